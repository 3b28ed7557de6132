//! End-to-end view resolution: settings bootstrap, column preferences and
//! per-record resolution working together.

use std::sync::Arc;

use admin_console::domain::{
    BootstrapOutcome, ColumnId, ColumnVisibilityManager, EntityId, EntityView, EntityViewResolver,
    Reconciliation, Record, RenderDescriptor, SettingsBridge,
};
use admin_console::outbound::preferences::InMemoryPreferenceStore;
use admin_console::test_support::{RecordingSessionAuthority, StubSettingsTransport};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

type Bridge = SettingsBridge<StubSettingsTransport, RecordingSessionAuthority>;

fn tenants() -> EntityId {
    EntityId::new("tenants").expect("valid entity id")
}

fn ids(columns: &[ColumnId]) -> Vec<&str> {
    columns.iter().map(ColumnId::as_str).collect()
}

fn tenant_table() -> Value {
    json!({
        "availableColumns": ["name", "status", "health", "mrr", "suspendedReason", "churn"],
        "defaultVisibleColumns": ["name", "status", "health", "mrr", "suspendedReason"],
        "alwaysVisible": ["name"],
        "sortableColumns": ["name", "health"],
        "filterableColumns": { "status": true, "name": false },
        "columnConfig": { "health": { "width": 120 } },
        "computedFields": { "churn": { "dependencies": [], "computeType": "churn-forecast" } }
    })
}

fn tenant_fields() -> Value {
    json!({
        "fields": [
            { "id": "name", "label": "Name" },
            { "id": "status", "label": "Status", "type": "status", "displayFormat": "status-badge" },
            {
                "id": "health",
                "label": "Health",
                "type": "number",
                "computeType": "tenant-health-score",
                "displayFormat": "health-score"
            },
            { "id": "mrr", "label": "MRR", "type": "currency", "requiredPermissions": ["view-billing"] },
            {
                "id": "suspendedReason",
                "label": "Suspended because",
                "conditionalVisibility": { "showWhen": { "status": "suspended" } }
            }
        ]
    })
}

fn healthy_tenant() -> Value {
    json!({
        "name": "Acme",
        "status": "active",
        "subscriptionStatus": "active",
        "userCount": 12,
        "onboardingCompleted": true,
        "daysSinceLastActivity": 2,
        "mrr": 4200
    })
}

fn suspended_tenant() -> Value {
    json!({
        "name": "Globex",
        "status": "suspended",
        "suspendedReason": "chargeback",
        "userCount": 0
    })
}

struct Console {
    bridge: Bridge,
    manager: ColumnVisibilityManager<InMemoryPreferenceStore>,
    store: Arc<InMemoryPreferenceStore>,
}

fn console_with(store: InMemoryPreferenceStore) -> Console {
    let transport = StubSettingsTransport::new()
        .with_table_columns(&tenants(), tenant_table())
        .with_form_fields(&tenants(), tenant_fields())
        .with_view_option(&tenants(), "pageSize", json!(25));
    let bridge = SettingsBridge::new(
        Arc::new(transport),
        Arc::new(RecordingSessionAuthority::with_role("admin")),
        Arc::new(DefaultClock),
    );
    let store = Arc::new(store);
    Console {
        bridge,
        manager: ColumnVisibilityManager::new(Arc::clone(&store)),
        store,
    }
}

#[fixture]
fn console() -> Console {
    console_with(InMemoryPreferenceStore::new())
}

async fn bootstrap(console: &Console) {
    let outcome = console
        .bridge
        .bootstrap_load(&console.manager)
        .await
        .expect("bootstrap should succeed");
    assert_eq!(
        outcome,
        BootstrapOutcome::Loaded {
            entities: vec![tenants()]
        }
    );
}

#[rstest]
#[tokio::test]
async fn bootstrap_resolves_role_filtered_rows(console: Console) {
    bootstrap(&console).await;

    let config = console
        .manager
        .table_config(&tenants())
        .expect("config registered");
    let visible = console
        .manager
        .visible_columns(&tenants())
        .expect("entity registered");
    let fields = console.bridge.form_field_specs(&tenants());
    let role = console.bridge.current_role().expect("signed in");
    let view = EntityView {
        config: &config,
        visible_columns: &visible,
        fields: &fields,
        role: &role,
    };
    let resolver = EntityViewResolver::default();

    let columns = resolver.resolve_columns(&view);
    let headers: Vec<&str> = columns.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(headers, ["name", "status", "health", "suspendedReason"]);
    let health = &columns[2];
    assert!(health.sortable);
    assert!(!health.filterable);
    assert_eq!(health.width, Some(120));
    assert!(columns[1].filterable);

    let records: Vec<Record> = vec![
        serde_json::from_value(healthy_tenant()).expect("record"),
        serde_json::from_value(suspended_tenant()).expect("record"),
    ];
    let rows = resolver.resolve_rows(&view, &records);

    let healthy: Vec<&str> = rows[0].iter().map(|f| f.id.as_str()).collect();
    assert_eq!(healthy, ["name", "status", "health"]);
    assert_eq!(rows[0][2].value, Some(json!(100)));
    assert!(matches!(
        rows[0][2].descriptor,
        Some(RenderDescriptor::ProgressBar { .. })
    ));
    assert!(matches!(
        rows[0][1].descriptor,
        Some(RenderDescriptor::Badge { .. })
    ));

    let suspended: Vec<&str> = rows[1].iter().map(|f| f.id.as_str()).collect();
    assert_eq!(suspended, ["name", "status", "health", "suspendedReason"]);
    assert_eq!(rows[1][2].value, Some(json!(0)));
}

#[rstest]
#[tokio::test]
async fn stored_override_survives_bootstrap() {
    let store = InMemoryPreferenceStore::new()
        .with_entry("column-visibility-tenants", r#"["health","ghost","status"]"#);
    let console = console_with(store);

    bootstrap(&console).await;

    let visible = console
        .manager
        .visible_columns(&tenants())
        .expect("entity registered");
    assert_eq!(ids(&visible), ["name", "health", "status"]);
}

#[rstest]
#[tokio::test]
async fn column_changes_persist_for_the_next_session(console: Console) {
    bootstrap(&console).await;
    let mrr = ColumnId::new("mrr").expect("valid column id");
    let name = ColumnId::new("name").expect("valid column id");

    console
        .manager
        .toggle_column(&tenants(), &mrr)
        .await
        .expect("toggle succeeds");
    let after_name_toggle = console
        .manager
        .toggle_column(&tenants(), &name)
        .await
        .expect("toggle succeeds");
    assert!(after_name_toggle.contains(&name));

    let next_session = ColumnVisibilityManager::new(Arc::clone(&console.store));
    let published = console.bridge.publish_table_configs(&next_session).await;
    assert_eq!(published, [tenants()]);

    let visible = next_session
        .visible_columns(&tenants())
        .expect("entity registered");
    assert_eq!(ids(&visible), ["name", "status", "health", "suspendedReason"]);
}

#[rstest]
#[tokio::test]
async fn unknown_compute_type_leaves_field_unset(console: Console) {
    bootstrap(&console).await;
    let churn = ColumnId::new("churn").expect("valid column id");
    let visible = console
        .manager
        .toggle_column(&tenants(), &churn)
        .await
        .expect("toggle succeeds");
    assert!(visible.contains(&churn));

    let config = console
        .manager
        .table_config(&tenants())
        .expect("config registered");
    let fields = console.bridge.form_field_specs(&tenants());
    let view = EntityView {
        config: &config,
        visible_columns: &visible,
        fields: &fields,
        role: "platform-admin",
    };
    let mut raw = healthy_tenant();
    raw["churn"] = json!(0.4);
    let record: Record = serde_json::from_value(raw).expect("record");
    let resolved = EntityViewResolver::default().resolve_record(&view, &record, &[]);

    let churn_field = resolved
        .iter()
        .find(|field| field.id == churn)
        .expect("churn column resolved");
    assert!(churn_field.value.is_none());
    assert!(churn_field.descriptor.is_none());
}

#[rstest]
#[tokio::test]
async fn view_option_updates_are_confirmed(console: Console) {
    bootstrap(&console).await;

    console
        .bridge
        .update_setting(&tenants(), "pageSize", json!(50))
        .await
        .expect("update succeeds");

    assert_eq!(
        console.bridge.view_option(&tenants(), "pageSize"),
        Some(json!(50))
    );
    let state = console
        .bridge
        .setting_state(&tenants(), "pageSize")
        .expect("state tracked");
    assert_eq!(state.reconciliation(), Some(Reconciliation::Confirmed));
}
