//! Column visibility coverage: list transitions and the persisting manager.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ports::{MockPreferenceStore, PreferenceStoreError};
use crate::outbound::preferences::InMemoryPreferenceStore;

fn id(raw: &str) -> ColumnId {
    ColumnId::new(raw).expect("valid column id")
}

fn ids(raw: &[&str]) -> Vec<ColumnId> {
    raw.iter().map(|value| id(value)).collect()
}

fn users() -> EntityId {
    EntityId::new("users").expect("valid entity id")
}

#[fixture]
fn config() -> TableConfig {
    TableConfig::new(ids(&["name", "email", "role", "status", "createdAt"]))
        .with_default_visible(ids(&["name", "email", "status"]))
        .with_always_visible(ids(&["name"]))
        .with_sortable(ids(&["name", "createdAt"]))
}

fn is_subsequence(visible: &[ColumnId], available: &[ColumnId]) -> bool {
    let mut remaining = available.iter();
    visible
        .iter()
        .all(|column| remaining.any(|candidate| candidate == column))
}

#[rstest]
fn hidden_column_is_inserted_at_its_rank(config: TableConfig) {
    let visible = toggle_column(&config, &ids(&["name", "email", "status"]), &id("role"));
    assert_eq!(visible, ids(&["name", "email", "role", "status"]));
}

#[rstest]
fn visible_column_is_removed_preserving_order(config: TableConfig) {
    let visible = toggle_column(&config, &ids(&["name", "email", "status"]), &id("email"));
    assert_eq!(visible, ids(&["name", "status"]));
}

#[rstest]
fn always_visible_column_cannot_be_hidden(config: TableConfig) {
    let before = ids(&["name", "email"]);
    assert_eq!(toggle_column(&config, &before, &id("name")), before);
}

#[rstest]
fn unknown_column_toggle_is_a_no_op(config: TableConfig) {
    let before = ids(&["name", "email"]);
    assert_eq!(toggle_column(&config, &before, &id("ghost")), before);
}

#[rstest]
#[case("role")]
#[case("createdAt")]
#[case("email")]
fn toggle_round_trip_restores_list(config: TableConfig, #[case] column: &str) {
    let before = ids(&["name", "email", "status"]);
    let once = toggle_column(&config, &before, &id(column));
    let twice = toggle_column(&config, &once, &id(column));
    assert_eq!(twice, before);
}

#[rstest]
fn toggle_sequences_keep_available_order(config: TableConfig) {
    let sequence = [
        "status", "createdAt", "email", "role", "status", "name", "email", "createdAt", "role",
    ];
    let mut visible = default_columns(&config);
    for column in sequence {
        visible = toggle_column(&config, &visible, &id(column));
        assert!(
            is_subsequence(&visible, &config.available_columns),
            "{visible:?} lost canonical order"
        );
        assert!(visible.contains(&id("name")));
    }
}

#[rstest]
#[case(0, 2, &["email", "status", "name"])]
#[case(2, 0, &["status", "name", "email"])]
#[case(1, 1, &["name", "email", "status"])]
fn reorder_moves_column(#[case] from: usize, #[case] to: usize, #[case] expected: &[&str]) {
    let visible = reorder_columns(&ids(&["name", "email", "status"]), from, to)
        .expect("indices in bounds");
    assert_eq!(visible, ids(expected));
}

#[rstest]
#[case(3, 0)]
#[case(0, 3)]
fn reorder_rejects_out_of_bounds(#[case] from: usize, #[case] to: usize) {
    let err = reorder_columns(&ids(&["name", "email", "status"]), from, to)
        .expect_err("indices out of bounds");
    assert_eq!(err, ColumnVisibilityError::InvalidIndex { from, to, len: 3 });
}

#[rstest]
fn normalize_restores_missing_always_visible_at_rank() {
    let config = TableConfig::new(ids(&["a", "b", "c", "d"])).with_always_visible(ids(&["c"]));
    let visible = normalize_columns(&config, ids(&["d", "a", "a"]));
    assert_eq!(visible, ids(&["d", "c", "a"]));
}

#[rstest]
fn sanitize_drops_invalid_and_unknown_ids(config: TableConfig) {
    let stored = vec![
        "email".to_owned(),
        " padded ".to_owned(),
        "ghost".to_owned(),
        "role".to_owned(),
    ];
    assert_eq!(
        sanitize_override(&config, stored),
        ids(&["name", "email", "role"])
    );
}

#[rstest]
#[case(
    TableConfig::new(ids(&["a", "a"])),
    TableConfigValidationError::DuplicateAvailableColumn { column: id("a") }
)]
#[case(
    TableConfig::new(ids(&["a"])).with_default_visible(ids(&["b"])),
    TableConfigValidationError::UnknownDefaultColumn { column: id("b") }
)]
#[case(
    TableConfig::new(ids(&["a"])).with_always_visible(ids(&["z"])),
    TableConfigValidationError::UnknownAlwaysVisibleColumn { column: id("z") }
)]
fn validation_reports_subset_violations(
    #[case] config: TableConfig,
    #[case] expected: TableConfigValidationError,
) {
    assert_eq!(config.validate(), Err(expected));
}

#[rstest]
#[case(json!(["status"]), true)]
#[case(json!({ "status": true, "email": false }), true)]
#[case(json!({ "status": false }), false)]
#[case(json!([]), false)]
fn filterable_columns_accept_both_shapes(#[case] raw: serde_json::Value, #[case] expected: bool) {
    let filterable: FilterableColumns = serde_json::from_value(raw).expect("filterable shape");
    assert_eq!(filterable.contains(&id("status")), expected);
}

#[rstest]
fn table_config_decodes_wire_shape() {
    let config: TableConfig = serde_json::from_value(json!({
        "availableColumns": ["name", "mrr"],
        "defaultVisibleColumns": ["name"],
        "alwaysVisible": ["name"],
        "columnConfig": { "mrr": { "width": 120, "formatter": "trend-arrow" } },
        "computedFields": { "mrr": { "dependencies": ["name"], "computeType": "revenue-trend" } },
        "sortableColumns": ["mrr"],
        "filterableColumns": { "name": true }
    }))
    .expect("wire table config");

    assert_eq!(config.compute_type(&id("mrr")), Some("revenue-trend"));
    assert_eq!(
        config.column_settings(&id("mrr")).and_then(|s| s.width),
        Some(120)
    );
    assert!(config.is_filterable(&id("name")));
    assert!(config.is_sortable(&id("mrr")));
}

#[rstest]
fn unknown_entity_maps_to_not_found() {
    let err: crate::domain::DomainError =
        ColumnVisibilityError::UnknownEntity { entity: users() }.into();
    assert_eq!(err.code(), crate::domain::ErrorCode::NotFound);
}

fn manager_with(
    store: InMemoryPreferenceStore,
    config: TableConfig,
) -> (Arc<InMemoryPreferenceStore>, ColumnVisibilityManager<InMemoryPreferenceStore>) {
    let store = Arc::new(store);
    let manager = ColumnVisibilityManager::new(Arc::clone(&store));
    manager
        .register_config(users(), config)
        .expect("valid config");
    (store, manager)
}

#[rstest]
#[tokio::test]
async fn toggle_persists_new_list(config: TableConfig) {
    let (store, manager) = manager_with(InMemoryPreferenceStore::new(), config);

    let visible = manager
        .toggle_column(&users(), &id("role"))
        .await
        .expect("registered entity");

    assert_eq!(visible, ids(&["name", "email", "role", "status"]));
    assert_eq!(
        store.snapshot("column-visibility-users").as_deref(),
        Some(r#"["name","email","role","status"]"#)
    );
}

#[rstest]
#[tokio::test]
async fn hydrate_applies_sanitised_override(config: TableConfig) {
    let store = InMemoryPreferenceStore::new()
        .with_entry("column-visibility-users", r#"["createdAt","ghost","email"]"#);
    let (_, manager) = manager_with(store, config);

    let visible = manager.hydrate(&users()).await.expect("registered entity");

    assert_eq!(visible, ids(&["name", "createdAt", "email"]));
}

#[rstest]
#[case(r#"{"not":"a list"}"#)]
#[case("not json")]
#[case("[1, 2]")]
#[tokio::test]
async fn corrupt_override_falls_back_to_defaults(config: TableConfig, #[case] raw: &str) {
    let store = InMemoryPreferenceStore::new().with_entry("column-visibility-users", raw);
    let (_, manager) = manager_with(store, config);

    let visible = manager.hydrate(&users()).await.expect("registered entity");

    assert_eq!(visible, ids(&["name", "email", "status"]));
}

#[rstest]
#[tokio::test]
async fn reset_is_idempotent_and_clears_override(config: TableConfig) {
    let (store, manager) = manager_with(InMemoryPreferenceStore::new(), config);
    manager
        .toggle_column(&users(), &id("email"))
        .await
        .expect("registered entity");

    let first = manager
        .reset_to_default(&users())
        .await
        .expect("registered entity");
    let second = manager
        .reset_to_default(&users())
        .await
        .expect("registered entity");

    assert_eq!(first, second);
    assert_eq!(first, ids(&["name", "email", "status"]));
    assert!(store.snapshot("column-visibility-users").is_none());
}

#[rstest]
#[tokio::test]
async fn reorder_persists_and_rejects_bad_indices(config: TableConfig) {
    let (store, manager) = manager_with(InMemoryPreferenceStore::new(), config);

    let visible = manager
        .reorder_columns(&users(), 2, 0)
        .await
        .expect("indices in bounds");
    assert_eq!(visible, ids(&["status", "name", "email"]));
    assert_eq!(
        store.snapshot("column-visibility-users").as_deref(),
        Some(r#"["status","name","email"]"#)
    );

    let err = manager
        .reorder_columns(&users(), 0, 9)
        .await
        .expect_err("out of bounds");
    assert!(matches!(err, ColumnVisibilityError::InvalidIndex { .. }));
    assert_eq!(
        manager.visible_columns(&users()).expect("registered entity"),
        ids(&["status", "name", "email"])
    );
}

#[rstest]
#[tokio::test]
async fn operations_on_unregistered_entity_fail() {
    let manager = ColumnVisibilityManager::new(Arc::new(InMemoryPreferenceStore::new()));
    let err = manager
        .toggle_column(&users(), &id("name"))
        .await
        .expect_err("no catalogue");
    assert_eq!(err, ColumnVisibilityError::UnknownEntity { entity: users() });
    assert!(manager.visible_columns(&users()).is_err());
}

#[rstest]
#[tokio::test]
async fn store_failures_keep_in_memory_list(config: TableConfig) {
    let mut store = MockPreferenceStore::new();
    store
        .expect_write()
        .withf(|key, _| key == "column-visibility-users")
        .times(1)
        .returning(|_, _| Err(PreferenceStoreError::unavailable("offline")));
    store
        .expect_read()
        .times(1)
        .returning(|_| Err(PreferenceStoreError::unavailable("offline")));
    let manager = ColumnVisibilityManager::new(Arc::new(store));
    manager
        .register_config(users(), config)
        .expect("valid config");

    let hydrated = manager.hydrate(&users()).await.expect("registered entity");
    assert_eq!(hydrated, ids(&["name", "email", "status"]));

    let visible = manager
        .toggle_column(&users(), &id("status"))
        .await
        .expect("registered entity");
    assert_eq!(visible, ids(&["name", "email"]));
    assert_eq!(
        manager.visible_columns(&users()).expect("registered entity"),
        ids(&["name", "email"])
    );
}

#[rstest]
#[tokio::test]
async fn always_visible_toggle_does_not_write(config: TableConfig) {
    let mut store = MockPreferenceStore::new();
    store.expect_write().never();
    let manager = ColumnVisibilityManager::new(Arc::new(store));
    manager
        .register_config(users(), config)
        .expect("valid config");

    let visible = manager
        .toggle_column(&users(), &id("name"))
        .await
        .expect("registered entity");

    assert!(visible.contains(&id("name")));
}

#[rstest]
fn refreshing_config_renormalises_visible_list(config: TableConfig) {
    let manager = ColumnVisibilityManager::new(Arc::new(InMemoryPreferenceStore::new()));
    manager
        .register_config(users(), config)
        .expect("valid config");

    let narrowed = TableConfig::new(ids(&["id", "name", "status"]))
        .with_default_visible(ids(&["name"]))
        .with_always_visible(ids(&["id"]));
    manager
        .register_config(users(), narrowed)
        .expect("valid config");

    assert_eq!(
        manager.visible_columns(&users()).expect("registered entity"),
        ids(&["id", "name", "status"])
    );
}

#[rstest]
fn invalid_config_is_rejected_and_previous_kept(config: TableConfig) {
    let manager = ColumnVisibilityManager::new(Arc::new(InMemoryPreferenceStore::new()));
    manager
        .register_config(users(), config.clone())
        .expect("valid config");

    let err = manager
        .register_config(users(), TableConfig::new(ids(&["a", "a"])))
        .expect_err("duplicate column");

    assert!(matches!(err, ColumnVisibilityError::InvalidConfig { .. }));
    assert_eq!(manager.table_config(&users()), Ok(config));
}

#[rstest]
fn stored_preference_is_a_bare_array() {
    let preference = UserColumnPreference {
        entity: users(),
        visible_columns: ids(&["name", "email"]),
    };
    assert_eq!(preference.storage_key(), "column-visibility-users");
    assert_eq!(
        preference.to_stored_json().expect("encode"),
        r#"["name","email"]"#
    );
}
