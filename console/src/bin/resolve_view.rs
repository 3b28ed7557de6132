//! Resolve one entity's admin view from JSON inputs and print it.
//!
//! Reads a table config, optional field specs and a page of records, applies
//! the operator's stored or supplied column override and role, and writes the
//! resolved columns and rows to stdout as JSON.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use admin_console::domain::ports::{PreferenceStore, column_visibility_key};
use admin_console::domain::{
    ColumnId, ColumnVisibilityManager, EntityId, EntityView, EntityViewResolver, FieldSpec, Record,
    ResolvedColumn, ResolvedField, TableConfig, decode_field_specs,
};
use admin_console::outbound::preferences::{DirectoryPreferenceStore, InMemoryPreferenceStore};
use cap_std::{ambient_authority, fs::Dir};
use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::runtime::Builder;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `resolve-view` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "resolve-view",
    about = "Resolve an entity's admin table view for one operator",
    version
)]
struct CliArgs {
    /// Entity the view belongs to.
    #[arg(long, value_name = "name")]
    entity: String,
    /// JSON table config (`availableColumns`, `defaultVisibleColumns`, ...).
    #[arg(long = "table-config", value_name = "path")]
    table_config: PathBuf,
    /// JSON array of field specs.
    #[arg(long, value_name = "path")]
    fields: Option<PathBuf>,
    /// JSON array of records.
    #[arg(long, value_name = "path")]
    records: PathBuf,
    /// JSON array of column ids to use as the operator's override.
    #[arg(long = "override", value_name = "path", conflicts_with = "preference_dir")]
    override_path: Option<PathBuf>,
    /// Directory holding stored column preferences.
    #[arg(long = "preference-dir", value_name = "path")]
    preference_dir: Option<PathBuf>,
    /// Operator role.
    #[arg(long, value_name = "role", default_value = "support")]
    role: String,
}

#[derive(Debug, Serialize)]
struct ResolvedView {
    entity: EntityId,
    columns: Vec<ResolvedColumn>,
    rows: Vec<Vec<ResolvedField>>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let args = CliArgs::try_parse()?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build runtime")?;
    let view = runtime.block_on(resolve(args))?;

    let encoded = serde_json::to_string_pretty(&view).wrap_err("failed to encode view")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{encoded}").wrap_err("failed to write view")?;
    Ok(())
}

async fn resolve(args: CliArgs) -> Result<ResolvedView> {
    let entity = EntityId::new(&args.entity).wrap_err("invalid --entity")?;
    let config: TableConfig = read_json(&args.table_config)?;
    let fields: Vec<FieldSpec> = match &args.fields {
        Some(path) => decode_field_specs(read_json(path)?),
        None => Vec::new(),
    };
    let records: Vec<Record> = read_json(&args.records)?;

    let visible = match (&args.preference_dir, &args.override_path) {
        (Some(dir), _) => {
            let store = DirectoryPreferenceStore::open_ambient(dir)
                .wrap_err("failed to open preference directory")?;
            visible_columns(Arc::new(store), &entity, &config).await?
        }
        (None, Some(path)) => {
            let raw = read_text(path)?;
            let store =
                InMemoryPreferenceStore::new().with_entry(column_visibility_key(&entity), raw);
            visible_columns(Arc::new(store), &entity, &config).await?
        }
        (None, None) => {
            visible_columns(Arc::new(InMemoryPreferenceStore::new()), &entity, &config).await?
        }
    };
    debug!(entity = %entity, columns = visible.len(), "resolved visible columns");

    let view = EntityView {
        config: &config,
        visible_columns: &visible,
        fields: &fields,
        role: &args.role,
    };
    let resolver = EntityViewResolver::default();
    Ok(ResolvedView {
        columns: resolver.resolve_columns(&view),
        rows: resolver.resolve_rows(&view, &records),
        entity,
    })
}

async fn visible_columns<S>(
    store: Arc<S>,
    entity: &EntityId,
    config: &TableConfig,
) -> Result<Vec<ColumnId>>
where
    S: PreferenceStore,
{
    let manager = ColumnVisibilityManager::new(store);
    manager
        .register_config(entity.clone(), config.clone())
        .wrap_err("table config is invalid")?;
    manager
        .hydrate(entity)
        .await
        .wrap_err("failed to load column preference")
}

fn read_text(path: &Path) -> Result<String> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("input path '{}' must be a file", path.display()))?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())
        .wrap_err_with(|| format!("failed to open directory '{}'", parent.display()))?;
    directory
        .read_to_string(Path::new(file_name))
        .wrap_err_with(|| format!("failed to read '{}'", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = read_text(path)?;
    serde_json::from_str(&raw).wrap_err_with(|| format!("failed to parse '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI parsing and file helpers.

    use std::fs;

    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, name: &str, value: &serde_json::Value) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, value.to_string()).expect("fixture should be written");
        path
    }

    fn args_for(dir: &TempDir) -> CliArgs {
        let table = write(
            dir,
            "table.json",
            &json!({
                "availableColumns": ["name", "status", "plan"],
                "defaultVisibleColumns": ["name", "status"],
                "alwaysVisible": ["name"]
            }),
        );
        let records = write(
            dir,
            "records.json",
            &json!([{ "name": "Acme", "status": "active", "plan": "pro" }]),
        );
        CliArgs::try_parse_from([
            "resolve-view",
            "--entity",
            "tenants",
            "--table-config",
            table.to_str().expect("utf-8 path"),
            "--records",
            records.to_str().expect("utf-8 path"),
        ])
        .expect("arguments should parse")
    }

    #[rstest]
    fn override_conflicts_with_preference_dir() {
        let result = CliArgs::try_parse_from([
            "resolve-view",
            "--entity",
            "tenants",
            "--table-config",
            "t.json",
            "--records",
            "r.json",
            "--override",
            "o.json",
            "--preference-dir",
            "prefs",
        ]);
        assert!(result.is_err());
    }

    #[rstest]
    fn role_defaults_to_support() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert_eq!(args_for(&dir).role, "support");
    }

    #[rstest]
    #[tokio::test]
    async fn resolves_defaults_without_override() {
        let dir = tempfile::tempdir().expect("temp dir");
        let view = resolve(args_for(&dir)).await.expect("view should resolve");

        let ids: Vec<&str> = view.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["name", "status"]);
        assert_eq!(view.rows.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn override_file_reorders_and_keeps_always_visible() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut args = args_for(&dir);
        args.override_path = Some(write(&dir, "override.json", &json!(["plan", "ghost"])));

        let view = resolve(args).await.expect("view should resolve");
        let ids: Vec<&str> = view.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["name", "plan"]);
    }

    #[rstest]
    #[tokio::test]
    async fn preference_dir_supplies_stored_override() {
        let dir = tempfile::tempdir().expect("temp dir");
        let prefs = dir.path().join("prefs");
        fs::create_dir_all(&prefs).expect("prefs dir");
        fs::write(
            prefs.join("column-visibility-tenants.json"),
            json!(["status", "name"]).to_string(),
        )
        .expect("preference should be written");
        let mut args = args_for(&dir);
        args.preference_dir = Some(prefs);

        let view = resolve(args).await.expect("view should resolve");
        let ids: Vec<&str> = view.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["status", "name"]);
    }

    #[rstest]
    #[tokio::test]
    async fn fields_with_unknown_roles_stay_hidden() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut args = args_for(&dir);
        args.fields = Some(write(
            &dir,
            "fields.json",
            &json!([
                { "id": "status", "label": "Status", "minRole": "superadmin" },
                { "id": "name", "label": 12 }
            ]),
        ));
        args.role = "platform-admin".to_owned();

        let view = resolve(args).await.expect("view should resolve");
        assert!(view.columns.is_empty());
    }

    #[rstest]
    fn missing_input_file_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = read_text(&dir.path().join("absent.json")).expect_err("read should fail");
        assert!(error.to_string().contains("absent.json"));
    }
}
