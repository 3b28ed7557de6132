//! Entity view resolution.
//!
//! Combines the operator's visible column list, the entity's field specs, the
//! role permission filter, per-record visibility rules, computed values and
//! formatters into the ordered field list a renderer consumes.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::columns::TableConfig;
use super::computed::ComputedFieldEngine;
use super::condition::should_show_field;
use super::field_spec::{FieldSpec, FieldType};
use super::format::{DynamicFormatter, RenderDescriptor};
use super::ids::ColumnId;
use super::record::Record;
use super::role::has_field_permission;

/// Everything the resolver needs to know about one entity's view.
#[derive(Debug, Clone, Copy)]
pub struct EntityView<'a> {
    /// The entity's catalogue.
    pub config: &'a TableConfig,
    /// The operator's visible columns, in display order.
    pub visible_columns: &'a [ColumnId],
    /// Field specs for the entity. Columns without one render as plain text.
    pub fields: &'a [FieldSpec],
    /// The operator's role string.
    pub role: &'a str,
}

impl EntityView<'_> {
    fn field_for<'f>(&'f self, column: &ColumnId) -> Cow<'f, FieldSpec> {
        self.fields
            .iter()
            .find(|field| &field.id == column)
            .map_or_else(
                || Cow::Owned(FieldSpec::new(column.clone(), column.as_str())),
                Cow::Borrowed,
            )
    }
}

/// Column header after permission filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedColumn {
    /// Column id.
    pub id: ColumnId,
    /// Header text.
    pub label: String,
    /// Value type of the column's field.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the table may sort on this column.
    pub sortable: bool,
    /// Whether the table may filter on this column.
    pub filterable: bool,
    /// Preferred width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

/// One field of one record, ready to render.
///
/// `value` and `descriptor` are `None` when the field has no value: the record
/// lacks it or its compute type is not registered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedField {
    /// Column id.
    pub id: ColumnId,
    /// Field label.
    pub label: String,
    /// Value type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Raw or computed value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// How to render `value`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<RenderDescriptor>,
}

/// Composition root for per-record view resolution.
///
/// # Examples
///
/// ```
/// # use admin_console::domain::{ColumnId, EntityView, EntityViewResolver, FieldSpec, Record, TableConfig};
/// # use serde_json::json;
/// let id = |raw: &str| ColumnId::new(raw).expect("valid column id");
/// let config = TableConfig::new([id("name"), id("health")]);
/// let fields = [FieldSpec::new(id("health"), "Health")
///     .with_compute_type("tenant-health-score")
///     .with_display_format("health-score")];
/// let visible = [id("name"), id("health")];
/// let view = EntityView { config: &config, visible_columns: &visible, fields: &fields, role: "admin" };
///
/// let tenant = Record::new().with("name", "Acme").with("userCount", 3);
/// let resolved = EntityViewResolver::default().resolve_record(&view, &tenant, &[]);
/// assert_eq!(resolved.len(), 2);
/// assert_eq!(resolved[1].value, Some(json!(25)));
/// ```
#[derive(Debug, Clone)]
pub struct EntityViewResolver {
    computed: ComputedFieldEngine,
    formatter: DynamicFormatter,
}

impl Default for EntityViewResolver {
    fn default() -> Self {
        Self::new(
            ComputedFieldEngine::with_builtins(),
            DynamicFormatter::with_builtins(),
        )
    }
}

impl EntityViewResolver {
    /// Resolver over the given registries.
    #[must_use]
    pub fn new(computed: ComputedFieldEngine, formatter: DynamicFormatter) -> Self {
        Self {
            computed,
            formatter,
        }
    }

    /// Column headers the operator may see, in display order.
    ///
    /// Only the role filter applies here; per-record rules need a record.
    #[must_use]
    pub fn resolve_columns(&self, view: &EntityView<'_>) -> Vec<ResolvedColumn> {
        view.visible_columns
            .iter()
            .filter_map(|column| {
                let field = view.field_for(column);
                if !has_field_permission(&field, view.role) {
                    return None;
                }
                Some(ResolvedColumn {
                    id: column.clone(),
                    label: field.label.clone(),
                    field_type: field.field_type,
                    sortable: view.config.is_sortable(column),
                    filterable: view.config.is_filterable(column),
                    width: view
                        .config
                        .column_settings(column)
                        .and_then(|settings| settings.width),
                })
            })
            .collect()
    }

    /// Resolve the visible fields of `record`.
    ///
    /// `all_records` is the page the record belongs to, passed through to
    /// compute functions that aggregate.
    #[must_use]
    pub fn resolve_record(
        &self,
        view: &EntityView<'_>,
        record: &Record,
        all_records: &[Record],
    ) -> Vec<ResolvedField> {
        view.visible_columns
            .iter()
            .filter_map(|column| {
                let field = view.field_for(column);
                if !has_field_permission(&field, view.role) || !should_show_field(&field, record) {
                    return None;
                }
                let value = self.field_value(view, &field, record, all_records);
                let display_format = field.display_format.as_deref().or_else(|| {
                    view.config
                        .column_settings(column)
                        .and_then(|settings| settings.formatter.as_deref())
                });
                let descriptor = value
                    .as_ref()
                    .map(|value| self.formatter.format(display_format, &field, value, record));
                Some(ResolvedField {
                    id: column.clone(),
                    label: field.label.clone(),
                    field_type: field.field_type,
                    value,
                    descriptor,
                })
            })
            .collect()
    }

    /// Resolve every record of a page.
    #[must_use]
    pub fn resolve_rows(&self, view: &EntityView<'_>, records: &[Record]) -> Vec<Vec<ResolvedField>> {
        records
            .iter()
            .map(|record| self.resolve_record(view, record, records))
            .collect()
    }

    fn field_value(
        &self,
        view: &EntityView<'_>,
        field: &FieldSpec,
        record: &Record,
        all_records: &[Record],
    ) -> Option<Value> {
        let compute_type = field
            .compute_type
            .as_deref()
            .or_else(|| view.config.compute_type(&field.id));
        let Some(compute_type) = compute_type else {
            return record.get(field.id.as_str()).cloned();
        };
        match self.computed.compute(compute_type, record, all_records) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(field = %field.id, error = %err, "leaving computed field unset");
                None
            }
        }
    }
}
