//! Renderable field definitions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::condition::{Condition, ConditionalVisibility};
use super::ids::ColumnId;
use super::role::{MinRole, Permission};

/// Value type of a field, used by renderers to pick editors and alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text.
    #[default]
    Text,
    /// Numeric value.
    Number,
    /// True/false flag.
    Boolean,
    /// Calendar date.
    Date,
    /// Date with time of day.
    Datetime,
    /// Email address.
    Email,
    /// Monetary amount.
    Currency,
    /// Enumerated status value.
    Status,
    /// Structured JSON payload.
    Json,
    /// Any type this build does not know about.
    #[serde(other)]
    Other,
}

/// One renderable field of an entity.
///
/// Field specs are static per entity. They come from the form-field settings
/// payload or are built in code with the `with_*` helpers.
///
/// # Examples
///
/// ```
/// # use admin_console::domain::{ColumnId, FieldSpec, MinRole, Role};
/// let field = FieldSpec::new(ColumnId::new("mrr").expect("valid id"), "MRR")
///     .with_min_role(Role::Admin)
///     .with_display_format("trend-arrow");
/// assert_eq!(field.min_role, Some(MinRole::Known(Role::Admin)));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Column this field renders.
    pub id: ColumnId,
    /// Human-readable label.
    pub label: String,
    /// Value type.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Per-record show/hide rules.
    #[serde(default)]
    pub conditional_visibility: Option<ConditionalVisibility>,
    /// Operator needs at least one of these permissions.
    #[serde(default)]
    pub required_permissions: Option<BTreeSet<Permission>>,
    /// Operator needs at least this role. Ignored when permissions are set.
    #[serde(default)]
    pub min_role: Option<MinRole>,
    /// Computed-field dispatch tag.
    #[serde(default)]
    pub compute_type: Option<String>,
    /// Formatter dispatch tag.
    #[serde(default)]
    pub display_format: Option<String>,
}

impl FieldSpec {
    /// Create a plain text field with no rules attached.
    #[must_use]
    pub fn new(id: ColumnId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            field_type: FieldType::Text,
            conditional_visibility: None,
            required_permissions: None,
            min_role: None,
            compute_type: None,
            display_format: None,
        }
    }

    /// A field no operator may see.
    ///
    /// Stands in for a spec that failed to decode so its column stays hidden.
    #[must_use]
    pub fn denied(id: ColumnId) -> Self {
        let label = id.as_str().to_owned();
        Self {
            required_permissions: Some(BTreeSet::new()),
            ..Self::new(id, label)
        }
    }

    /// Set the value type.
    #[must_use]
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    /// Show the field only when `condition` holds.
    #[must_use]
    pub fn with_show_when(mut self, condition: Condition) -> Self {
        self.conditional_visibility
            .get_or_insert_with(ConditionalVisibility::default)
            .show_when = Some(condition);
        self
    }

    /// Hide the field when `condition` holds.
    #[must_use]
    pub fn with_hide_when(mut self, condition: Condition) -> Self {
        self.conditional_visibility
            .get_or_insert_with(ConditionalVisibility::default)
            .hide_when = Some(condition);
        self
    }

    /// Require one of `permissions`.
    #[must_use]
    pub fn with_required_permissions(
        mut self,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        self.required_permissions = Some(permissions.into_iter().collect());
        self
    }

    /// Require at least `role`.
    #[must_use]
    pub fn with_min_role(mut self, role: impl Into<MinRole>) -> Self {
        self.min_role = Some(role.into());
        self
    }

    /// Derive the value with the named compute type.
    #[must_use]
    pub fn with_compute_type(mut self, compute_type: impl Into<String>) -> Self {
        self.compute_type = Some(compute_type.into());
        self
    }

    /// Render the value with the named display format.
    #[must_use]
    pub fn with_display_format(mut self, display_format: impl Into<String>) -> Self {
        self.display_format = Some(display_format.into());
        self
    }
}

/// Decode a form-field payload one entry at a time.
///
/// Accepts a bare array of specs or an object with a `fields` array; any other
/// shape yields no fields. An entry that fails to decode but carries a valid
/// `id` becomes [`FieldSpec::denied`]. Entries without a usable `id` are
/// skipped.
#[must_use]
pub fn decode_field_specs(payload: Value) -> Vec<FieldSpec> {
    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(mut config) => match config.remove("fields") {
            Some(Value::Array(entries)) => entries,
            _ => {
                warn!("form field config has no fields array");
                return Vec::new();
            }
        },
        _ => {
            warn!("form field config is neither an array nor an object");
            return Vec::new();
        }
    };
    entries.into_iter().filter_map(decode_entry).collect()
}

fn decode_entry(entry: Value) -> Option<FieldSpec> {
    let id = entry
        .get("id")
        .and_then(Value::as_str)
        .and_then(|raw| ColumnId::new(raw).ok());
    match serde_json::from_value::<FieldSpec>(entry) {
        Ok(field) => Some(field),
        Err(err) => {
            if let Some(id) = id {
                warn!(field = %id, error = %err, "malformed field spec; hiding column");
                Some(FieldSpec::denied(id))
            } else {
                warn!(error = %err, "dropping field spec without a usable id");
                None
            }
        }
    }
}
