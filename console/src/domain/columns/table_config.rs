//! Per-entity table catalogue.
//!
//! `availableColumns` order is the canonical ranking every visible list is
//! measured against. The remaining maps are optional presentation hints.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::ColumnId;

/// Presentation hints for one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSettings {
    /// Preferred width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Display format used when the field spec names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatter: Option<String>,
}

/// Declaration of a column derived from other columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedColumn {
    /// Columns the value is derived from.
    #[serde(default)]
    pub dependencies: Vec<ColumnId>,
    /// Compute type used when the field spec names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_type: Option<String>,
}

/// Filterable columns, as a plain set or as per-column flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterableColumns {
    /// `["status", "plan"]`
    Set(BTreeSet<ColumnId>),
    /// `{"status": true, "plan": false}`
    Flags(BTreeMap<ColumnId, bool>),
}

impl Default for FilterableColumns {
    fn default() -> Self {
        Self::Set(BTreeSet::new())
    }
}

impl FilterableColumns {
    /// Whether `column` accepts a filter.
    #[must_use]
    pub fn contains(&self, column: &ColumnId) -> bool {
        match self {
            Self::Set(columns) => columns.contains(column),
            Self::Flags(flags) => flags.get(column).copied().unwrap_or(false),
        }
    }
}

/// Consistency failures detected by [`TableConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableConfigValidationError {
    /// A column appears twice in `availableColumns`.
    #[error("column `{column}` is listed more than once in availableColumns")]
    DuplicateAvailableColumn {
        /// The repeated column.
        column: ColumnId,
    },
    /// A default column is not in `availableColumns`.
    #[error("default column `{column}` is not an available column")]
    UnknownDefaultColumn {
        /// The offending column.
        column: ColumnId,
    },
    /// An always-visible column is not in `availableColumns`.
    #[error("always-visible column `{column}` is not an available column")]
    UnknownAlwaysVisibleColumn {
        /// The offending column.
        column: ColumnId,
    },
}

/// Column catalogue for one entity.
///
/// # Examples
///
/// ```
/// # use admin_console::domain::{ColumnId, TableConfig};
/// let id = |raw: &str| ColumnId::new(raw).expect("valid column id");
/// let config = TableConfig::new([id("name"), id("email"), id("role")])
///     .with_default_visible([id("name"), id("email")])
///     .with_always_visible([id("name")]);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.rank(&id("role")), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    /// Every column the entity can show, in canonical order.
    pub available_columns: Vec<ColumnId>,
    /// Columns shown before the operator customises anything.
    #[serde(default)]
    pub default_visible_columns: Vec<ColumnId>,
    /// Columns that can never be hidden.
    #[serde(default)]
    pub always_visible: BTreeSet<ColumnId>,
    /// Per-column presentation settings.
    #[serde(default)]
    pub column_config: BTreeMap<ColumnId, ColumnSettings>,
    /// Columns whose values are derived rather than read from the record.
    #[serde(default)]
    pub computed_fields: BTreeMap<ColumnId, ComputedColumn>,
    /// Columns the table may sort on.
    #[serde(default)]
    pub sortable_columns: BTreeSet<ColumnId>,
    /// Columns the table may filter on.
    #[serde(default)]
    pub filterable_columns: FilterableColumns,
}

impl TableConfig {
    /// Catalogue with `available` columns and nothing else configured.
    #[must_use]
    pub fn new(available: impl IntoIterator<Item = ColumnId>) -> Self {
        Self {
            available_columns: available.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Set the default visible columns.
    #[must_use]
    pub fn with_default_visible(mut self, columns: impl IntoIterator<Item = ColumnId>) -> Self {
        self.default_visible_columns = columns.into_iter().collect();
        self
    }

    /// Set the always-visible columns.
    #[must_use]
    pub fn with_always_visible(mut self, columns: impl IntoIterator<Item = ColumnId>) -> Self {
        self.always_visible = columns.into_iter().collect();
        self
    }

    /// Set the sortable columns.
    #[must_use]
    pub fn with_sortable(mut self, columns: impl IntoIterator<Item = ColumnId>) -> Self {
        self.sortable_columns = columns.into_iter().collect();
        self
    }

    /// Set the filterable columns.
    #[must_use]
    pub fn with_filterable(mut self, filterable: FilterableColumns) -> Self {
        self.filterable_columns = filterable;
        self
    }

    /// Attach presentation hints to a column.
    #[must_use]
    pub fn with_column_settings(mut self, column: ColumnId, settings: ColumnSettings) -> Self {
        self.column_config.insert(column, settings);
        self
    }

    /// Declare a computed column.
    #[must_use]
    pub fn with_computed(mut self, column: ColumnId, computed: ComputedColumn) -> Self {
        self.computed_fields.insert(column, computed);
        self
    }

    /// Position of `column` in `availableColumns`.
    #[must_use]
    pub fn rank(&self, column: &ColumnId) -> Option<usize> {
        self.available_columns
            .iter()
            .position(|candidate| candidate == column)
    }

    /// Whether `column` is in the catalogue.
    #[must_use]
    pub fn is_available(&self, column: &ColumnId) -> bool {
        self.rank(column).is_some()
    }

    /// Whether `column` can never be hidden.
    #[must_use]
    pub fn is_always_visible(&self, column: &ColumnId) -> bool {
        self.always_visible.contains(column)
    }

    /// Whether `column` is sortable.
    #[must_use]
    pub fn is_sortable(&self, column: &ColumnId) -> bool {
        self.sortable_columns.contains(column)
    }

    /// Whether `column` is filterable.
    #[must_use]
    pub fn is_filterable(&self, column: &ColumnId) -> bool {
        self.filterable_columns.contains(column)
    }

    /// Presentation settings for `column`, if configured.
    #[must_use]
    pub fn column_settings(&self, column: &ColumnId) -> Option<&ColumnSettings> {
        self.column_config.get(column)
    }

    /// Compute type declared for `column` under `computedFields`.
    #[must_use]
    pub fn compute_type(&self, column: &ColumnId) -> Option<&str> {
        self.computed_fields
            .get(column)
            .and_then(|computed| computed.compute_type.as_deref())
    }

    /// Check the subset rules between the column lists.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), TableConfigValidationError> {
        let mut seen = HashSet::with_capacity(self.available_columns.len());
        if let Some(column) = self
            .available_columns
            .iter()
            .find(|column| !seen.insert(*column))
        {
            return Err(TableConfigValidationError::DuplicateAvailableColumn {
                column: column.clone(),
            });
        }
        if let Some(column) = self
            .default_visible_columns
            .iter()
            .find(|column| !seen.contains(column))
        {
            return Err(TableConfigValidationError::UnknownDefaultColumn {
                column: column.clone(),
            });
        }
        if let Some(column) = self
            .always_visible
            .iter()
            .find(|column| !seen.contains(column))
        {
            return Err(TableConfigValidationError::UnknownAlwaysVisibleColumn {
                column: column.clone(),
            });
        }
        Ok(())
    }
}
