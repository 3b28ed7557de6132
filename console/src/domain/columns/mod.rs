//! Column visibility: the per-entity catalogue, the pure list transitions and
//! the stateful manager that persists each operator's override.

mod reducer;
mod service;
mod table_config;

use serde::{Deserialize, Serialize};

use crate::domain::ports::column_visibility_key;
use crate::domain::{ColumnId, DomainError, EntityId};

pub use reducer::{
    default_columns, normalize_columns, reorder_columns, sanitize_override, toggle_column,
};
pub use service::ColumnVisibilityManager;
pub use table_config::{
    ColumnSettings, ComputedColumn, FilterableColumns, TableConfig, TableConfigValidationError,
};

/// Errors raised by column visibility operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnVisibilityError {
    /// No catalogue has been registered for the entity.
    #[error("no table config registered for entity `{entity}`")]
    UnknownEntity {
        /// The unregistered entity.
        entity: EntityId,
    },
    /// A reorder index lies outside the visible list.
    #[error("column index out of bounds: from {from}, to {to}, visible {len}")]
    InvalidIndex {
        /// Source index.
        from: usize,
        /// Destination index.
        to: usize,
        /// Length of the visible list.
        len: usize,
    },
    /// The catalogue failed validation.
    #[error("invalid table config for entity `{entity}`: {source}")]
    InvalidConfig {
        /// Entity the catalogue was registered for.
        entity: EntityId,
        /// The validation failure.
        #[source]
        source: TableConfigValidationError,
    },
}

impl From<ColumnVisibilityError> for DomainError {
    fn from(err: ColumnVisibilityError) -> Self {
        match err {
            ColumnVisibilityError::UnknownEntity { .. } => Self::not_found(err.to_string()),
            ColumnVisibilityError::InvalidIndex { .. }
            | ColumnVisibilityError::InvalidConfig { .. } => Self::invalid_request(err.to_string()),
        }
    }
}

/// An operator's persisted column list for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserColumnPreference {
    /// Entity the list belongs to.
    pub entity: EntityId,
    /// Visible columns in display order.
    pub visible_columns: Vec<ColumnId>,
}

impl UserColumnPreference {
    /// Preference-store key for this entity.
    #[must_use]
    pub fn storage_key(&self) -> String {
        column_visibility_key(&self.entity)
    }

    /// The stored form: a bare JSON array of column ids.
    pub fn to_stored_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.visible_columns)
    }
}

#[cfg(test)]
mod tests;
