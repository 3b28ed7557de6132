//! Stateful column visibility manager.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::domain::ports::{PreferenceStore, column_visibility_key};
use crate::domain::{ColumnId, EntityId};

use super::reducer::{
    default_columns, normalize_columns, reorder_columns, sanitize_override, toggle_column,
};
use super::table_config::{ColumnSettings, TableConfig};
use super::{ColumnVisibilityError, UserColumnPreference};

#[derive(Debug, Clone)]
struct EntityColumns {
    config: TableConfig,
    visible: Vec<ColumnId>,
}

/// Holds each entity's catalogue and the operator's visible column list.
///
/// Every mutation is applied in memory first and then written to the
/// preference store. Store failures are logged; the in-memory list stands.
pub struct ColumnVisibilityManager<S> {
    store: Arc<S>,
    entities: Mutex<HashMap<EntityId, EntityColumns>>,
}

impl<S> ColumnVisibilityManager<S> {
    /// Create a manager with no catalogues registered.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            entities: Mutex::new(HashMap::new()),
        }
    }

    fn entities(&self) -> MutexGuard<'_, HashMap<EntityId, EntityColumns>> {
        self.entities.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_entity<T>(
        &self,
        entity: &EntityId,
        read: impl FnOnce(&EntityColumns) -> T,
    ) -> Result<T, ColumnVisibilityError> {
        self.entities()
            .get(entity)
            .map(read)
            .ok_or_else(|| ColumnVisibilityError::UnknownEntity {
                entity: entity.clone(),
            })
    }

    /// Apply `update` to the entity's list, returning the previous and next
    /// lists. The lock is released before returning.
    fn update_visible<E>(
        &self,
        entity: &EntityId,
        update: impl FnOnce(&EntityColumns) -> Result<Vec<ColumnId>, E>,
    ) -> Result<(Vec<ColumnId>, Vec<ColumnId>), ColumnVisibilityError>
    where
        E: Into<ColumnVisibilityError>,
    {
        let mut entities = self.entities();
        let state = entities
            .get_mut(entity)
            .ok_or_else(|| ColumnVisibilityError::UnknownEntity {
                entity: entity.clone(),
            })?;
        let next = update(state).map_err(Into::into)?;
        let previous = std::mem::replace(&mut state.visible, next.clone());
        Ok((previous, next))
    }

    /// Install or refresh the catalogue for `entity`.
    ///
    /// An existing visible list is re-normalised against the new catalogue;
    /// a new entity starts from the defaults.
    ///
    /// # Errors
    ///
    /// [`ColumnVisibilityError::InvalidConfig`] when the catalogue fails
    /// validation. The previous catalogue, if any, is kept.
    pub fn register_config(
        &self,
        entity: EntityId,
        config: TableConfig,
    ) -> Result<(), ColumnVisibilityError> {
        config
            .validate()
            .map_err(|source| ColumnVisibilityError::InvalidConfig {
                entity: entity.clone(),
                source,
            })?;
        let mut entities = self.entities();
        let visible = match entities.get(&entity) {
            Some(existing) => normalize_columns(&config, existing.visible.iter().cloned()),
            None => default_columns(&config),
        };
        debug!(entity = %entity, columns = visible.len(), "registered table config");
        entities.insert(entity, EntityColumns { config, visible });
        Ok(())
    }

    /// Entities with a registered catalogue.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Current visible list for `entity`.
    pub fn visible_columns(&self, entity: &EntityId) -> Result<Vec<ColumnId>, ColumnVisibilityError> {
        self.with_entity(entity, |state| state.visible.clone())
    }

    /// Registered catalogue for `entity`.
    pub fn table_config(&self, entity: &EntityId) -> Result<TableConfig, ColumnVisibilityError> {
        self.with_entity(entity, |state| state.config.clone())
    }

    /// Whether `column` of `entity` can be sorted.
    pub fn is_sortable(
        &self,
        entity: &EntityId,
        column: &ColumnId,
    ) -> Result<bool, ColumnVisibilityError> {
        self.with_entity(entity, |state| state.config.is_sortable(column))
    }

    /// Whether `column` of `entity` can be filtered.
    pub fn is_filterable(
        &self,
        entity: &EntityId,
        column: &ColumnId,
    ) -> Result<bool, ColumnVisibilityError> {
        self.with_entity(entity, |state| state.config.is_filterable(column))
    }

    /// Presentation settings for `column` of `entity`, if any.
    pub fn column_settings(
        &self,
        entity: &EntityId,
        column: &ColumnId,
    ) -> Result<Option<ColumnSettings>, ColumnVisibilityError> {
        self.with_entity(entity, |state| state.config.column_settings(column).cloned())
    }
}

impl<S> ColumnVisibilityManager<S>
where
    S: PreferenceStore,
{
    async fn persist(&self, entity: &EntityId, visible: Vec<ColumnId>) {
        let preference = UserColumnPreference {
            entity: entity.clone(),
            visible_columns: visible,
        };
        let encoded = match preference.to_stored_json() {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(entity = %entity, error = %err, "failed to encode column preference");
                return;
            }
        };
        if let Err(err) = self.store.write(&preference.storage_key(), &encoded).await {
            warn!(entity = %entity, error = %err, "failed to persist column preference");
        }
    }

    async fn read_override(&self, entity: &EntityId) -> Option<Vec<String>> {
        let raw = match self.store.read(&column_visibility_key(entity)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(entity = %entity, error = %err, "failed to read column preference");
                return None;
            }
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(stored) => Some(stored),
            Err(err) => {
                warn!(entity = %entity, error = %err, "ignoring corrupt column preference");
                None
            }
        }
    }

    /// Load the operator's persisted list for `entity`.
    ///
    /// Unknown ids are dropped and missing always-visible columns restored. A
    /// missing, unreadable or corrupt override yields the defaults.
    pub async fn hydrate(&self, entity: &EntityId) -> Result<Vec<ColumnId>, ColumnVisibilityError> {
        // Fail fast before touching the store.
        self.with_entity(entity, |_| ())?;
        let stored = self.read_override(entity).await;
        let (_, next) = self.update_visible(entity, |state| {
            Ok::<_, ColumnVisibilityError>(match stored {
                Some(stored) => sanitize_override(&state.config, stored),
                None => default_columns(&state.config),
            })
        })?;
        debug!(entity = %entity, columns = next.len(), "hydrated column preference");
        Ok(next)
    }

    /// Show `column` if hidden, hide it if visible.
    ///
    /// Always-visible and unknown columns are left alone and nothing is
    /// written.
    pub async fn toggle_column(
        &self,
        entity: &EntityId,
        column: &ColumnId,
    ) -> Result<Vec<ColumnId>, ColumnVisibilityError> {
        let (previous, next) = self.update_visible(entity, |state| {
            Ok::<_, ColumnVisibilityError>(toggle_column(&state.config, &state.visible, column))
        })?;
        if previous != next {
            info!(entity = %entity, column = %column, "toggled column");
            self.persist(entity, next.clone()).await;
        }
        Ok(next)
    }

    /// Move the visible column at `from` to `to`.
    pub async fn reorder_columns(
        &self,
        entity: &EntityId,
        from: usize,
        to: usize,
    ) -> Result<Vec<ColumnId>, ColumnVisibilityError> {
        let (_, next) =
            self.update_visible(entity, |state| reorder_columns(&state.visible, from, to))?;
        info!(entity = %entity, from, to, "reordered columns");
        self.persist(entity, next.clone()).await;
        Ok(next)
    }

    /// Restore the catalogue defaults and drop the persisted override.
    pub async fn reset_to_default(
        &self,
        entity: &EntityId,
    ) -> Result<Vec<ColumnId>, ColumnVisibilityError> {
        let (_, next) = self.update_visible(entity, |state| {
            Ok::<_, ColumnVisibilityError>(default_columns(&state.config))
        })?;
        info!(entity = %entity, "reset columns to default");
        if let Err(err) = self.store.remove(&column_visibility_key(entity)).await {
            warn!(entity = %entity, error = %err, "failed to clear column preference");
        }
        Ok(next)
    }
}
