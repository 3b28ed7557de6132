//! Settings persistence bridge.
//!
//! Caches view options, table-column configs and form-field configs fetched
//! from the settings backend. Writes are optimistic: the cache changes first,
//! and a rejected write restores the previous value and reloads the
//! authoritative copy. An unauthorised response invalidates the session
//! instead of reloading.
//!
//! Concurrent writes to the same setting are not sequenced. Whichever response
//! resolves last decides the cached value.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::domain::columns::{ColumnVisibilityManager, TableConfig};
use crate::domain::ports::{
    EntityConfigPatch, EntityConfigs, EntitySettingDelete, EntitySettingPatch, PreferenceStore,
    SessionAuthority, SettingsTransport, SettingsTransportError, ViewOptions,
};
use crate::domain::{DomainError, EntityId, FieldSpec, decode_field_specs};

use super::state::{Reconciliation, SettingState};

/// Window within which a repeated bootstrap request is coalesced.
pub const DEFAULT_BOOTSTRAP_THROTTLE: Duration = Duration::from_millis(300);

/// Result of [`SettingsBridge::bootstrap_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Settings were fetched and these entities' catalogues published.
    Loaded {
        /// Entities registered with the column manager.
        entities: Vec<EntityId>,
    },
    /// Another bootstrap was already running; nothing was fetched.
    Coalesced,
}

type SettingKey = (EntityId, String);

#[derive(Debug, Default)]
struct BootstrapState {
    in_flight: bool,
    started_at: Option<DateTime<Utc>>,
    last_requested: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct BridgeState {
    view_options: ViewOptions,
    table_columns: EntityConfigs,
    form_fields: EntityConfigs,
    settings: HashMap<SettingKey, SettingState>,
    last_error: Option<DomainError>,
    bootstrap: BootstrapState,
}

impl BridgeState {
    fn view_option(&self, entity: &EntityId, key: &str) -> Option<Value> {
        self.view_options
            .get(entity)
            .and_then(|options| options.get(key))
            .cloned()
    }

    fn set_view_option(&mut self, entity: &EntityId, key: &str, value: Option<Value>) {
        match value {
            Some(value) => {
                self.view_options
                    .entry(entity.clone())
                    .or_default()
                    .insert(key.to_owned(), value);
            }
            None => {
                if let Some(options) = self.view_options.get_mut(entity) {
                    options.remove(key);
                }
            }
        }
    }
}

/// Entity config family targeted by a load or write.
#[derive(Debug, Clone, Copy)]
enum ConfigScope {
    TableColumns,
    FormFields,
}

impl ConfigScope {
    fn as_str(self) -> &'static str {
        match self {
            Self::TableColumns => "table-columns",
            Self::FormFields => "form-fields",
        }
    }

    fn cache(self, state: &mut BridgeState) -> &mut EntityConfigs {
        match self {
            Self::TableColumns => &mut state.table_columns,
            Self::FormFields => &mut state.form_fields,
        }
    }
}

/// Cached, optimistic view onto the admin settings backend.
pub struct SettingsBridge<T, A> {
    transport: Arc<T>,
    authority: Arc<A>,
    clock: Arc<dyn Clock>,
    throttle_window: TimeDelta,
    state: Mutex<BridgeState>,
}

impl<T, A> SettingsBridge<T, A> {
    /// Create a bridge with an empty cache and the default bootstrap window.
    #[must_use]
    pub fn new(transport: Arc<T>, authority: Arc<A>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            authority,
            clock,
            throttle_window: TimeDelta::from_std(DEFAULT_BOOTSTRAP_THROTTLE)
                .unwrap_or(TimeDelta::MAX),
            state: Mutex::new(BridgeState::default()),
        }
    }

    /// Override the bootstrap coalescing window.
    #[must_use]
    pub fn with_throttle_window(mut self, window: Duration) -> Self {
        self.throttle_window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        self
    }

    fn state(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn map_transport_error(error: SettingsTransportError) -> DomainError {
        match error {
            SettingsTransportError::Unauthorized => {
                DomainError::unauthorized("settings backend rejected the session")
            }
            SettingsTransportError::Status { status, message } => {
                let error = match status {
                    404 => {
                        DomainError::not_found(format!("settings resource not found: {message}"))
                    }
                    400..=499 => {
                        DomainError::invalid_request(format!("settings request rejected: {message}"))
                    }
                    _ => {
                        DomainError::service_unavailable(format!("settings backend error: {message}"))
                    }
                };
                error.with_details(json!({ "status": status }))
            }
            SettingsTransportError::Transport { message } => {
                DomainError::service_unavailable(format!("settings backend unreachable: {message}"))
            }
            SettingsTransportError::Decode { message } => {
                DomainError::internal(format!("settings response malformed: {message}"))
            }
        }
    }

    fn decode_table_config(entity: &EntityId, raw: Value) -> Option<TableConfig> {
        match serde_json::from_value::<TableConfig>(raw) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!(entity = %entity, error = %err, "ignoring malformed table config");
                None
            }
        }
    }

    /// Cached view option, including any optimistic value.
    #[must_use]
    pub fn view_option(&self, entity: &EntityId, key: &str) -> Option<Value> {
        self.state().view_option(entity, key)
    }

    /// Every cached view option for `entity`.
    #[must_use]
    pub fn view_options(&self, entity: &EntityId) -> BTreeMap<String, Value> {
        self.state()
            .view_options
            .get(entity)
            .cloned()
            .unwrap_or_default()
    }

    /// Cached table config for `entity`. Malformed payloads are logged and
    /// treated as absent.
    #[must_use]
    pub fn table_config(&self, entity: &EntityId) -> Option<TableConfig> {
        let raw = self.state().table_columns.get(entity).cloned()?;
        Self::decode_table_config(entity, raw)
    }

    /// Entities with a cached table config.
    #[must_use]
    pub fn table_entities(&self) -> Vec<EntityId> {
        self.state().table_columns.keys().cloned().collect()
    }

    /// Field specs from the cached form-field config for `entity`.
    ///
    /// See [`decode_field_specs`] for the accepted shapes. Entries that fail
    /// to decode hide their column rather than dropping its rules.
    #[must_use]
    pub fn form_field_specs(&self, entity: &EntityId) -> Vec<FieldSpec> {
        let Some(raw) = self.state().form_fields.get(entity).cloned() else {
            return Vec::new();
        };
        let fields = decode_field_specs(raw);
        debug!(entity = %entity, fields = fields.len(), "decoded form field specs");
        fields
    }

    /// Reconciliation state of one setting.
    ///
    /// Settings never written locally report `Clean(Loaded)` while cached.
    #[must_use]
    pub fn setting_state(&self, entity: &EntityId, key: &str) -> Option<SettingState> {
        let state = self.state();
        if let Some(setting) = state.settings.get(&(entity.clone(), key.to_owned())) {
            return Some(setting.clone());
        }
        state
            .view_option(entity, key)
            .map(|value| SettingState::Clean {
                value: Some(value),
                reconciliation: Reconciliation::Loaded,
            })
    }

    /// Most recent failure, cleared by the next successful load.
    #[must_use]
    pub fn last_error(&self) -> Option<DomainError> {
        self.state().last_error.clone()
    }

    /// When `bootstrap_load` was last called, coalesced or not.
    #[must_use]
    pub fn last_bootstrap_request(&self) -> Option<DateTime<Utc>> {
        self.state().bootstrap.last_requested
    }

    /// Start a bootstrap unless one is in flight within the window.
    fn try_begin_bootstrap(&self) -> bool {
        let now = self.clock.utc();
        let window = self.throttle_window;
        let mut state = self.state();
        let bootstrap = &mut state.bootstrap;
        bootstrap.last_requested = Some(now);
        let within_window = bootstrap
            .started_at
            .is_some_and(|started| now.signed_duration_since(started) < window);
        if bootstrap.in_flight && within_window {
            return false;
        }
        bootstrap.in_flight = true;
        bootstrap.started_at = Some(now);
        true
    }

    /// Register every cached table config with `manager` and hydrate the
    /// operator's override for each. Returns the entities published.
    pub async fn publish_table_configs<S>(
        &self,
        manager: &ColumnVisibilityManager<S>,
    ) -> Vec<EntityId>
    where
        S: PreferenceStore,
    {
        let configs: Vec<(EntityId, Value)> = self
            .state()
            .table_columns
            .iter()
            .map(|(entity, raw)| (entity.clone(), raw.clone()))
            .collect();
        let mut published = Vec::with_capacity(configs.len());
        for (entity, raw) in configs {
            let Some(config) = Self::decode_table_config(&entity, raw) else {
                continue;
            };
            if let Err(err) = manager.register_config(entity.clone(), config) {
                warn!(entity = %entity, error = %err, "skipping invalid table config");
                continue;
            }
            if let Err(err) = manager.hydrate(&entity).await {
                warn!(entity = %entity, error = %err, "failed to hydrate column preference");
                continue;
            }
            published.push(entity);
        }
        published
    }
}

impl<T, A> SettingsBridge<T, A>
where
    T: SettingsTransport,
    A: SessionAuthority,
{
    /// Role of the signed-in operator, from the auth collaborator.
    #[must_use]
    pub fn current_role(&self) -> Option<String> {
        self.authority.current_role()
    }

    fn record_failure(&self, error: SettingsTransportError) -> DomainError {
        if error.is_unauthorized() {
            warn!("settings backend returned 401, invalidating session");
            self.authority.invalidate_session();
        }
        let mapped = Self::map_transport_error(error);
        self.state().last_error = Some(mapped.clone());
        mapped
    }

    /// Replace the view-option cache with the backend's copy.
    ///
    /// # Errors
    ///
    /// The mapped transport failure; the cache is left untouched.
    pub async fn load_view_options(&self) -> Result<(), DomainError> {
        match self.transport.fetch_view_options().await {
            Ok(options) => {
                let mut state = self.state();
                state.settings.retain(|_, setting| setting.is_pending());
                state.view_options = options;
                state.last_error = None;
                debug!(entities = state.view_options.len(), "loaded view options");
                Ok(())
            }
            Err(err) => Err(self.record_failure(err)),
        }
    }

    async fn load_configs(&self, scope: ConfigScope) -> Result<(), DomainError> {
        let fetched = match scope {
            ConfigScope::TableColumns => self.transport.fetch_table_columns().await,
            ConfigScope::FormFields => self.transport.fetch_form_fields().await,
        };
        match fetched {
            Ok(configs) => {
                let mut state = self.state();
                let entities = configs.len();
                *scope.cache(&mut state) = configs;
                state.last_error = None;
                debug!(scope = scope.as_str(), entities, "loaded entity configs");
                Ok(())
            }
            Err(err) => Err(self.record_failure(err)),
        }
    }

    /// Replace the table-column cache with the backend's copy.
    pub async fn load_table_columns(&self) -> Result<(), DomainError> {
        self.load_configs(ConfigScope::TableColumns).await
    }

    /// Replace the form-field cache with the backend's copy.
    pub async fn load_form_fields(&self) -> Result<(), DomainError> {
        self.load_configs(ConfigScope::FormFields).await
    }

    /// Apply `optimistic` to the cache and mark the setting pending. Returns
    /// the value it replaced.
    fn begin_optimistic(
        &self,
        entity: &EntityId,
        key: &str,
        optimistic: Option<Value>,
    ) -> Option<Value> {
        let mut state = self.state();
        let previous = state.view_option(entity, key);
        state.set_view_option(entity, key, optimistic.clone());
        state.settings.insert(
            (entity.clone(), key.to_owned()),
            SettingState::Pending {
                optimistic,
                previous: previous.clone(),
            },
        );
        previous
    }

    async fn settle(
        &self,
        entity: &EntityId,
        key: &str,
        optimistic: Option<Value>,
        previous: Option<Value>,
        outcome: Result<(), SettingsTransportError>,
    ) -> Result<(), DomainError> {
        let setting_key = (entity.clone(), key.to_owned());
        let err = match outcome {
            Ok(()) => {
                info!(entity = %entity, key, "setting saved");
                self.state().settings.insert(
                    setting_key,
                    SettingState::Clean {
                        value: optimistic,
                        reconciliation: Reconciliation::Confirmed,
                    },
                );
                return Ok(());
            }
            Err(err) => err,
        };

        let unauthorized = err.is_unauthorized();
        let error = self.record_failure(err);
        self.state().set_view_option(entity, key, previous);
        if !unauthorized {
            if let Err(reload) = self.load_view_options().await {
                warn!(entity = %entity, key, error = %reload, "reload after failed save failed");
            }
        }

        let mut state = self.state();
        let value = state.view_option(entity, key);
        state.settings.insert(
            setting_key,
            SettingState::Clean {
                value,
                reconciliation: Reconciliation::Reverted,
            },
        );
        state.last_error = Some(error.clone());
        warn!(entity = %entity, key, error = %error, "setting update reverted");
        Err(error)
    }

    /// Optimistically set a view option and save it.
    ///
    /// # Errors
    ///
    /// The mapped transport failure. By then the cache holds the restored or
    /// reloaded value and the setting is `Clean(Reverted)`.
    pub async fn update_setting(
        &self,
        entity: &EntityId,
        key: &str,
        value: Value,
    ) -> Result<(), DomainError> {
        let previous = self.begin_optimistic(entity, key, Some(value.clone()));
        let patch = EntitySettingPatch {
            entity_name: entity.clone(),
            setting_key: key.to_owned(),
            setting_value: value.clone(),
        };
        let outcome = self.transport.patch_entity_setting(&patch).await;
        self.settle(entity, key, Some(value), previous, outcome).await
    }

    /// Optimistically remove a view option and delete it on the backend.
    pub async fn delete_setting(&self, entity: &EntityId, key: &str) -> Result<(), DomainError> {
        let previous = self.begin_optimistic(entity, key, None);
        let request = EntitySettingDelete {
            entity_name: entity.clone(),
            setting_key: key.to_owned(),
        };
        let outcome = self.transport.delete_entity_setting(&request).await;
        self.settle(entity, key, None, previous, outcome).await
    }

    async fn update_entity_config(
        &self,
        scope: ConfigScope,
        entity: &EntityId,
        config: Value,
    ) -> Result<(), DomainError> {
        let previous = {
            let mut state = self.state();
            scope.cache(&mut state).insert(entity.clone(), config.clone())
        };
        let patch = EntityConfigPatch {
            entity_name: entity.clone(),
            entity_config: config,
        };
        let outcome = match scope {
            ConfigScope::TableColumns => self.transport.patch_table_columns(&patch).await,
            ConfigScope::FormFields => self.transport.patch_form_fields(&patch).await,
        };
        let err = match outcome {
            Ok(()) => {
                info!(entity = %entity, scope = scope.as_str(), "entity config saved");
                return Ok(());
            }
            Err(err) => err,
        };

        let unauthorized = err.is_unauthorized();
        let error = self.record_failure(err);
        {
            let mut state = self.state();
            let cache = scope.cache(&mut state);
            match previous {
                Some(previous) => {
                    cache.insert(entity.clone(), previous);
                }
                None => {
                    cache.remove(entity);
                }
            }
        }
        if !unauthorized {
            if let Err(reload) = self.load_configs(scope).await {
                warn!(
                    entity = %entity,
                    scope = scope.as_str(),
                    error = %reload,
                    "reload after failed save failed"
                );
            }
        }
        self.state().last_error = Some(error.clone());
        warn!(
            entity = %entity,
            scope = scope.as_str(),
            error = %error,
            "entity config update reverted"
        );
        Err(error)
    }

    /// Optimistically replace an entity's table config and save it.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::InvalidRequest`](crate::domain::ErrorCode::InvalidRequest)
    /// without contacting the backend when the config fails validation,
    /// otherwise the mapped transport failure.
    pub async fn update_table_columns(
        &self,
        entity: &EntityId,
        config: &TableConfig,
    ) -> Result<(), DomainError> {
        config.validate().map_err(|err| {
            DomainError::invalid_request(format!("invalid table config for `{entity}`: {err}"))
        })?;
        let value = serde_json::to_value(config)
            .map_err(|err| DomainError::internal(format!("failed to encode table config: {err}")))?;
        self.update_entity_config(ConfigScope::TableColumns, entity, value)
            .await
    }

    /// Optimistically replace an entity's form-field config and save it.
    pub async fn update_form_fields(
        &self,
        entity: &EntityId,
        config: Value,
    ) -> Result<(), DomainError> {
        self.update_entity_config(ConfigScope::FormFields, entity, config)
            .await
    }

    /// Load every settings family, then publish table configs to `manager`.
    ///
    /// A call made while another bootstrap is in flight and inside the
    /// throttle window only records the request time and returns
    /// [`BootstrapOutcome::Coalesced`]. Loads run in order (table columns,
    /// form fields, view options); one failing does not stop the others.
    ///
    /// # Errors
    ///
    /// The first load failure, after every load has been attempted and the
    /// cached configs published.
    pub async fn bootstrap_load<S>(
        &self,
        manager: &ColumnVisibilityManager<S>,
    ) -> Result<BootstrapOutcome, DomainError>
    where
        S: PreferenceStore,
    {
        if !self.try_begin_bootstrap() {
            debug!("bootstrap already in flight, coalescing");
            return Ok(BootstrapOutcome::Coalesced);
        }

        let loads = [
            self.load_configs(ConfigScope::TableColumns).await,
            self.load_configs(ConfigScope::FormFields).await,
            self.load_view_options().await,
        ];
        let entities = self.publish_table_configs(manager).await;
        self.state().bootstrap.in_flight = false;

        if let Some(error) = loads.into_iter().find_map(Result::err) {
            self.state().last_error = Some(error.clone());
            return Err(error);
        }
        info!(entities = entities.len(), "settings bootstrap complete");
        Ok(BootstrapOutcome::Loaded { entities })
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
