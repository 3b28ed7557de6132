//! Shared test doubles for unit and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use serde_json::Value;
use tokio::sync::Notify;

use crate::domain::EntityId;
use crate::domain::ports::{
    EntityConfigPatch, EntityConfigs, EntitySettingDelete, EntitySettingPatch, SessionAuthority,
    SettingsTransport, SettingsTransportError, ViewOptions,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex poisoned"),
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Clock frozen at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *lock(&self.0, "clock") += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0, "clock")
    }
}

/// Session authority that records invalidations.
#[derive(Default)]
pub struct RecordingSessionAuthority {
    role: Mutex<Option<String>>,
    invalidations: AtomicUsize,
}

impl RecordingSessionAuthority {
    /// Authority with a signed-in operator.
    #[must_use]
    pub fn with_role(role: impl Into<String>) -> Self {
        Self {
            role: Mutex::new(Some(role.into())),
            invalidations: AtomicUsize::new(0),
        }
    }

    /// Number of `invalidate_session` calls.
    #[must_use]
    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl SessionAuthority for RecordingSessionAuthority {
    fn current_role(&self) -> Option<String> {
        lock(&self.role, "role").clone()
    }

    fn invalidate_session(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        *lock(&self.role, "role") = None;
    }
}

#[derive(Default)]
struct StubState {
    view_options: ViewOptions,
    table_columns: EntityConfigs,
    form_fields: EntityConfigs,
    mutation_failure: Option<SettingsTransportError>,
    setting_patches: Vec<EntitySettingPatch>,
    setting_deletes: Vec<EntitySettingDelete>,
    config_patches: Vec<EntityConfigPatch>,
}

/// In-process settings backend.
///
/// Successful mutations update the stored settings so a later fetch sees
/// them. `fail_mutations_with` makes every mutation fail without touching the
/// stored settings. `with_gate` holds table-column fetches until the gate is
/// notified.
#[derive(Default)]
pub struct StubSettingsTransport {
    state: Mutex<StubState>,
    gate: Option<Arc<Notify>>,
    view_option_fetches: AtomicUsize,
    table_column_fetches: AtomicUsize,
    form_field_fetches: AtomicUsize,
}

impl StubSettingsTransport {
    /// Backend with no stored settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a view option.
    #[must_use]
    pub fn with_view_option(self, entity: &EntityId, key: &str, value: Value) -> Self {
        lock(&self.state, "stub")
            .view_options
            .entry(entity.clone())
            .or_default()
            .insert(key.to_owned(), value);
        self
    }

    /// Seed an entity's table config.
    #[must_use]
    pub fn with_table_columns(self, entity: &EntityId, config: Value) -> Self {
        lock(&self.state, "stub")
            .table_columns
            .insert(entity.clone(), config);
        self
    }

    /// Seed an entity's form field config.
    #[must_use]
    pub fn with_form_fields(self, entity: &EntityId, config: Value) -> Self {
        lock(&self.state, "stub")
            .form_fields
            .insert(entity.clone(), config);
        self
    }

    /// Hold table-column fetches until `gate` is notified.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Fail every later mutation with `error`.
    pub fn fail_mutations_with(&self, error: SettingsTransportError) {
        lock(&self.state, "stub").mutation_failure = Some(error);
    }

    /// Change a stored view option behind the client's back.
    pub fn set_remote_view_option(&self, entity: &EntityId, key: &str, value: Value) {
        lock(&self.state, "stub")
            .view_options
            .entry(entity.clone())
            .or_default()
            .insert(key.to_owned(), value);
    }

    /// Number of view option fetches.
    #[must_use]
    pub fn view_option_fetches(&self) -> usize {
        self.view_option_fetches.load(Ordering::SeqCst)
    }

    /// Number of table-column fetches.
    #[must_use]
    pub fn table_column_fetches(&self) -> usize {
        self.table_column_fetches.load(Ordering::SeqCst)
    }

    /// Number of form-field fetches.
    #[must_use]
    pub fn form_field_fetches(&self) -> usize {
        self.form_field_fetches.load(Ordering::SeqCst)
    }

    /// Setting PATCH bodies received, failed ones included.
    #[must_use]
    pub fn setting_patches(&self) -> Vec<EntitySettingPatch> {
        lock(&self.state, "stub").setting_patches.clone()
    }

    /// Setting DELETE bodies received, failed ones included.
    #[must_use]
    pub fn setting_deletes(&self) -> Vec<EntitySettingDelete> {
        lock(&self.state, "stub").setting_deletes.clone()
    }

    /// Config PATCH bodies received, failed ones included.
    #[must_use]
    pub fn config_patches(&self) -> Vec<EntityConfigPatch> {
        lock(&self.state, "stub").config_patches.clone()
    }

    fn mutation_failure(&self) -> Result<(), SettingsTransportError> {
        match lock(&self.state, "stub").mutation_failure.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SettingsTransport for StubSettingsTransport {
    async fn fetch_view_options(&self) -> Result<ViewOptions, SettingsTransportError> {
        self.view_option_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.state, "stub").view_options.clone())
    }

    async fn patch_entity_setting(
        &self,
        patch: &EntitySettingPatch,
    ) -> Result<(), SettingsTransportError> {
        lock(&self.state, "stub").setting_patches.push(patch.clone());
        self.mutation_failure()?;
        self.set_remote_view_option(
            &patch.entity_name,
            &patch.setting_key,
            patch.setting_value.clone(),
        );
        Ok(())
    }

    async fn delete_entity_setting(
        &self,
        request: &EntitySettingDelete,
    ) -> Result<(), SettingsTransportError> {
        lock(&self.state, "stub").setting_deletes.push(request.clone());
        self.mutation_failure()?;
        if let Some(options) = lock(&self.state, "stub")
            .view_options
            .get_mut(&request.entity_name)
        {
            options.remove(&request.setting_key);
        }
        Ok(())
    }

    async fn fetch_form_fields(&self) -> Result<EntityConfigs, SettingsTransportError> {
        self.form_field_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.state, "stub").form_fields.clone())
    }

    async fn patch_form_fields(
        &self,
        patch: &EntityConfigPatch,
    ) -> Result<(), SettingsTransportError> {
        lock(&self.state, "stub").config_patches.push(patch.clone());
        self.mutation_failure()?;
        lock(&self.state, "stub")
            .form_fields
            .insert(patch.entity_name.clone(), patch.entity_config.clone());
        Ok(())
    }

    async fn fetch_table_columns(&self) -> Result<EntityConfigs, SettingsTransportError> {
        self.table_column_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(lock(&self.state, "stub").table_columns.clone())
    }

    async fn patch_table_columns(
        &self,
        patch: &EntityConfigPatch,
    ) -> Result<(), SettingsTransportError> {
        lock(&self.state, "stub").config_patches.push(patch.clone());
        self.mutation_failure()?;
        lock(&self.state, "stub")
            .table_columns
            .insert(patch.entity_name.clone(), patch.entity_config.clone());
        Ok(())
    }
}
