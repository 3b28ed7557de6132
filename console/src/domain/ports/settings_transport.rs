//! Port for the remote admin settings store.
//!
//! Mirrors the `/admin/api/settings` endpoints. Payloads stay close to the
//! wire: per-entity configs travel as raw JSON and are validated by the
//! settings bridge, so one malformed entity does not poison the whole load.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::EntityId;

use super::define_port_error;

/// View options keyed by entity, then by setting key.
pub type ViewOptions = BTreeMap<EntityId, BTreeMap<String, Value>>;

/// Raw per-entity configuration documents (table columns or form fields).
pub type EntityConfigs = BTreeMap<EntityId, Value>;

/// Body of `PATCH /admin/api/settings/entity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySettingPatch {
    /// Entity the setting belongs to.
    pub entity_name: EntityId,
    /// View-option key.
    pub setting_key: String,
    /// New value.
    pub setting_value: Value,
}

/// Body of `DELETE /admin/api/settings/entity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySettingDelete {
    /// Entity the setting belongs to.
    pub entity_name: EntityId,
    /// View-option key to remove.
    pub setting_key: String,
}

/// Body of the `.../form-fields/entity` and `.../table-columns/entity` PATCH
/// endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityConfigPatch {
    /// Entity the document belongs to.
    pub entity_name: EntityId,
    /// Replacement configuration document.
    pub entity_config: Value,
}

define_port_error! {
    /// Errors raised by settings transport adapters.
    pub enum SettingsTransportError {
        /// The backend rejected the session (`401`).
        Unauthorized => "settings request was not authorised",
        /// Any other non-success status.
        Status { status: u16, message: String } =>
            "settings request failed with status {status}: {message}",
        /// The request never produced a response.
        Transport { message: String } =>
            "settings transport failed: {message}",
        /// The response body did not match the expected shape.
        Decode { message: String } =>
            "settings response could not be decoded: {message}",
    }
}

/// Remote persistence for view options, form fields and table columns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsTransport: Send + Sync {
    /// `GET /admin/api/settings`.
    async fn fetch_view_options(&self) -> Result<ViewOptions, SettingsTransportError>;

    /// `PATCH /admin/api/settings/entity`.
    async fn patch_entity_setting(
        &self,
        patch: &EntitySettingPatch,
    ) -> Result<(), SettingsTransportError>;

    /// `DELETE /admin/api/settings/entity`.
    async fn delete_entity_setting(
        &self,
        request: &EntitySettingDelete,
    ) -> Result<(), SettingsTransportError>;

    /// `GET /admin/api/settings/form-fields`.
    async fn fetch_form_fields(&self) -> Result<EntityConfigs, SettingsTransportError>;

    /// `PATCH /admin/api/settings/form-fields/entity`.
    async fn patch_form_fields(
        &self,
        patch: &EntityConfigPatch,
    ) -> Result<(), SettingsTransportError>;

    /// `GET /admin/api/settings/table-columns`.
    async fn fetch_table_columns(&self) -> Result<EntityConfigs, SettingsTransportError>;

    /// `PATCH /admin/api/settings/table-columns/entity`.
    async fn patch_table_columns(
        &self,
        patch: &EntityConfigPatch,
    ) -> Result<(), SettingsTransportError>;
}

/// Fixture transport: empty settings, every mutation accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSettingsTransport;

#[async_trait]
impl SettingsTransport for FixtureSettingsTransport {
    async fn fetch_view_options(&self) -> Result<ViewOptions, SettingsTransportError> {
        Ok(ViewOptions::new())
    }

    async fn patch_entity_setting(
        &self,
        _patch: &EntitySettingPatch,
    ) -> Result<(), SettingsTransportError> {
        Ok(())
    }

    async fn delete_entity_setting(
        &self,
        _request: &EntitySettingDelete,
    ) -> Result<(), SettingsTransportError> {
        Ok(())
    }

    async fn fetch_form_fields(&self) -> Result<EntityConfigs, SettingsTransportError> {
        Ok(EntityConfigs::new())
    }

    async fn patch_form_fields(
        &self,
        _patch: &EntityConfigPatch,
    ) -> Result<(), SettingsTransportError> {
        Ok(())
    }

    async fn fetch_table_columns(&self) -> Result<EntityConfigs, SettingsTransportError> {
        Ok(EntityConfigs::new())
    }

    async fn patch_table_columns(
        &self,
        _patch: &EntityConfigPatch,
    ) -> Result<(), SettingsTransportError> {
        Ok(())
    }
}
