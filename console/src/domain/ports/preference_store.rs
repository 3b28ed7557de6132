//! Port for the per-operator preference store.
//!
//! The store is an opaque key to JSON-text map. The column visibility manager
//! keeps one entry per entity under [`column_visibility_key`]; the adapter
//! decides where the bytes live (memory, a directory, browser storage).

use async_trait::async_trait;

use crate::domain::EntityId;

use super::define_port_error;

/// Prefix of the key under which an entity's visible column list is stored.
pub const COLUMN_VISIBILITY_KEY_PREFIX: &str = "column-visibility-";

/// Store key for an entity's persisted visible column list.
///
/// # Examples
///
/// ```
/// # use admin_console::domain::EntityId;
/// # use admin_console::domain::ports::column_visibility_key;
/// let entity = EntityId::new("tenants").expect("valid entity id");
/// assert_eq!(column_visibility_key(&entity), "column-visibility-tenants");
/// ```
#[must_use]
pub fn column_visibility_key(entity: &EntityId) -> String {
    format!("{COLUMN_VISIBILITY_KEY_PREFIX}{entity}")
}

define_port_error! {
    /// Errors raised by preference store adapters.
    pub enum PreferenceStoreError {
        /// The backing store cannot be reached.
        Unavailable { message: String } =>
            "preference store unavailable: {message}",
        /// Reading or writing an entry failed.
        Io { key: String, message: String } =>
            "preference store I/O failed for {key}: {message}",
    }
}

/// Opaque key to JSON-text persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Read the raw JSON text stored under `key`, if any.
    async fn read(&self, key: &str) -> Result<Option<String>, PreferenceStoreError>;

    /// Replace the entry under `key`.
    async fn write(&self, key: &str, value: &str) -> Result<(), PreferenceStoreError>;

    /// Remove the entry under `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), PreferenceStoreError>;
}

/// Fixture store that never holds anything and accepts every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePreferenceStore;

#[async_trait]
impl PreferenceStore for FixturePreferenceStore {
    async fn read(&self, _key: &str) -> Result<Option<String>, PreferenceStoreError> {
        Ok(None)
    }

    async fn write(&self, _key: &str, _value: &str) -> Result<(), PreferenceStoreError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<(), PreferenceStoreError> {
        Ok(())
    }
}
