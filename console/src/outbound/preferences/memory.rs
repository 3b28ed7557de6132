//! Process-local preference store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{PreferenceStore, PreferenceStoreError};

/// Preference store backed by a `HashMap`.
///
/// Entries live as long as the store. Useful for embedding hosts that manage
/// persistence themselves and for tests.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryPreferenceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry.
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        self
    }

    /// Current raw value under `key`.
    #[must_use]
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn read(&self, key: &str) -> Result<Option<String>, PreferenceStoreError> {
        Ok(self.snapshot(key))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PreferenceStoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PreferenceStoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_returns_latest_value() {
        let store = InMemoryPreferenceStore::new().with_entry("k", "[\"a\"]");
        store.write("k", "[\"b\"]").await.expect("write succeeds");

        let value = store.read("k").await.expect("read succeeds");
        assert_eq!(value.as_deref(), Some("[\"b\"]"));
    }

    #[tokio::test]
    async fn removing_missing_key_succeeds() {
        let store = InMemoryPreferenceStore::new();
        store.remove("absent").await.expect("remove succeeds");
        assert!(store.snapshot("absent").is_none());
    }
}
