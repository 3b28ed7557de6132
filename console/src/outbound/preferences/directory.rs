//! Preference store that keeps one JSON file per key inside a directory.
//!
//! All access goes through a `cap_std` directory handle, so a key can never
//! name a file outside that directory.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};

use crate::domain::ports::{PreferenceStore, PreferenceStoreError};

const FILE_EXTENSION: &str = "json";

/// File-backed preference store rooted at one directory.
#[derive(Debug)]
pub struct DirectoryPreferenceStore {
    dir: Dir,
}

impl DirectoryPreferenceStore {
    /// Wrap an already opened directory handle.
    #[must_use]
    pub fn new(dir: Dir) -> Self {
        Self { dir }
    }

    /// Create `path` if needed and open it with ambient authority.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceStoreError::Unavailable`] when the directory cannot
    /// be created or opened.
    pub fn open_ambient(path: impl AsRef<Path>) -> Result<Self, PreferenceStoreError> {
        let path = path.as_ref();
        let unavailable = |error: io::Error| {
            PreferenceStoreError::unavailable(format!("{}: {error}", path.display()))
        };
        Dir::create_ambient_dir_all(path, ambient_authority()).map_err(unavailable)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(unavailable)?;
        Ok(Self::new(dir))
    }
}

fn file_name(key: &str) -> Result<String, PreferenceStoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(format!("{key}.{FILE_EXTENSION}"))
    } else {
        Err(PreferenceStoreError::io(key, "key is not a valid file name"))
    }
}

#[async_trait]
impl PreferenceStore for DirectoryPreferenceStore {
    async fn read(&self, key: &str) -> Result<Option<String>, PreferenceStoreError> {
        let name = file_name(key)?;
        match self.dir.read_to_string(&name) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(PreferenceStoreError::io(key, error.to_string())),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PreferenceStoreError> {
        let name = file_name(key)?;
        self.dir
            .write(&name, value.as_bytes())
            .map_err(|error| PreferenceStoreError::io(key, error.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), PreferenceStoreError> {
        let name = file_name(key)?;
        match self.dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(PreferenceStoreError::io(key, error.to_string())),
        }
    }
}
