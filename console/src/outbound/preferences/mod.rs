//! Preference store adapters.

mod directory;
mod memory;

pub use directory::DirectoryPreferenceStore;
pub use memory::InMemoryPreferenceStore;
