//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **preferences**: per-operator preference stores (in-memory and a
//!   capability-scoped directory)
//! - **settings_http**: reqwest-backed client for the admin settings API
//!
//! Adapters are thin translators between domain types and the storage or wire
//! representation. They contain no business logic.

pub mod preferences;
pub mod settings_http;
