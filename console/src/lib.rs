//! Admin console view engine.
//!
//! Turns layered table configuration (site defaults, per-operator overrides,
//! backend settings, conditional rules, role permissions and computed values)
//! into one ordered, filtered view specification per entity and record.

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::ConsoleSettings;
