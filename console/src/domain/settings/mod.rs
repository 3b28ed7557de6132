//! Settings persistence bridge: cached backend settings with optimistic
//! writes and a throttled bootstrap.

mod bridge;
mod state;

pub use bridge::{BootstrapOutcome, DEFAULT_BOOTSTRAP_THROTTLE, SettingsBridge};
pub use state::{Reconciliation, SettingState};
