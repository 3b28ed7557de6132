//! Reconciliation state of a single view-option setting.

use serde::Serialize;
use serde_json::Value;

/// How a clean value came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reconciliation {
    /// Read from the backend.
    Loaded,
    /// Written locally and acknowledged by the backend.
    Confirmed,
    /// A local write was rejected and the backend value restored.
    Reverted,
}

/// Lifecycle of one `(entity, key)` setting.
///
/// `Clean(Loaded)` moves to `Pending` on a local write, which settles as
/// `Clean(Confirmed)` or `Clean(Reverted)`. `None` values mean the setting is
/// absent (for example after a delete).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SettingState {
    /// The cache agrees with the backend as far as the bridge knows.
    Clean {
        /// Cached value, `None` when the setting is absent.
        value: Option<Value>,
        /// How the value was reached.
        reconciliation: Reconciliation,
    },
    /// A local write awaits the backend's answer.
    Pending {
        /// Value shown while the write is in flight.
        optimistic: Option<Value>,
        /// Value to restore if the write fails.
        previous: Option<Value>,
    },
}

impl SettingState {
    /// Value the UI should show right now.
    #[must_use]
    pub fn current(&self) -> Option<&Value> {
        match self {
            Self::Clean { value, .. } => value.as_ref(),
            Self::Pending { optimistic, .. } => optimistic.as_ref(),
        }
    }

    /// Whether a local write is still in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// The reconciliation outcome, if settled.
    #[must_use]
    pub fn reconciliation(&self) -> Option<Reconciliation> {
        match self {
            Self::Clean { reconciliation, .. } => Some(*reconciliation),
            Self::Pending { .. } => None,
        }
    }
}
