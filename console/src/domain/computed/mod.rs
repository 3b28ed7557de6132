//! Computed field engine.
//!
//! Derived values are produced by plain functions registered under a compute
//! type tag. The registry is open: callers may add their own entries next to
//! the built-ins. Looking up an unregistered tag is an explicit
//! [`ComputeError::UnknownComputeType`]; the view resolver decides how to
//! degrade.

mod builtins;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::record::Record;

pub use builtins::{
    REVENUE_SHARE, REVENUE_TREND, TENANT_HEALTH_SCORE, USER_RISK_SCORE, revenue_share,
    revenue_trend, tenant_health_score, user_risk_score,
};

/// Signature of a compute function: the record plus every record on the page.
pub type ComputeFn = fn(&Record, &[Record]) -> Value;

/// Errors raised by the computed field engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComputeError {
    /// No function is registered for the tag.
    #[error("unknown compute type: {compute_type}")]
    UnknownComputeType {
        /// The unregistered tag.
        compute_type: String,
    },
}

/// Direction bucket for a percentage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trend {
    /// More than 10% up.
    UpStrong,
    /// Up by at most 10%.
    Up,
    /// No change.
    Stable,
    /// Down by at most 10%.
    Down,
    /// More than 10% down.
    DownStrong,
    /// No usable baseline.
    Unknown,
}

impl Trend {
    /// Bucket a percentage change.
    ///
    /// # Examples
    ///
    /// ```
    /// # use admin_console::domain::Trend;
    /// assert_eq!(Trend::classify(12.5), Trend::UpStrong);
    /// assert_eq!(Trend::classify(-3.0), Trend::Down);
    /// assert_eq!(Trend::classify(0.0), Trend::Stable);
    /// ```
    #[must_use]
    pub fn classify(change_pct: f64) -> Self {
        if change_pct.is_nan() {
            Self::Unknown
        } else if change_pct > 10.0 {
            Self::UpStrong
        } else if change_pct > 0.0 {
            Self::Up
        } else if change_pct < -10.0 {
            Self::DownStrong
        } else if change_pct < 0.0 {
            Self::Down
        } else {
            Self::Stable
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpStrong => "up-strong",
            Self::Up => "up",
            Self::Stable => "stable",
            Self::Down => "down",
            Self::DownStrong => "down-strong",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of compute functions keyed by compute type.
///
/// # Examples
///
/// ```
/// # use admin_console::domain::{ComputedFieldEngine, Record};
/// # use serde_json::json;
/// let engine = ComputedFieldEngine::with_builtins();
/// let tenant = Record::new()
///     .with("userCount", 5)
///     .with("subscriptionStatus", "active")
///     .with("onboardingCompleted", true)
///     .with("daysSinceLastActivity", 3);
/// let score = engine
///     .compute("tenant-health-score", &tenant, &[])
///     .expect("built-in compute type");
/// assert_eq!(score, json!(100));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComputedFieldEngine {
    registry: HashMap<String, ComputeFn>,
}

impl ComputedFieldEngine {
    /// Create an engine with nothing registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the built-in compute types registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut engine = Self::new();
        engine
            .register(TENANT_HEALTH_SCORE, tenant_health_score)
            .register(USER_RISK_SCORE, user_risk_score)
            .register(REVENUE_TREND, revenue_trend)
            .register(REVENUE_SHARE, revenue_share);
        engine
    }

    /// Register `compute` under `compute_type`, replacing any previous entry.
    pub fn register(&mut self, compute_type: impl Into<String>, compute: ComputeFn) -> &mut Self {
        let compute_type = compute_type.into();
        if self.registry.insert(compute_type.clone(), compute).is_some() {
            debug!(compute_type = %compute_type, "replaced compute function");
        }
        self
    }

    /// Whether a function is registered for `compute_type`.
    #[must_use]
    pub fn supports(&self, compute_type: &str) -> bool {
        self.registry.contains_key(compute_type)
    }

    /// Run the function registered for `compute_type`.
    pub fn compute(
        &self,
        compute_type: &str,
        record: &Record,
        all_records: &[Record],
    ) -> Result<Value, ComputeError> {
        let compute =
            self.registry
                .get(compute_type)
                .ok_or_else(|| ComputeError::UnknownComputeType {
                    compute_type: compute_type.to_owned(),
                })?;
        Ok(compute(record, all_records))
    }
}

#[cfg(test)]
mod tests;
