//! Built-in compute functions.
//!
//! Missing or mistyped inputs contribute nothing rather than failing, so a
//! partially populated record still yields a score.

use serde_json::{Value, json};

use super::Trend;
use crate::domain::record::Record;

/// Tag for [`tenant_health_score`].
pub const TENANT_HEALTH_SCORE: &str = "tenant-health-score";
/// Tag for [`user_risk_score`].
pub const USER_RISK_SCORE: &str = "user-risk-score";
/// Tag for [`revenue_trend`].
pub const REVENUE_TREND: &str = "revenue-trend";
/// Tag for [`revenue_share`].
pub const REVENUE_SHARE: &str = "revenue-share";

const FAILED_LOGIN_CAP: i64 = 50;
const NEW_ACCOUNT_DAYS: f64 = 30.0;

/// Tenant health on a 0–100 scale from four 25-point components.
#[must_use]
pub fn tenant_health_score(record: &Record, _all_records: &[Record]) -> Value {
    let users = if record.f64_field("userCount").is_some_and(|count| count > 0.0) {
        25
    } else {
        0
    };
    let subscription = match record.str_field("subscriptionStatus") {
        Some("active") => 25,
        Some("trialing") => 15,
        Some("past_due") => 10,
        _ => 0,
    };
    let onboarding = if record.bool_field("onboardingCompleted") == Some(true) {
        25
    } else {
        0
    };
    let activity = match record.f64_field("daysSinceLastActivity") {
        Some(days) if days <= 7.0 => 25,
        Some(days) if days <= 30.0 => 15,
        Some(days) if days <= 90.0 => 5,
        _ => 0,
    };
    Value::from(users + subscription + onboarding + activity)
}

/// Account risk score. Unbounded above: heavy suspicious activity can push it
/// past 100. Negative counts contribute nothing.
#[must_use]
pub fn user_risk_score(record: &Record, _all_records: &[Record]) -> Value {
    let failed_logins = record
        .i64_field("failedLoginAttempts")
        .unwrap_or(0)
        .clamp(0, FAILED_LOGIN_CAP);
    let new_account = if record
        .f64_field("accountAgeDays")
        .is_some_and(|days| days < NEW_ACCOUNT_DAYS)
    {
        30
    } else {
        0
    };
    let suspicious = record
        .i64_field("suspiciousActivityCount")
        .unwrap_or(0)
        .max(0)
        .saturating_mul(10);
    Value::from(
        failed_logins
            .saturating_add(new_account)
            .saturating_add(suspicious),
    )
}

/// Period-over-period revenue change as `{ "value": pct, "trend": bucket }`.
///
/// Without a positive previous-period baseline the change is `0` and the
/// trend `unknown`.
#[expect(
    clippy::float_arithmetic,
    reason = "percentage change is inherently fractional"
)]
#[must_use]
pub fn revenue_trend(record: &Record, _all_records: &[Record]) -> Value {
    let current = record.f64_field("currentRevenue");
    let previous = record.f64_field("previousRevenue");
    match (current, previous) {
        (Some(current), Some(previous)) if previous > 0.0 => {
            let change_pct = 100.0 * (current - previous) / previous;
            json!({ "value": change_pct, "trend": Trend::classify(change_pct) })
        }
        _ => json!({ "value": 0, "trend": Trend::Unknown }),
    }
}

/// A record's `currentRevenue` as a percentage of the page total.
#[expect(clippy::float_arithmetic, reason = "share is a ratio of sums")]
#[must_use]
pub fn revenue_share(record: &Record, all_records: &[Record]) -> Value {
    let total: f64 = all_records
        .iter()
        .filter_map(|other| other.f64_field("currentRevenue"))
        .sum();
    let own = record.f64_field("currentRevenue").unwrap_or(0.0);
    if total <= 0.0 {
        return json!(0);
    }
    json!(100.0 * own / total)
}
