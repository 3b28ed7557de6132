//! Coverage for the computed field engine and built-in scores.

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;

fn record(value: Value) -> Record {
    Record::try_from(value).expect("object record")
}

#[fixture]
fn engine() -> ComputedFieldEngine {
    ComputedFieldEngine::with_builtins()
}

#[rstest]
fn healthy_tenant_scores_full_marks(engine: ComputedFieldEngine) {
    let tenant = record(json!({
        "userCount": 5,
        "subscriptionStatus": "active",
        "onboardingCompleted": true,
        "daysSinceLastActivity": 3
    }));
    let score = engine
        .compute(TENANT_HEALTH_SCORE, &tenant, &[])
        .expect("registered");
    assert_eq!(score, json!(100));
}

#[rstest]
#[case(json!({ "subscriptionStatus": "trialing", "daysSinceLastActivity": 30 }), 30)]
#[case(json!({ "subscriptionStatus": "past_due", "daysSinceLastActivity": 90 }), 15)]
#[case(json!({ "userCount": 0, "subscriptionStatus": "canceled", "daysSinceLastActivity": 91 }), 0)]
#[case(json!({ "userCount": 2, "onboardingCompleted": false }), 25)]
#[case(json!({}), 0)]
fn tenant_health_tiers(#[case] data: Value, #[case] expected: i64) {
    assert_eq!(tenant_health_score(&record(data), &[]), json!(expected));
}

#[rstest]
#[case(json!({ "failedLoginAttempts": 3, "accountAgeDays": 400 }), 3)]
#[case(json!({ "failedLoginAttempts": 80, "accountAgeDays": 400 }), 50)]
#[case(json!({ "failedLoginAttempts": 0, "accountAgeDays": 12 }), 30)]
#[case(json!({ "failedLoginAttempts": 50, "accountAgeDays": 1, "suspiciousActivityCount": 4 }), 120)]
#[case(json!({ "failedLoginAttempts": -20, "accountAgeDays": 400 }), 0)]
#[case(json!({ "failedLoginAttempts": 5, "accountAgeDays": 12, "suspiciousActivityCount": -3 }), 35)]
fn user_risk_is_not_clamped(#[case] data: Value, #[case] expected: i64) {
    assert_eq!(user_risk_score(&record(data), &[]), json!(expected));
}

#[rstest]
#[case(120.0, 100.0, "up-strong")]
#[case(105.0, 100.0, "up")]
#[case(100.0, 100.0, "stable")]
#[case(95.0, 100.0, "down")]
#[case(50.0, 100.0, "down-strong")]
fn revenue_trend_buckets(#[case] current: f64, #[case] previous: f64, #[case] trend: &str) {
    let value = revenue_trend(
        &record(json!({ "currentRevenue": current, "previousRevenue": previous })),
        &[],
    );
    assert_eq!(value["trend"], json!(trend));
}

#[rstest]
#[case(json!({ "currentRevenue": 100, "previousRevenue": 0 }))]
#[case(json!({ "currentRevenue": 100 }))]
#[case(json!({ "previousRevenue": 100 }))]
fn revenue_trend_without_baseline_is_unknown(#[case] data: Value) {
    let value = revenue_trend(&record(data), &[]);
    assert_eq!(value, json!({ "value": 0, "trend": "unknown" }));
}

#[rstest]
fn revenue_trend_reports_percentage_change() {
    let value = revenue_trend(
        &record(json!({ "currentRevenue": 150, "previousRevenue": 100 })),
        &[],
    );
    assert_eq!(value["value"].as_f64(), Some(50.0));
}

#[rstest]
fn revenue_share_uses_all_records(engine: ComputedFieldEngine) {
    let rows = vec![
        record(json!({ "currentRevenue": 300 })),
        record(json!({ "currentRevenue": 100 })),
        record(json!({})),
    ];
    let share = engine
        .compute(REVENUE_SHARE, &rows[0], &rows)
        .expect("registered");
    assert_eq!(share.as_f64(), Some(75.0));
}

#[rstest]
fn revenue_share_is_zero_without_revenue(engine: ComputedFieldEngine) {
    let rows = vec![record(json!({ "currentRevenue": 0 }))];
    let share = engine
        .compute(REVENUE_SHARE, &rows[0], &rows)
        .expect("registered");
    assert_eq!(share, json!(0));
}

#[rstest]
fn unknown_compute_type_is_a_typed_error(engine: ComputedFieldEngine) {
    let err = engine
        .compute("lifetime-value", &Record::new(), &[])
        .expect_err("unregistered tag");
    assert_eq!(
        err,
        ComputeError::UnknownComputeType {
            compute_type: "lifetime-value".to_owned()
        }
    );
}

#[rstest]
fn custom_functions_can_be_registered() {
    fn seat_count(record: &Record, _: &[Record]) -> Value {
        json!(record.i64_field("seats").unwrap_or(0))
    }

    let mut engine = ComputedFieldEngine::new();
    engine.register("seat-count", seat_count);

    assert!(engine.supports("seat-count"));
    assert!(!engine.supports(TENANT_HEALTH_SCORE));
    let value = engine
        .compute("seat-count", &record(json!({ "seats": 12 })), &[])
        .expect("registered");
    assert_eq!(value, json!(12));
}
