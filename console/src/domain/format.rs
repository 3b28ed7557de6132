//! Display formatting as render metadata.
//!
//! Formatters turn a field value into a [`RenderDescriptor`]: plain data that
//! names a component and its styling. Descriptors never reference a concrete
//! UI toolkit. Unknown display formats, and values of the wrong shape for a
//! known format, fall back to [`RenderDescriptor::Text`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::computed::Trend;
use super::field_spec::FieldSpec;
use super::record::Record;

/// Tag for [`status_badge`].
pub const STATUS_BADGE: &str = "status-badge";
/// Tag for [`health_score`].
pub const HEALTH_SCORE: &str = "health-score";
/// Tag for [`risk_indicator`].
pub const RISK_INDICATOR: &str = "risk-indicator";
/// Tag for [`trend_arrow`].
pub const TREND_ARROW: &str = "trend-arrow";

/// Signature of a formatter.
pub type FormatFn = fn(&FieldSpec, &Value, &Record) -> RenderDescriptor;

/// Render metadata for one field value.
///
/// Serialises with a `component` tag and camelCase keys:
///
/// ```
/// # use admin_console::domain::RenderDescriptor;
/// # use serde_json::json;
/// let descriptor = RenderDescriptor::Badge {
///     text: "active".to_owned(),
///     style_class: "badge-success".to_owned(),
/// };
/// assert_eq!(
///     serde_json::to_value(&descriptor).expect("serialise"),
///     json!({ "component": "badge", "text": "active", "styleClass": "badge-success" })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "component", rename_all = "kebab-case")]
pub enum RenderDescriptor {
    /// Coloured status pill.
    #[serde(rename_all = "camelCase")]
    Badge {
        /// Text shown inside the badge.
        text: String,
        /// Style hook derived from the value.
        style_class: String,
    },
    /// Bounded progress bar.
    #[serde(rename_all = "camelCase")]
    ProgressBar {
        /// Current value.
        value: Value,
        /// Upper bound.
        max: u32,
        /// Style hook derived from thresholds.
        style_class: String,
        /// Caption, e.g. `85%`.
        label: String,
    },
    /// Risk level badge.
    #[serde(rename_all = "camelCase")]
    RiskBadge {
        /// Raw risk score.
        value: Value,
        /// Bucketed level.
        level: RiskLevel,
        /// Style hook derived from the level.
        style_class: String,
    },
    /// Value with a direction arrow.
    #[serde(rename_all = "camelCase")]
    TrendDisplay {
        /// Change value.
        value: Value,
        /// Direction bucket.
        trend: Trend,
        /// Icon name.
        icon: String,
        /// Style hook derived from the trend.
        style_class: String,
    },
    /// Plain value.
    Text {
        /// The value as-is.
        value: Value,
    },
}

/// Bucketed risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Below 20.
    Low,
    /// 20 to below 50.
    Medium,
    /// 50 to below 80.
    High,
    /// 80 and above.
    Critical,
}

impl RiskLevel {
    /// Bucket a risk score.
    #[must_use]
    pub fn classify(score: f64) -> Self {
        if score < 20.0 {
            Self::Low
        } else if score < 50.0 {
            Self::Medium
        } else if score < 80.0 {
            Self::High
        } else {
            Self::Critical
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Status badge: the value as text, styled by well-known status names.
#[must_use]
pub fn status_badge(_field: &FieldSpec, value: &Value, _record: &Record) -> RenderDescriptor {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let style_class = status_style_class(&text).to_owned();
    RenderDescriptor::Badge { text, style_class }
}

fn status_style_class(status: &str) -> &'static str {
    match status {
        "active" | "enabled" | "completed" | "verified" => "badge-success",
        "trialing" | "pending" | "invited" => "badge-info",
        "past_due" | "locked" | "warning" => "badge-warning",
        "canceled" | "suspended" | "disabled" | "failed" | "deleted" => "badge-danger",
        _ => "badge-neutral",
    }
}

/// Health score: a 0–100 progress bar, good from 80 and fair from 60.
#[must_use]
pub fn health_score(field: &FieldSpec, value: &Value, record: &Record) -> RenderDescriptor {
    let Some(score) = value.as_f64() else {
        return text(field, value, record);
    };
    let style_class = if score >= 80.0 {
        "health-good"
    } else if score >= 60.0 {
        "health-fair"
    } else {
        "health-poor"
    };
    RenderDescriptor::ProgressBar {
        value: value.clone(),
        max: 100,
        style_class: style_class.to_owned(),
        label: format!("{value}%"),
    }
}

/// Risk indicator: bucketed at 20, 50 and 80.
#[must_use]
pub fn risk_indicator(field: &FieldSpec, value: &Value, record: &Record) -> RenderDescriptor {
    let Some(score) = value.as_f64() else {
        return text(field, value, record);
    };
    let level = RiskLevel::classify(score);
    RenderDescriptor::RiskBadge {
        value: value.clone(),
        level,
        style_class: format!("risk-{}", level.as_str()),
    }
}

/// Trend arrow: accepts a raw change or a `{ value, trend }` pair.
#[must_use]
pub fn trend_arrow(field: &FieldSpec, value: &Value, record: &Record) -> RenderDescriptor {
    let (change, trend) = match value {
        Value::Number(number) => (
            value.clone(),
            number.as_f64().map_or(Trend::Unknown, Trend::classify),
        ),
        Value::Object(pair) => {
            let trend = pair
                .get("trend")
                .cloned()
                .and_then(|raw| serde_json::from_value::<Trend>(raw).ok())
                .unwrap_or(Trend::Unknown);
            (pair.get("value").cloned().unwrap_or(Value::Null), trend)
        }
        _ => return text(field, value, record),
    };
    RenderDescriptor::TrendDisplay {
        value: change,
        trend,
        icon: trend_icon(trend).to_owned(),
        style_class: format!("trend-{}", trend.as_str()),
    }
}

fn trend_icon(trend: Trend) -> &'static str {
    match trend {
        Trend::UpStrong => "arrow-up-double",
        Trend::Up => "arrow-up",
        Trend::Stable => "arrow-right",
        Trend::Down => "arrow-down",
        Trend::DownStrong => "arrow-down-double",
        Trend::Unknown => "minus",
    }
}

/// Default formatter: the value unchanged.
#[must_use]
pub fn text(_field: &FieldSpec, value: &Value, _record: &Record) -> RenderDescriptor {
    RenderDescriptor::Text {
        value: value.clone(),
    }
}

/// Registry of formatters keyed by display format.
#[derive(Debug, Clone, Default)]
pub struct DynamicFormatter {
    registry: HashMap<String, FormatFn>,
}

impl DynamicFormatter {
    /// Create a formatter with nothing registered; everything renders as text.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter with the built-in display formats registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut formatter = Self::new();
        formatter
            .register(STATUS_BADGE, status_badge)
            .register(HEALTH_SCORE, health_score)
            .register(RISK_INDICATOR, risk_indicator)
            .register(TREND_ARROW, trend_arrow);
        formatter
    }

    /// Register `format` under `display_format`, replacing any previous entry.
    pub fn register(&mut self, display_format: impl Into<String>, format: FormatFn) -> &mut Self {
        self.registry.insert(display_format.into(), format);
        self
    }

    /// Describe `value` using the formatter for `display_format`.
    #[must_use]
    pub fn format(
        &self,
        display_format: Option<&str>,
        field: &FieldSpec,
        value: &Value,
        record: &Record,
    ) -> RenderDescriptor {
        let Some(display_format) = display_format else {
            return text(field, value, record);
        };
        match self.registry.get(display_format) {
            Some(format) => format(field, value, record),
            None => {
                debug!(display_format, field = %field.id, "unknown display format, rendering as text");
                text(field, value, record)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Formatter dispatch and descriptor coverage.

    use super::*;
    use crate::domain::ColumnId;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn formatter() -> DynamicFormatter {
        DynamicFormatter::with_builtins()
    }

    #[fixture]
    fn field() -> FieldSpec {
        FieldSpec::new(ColumnId::new("value").expect("valid id"), "Value")
    }

    #[rstest]
    #[case("active", "badge-success")]
    #[case("past_due", "badge-warning")]
    #[case("suspended", "badge-danger")]
    #[case("mystery", "badge-neutral")]
    fn status_badges_map_style_from_value(
        formatter: DynamicFormatter,
        field: FieldSpec,
        #[case] status: &str,
        #[case] style: &str,
    ) {
        let descriptor = formatter.format(Some(STATUS_BADGE), &field, &json!(status), &Record::new());
        assert_eq!(
            descriptor,
            RenderDescriptor::Badge {
                text: status.to_owned(),
                style_class: style.to_owned()
            }
        );
    }

    #[rstest]
    #[case(json!(85), "health-good", "85%")]
    #[case(json!(60), "health-fair", "60%")]
    #[case(json!(59.5), "health-poor", "59.5%")]
    fn health_scores_render_as_progress_bars(
        formatter: DynamicFormatter,
        field: FieldSpec,
        #[case] value: Value,
        #[case] style: &str,
        #[case] label: &str,
    ) {
        let descriptor = formatter.format(Some(HEALTH_SCORE), &field, &value, &Record::new());
        let RenderDescriptor::ProgressBar {
            max,
            style_class,
            label: actual_label,
            ..
        } = descriptor
        else {
            panic!("expected progress bar, got {descriptor:?}");
        };
        assert_eq!(max, 100);
        assert_eq!(style_class, style);
        assert_eq!(actual_label, label);
    }

    #[rstest]
    #[case(json!(5), RiskLevel::Low)]
    #[case(json!(20), RiskLevel::Medium)]
    #[case(json!(79), RiskLevel::High)]
    #[case(json!(120), RiskLevel::Critical)]
    fn risk_levels_follow_thresholds(
        formatter: DynamicFormatter,
        field: FieldSpec,
        #[case] value: Value,
        #[case] expected: RiskLevel,
    ) {
        let descriptor = formatter.format(Some(RISK_INDICATOR), &field, &value, &Record::new());
        assert!(matches!(
            descriptor,
            RenderDescriptor::RiskBadge { level, ref style_class, .. }
                if level == expected && *style_class == format!("risk-{}", expected.as_str())
        ));
    }

    #[rstest]
    fn trend_arrow_accepts_value_trend_pairs(formatter: DynamicFormatter, field: FieldSpec) {
        let value = json!({ "value": -12.5, "trend": "down-strong" });
        let descriptor = formatter.format(Some(TREND_ARROW), &field, &value, &Record::new());
        assert_eq!(
            descriptor,
            RenderDescriptor::TrendDisplay {
                value: json!(-12.5),
                trend: Trend::DownStrong,
                icon: "arrow-down-double".to_owned(),
                style_class: "trend-down-strong".to_owned(),
            }
        );
    }

    #[rstest]
    fn trend_arrow_classifies_raw_numbers(formatter: DynamicFormatter, field: FieldSpec) {
        let descriptor = formatter.format(Some(TREND_ARROW), &field, &json!(4), &Record::new());
        assert!(matches!(
            descriptor,
            RenderDescriptor::TrendDisplay { trend: Trend::Up, .. }
        ));
    }

    #[rstest]
    #[case(Some("sparkline"), json!([1, 2, 3]))]
    #[case(None, json!("plain"))]
    #[case(Some(HEALTH_SCORE), json!("n/a"))]
    #[case(Some(TREND_ARROW), json!(true))]
    fn falls_back_to_text(
        formatter: DynamicFormatter,
        field: FieldSpec,
        #[case] display_format: Option<&str>,
        #[case] value: Value,
    ) {
        let descriptor = formatter.format(display_format, &field, &value, &Record::new());
        assert_eq!(descriptor, RenderDescriptor::Text { value });
    }

    #[rstest]
    fn descriptors_serialise_with_component_tag() {
        let descriptor = RenderDescriptor::ProgressBar {
            value: json!(72),
            max: 100,
            style_class: "health-fair".to_owned(),
            label: "72%".to_owned(),
        };
        assert_eq!(
            serde_json::to_value(&descriptor).expect("serialise"),
            json!({
                "component": "progress-bar",
                "value": 72,
                "max": 100,
                "styleClass": "health-fair",
                "label": "72%"
            })
        );
    }
}
