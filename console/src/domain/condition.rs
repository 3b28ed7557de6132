//! Per-record visibility conditions.
//!
//! A [`Condition`] is classified once, when it is built from configuration or
//! from code, into one of three shapes. Evaluation never inspects raw JSON
//! again, so malformed input is rejected deterministically as
//! [`Condition::Unrecognized`], which always evaluates to `false`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::field_spec::FieldSpec;
use super::record::{Record, json_kind};

/// Boolean rule supplied as code.
pub type Predicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Expected value for a single field in a membership condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// The field must equal this scalar.
    Equals(Value),
    /// The field must equal one of these scalars.
    OneOf(Vec<Value>),
}

/// A boolean rule over a record.
#[derive(Clone)]
pub enum Condition {
    /// Every listed field equals its expected scalar.
    Equality(BTreeMap<String, Value>),
    /// Every listed field matches its expectation; at least one is a set.
    Membership(BTreeMap<String, Expectation>),
    /// Arbitrary code evaluated against the record.
    Predicate(Predicate),
    /// Input of an unsupported shape. Always evaluates to `false`.
    Unrecognized,
}

impl Condition {
    /// Classify a JSON value into a condition.
    ///
    /// Objects whose values are all scalars become [`Condition::Equality`];
    /// objects with at least one array value become [`Condition::Membership`].
    /// Anything else, including objects with nested object values, is
    /// [`Condition::Unrecognized`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use admin_console::domain::{Condition, Record, evaluate_condition};
    /// # use serde_json::json;
    /// let condition = Condition::from_json(json!({ "tier": ["pro", "ent"] }));
    /// let record = Record::new().with("tier", "free");
    /// assert!(!evaluate_condition(&condition, &record));
    /// ```
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        let entries = match value {
            Value::Object(entries) => entries,
            other => {
                debug!(kind = json_kind(&other), "unrecognised condition shape");
                return Self::Unrecognized;
            }
        };
        if entries.values().any(Value::is_object) {
            debug!("condition with nested object values is unrecognised");
            return Self::Unrecognized;
        }
        if entries.values().any(Value::is_array) {
            let expectations = entries
                .into_iter()
                .map(|(field, expected)| {
                    let expectation = match expected {
                        Value::Array(options) => Expectation::OneOf(options),
                        scalar => Expectation::Equals(scalar),
                    };
                    (field, expectation)
                })
                .collect();
            return Self::Membership(expectations);
        }
        Self::Equality(entries.into_iter().collect())
    }

    /// Build a predicate condition from a closure.
    #[must_use]
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equality(entries) => f.debug_tuple("Equality").field(entries).finish(),
            Self::Membership(entries) => f.debug_tuple("Membership").field(entries).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Unrecognized => f.write_str("Unrecognized"),
        }
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}

/// Evaluate a condition against a record.
#[must_use]
pub fn evaluate_condition(condition: &Condition, record: &Record) -> bool {
    match condition {
        Condition::Equality(entries) => entries
            .iter()
            .all(|(field, expected)| field_equals(record, field, expected)),
        Condition::Membership(entries) => {
            entries
                .iter()
                .all(|(field, expectation)| match expectation {
                    Expectation::Equals(expected) => field_equals(record, field, expected),
                    Expectation::OneOf(options) => record
                        .get(field)
                        .is_some_and(|actual| options.iter().any(|o| scalars_equal(actual, o))),
                })
        }
        Condition::Predicate(predicate) => predicate(record),
        Condition::Unrecognized => false,
    }
}

fn field_equals(record: &Record, field: &str, expected: &Value) -> bool {
    record
        .get(field)
        .is_some_and(|actual| scalars_equal(actual, expected))
}

/// Compare two JSON scalars, treating `5` and `5.0` as equal.
#[must_use]
pub(crate) fn scalars_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => left == right,
    }
}

/// Show/hide rules attached to a field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalVisibility {
    /// Show the field only when this holds. Takes priority over `hide_when`.
    #[serde(default)]
    pub show_when: Option<Condition>,
    /// Hide the field when this holds.
    #[serde(default)]
    pub hide_when: Option<Condition>,
}

/// Decide whether `field` is shown for `record`.
///
/// Fields without rules are always shown. `show_when` wins over `hide_when`
/// when both are present.
#[must_use]
pub fn should_show_field(field: &FieldSpec, record: &Record) -> bool {
    let Some(rules) = &field.conditional_visibility else {
        return true;
    };
    if let Some(show_when) = &rules.show_when {
        return evaluate_condition(show_when, record);
    }
    if let Some(hide_when) = &rules.hide_when {
        return !evaluate_condition(hide_when, record);
    }
    true
}
