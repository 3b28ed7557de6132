//! Entity records as seen by the rules engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of entity data, keyed by field name.
///
/// Records are plain JSON objects. Rules only ever read them; computed values
/// are attached to the resolved view rather than written back.
///
/// # Examples
///
/// ```
/// # use admin_console::domain::Record;
/// # use serde_json::json;
/// let record = Record::try_from(json!({ "status": "active", "userCount": 5 }))
///     .expect("object payload");
/// assert_eq!(record.get("status"), Some(&json!("active")));
/// assert_eq!(record.i64_field("userCount"), Some(5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

/// Error returned when a JSON value is not an object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record payload must be a JSON object, got {kind}")]
pub struct RecordShapeError {
    /// JSON kind of the rejected value.
    pub kind: &'static str,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field, returning the record for chaining.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Read a numeric field as `f64`.
    #[must_use]
    pub fn f64_field(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Read a numeric field as `i64`, accepting integral floats.
    #[must_use]
    pub fn i64_field(&self, field: &str) -> Option<i64> {
        let value = self.get(field)?;
        if let Some(int) = value.as_i64() {
            return Some(int);
        }
        let float = value.as_f64()?;
        #[expect(
            clippy::cast_possible_truncation,
            reason = "only integral values inside the i64 range reach the cast"
        )]
        let truncated = float as i64;
        (float.fract() == 0.0 && float.abs() < 9.0e15).then_some(truncated)
    }

    /// Read a boolean field.
    #[must_use]
    pub fn bool_field(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Read a string field.
    #[must_use]
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl TryFrom<Value> for Record {
    type Error = RecordShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(RecordShapeError {
                kind: json_kind(&other),
            }),
        }
    }
}

#[must_use]
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
