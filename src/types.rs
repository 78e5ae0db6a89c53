//! Core value type shared by the row materializer and record setters.
//!
//! Every decoded cell becomes a [`Value`] before it is handed to a setter. Setters convert it into
//! their field type with the `to_*` / [`Value::parse`] helpers, which report failures as
//! [`AssignError`] so the tolerance policy can decide what happens next.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AssignError;

/// A single decoded scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// Date/time without a zone (spreadsheet dates carry no zone).
    Timestamp(NaiveDateTime),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text of a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value kind, used in conversion errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int64(_) => "integer",
            Value::Float64(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Timestamp(_) => "timestamp",
            Value::Utf8(_) => "text",
        }
    }

    /// Consume the value as text. `Null` becomes the empty string.
    pub fn into_text(self) -> String {
        match self {
            Value::Utf8(s) => s,
            other => other.to_string(),
        }
    }

    /// Interpret the value as text, keeping `Null` distinct.
    pub fn into_opt_text(self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.into_text()),
        }
    }

    pub fn to_i64(&self) -> Result<i64, AssignError> {
        match self {
            Value::Int64(v) => Ok(*v),
            Value::Float64(v) if v.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(v) => {
                Ok(*v as i64)
            }
            Value::Float64(v) if v.fract() == 0.0 => Err(AssignError::Conversion {
                value: v.to_string(),
                message: "out of range for a 64-bit integer".to_string(),
            }),
            Value::Float64(v) => Err(AssignError::Conversion {
                value: v.to_string(),
                message: "not an integral number".to_string(),
            }),
            Value::Utf8(s) => s.trim().parse::<i64>().map_err(|e| AssignError::Conversion {
                value: s.clone(),
                message: e.to_string(),
            }),
            _ => Err(self.mismatch("integer")),
        }
    }

    pub fn to_f64(&self) -> Result<f64, AssignError> {
        match self {
            Value::Float64(v) => Ok(*v),
            Value::Int64(v) => Ok(*v as f64),
            Value::Utf8(s) => s.trim().parse::<f64>().map_err(|e| AssignError::Conversion {
                value: s.clone(),
                message: e.to_string(),
            }),
            _ => Err(self.mismatch("float")),
        }
    }

    pub fn to_bool(&self) -> Result<bool, AssignError> {
        match self {
            Value::Bool(v) => Ok(*v),
            Value::Int64(v) => Ok(*v != 0),
            Value::Utf8(s) => parse_bool(s).ok_or_else(|| AssignError::Conversion {
                value: s.clone(),
                message: "not a boolean".to_string(),
            }),
            _ => Err(self.mismatch("boolean")),
        }
    }

    /// Accepts native timestamps and text in `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or
    /// `YYYY-MM-DDTHH:MM:SS` form.
    pub fn to_timestamp(&self) -> Result<NaiveDateTime, AssignError> {
        match self {
            Value::Timestamp(ts) => Ok(*ts),
            Value::Utf8(s) => parse_timestamp(s.trim()).ok_or_else(|| AssignError::Conversion {
                value: s.clone(),
                message: "not a recognized date/time".to_string(),
            }),
            _ => Err(self.mismatch("timestamp")),
        }
    }

    /// Parse the textual form of the value with [`FromStr`].
    ///
    /// Useful for enums and newtypes:
    ///
    /// ```
    /// use tabular_ingest::types::Value;
    ///
    /// let port: u16 = Value::Utf8(" 8080 ".to_string()).parse().unwrap();
    /// assert_eq!(port, 8080);
    /// ```
    pub fn parse<T>(&self) -> Result<T, AssignError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        if self.is_null() {
            return Err(self.mismatch("a value"));
        }
        let text = self.to_string();
        text.trim().parse::<T>().map_err(|e| AssignError::Conversion {
            value: text.clone(),
            message: e.to_string(),
        })
    }

    /// JSON view of the value. Timestamps render as ISO-8601 strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Int64(v) => serde_json::Value::from(*v),
            Value::Float64(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Timestamp(ts) => {
                serde_json::Value::String(ts.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
            Value::Utf8(s) => serde_json::Value::String(s.clone()),
        }
    }

    fn mismatch(&self, expected: &'static str) -> AssignError {
        AssignError::TypeMismatch {
            expected,
            found: self.kind_name().to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Timestamp(ts) => write!(f, "{ts}"),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
