//! Type-directed conversion of replacement strings.
//!
//! The kind of the leaf currently stored at a path decides how the
//! replacement string is parsed. The table is closed: every [`LeafKind`] maps
//! to exactly one converter or to none, in which case the caller falls back
//! to a verbatim string.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use uuid::Uuid;

use super::timespan::TimeSpan;
use crate::errors::ConversionError;

/// Parses a replacement string into a JSON value of a fixed kind.
pub type Converter = fn(&str) -> Result<Value, ConversionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    DateTime,
    Uuid,
    Duration,
    Object,
    Array,
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LeafKind::Null => "null",
            LeafKind::Boolean => "boolean",
            LeafKind::Integer => "integer",
            LeafKind::Float => "float",
            LeafKind::String => "string",
            LeafKind::DateTime => "date-time",
            LeafKind::Uuid => "uuid",
            LeafKind::Duration => "duration",
            LeafKind::Object => "object",
            LeafKind::Array => "array",
        };
        f.write_str(name)
    }
}

/// Which string shapes are treated as semantically typed leaves.
///
/// JSON carries dates, identifiers and durations as plain strings. A string
/// leaf is promoted to the richer kind only when its switch is on and its
/// current content parses as that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDetection {
    #[serde(default = "default_true")]
    pub date_time: bool,
    #[serde(default)]
    pub uuid: bool,
    #[serde(default)]
    pub duration: bool,
}

impl Default for TypeDetection {
    fn default() -> Self {
        Self {
            date_time: true,
            uuid: false,
            duration: false,
        }
    }
}

impl TypeDetection {
    /// Only the JSON-native kinds; every string stays a string.
    pub fn none() -> Self {
        Self {
            date_time: false,
            uuid: false,
            duration: false,
        }
    }

    pub fn all() -> Self {
        Self {
            date_time: true,
            uuid: true,
            duration: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl LeafKind {
    pub fn detect(value: &Value, detection: &TypeDetection) -> Self {
        match value {
            Value::Null => LeafKind::Null,
            Value::Bool(_) => LeafKind::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => LeafKind::Integer,
            Value::Number(_) => LeafKind::Float,
            Value::String(s) => Self::detect_string(s, detection),
            Value::Array(_) => LeafKind::Array,
            Value::Object(_) => LeafKind::Object,
        }
    }

    fn detect_string(s: &str, detection: &TypeDetection) -> Self {
        if detection.date_time && looks_like_date_time(s) {
            LeafKind::DateTime
        } else if detection.uuid && Uuid::parse_str(s).is_ok() {
            LeafKind::Uuid
        } else if detection.duration && TimeSpan::parse_clock(s).is_ok() {
            LeafKind::Duration
        } else {
            LeafKind::String
        }
    }

    /// The converter for this kind, or `None` when the kind cannot be
    /// produced from a single string.
    pub fn converter(self) -> Option<Converter> {
        match self {
            LeafKind::Integer => Some(to_integer as Converter),
            LeafKind::Float => Some(to_float as Converter),
            LeafKind::Boolean => Some(to_boolean as Converter),
            LeafKind::String | LeafKind::Null => Some(verbatim as Converter),
            LeafKind::DateTime => Some(to_date_time as Converter),
            LeafKind::Uuid => Some(to_uuid as Converter),
            LeafKind::Duration => Some(to_duration as Converter),
            LeafKind::Object | LeafKind::Array => None,
        }
    }
}

/// Replacement for leaves whose kind has no converter.
pub fn verbatim(raw: &str) -> Result<Value, ConversionError> {
    Ok(Value::String(raw.to_string()))
}

fn to_integer(raw: &str) -> Result<Value, ConversionError> {
    raw.trim()
        .parse::<i64>()
        .map(Value::from)
        .map_err(|e| ConversionError::new(LeafKind::Integer, raw, e))
}

fn to_float(raw: &str) -> Result<Value, ConversionError> {
    let parsed: f64 = raw
        .trim()
        .parse()
        .map_err(|e| ConversionError::new(LeafKind::Float, raw, e))?;
    Number::from_f64(parsed)
        .map(Value::Number)
        .ok_or_else(|| ConversionError::new(LeafKind::Float, raw, "value is not a finite number"))
}

fn to_boolean(raw: &str) -> Result<Value, ConversionError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(Value::Bool(true))
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(Value::Bool(false))
    } else {
        Err(ConversionError::new(
            LeafKind::Boolean,
            raw,
            "expected 'true' or 'false'",
        ))
    }
}

fn to_date_time(raw: &str) -> Result<Value, ConversionError> {
    normalize_date_time(raw).map(Value::String).ok_or_else(|| {
        ConversionError::new(LeafKind::DateTime, raw, "expected an ISO 8601 date-time")
    })
}

fn to_uuid(raw: &str) -> Result<Value, ConversionError> {
    Uuid::parse_str(raw.trim())
        .map(|id| Value::String(id.hyphenated().to_string()))
        .map_err(|e| ConversionError::new(LeafKind::Uuid, raw, e))
}

fn to_duration(raw: &str) -> Result<Value, ConversionError> {
    raw.parse::<TimeSpan>()
        .map(|span| Value::String(span.to_string()))
        .map_err(|e| ConversionError::new(LeafKind::Duration, raw, e))
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a date-time and render it in canonical ISO 8601 form. Values with
/// an offset keep it (UTC is written as `Z`); naive values stay naive.
fn normalize_date_time(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some(naive.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

/// Date-only strings are left alone; detection needs a time part.
fn looks_like_date_time(s: &str) -> bool {
    s.len() >= 16 && s.as_bytes().get(10) == Some(&b'T') && normalize_date_time(s).is_some()
}
