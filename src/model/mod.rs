pub mod artist;
pub mod post;
pub mod tag;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use thiserror::Error;

/// A single raw record failed validation. These are recorded and skipped,
/// never propagated past the batch that produced them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a valid {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field `{field}` holds unparsable timestamp `{value}`")]
    BadTimestamp { field: &'static str, value: String },
}

fn get<'a>(raw: &'a Value, field: &'static str) -> Result<Option<&'a Value>, DecodeError> {
    match raw {
        Value::Object(map) => Ok(map.get(field).filter(|v| !v.is_null())),
        _ => Err(DecodeError::NotAnObject),
    }
}

pub(crate) fn req_i64(raw: &Value, field: &'static str) -> Result<i64, DecodeError> {
    match get(raw, field)? {
        Some(v) => v.as_i64().ok_or(DecodeError::WrongType {
            field,
            expected: "integer",
        }),
        None => Err(DecodeError::MissingField(field)),
    }
}

pub(crate) fn opt_i64(raw: &Value, field: &'static str) -> Result<Option<i64>, DecodeError> {
    match get(raw, field)? {
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or(DecodeError::WrongType {
                field,
                expected: "integer",
            }),
        None => Ok(None),
    }
}

pub(crate) fn req_str(raw: &Value, field: &'static str) -> Result<String, DecodeError> {
    match get(raw, field)? {
        Some(v) => v
            .as_str()
            .map(str::to_owned)
            .ok_or(DecodeError::WrongType {
                field,
                expected: "string",
            }),
        None => Err(DecodeError::MissingField(field)),
    }
}

pub(crate) fn opt_str(raw: &Value, field: &'static str) -> Result<Option<String>, DecodeError> {
    match get(raw, field)? {
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_owned()))
            .ok_or(DecodeError::WrongType {
                field,
                expected: "string",
            }),
        None => Ok(None),
    }
}

/// Missing booleans fall back to `default`; the exports elide flags that
/// were never set.
pub(crate) fn bool_or(
    raw: &Value,
    field: &'static str,
    default: bool,
) -> Result<bool, DecodeError> {
    match get(raw, field)? {
        Some(v) => v.as_bool().ok_or(DecodeError::WrongType {
            field,
            expected: "boolean",
        }),
        None => Ok(default),
    }
}

/// An absent or empty timestamp string becomes `None`; a present but
/// unparsable one fails the record.
pub(crate) fn opt_timestamp(
    raw: &Value,
    field: &'static str,
) -> Result<Option<DateTime<FixedOffset>>, DecodeError> {
    let text = match get(raw, field)? {
        Some(v) => v.as_str().ok_or(DecodeError::WrongType {
            field,
            expected: "timestamp string",
        })?,
        None => return Ok(None),
    };
    if text.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(text)
        .map(Some)
        .map_err(|_| DecodeError::BadTimestamp {
            field,
            value: text.to_owned(),
        })
}

/// Splits a space-delimited tag string, trimming each token and dropping
/// empty ones so doubled or trailing spaces never yield empty tag names.
pub fn split_tag_string(tag_string: &str) -> Vec<String> {
    tag_string
        .split(' ')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}
