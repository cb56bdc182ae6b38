//! Field-by-field reader over a decoded JSON object.
//!
//! Each record's `TryFrom<Map<String, Value>>` impl pulls its fields through
//! `Fields`, which turns serde failures into a `ValidationError` naming the
//! field. Struct literals evaluate their fields in the order written, so the
//! first offending field in declaration order is the one reported.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use crate::error::ValidationError;

pub(crate) struct Fields<'a> {
    object: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(object: &'a Map<String, Value>) -> Self {
        Self { object }
    }

    /// A required field: absent is `MissingField`, `null` is `TypeMismatch`.
    pub(crate) fn required<T: DeserializeOwned>(&self, name: &str) -> Result<T, ValidationError> {
        match self.object.get(name) {
            None => Err(ValidationError::missing(name)),
            Some(Value::Null) => Err(ValidationError::mismatch(name, "null is not allowed")),
            Some(value) => decode(name, value),
        }
    }

    /// An optional field: absent and `null` both yield `None`.
    pub(crate) fn optional<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, ValidationError> {
        match self.object.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(name, value).map(Some),
        }
    }

    pub(crate) fn or_default<T: DeserializeOwned + Default>(
        &self,
        name: &str,
    ) -> Result<T, ValidationError> {
        Ok(self.optional(name)?.unwrap_or_default())
    }

    pub(crate) fn or<T: DeserializeOwned>(&self, name: &str, default: T) -> Result<T, ValidationError> {
        Ok(self.optional(name)?.unwrap_or(default))
    }

    pub(crate) fn url(&self, name: &str) -> Result<Url, ValidationError> {
        let raw: String = self.required(name)?;
        parse_url(name, &raw)
    }

    /// Optional URL; the API sends `""` for unset links, which maps to `None`.
    pub(crate) fn optional_url(&self, name: &str) -> Result<Option<Url>, ValidationError> {
        match self.optional::<String>(name)? {
            Some(raw) if !raw.is_empty() => parse_url(name, &raw).map(Some),
            _ => Ok(None),
        }
    }

    pub(crate) fn timestamp(&self, name: &str) -> Result<DateTime<Utc>, ValidationError> {
        let raw: String = self.required(name)?;
        parse_timestamp(name, &raw)
    }

    pub(crate) fn optional_timestamp(
        &self,
        name: &str,
    ) -> Result<Option<DateTime<Utc>>, ValidationError> {
        self.optional::<String>(name)?
            .map(|raw| parse_timestamp(name, &raw))
            .transpose()
    }
}

fn decode<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, ValidationError> {
    T::deserialize(value).map_err(|e| ValidationError::mismatch(name, e.to_string()))
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::mismatch(name, format!("{e}: {raw:?}")))?;
    if !url.has_host() {
        return Err(ValidationError::mismatch(
            name,
            format!("URL has no host: {raw:?}"),
        ));
    }
    Ok(url)
}

/// Naive date-time layouts, `T` or space separated.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// RFC 3339 with an offset, or a naive ISO-8601 date-time taken as UTC.
fn parse_timestamp(name: &str, raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let mut last_error = None;
    for format in NAIVE_FORMATS {
        match NaiveDateTime::parse_from_str(raw, format) {
            Ok(naive) => return Ok(naive.and_utc()),
            Err(e) => last_error = Some(e),
        }
    }
    let reason = last_error.map_or_else(|| "unparsable".to_string(), |e| e.to_string());
    Err(ValidationError::mismatch(name, format!("{reason}: {raw:?}")))
}

/// Short name of a JSON value's kind, for shape errors and logs.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
