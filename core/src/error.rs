//! Error types for the Thunderstore API client.
//!
//! # Design
//! `ApiError` is the single error type returned by every operation, so callers
//! can match narrowly on one variant or propagate everything with `?`. The
//! statuses the API uses to signal a specific condition (401, 404, 429) get
//! dedicated variants; every other non-200 response lands in `HttpError` with
//! the raw status code and body for debugging.
//!
//! `ValidationError` describes why a response body could not be turned into a
//! record. It names the offending field so a schema change on the remote side
//! is easy to pin down.

use thiserror::Error;

/// Errors returned by `ThunderstoreApi` parse methods and `ThunderstoreClient`
/// operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 401.
    #[error("authentication failed (HTTP {status})")]
    Authentication { status: u16 },

    /// The server returned 404.
    #[error("resource not found (HTTP {status})")]
    NotFound { status: u16 },

    /// The server returned 429.
    #[error("rate limit exceeded (HTTP {status})")]
    RateLimited { status: u16 },

    /// Any other non-200 status.
    #[error("API request failed: HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request did not complete before the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The HTTP exchange itself failed (connection refused, DNS, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// A caller-supplied path segment (identifier, namespace, name or
    /// version) cannot be sent as-is: it is empty, `.` or `..`.
    #[error("invalid path segment `{0}`")]
    InvalidPathSegment(String),

    /// The response body was not valid JSON or did not match the record schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ApiError {
    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authentication { status }
            | ApiError::NotFound { status }
            | ApiError::RateLimited { status }
            | ApiError::HttpError { status, .. } => Some(*status),
            ApiError::Timeout
            | ApiError::Transport(_)
            | ApiError::InvalidPathSegment(_)
            | ApiError::Validation(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// Why a JSON payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent from the object.
    #[error("missing field `{field}`")]
    MissingField { field: String },

    /// A field is present but has the wrong shape, or fails URL/timestamp parsing.
    #[error("invalid value for field `{field}`: {reason}")]
    TypeMismatch { field: String, reason: String },

    /// The payload is valid JSON but not the kind of value a record is built from.
    #[error("unexpected JSON shape: {0}")]
    UnexpectedShape(String),

    /// The body could not be parsed as JSON at all.
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(String),
}

impl ValidationError {
    pub(crate) fn missing(field: &str) -> Self {
        ValidationError::MissingField {
            field: field.to_string(),
        }
    }

    pub(crate) fn mismatch(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::TypeMismatch {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field, when the failure is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingField { field } | ValidationError::TypeMismatch { field, .. } => {
                Some(field)
            }
            ValidationError::UnexpectedShape(_) | ValidationError::InvalidJson(_) => None,
        }
    }
}
