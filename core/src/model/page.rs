//! Paginated list envelope and list-body shape detection.
//!
//! # Design
//! List endpoints answer either with a bare JSON array or with an object
//! carrying `results` plus pagination metadata. Both are normalized into a
//! `Page`; a bare array becomes a page with no count and no neighbours. Any
//! other shape is treated as an empty page rather than an error, so callers
//! always get a sequence back from a successful list call.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use url::Url;

use super::fields::{value_kind, Fields};
use super::Record;
use crate::error::ValidationError;

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: Option<u64>,
    /// Token (usually a full URL) for the following page; `None` on the last page.
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: None,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }

    /// Cursor to pass to the next `list_*` call, if there is a next page.
    pub fn next_cursor(&self) -> Option<String> {
        self.next.as_deref().map(cursor_of)
    }

    pub fn previous_cursor(&self) -> Option<String> {
        self.previous.as_deref().map(cursor_of)
    }

    fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect::<Result<_, _>>()?,
        })
    }
}

impl<T: Record> Page<T> {
    /// Normalize a decoded list body and validate every element.
    pub fn from_list_body(body: Value) -> Result<Self, ValidationError> {
        split_list_body(body)?.try_map(T::from_value)
    }
}

fn split_list_body(body: Value) -> Result<Page<Value>, ValidationError> {
    match body {
        Value::Array(results) => Ok(Page {
            results,
            ..Page::default()
        }),
        Value::Object(object) if object.contains_key("results") => {
            let f = Fields::new(&object);
            Ok(Page {
                count: f.optional("count")?,
                next: f.optional("next")?,
                previous: f.optional("previous")?,
                results: f.or_default("results")?,
            })
        }
        other => {
            warn!(shape = value_kind(&other), "unrecognized list body, returning no results");
            Ok(Page::default())
        }
    }
}

/// The `cursor` query parameter when `token` is a URL carrying one, else the
/// token itself.
fn cursor_of(token: &str) -> String {
    Url::parse(token)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "cursor")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_else(|| token.to_string())
}
