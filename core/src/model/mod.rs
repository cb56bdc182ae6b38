//! Typed records for Thunderstore API responses.
//!
//! # Design
//! Every record is an immutable value built from one decoded JSON object.
//! Records implement `TryFrom<Map<String, Value>>` with a field-by-field
//! reader, and route serde's `Deserialize` through that impl, so
//! `serde_json::from_str::<Vec<Package>>` and `Package::from_value` share the
//! same validation: required fields, URL syntax, timestamp parsing, and
//! defaults for optional fields.
//!
//! The v1, experimental and cyberstorm surfaces expose incompatible shapes
//! for the same concepts. They are kept as separate types instead of one
//! merged record with everything optional.

mod community;
mod fields;
mod metrics;
mod package;
mod page;

use serde_json::{Map, Value};

use crate::error::ValidationError;

pub use community::{Community, CommunityV1, CyberstormCommunity};
pub use metrics::{PackageMetrics, PackageVersionMetrics};
pub use package::{
    Package, PackageCategory, PackageExperimental, PackageListingExperimental, PackageVersion,
    PackageVersionExperimental,
};
pub use page::Page;

/// A record that can be validated out of a JSON object.
pub trait Record: TryFrom<Map<String, Value>, Error = ValidationError> {
    /// Validate `value`, which must be a JSON object.
    fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(object) => Self::try_from(object),
            other => Err(ValidationError::UnexpectedShape(format!(
                "expected a JSON object, found {}",
                fields::value_kind(&other)
            ))),
        }
    }
}

impl<T> Record for T where T: TryFrom<Map<String, Value>, Error = ValidationError> {}
