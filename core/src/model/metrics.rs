//! Download and rating counters from `/api/v1/package-metrics/`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::fields::Fields;
use crate::error::ValidationError;

/// Aggregated metrics for a package across all of its versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct PackageMetrics {
    pub downloads: u64,
    pub rating_score: i64,
    pub latest_version: String,
}

impl TryFrom<Map<String, Value>> for PackageMetrics {
    type Error = ValidationError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let f = Fields::new(&object);
        Ok(Self {
            downloads: f.required("downloads")?,
            rating_score: f.required("rating_score")?,
            latest_version: f.required("latest_version")?,
        })
    }
}

/// Download count for a single version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct PackageVersionMetrics {
    pub downloads: u64,
}

impl TryFrom<Map<String, Value>> for PackageVersionMetrics {
    type Error = ValidationError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let f = Fields::new(&object);
        Ok(Self {
            downloads: f.required("downloads")?,
        })
    }
}
