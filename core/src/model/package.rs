//! Package, version and category records.
//!
//! The v1 and experimental APIs describe the same packages with different
//! field names (`owner` vs `namespace`), different types (`rating_score` as an
//! integer vs a string) and different completeness, so each surface gets its
//! own record type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;
use uuid::Uuid;

use super::fields::Fields;
use crate::error::ValidationError;

/// A category tag a package can be listed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct PackageCategory {
    pub name: String,
    pub slug: String,
}

impl TryFrom<Map<String, Value>> for PackageCategory {
    type Error = ValidationError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let f = Fields::new(&object);
        Ok(Self {
            name: f.required("name")?,
            slug: f.required("slug")?,
        })
    }
}

/// One published version of a package, as returned by `/api/v1/package/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct PackageVersion {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub icon: Url,
    pub version_number: String,
    /// Dependency strings of the form `<namespace>-<name>-<version>`.
    pub dependencies: Vec<String>,
    pub download_url: Url,
    pub downloads: u64,
    pub date_created: DateTime<Utc>,
    pub website_url: Option<Url>,
    pub is_active: bool,
    pub uuid4: Uuid,
    /// Size of the package archive in bytes.
    pub file_size: u64,
}

impl TryFrom<Map<String, Value>> for PackageVersion {
    type Error = ValidationError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let f = Fields::new(&object);
        Ok(Self {
            name: f.required("name")?,
            full_name: f.required("full_name")?,
            description: f.required("description")?,
            icon: f.url("icon")?,
            version_number: f.required("version_number")?,
            dependencies: f.required("dependencies")?,
            download_url: f.url("download_url")?,
            downloads: f.required("downloads")?,
            date_created: f.timestamp("date_created")?,
            website_url: f.optional_url("website_url")?,
            is_active: f.required("is_active")?,
            uuid4: f.required("uuid4")?,
            file_size: f.required("file_size")?,
        })
    }
}

/// A package as returned by the stable v1 listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Package {
    pub name: String,
    /// Conventionally `<owner>-<name>`.
    pub full_name: String,
    pub owner: String,
    pub package_url: Url,
    pub donation_link: Option<Url>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    pub uuid4: Uuid,
    /// Can go negative on some deployments.
    pub rating_score: i64,
    pub is_pinned: bool,
    pub is_deprecated: bool,
    pub has_nsfw_content: bool,
    pub categories: Vec<String>,
    /// Newest first. May be empty.
    pub versions: Vec<PackageVersion>,
}

impl TryFrom<Map<String, Value>> for Package {
    type Error = ValidationError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let f = Fields::new(&object);
        Ok(Self {
            name: f.required("name")?,
            full_name: f.required("full_name")?,
            owner: f.required("owner")?,
            package_url: f.url("package_url")?,
            donation_link: f.optional_url("donation_link")?,
            date_created: f.timestamp("date_created")?,
            date_updated: f.timestamp("date_updated")?,
            uuid4: f.required("uuid4")?,
            rating_score: f.required("rating_score")?,
            is_pinned: f.required("is_pinned")?,
            is_deprecated: f.required("is_deprecated")?,
            has_nsfw_content: f.required("has_nsfw_content")?,
            categories: f.required("categories")?,
            versions: f.required("versions")?,
        })
    }
}

impl Package {
    /// The most recent version; the API lists versions newest first.
    pub fn latest_version(&self) -> Option<&PackageVersion> {
        self.versions.first()
    }

    pub fn total_downloads(&self) -> u64 {
        self.versions.iter().map(|v| v.downloads).sum()
    }

    /// True when the name, full name, owner, or any category contains `query`,
    /// ignoring case.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        [&self.name, &self.full_name, &self.owner]
            .into_iter()
            .chain(self.categories.iter())
            .any(|haystack| haystack.to_lowercase().contains(&needle))
    }
}

/// A package version as returned by the experimental API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct PackageVersionExperimental {
    pub namespace: Option<String>,
    pub name: String,
    pub version_number: String,
    pub full_name: Option<String>,
    pub description: String,
    pub icon: Option<Url>,
    pub dependencies: Vec<String>,
    pub download_url: Option<Url>,
    pub downloads: u64,
    pub date_created: Option<DateTime<Utc>>,
    pub website_url: Option<String>,
    pub is_active: bool,
}

impl TryFrom<Map<String, Value>> for PackageVersionExperimental {
    type Error = ValidationError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let f = Fields::new(&object);
        Ok(Self {
            namespace: f.optional("namespace")?,
            name: f.required("name")?,
            version_number: f.required("version_number")?,
            full_name: f.optional("full_name")?,
            description: f.required("description")?,
            icon: f.optional_url("icon")?,
            dependencies: f.or_default("dependencies")?,
            download_url: f.optional_url("download_url")?,
            downloads: f.or("downloads", 0)?,
            date_created: f.optional_timestamp("date_created")?,
            website_url: f.optional("website_url")?,
            is_active: f.or("is_active", true)?,
        })
    }
}

/// How a package is listed inside one community (experimental API).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct PackageListingExperimental {
    pub has_nsfw_content: bool,
    pub categories: Vec<String>,
    pub community: Option<String>,
    pub review_status: String,
}

impl TryFrom<Map<String, Value>> for PackageListingExperimental {
    type Error = ValidationError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let f = Fields::new(&object);
        Ok(Self {
            has_nsfw_content: f.or("has_nsfw_content", false)?,
            categories: f.or_default("categories")?,
            community: f.optional("community")?,
            review_status: f.or("review_status", "unreviewed".to_string())?,
        })
    }
}

/// A package as returned by the experimental API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct PackageExperimental {
    pub namespace: Option<String>,
    pub name: String,
    pub full_name: Option<String>,
    pub owner: Option<String>,
    pub package_url: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_updated: Option<DateTime<Utc>>,
    /// Sent as a string by this API surface.
    pub rating_score: Option<String>,
    pub is_pinned: bool,
    pub is_deprecated: bool,
    pub total_downloads: Option<String>,
    /// Latest version state; not cross-checked against any version list.
    pub latest: Option<PackageVersionExperimental>,
    pub community_listings: Vec<PackageListingExperimental>,
}

impl TryFrom<Map<String, Value>> for PackageExperimental {
    type Error = ValidationError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let f = Fields::new(&object);
        Ok(Self {
            namespace: f.optional("namespace")?,
            name: f.required("name")?,
            full_name: f.optional("full_name")?,
            owner: f.optional("owner")?,
            package_url: f.optional("package_url")?,
            date_created: f.optional_timestamp("date_created")?,
            date_updated: f.optional_timestamp("date_updated")?,
            rating_score: f.optional("rating_score")?,
            is_pinned: f.or("is_pinned", false)?,
            is_deprecated: f.or("is_deprecated", false)?,
            total_downloads: f.optional("total_downloads")?,
            latest: f.optional("latest")?,
            community_listings: f.or_default("community_listings")?,
        })
    }
}
