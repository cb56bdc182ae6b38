//! Community records for the experimental, v1 and cyberstorm surfaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use super::fields::Fields;
use crate::error::ValidationError;

/// A game community as returned by `/api/experimental/community/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Community {
    /// Stable slug used by every community-scoped call.
    pub identifier: String,
    pub name: String,
    pub discord_url: Option<Url>,
    pub wiki_url: Option<Url>,
    pub require_package_listing_approval: bool,
}

impl TryFrom<Map<String, Value>> for Community {
    type Error = ValidationError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let f = Fields::new(&object);
        Ok(Self {
            identifier: f.required("identifier")?,
            name: f.required("name")?,
            discord_url: f.optional_url("discord_url")?,
            wiki_url: f.optional_url("wiki_url")?,
            require_package_listing_approval: f.or("require_package_listing_approval", false)?,
        })
    }
}

/// A game community as returned by `/api/v1/community/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct CommunityV1 {
    pub identifier: String,
    pub name: String,
    pub discord_url: Option<Url>,
    pub wiki_url: Option<Url>,
    pub require_package_category_choice: bool,
}

impl TryFrom<Map<String, Value>> for CommunityV1 {
    type Error = ValidationError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let f = Fields::new(&object);
        Ok(Self {
            identifier: f.required("identifier")?,
            name: f.required("name")?,
            discord_url: f.optional_url("discord_url")?,
            wiki_url: f.optional_url("wiki_url")?,
            require_package_category_choice: f.or("require_package_category_choice", false)?,
        })
    }
}

/// Detailed community record from `/api/cyberstorm/community/{id}/`, with
/// artwork links and catalog counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct CyberstormCommunity {
    pub name: String,
    pub identifier: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub discord_url: Option<String>,
    pub wiki_url: Option<String>,
    pub datetime_created: DateTime<Utc>,
    pub background_image_url: Option<String>,
    pub hero_image_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub icon_url: Option<String>,
    pub community_icon_url: Option<String>,
    pub total_download_count: Option<u64>,
    pub total_package_count: Option<u64>,
    pub has_mod_manager_support: bool,
    pub is_listed: bool,
}

impl TryFrom<Map<String, Value>> for CyberstormCommunity {
    type Error = ValidationError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let f = Fields::new(&object);
        Ok(Self {
            name: f.required("name")?,
            identifier: f.required("identifier")?,
            short_description: f.optional("short_description")?,
            description: f.optional("description")?,
            discord_url: f.optional("discord_url")?,
            wiki_url: f.optional("wiki_url")?,
            datetime_created: f.timestamp("datetime_created")?,
            background_image_url: f.optional("background_image_url")?,
            hero_image_url: f.optional("hero_image_url")?,
            cover_image_url: f.optional("cover_image_url")?,
            icon_url: f.optional("icon_url")?,
            community_icon_url: f.optional("community_icon_url")?,
            total_download_count: f.optional("total_download_count")?,
            total_package_count: f.optional("total_package_count")?,
            has_mod_manager_support: f.required("has_mod_manager_support")?,
            is_listed: f.required("is_listed")?,
        })
    }
}
