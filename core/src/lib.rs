//! Typed blocking client for the Thunderstore mod-distribution API.
//!
//! # Overview
//! Covers the read-only endpoints of the stable v1, experimental and
//! cyberstorm API surfaces. Responses are validated into typed records and
//! failure statuses become typed errors.
//!
//! # Design
//! - `ThunderstoreApi` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`. It never touches the network, so
//!   callers with their own HTTP stack can use it directly.
//! - `ThunderstoreClient` drives `ThunderstoreApi` through a lazily opened
//!   `Transport` (a `ureq` agent by default) and releases it on `close()` or
//!   drop.
//! - Each API surface has its own record types; shapes that disagree across
//!   surfaces are never merged.
//! - There is no caching, retrying or automatic pagination. Paginated
//!   endpoints return one `Page` with its raw `next`/`previous` tokens.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod transport;

pub use api::{PackageQuery, ThunderstoreApi};
pub use client::ThunderstoreClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ValidationError};
pub use http::{HttpRequest, HttpResponse};
pub use model::{
    Community, CommunityV1, CyberstormCommunity, Package, PackageCategory, PackageExperimental,
    PackageListingExperimental, PackageMetrics, PackageVersion, PackageVersionExperimental,
    PackageVersionMetrics, Page, Record,
};
pub use transport::{Connector, HttpConnector, HttpTransport, Transport};
