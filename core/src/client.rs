//! Stateful façade over `ThunderstoreApi`.
//!
//! # Design
//! `ThunderstoreClient` owns its configuration and, once used, a transport.
//! The transport is opened lazily by the first operation and released by
//! `close()` or when the client is dropped, whichever comes first; closing
//! twice, or closing a client that never connected, does nothing. An
//! operation after `close()` reconnects.
//!
//! Every operation is one blocking GET. Operations take `&mut self` because
//! the first one opens the transport, so a client cannot be shared between
//! threads without external locking; use one client per thread instead.

use tracing::debug;

use crate::api::{PackageQuery, ThunderstoreApi};
use crate::config::{ClientConfig, ConfigError};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::model::{
    Community, CommunityV1, CyberstormCommunity, Package, PackageCategory, PackageExperimental,
    PackageMetrics, PackageVersionExperimental, PackageVersionMetrics, Page,
};
use crate::transport::{Connector, HttpConnector, Transport};

/// Blocking client for the Thunderstore API.
///
/// ```no_run
/// use thunderstore_sdk::{PackageQuery, ThunderstoreClient};
///
/// let mut client = ThunderstoreClient::default();
/// let packages = client.list_packages(&PackageQuery::new().community("riskofrain2"))?;
/// for package in packages.iter().take(5) {
///     println!("{} - rating {}", package.full_name, package.rating_score);
/// }
/// # Ok::<(), thunderstore_sdk::ApiError>(())
/// ```
pub struct ThunderstoreClient<C: Connector = HttpConnector> {
    config: ClientConfig,
    api: ThunderstoreApi,
    connector: C,
    transport: Option<C::Transport>,
}

impl ThunderstoreClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(config, HttpConnector)
    }

    /// Client configured from `THUNDERSTORE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(ClientConfig::from_env()?))
    }
}

impl Default for ThunderstoreClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl<C: Connector> ThunderstoreClient<C> {
    pub fn with_connector(config: ClientConfig, connector: C) -> Self {
        Self {
            api: ThunderstoreApi::new(&config),
            config,
            connector,
            transport: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The request builder/parser this client drives.
    pub fn api(&self) -> &ThunderstoreApi {
        &self.api
    }

    /// Whether a transport is currently held.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Release the transport. No-op when nothing is open.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!(base_url = %self.config.base_url(), "closed connection");
        }
    }

    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let transport = match self.transport.take() {
            Some(transport) => transport,
            None => {
                let transport = self.connector.connect(&self.config)?;
                debug!(base_url = %self.config.base_url(), "opened connection");
                transport
            }
        };
        debug!(url = %request.url, query = ?request.query, "sending request");
        self.transport.insert(transport).execute(request)
    }

    /// One page of the v1 package listing, in server order.
    pub fn list_packages(&mut self, query: &PackageQuery) -> Result<Vec<Package>, ApiError> {
        let request = self.api.build_list_packages(query);
        let response = self.send(&request)?;
        self.api.parse_list_packages(response)
    }

    /// Look up `<owner>-<name>` in the full v1 listing.
    ///
    /// Returns `Ok(None)` when the listing has no such package. A 404 on the
    /// listing request is still `ApiError::NotFound`; compare
    /// [`ThunderstoreClient::get_package_experimental`], which maps a 404 to
    /// `None`.
    pub fn get_package(&mut self, owner: &str, name: &str) -> Result<Option<Package>, ApiError> {
        let request = self.api.build_get_package();
        let response = self.send(&request)?;
        self.api.parse_get_package(response, owner, name)
    }

    /// Case-insensitive substring search over name, full name, owner and
    /// categories.
    ///
    /// The search runs client-side over a single listing response, so it only
    /// sees what that one response contains.
    pub fn search_packages(
        &mut self,
        query: &str,
        community: Option<&str>,
    ) -> Result<Vec<Package>, ApiError> {
        let request = self.api.build_search_packages(community);
        let response = self.send(&request)?;
        self.api.parse_search_packages(response, query)
    }

    pub fn list_communities(&mut self) -> Result<Vec<Community>, ApiError> {
        let request = self.api.build_list_communities();
        let response = self.send(&request)?;
        self.api.parse_list_communities(response)
    }

    pub fn get_community(&mut self, identifier: &str) -> Result<Community, ApiError> {
        let request = self.api.build_get_community(identifier)?;
        let response = self.send(&request)?;
        self.api.parse_get_community(response)
    }

    pub fn list_communities_v1(&mut self) -> Result<Vec<CommunityV1>, ApiError> {
        let request = self.api.build_list_communities_v1();
        let response = self.send(&request)?;
        self.api.parse_list_communities_v1(response)
    }

    pub fn get_community_v1(&mut self, identifier: &str) -> Result<CommunityV1, ApiError> {
        let request = self.api.build_get_community_v1(identifier)?;
        let response = self.send(&request)?;
        self.api.parse_get_community_v1(response)
    }

    pub fn get_cyberstorm_community(
        &mut self,
        community_id: &str,
    ) -> Result<CyberstormCommunity, ApiError> {
        let request = self.api.build_get_cyberstorm_community(community_id)?;
        let response = self.send(&request)?;
        self.api.parse_get_cyberstorm_community(response)
    }

    pub fn list_community_categories(
        &mut self,
        community: &str,
        cursor: Option<&str>,
    ) -> Result<Page<PackageCategory>, ApiError> {
        let request = self.api.build_list_community_categories(community, cursor)?;
        let response = self.send(&request)?;
        self.api.parse_list_community_categories(response)
    }

    /// One cursor page of the experimental package listing. Pass
    /// `page.next_cursor()` back in to fetch the following page.
    pub fn list_packages_experimental(
        &mut self,
        cursor: Option<&str>,
    ) -> Result<Page<PackageExperimental>, ApiError> {
        let request = self.api.build_list_packages_experimental(cursor);
        let response = self.send(&request)?;
        self.api.parse_list_packages_experimental(response)
    }

    /// `Ok(None)` when the server answers 404.
    pub fn get_package_experimental(
        &mut self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PackageExperimental>, ApiError> {
        let request = self.api.build_get_package_experimental(namespace, name)?;
        let response = self.send(&request)?;
        self.api.parse_get_package_experimental(response)
    }

    /// `Ok(None)` when the server answers 404.
    pub fn get_package_version_experimental(
        &mut self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Result<Option<PackageVersionExperimental>, ApiError> {
        let request = self
            .api
            .build_get_package_version_experimental(namespace, name, version)?;
        let response = self.send(&request)?;
        self.api.parse_get_package_version_experimental(response)
    }

    /// `Ok(None)` when the server answers 404.
    pub fn get_package_metrics(
        &mut self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PackageMetrics>, ApiError> {
        let request = self.api.build_get_package_metrics(namespace, name)?;
        let response = self.send(&request)?;
        self.api.parse_get_package_metrics(response)
    }

    /// `Ok(None)` when the server answers 404.
    pub fn get_package_version_metrics(
        &mut self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Result<Option<PackageVersionMetrics>, ApiError> {
        let request = self
            .api
            .build_get_package_version_metrics(namespace, name, version)?;
        let response = self.send(&request)?;
        self.api.parse_get_package_version_metrics(response)
    }
}

impl<C: Connector> Drop for ThunderstoreClient<C> {
    fn drop(&mut self) {
        self.close();
    }
}
