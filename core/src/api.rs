//! Stateless request builder and response parser for the Thunderstore API.
//!
//! # Design
//! `ThunderstoreApi` holds only the base URL and the optional bearer token.
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`. The
//! caller (normally `ThunderstoreClient`) executes the round-trip in between,
//! keeping status classification and record mapping deterministic and free
//! of I/O.
//!
//! Status classification is the same for every endpoint: 200 is decoded,
//! 401/404/429 get dedicated errors, anything else is `HttpError`. A few
//! lookups report a 404 as `Ok(None)` instead; which ones is part of each
//! method's contract and differs between API surfaces.

use serde_json::Value;
use url::Url;

use crate::config::{ClientConfig, USER_AGENT};
use crate::error::{ApiError, ValidationError};
use crate::http::{HttpRequest, HttpResponse};
use crate::model::{
    Community, CommunityV1, CyberstormCommunity, Package, PackageCategory, PackageExperimental,
    PackageMetrics, PackageVersionExperimental, PackageVersionMetrics, Page, Record,
};

/// Filters for the v1 package listing. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageQuery {
    pub community: Option<String>,
    /// Sort key such as `-date_updated`, `name` or `-rating_score`.
    pub ordering: Option<String>,
    pub page: Option<u32>,
}

impl PackageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn community(mut self, community: impl Into<String>) -> Self {
        self.community = Some(community.into());
        self
    }

    pub fn ordering(mut self, ordering: impl Into<String>) -> Self {
        self.ordering = Some(ordering.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Synchronous, stateless client for the Thunderstore API.
#[derive(Debug, Clone)]
pub struct ThunderstoreApi {
    base_url: Url,
    api_token: Option<String>,
}

impl ThunderstoreApi {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url().clone(),
            api_token: config.api_token().map(str::to_string),
        }
    }

    // --- v1 packages -------------------------------------------------------

    pub fn build_list_packages(&self, query: &PackageQuery) -> HttpRequest {
        let mut params = Vec::new();
        if let Some(community) = &query.community {
            params.push(("community", community.clone()));
        }
        if let Some(ordering) = &query.ordering {
            params.push(("ordering", ordering.clone()));
        }
        if let Some(page) = query.page {
            params.push(("page", page.to_string()));
        }
        self.get(&["api", "v1", "package"], params)
    }

    /// Packages in listing order. Accepts both a bare array and a paginated
    /// envelope; an unrecognized body yields an empty list.
    pub fn parse_list_packages(&self, response: HttpResponse) -> Result<Vec<Package>, ApiError> {
        Ok(parse_page(response)?.results)
    }

    /// The v1 surface has no lookup-by-name endpoint, so a lookup fetches the
    /// full listing and scans it.
    pub fn build_get_package(&self) -> HttpRequest {
        self.build_list_packages(&PackageQuery::default())
    }

    /// First package whose full name is `<owner>-<name>`, or `None` if the
    /// listing has no such entry. A 404 on the listing itself is still
    /// `ApiError::NotFound`.
    pub fn parse_get_package(
        &self,
        response: HttpResponse,
        owner: &str,
        name: &str,
    ) -> Result<Option<Package>, ApiError> {
        let full_name = format!("{owner}-{name}");
        Ok(self
            .parse_list_packages(response)?
            .into_iter()
            .find(|package| package.full_name == full_name))
    }

    pub fn build_search_packages(&self, community: Option<&str>) -> HttpRequest {
        let query = PackageQuery {
            community: community.map(str::to_string),
            ..PackageQuery::default()
        };
        self.build_list_packages(&query)
    }

    /// Client-side search over one listing response: keeps, in order, the
    /// packages whose name, full name, owner or any category contains `query`
    /// case-insensitively. Only what this one response contains is searched.
    pub fn parse_search_packages(
        &self,
        response: HttpResponse,
        query: &str,
    ) -> Result<Vec<Package>, ApiError> {
        let mut packages = self.parse_list_packages(response)?;
        packages.retain(|package| package.matches(query));
        Ok(packages)
    }

    // --- communities -------------------------------------------------------

    pub fn build_list_communities(&self) -> HttpRequest {
        self.get(&["api", "experimental", "community"], Vec::new())
    }

    pub fn parse_list_communities(&self, response: HttpResponse) -> Result<Vec<Community>, ApiError> {
        Ok(parse_page(response)?.results)
    }

    pub fn build_get_community(&self, identifier: &str) -> Result<HttpRequest, ApiError> {
        self.get_at(&["api", "experimental", "community", identifier], Vec::new())
    }

    pub fn parse_get_community(&self, response: HttpResponse) -> Result<Community, ApiError> {
        parse_record(response)
    }

    pub fn build_list_communities_v1(&self) -> HttpRequest {
        self.get(&["api", "v1", "community"], Vec::new())
    }

    pub fn parse_list_communities_v1(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<CommunityV1>, ApiError> {
        Ok(parse_page(response)?.results)
    }

    pub fn build_get_community_v1(&self, identifier: &str) -> Result<HttpRequest, ApiError> {
        self.get_at(&["api", "v1", "community", identifier], Vec::new())
    }

    pub fn parse_get_community_v1(&self, response: HttpResponse) -> Result<CommunityV1, ApiError> {
        parse_record(response)
    }

    pub fn build_get_cyberstorm_community(
        &self,
        community_id: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.get_at(&["api", "cyberstorm", "community", community_id], Vec::new())
    }

    pub fn parse_get_cyberstorm_community(
        &self,
        response: HttpResponse,
    ) -> Result<CyberstormCommunity, ApiError> {
        parse_record(response)
    }

    pub fn build_list_community_categories(
        &self,
        community: &str,
        cursor: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        self.get_at(
            &["api", "experimental", "community", community, "category"],
            cursor_param(cursor),
        )
    }

    pub fn parse_list_community_categories(
        &self,
        response: HttpResponse,
    ) -> Result<Page<PackageCategory>, ApiError> {
        parse_page(response)
    }

    // --- experimental packages ---------------------------------------------

    pub fn build_list_packages_experimental(&self, cursor: Option<&str>) -> HttpRequest {
        self.get(&["api", "experimental", "package"], cursor_param(cursor))
    }

    pub fn parse_list_packages_experimental(
        &self,
        response: HttpResponse,
    ) -> Result<Page<PackageExperimental>, ApiError> {
        parse_page(response)
    }

    pub fn build_get_package_experimental(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.get_at(&["api", "experimental", "package", namespace, name], Vec::new())
    }

    /// `None` on 404.
    pub fn parse_get_package_experimental(
        &self,
        response: HttpResponse,
    ) -> Result<Option<PackageExperimental>, ApiError> {
        not_found_as_none(parse_record(response))
    }

    pub fn build_get_package_version_experimental(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.get_at(
            &["api", "experimental", "package", namespace, name, version],
            Vec::new(),
        )
    }

    /// `None` on 404.
    pub fn parse_get_package_version_experimental(
        &self,
        response: HttpResponse,
    ) -> Result<Option<PackageVersionExperimental>, ApiError> {
        not_found_as_none(parse_record(response))
    }

    // --- metrics -----------------------------------------------------------

    pub fn build_get_package_metrics(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.get_at(&["api", "v1", "package-metrics", namespace, name], Vec::new())
    }

    /// `None` on 404.
    pub fn parse_get_package_metrics(
        &self,
        response: HttpResponse,
    ) -> Result<Option<PackageMetrics>, ApiError> {
        not_found_as_none(parse_record(response))
    }

    pub fn build_get_package_version_metrics(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.get_at(
            &["api", "v1", "package-metrics", namespace, name, version],
            Vec::new(),
        )
    }

    /// `None` on 404.
    pub fn parse_get_package_version_metrics(
        &self,
        response: HttpResponse,
    ) -> Result<Option<PackageVersionMetrics>, ApiError> {
        not_found_as_none(parse_record(response))
    }

    // --- helpers -----------------------------------------------------------

    /// GET request for `segments` (each percent-encoded, with a trailing
    /// slash) under the base URL.
    fn get(&self, segments: &[&str], query: Vec<(&str, String)>) -> HttpRequest {
        let mut url = self.base_url.clone();
        // ClientConfig only accepts URLs that can be a base.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments).push("");
        }
        HttpRequest {
            url: url.into(),
            query: query
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
            headers: self.headers(),
        }
    }

    /// Like [`ThunderstoreApi::get`], for paths that carry caller-supplied
    /// segments. URL parsing collapses `.` and `..`, and an empty segment
    /// yields `//`; either would address a different endpoint.
    fn get_at(
        &self,
        segments: &[&str],
        query: Vec<(&str, String)>,
    ) -> Result<HttpRequest, ApiError> {
        if let Some(segment) = segments.iter().find(|s| is_unaddressable(s)) {
            return Err(ApiError::InvalidPathSegment(segment.to_string()));
        }
        Ok(self.get(segments, query))
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if let Some(token) = &self.api_token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }
}

/// Segments that cannot be carried verbatim in a path.
fn is_unaddressable(segment: &str) -> bool {
    matches!(segment, "" | "." | "..")
}

fn cursor_param(cursor: Option<&str>) -> Vec<(&'static str, String)> {
    cursor
        .map(|cursor| vec![("cursor", cursor.to_string())])
        .unwrap_or_default()
}

/// Map non-200 status codes to the matching `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        200 => Ok(()),
        401 => Err(ApiError::Authentication { status: 401 }),
        404 => Err(ApiError::NotFound { status: 404 }),
        429 => Err(ApiError::RateLimited { status: 429 }),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

fn parse_json(response: HttpResponse) -> Result<Value, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body)
        .map_err(|e| ValidationError::InvalidJson(e.to_string()).into())
}

fn parse_record<T: Record>(response: HttpResponse) -> Result<T, ApiError> {
    Ok(T::from_value(parse_json(response)?)?)
}

fn parse_page<T: Record>(response: HttpResponse) -> Result<Page<T>, ApiError> {
    Ok(Page::from_list_body(parse_json(response)?)?)
}

fn not_found_as_none<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ApiError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn api() -> ThunderstoreApi {
        ThunderstoreApi::new(&ClientConfig::new("http://localhost:3000").unwrap())
    }

    fn ok(body: Value) -> HttpResponse {
        HttpResponse::new(200, body.to_string())
    }

    fn package(owner: &str, name: &str, categories: &[&str]) -> Value {
        json!({
            "name": name,
            "full_name": format!("{owner}-{name}"),
            "owner": owner,
            "package_url": format!("https://thunderstore.io/package/{owner}/{name}/"),
            "date_created": "2024-01-01T12:00:00Z",
            "date_updated": "2024-01-02T12:00:00Z",
            "uuid4": "00000000-0000-0000-0000-000000000001",
            "rating_score": 100,
            "is_pinned": false,
            "is_deprecated": false,
            "has_nsfw_content": false,
            "categories": categories,
            "versions": []
        })
    }

    #[test]
    fn build_list_packages_without_filters() {
        let req = api().build_list_packages(&PackageQuery::new());
        assert_eq!(req.url, "http://localhost:3000/api/v1/package/");
        assert!(req.query.is_empty());
        assert_eq!(req.header("user-agent"), Some(USER_AGENT));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn build_list_packages_with_filters() {
        let query = PackageQuery::new()
            .community("riskofrain2")
            .ordering("-rating_score")
            .page(2);
        let req = api().build_list_packages(&query);
        assert_eq!(req.query_param("community"), Some("riskofrain2"));
        assert_eq!(req.query_param("ordering"), Some("-rating_score"));
        assert_eq!(req.query_param("page"), Some("2"));
    }

    #[test]
    fn bearer_token_is_attached() {
        let config = ClientConfig::default().with_api_token("test_token");
        let req = ThunderstoreApi::new(&config).build_list_communities();
        assert_eq!(req.url, "https://thunderstore.io/api/experimental/community/");
        assert_eq!(req.header("Authorization"), Some("Bearer test_token"));
    }

    #[test]
    fn path_segments_are_encoded() {
        let req = api().build_get_package_experimental("some team", "a/b").unwrap();
        assert_eq!(
            req.url,
            "http://localhost:3000/api/experimental/package/some%20team/a%2Fb/"
        );
    }

    #[test]
    fn dot_and_empty_segments_are_refused() {
        let api = api();
        let err = api.build_get_community("..").unwrap_err();
        assert!(matches!(err, ApiError::InvalidPathSegment(ref s) if s == ".."));
        assert_eq!(err.status(), None);
        assert!(matches!(
            api.build_get_package_experimental(".", "x"),
            Err(ApiError::InvalidPathSegment(_))
        ));
        assert!(matches!(
            api.build_get_package_version_metrics("ebkr", "r2modman", ""),
            Err(ApiError::InvalidPathSegment(_))
        ));
        assert!(api.build_list_community_categories("..", None).is_err());
    }

    #[test]
    fn dotted_names_that_are_not_dot_segments_pass_through() {
        let api = api();
        assert_eq!(
            api.build_get_package_version_experimental("team", "mod.core", "...")
                .unwrap()
                .url,
            "http://localhost:3000/api/experimental/package/team/mod.core/.../"
        );
        assert_eq!(
            api.build_get_community("%2e%2e").unwrap().url,
            "http://localhost:3000/api/experimental/community/%252e%252e/"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let config = ClientConfig::new("http://localhost:3000/mirror/").unwrap();
        let req = ThunderstoreApi::new(&config)
            .build_get_package_metrics("ebkr", "r2modman")
            .unwrap();
        assert_eq!(
            req.url,
            "http://localhost:3000/mirror/api/v1/package-metrics/ebkr/r2modman/"
        );
    }

    #[test]
    fn versioned_paths() {
        let api = api();
        assert_eq!(
            api.build_get_package_version_experimental("bbepis", "BepInExPack", "5.4.2100")
                .unwrap()
                .url,
            "http://localhost:3000/api/experimental/package/bbepis/BepInExPack/5.4.2100/"
        );
        assert_eq!(
            api.build_get_package_version_metrics("bbepis", "BepInExPack", "5.4.2100")
                .unwrap()
                .url,
            "http://localhost:3000/api/v1/package-metrics/bbepis/BepInExPack/5.4.2100/"
        );
        assert_eq!(
            api.build_get_cyberstorm_community("riskofrain2").unwrap().url,
            "http://localhost:3000/api/cyberstorm/community/riskofrain2/"
        );
        assert_eq!(
            api.build_get_community_v1("riskofrain2").unwrap().url,
            "http://localhost:3000/api/v1/community/riskofrain2/"
        );
    }

    #[test]
    fn cursor_is_only_sent_when_given() {
        let api = api();
        assert!(api.build_list_packages_experimental(None).query.is_empty());
        let req = api.build_list_community_categories("riskofrain2", Some("cD0y")).unwrap();
        assert_eq!(
            req.url,
            "http://localhost:3000/api/experimental/community/riskofrain2/category/"
        );
        assert_eq!(req.query_param("cursor"), Some("cD0y"));
    }

    #[test]
    fn list_packages_accepts_bare_array_and_envelope() {
        let api = api();
        let bare = ok(json!([package("a", "One", &[]), package("b", "Two", &[])]));
        let names: Vec<_> = api
            .parse_list_packages(bare)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["One", "Two"]);

        let envelope = ok(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [package("a", "One", &[])]
        }));
        assert_eq!(api.parse_list_packages(envelope).unwrap().len(), 1);
    }

    #[test]
    fn list_packages_unrecognized_shape_is_empty() {
        let packages = api().parse_list_packages(ok(json!({"detail": "ok"}))).unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn list_packages_invalid_record_is_validation_error() {
        let mut bad = package("a", "One", &[]);
        bad.as_object_mut().unwrap().remove("full_name");
        let err = api().parse_list_packages(ok(json!([bad]))).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::MissingField { ref field }) if field == "full_name"
        ));
    }

    #[test]
    fn bad_json_is_validation_error() {
        let err = api()
            .parse_list_packages(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::InvalidJson(_))));
    }

    #[test]
    fn status_classification() {
        let api = api();
        for status in [401u16, 404, 429, 500, 503] {
            let err = api
                .parse_list_communities(HttpResponse::new(status, "failure text"))
                .unwrap_err();
            assert_eq!(err.status(), Some(status), "status {status}");
            match status {
                401 => assert!(matches!(err, ApiError::Authentication { .. })),
                404 => assert!(matches!(err, ApiError::NotFound { .. })),
                429 => assert!(matches!(err, ApiError::RateLimited { .. })),
                _ => assert!(matches!(err, ApiError::HttpError { ref body, .. } if body == "failure text")),
            }
        }
    }

    #[test]
    fn http_error_keeps_raw_body() {
        let err = api()
            .parse_get_community(HttpResponse::new(502, "<html>bad gateway</html>"))
            .unwrap_err();
        match err {
            ApiError::HttpError { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "<html>bad gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn get_package_scans_listing_by_full_name() {
        let api = api();
        let listing = json!([
            package("ebkr", "r2modman", &["Tools"]),
            package("bbepis", "BepInExPack", &["Libraries"]),
        ]);
        let found = api
            .parse_get_package(ok(listing.clone()), "bbepis", "BepInExPack")
            .unwrap()
            .unwrap();
        assert_eq!(found.owner, "bbepis");
        let missing = api.parse_get_package(ok(listing), "nobody", "Nothing").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn get_package_listing_404_is_not_found() {
        let err = api()
            .parse_get_package(HttpResponse::new(404, "Not found"), "NonExistent", "Package")
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { status: 404 }));
    }

    #[test]
    fn search_filters_case_insensitively_in_order() {
        let api = api();
        let listing = json!([
            package("ebkr", "r2modman", &["Tools"]),
            package("bbepis", "BepInExPack", &["Libraries"]),
            package("Modders", "Thing", &[]),
            package("x", "y", &["MODPACKS"]),
        ]);
        let hits: Vec<_> = api
            .parse_search_packages(ok(listing.clone()), "modman")
            .unwrap()
            .into_iter()
            .map(|p| p.full_name)
            .collect();
        assert_eq!(hits, ["ebkr-r2modman"]);

        let hits: Vec<_> = api
            .parse_search_packages(ok(listing.clone()), "MOD")
            .unwrap()
            .into_iter()
            .map(|p| p.full_name)
            .collect();
        assert_eq!(hits, ["ebkr-r2modman", "Modders-Thing", "x-y"]);

        assert!(api.parse_search_packages(ok(listing), "zzz").unwrap().is_empty());
    }

    #[test]
    fn get_community_404_is_error() {
        let err = api()
            .parse_get_community(HttpResponse::new(404, ""))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn experimental_lookups_map_404_to_none() {
        let api = api();
        assert!(api
            .parse_get_package_experimental(HttpResponse::new(404, ""))
            .unwrap()
            .is_none());
        assert!(api
            .parse_get_package_version_experimental(HttpResponse::new(404, ""))
            .unwrap()
            .is_none());
        assert!(api
            .parse_get_package_metrics(HttpResponse::new(404, ""))
            .unwrap()
            .is_none());
        assert!(api
            .parse_get_package_version_metrics(HttpResponse::new(404, ""))
            .unwrap()
            .is_none());
    }

    #[test]
    fn optional_lookups_still_raise_other_statuses() {
        let err = api()
            .parse_get_package_metrics(HttpResponse::new(429, ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::RateLimited { status: 429 }));
    }

    #[test]
    fn experimental_listing_empty_and_unrecognized_bodies() {
        let page = api()
            .parse_list_packages_experimental(ok(json!([])))
            .unwrap();
        assert!(page.results.is_empty());
        assert!(page.is_last());
        let page = api()
            .parse_list_packages_experimental(ok(json!(42)))
            .unwrap();
        assert!(page.results.is_empty());
    }

    #[test]
    fn record_body_must_be_object() {
        let err = api()
            .parse_get_community(ok(json!(["riskofrain2"])))
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::UnexpectedShape(_))));
    }
}
