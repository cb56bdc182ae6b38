//! In-memory stand-in for the Thunderstore web API.
//!
//! Serves the read-only endpoints the SDK consumes from a fixed catalog
//! seeded out of `fixtures/`. The v1 package listing is stored once and the
//! experimental and metrics views are derived from it, the way the real
//! service renders several API surfaces from one database.
//!
//! `MockOptions` adds the failure modes integration tests need: a required
//! bearer token (401 without it) and a request budget (429 once spent).

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tracing::debug;

/// Results per page for the paginated endpoints.
pub const PAGE_SIZE: usize = 2;

const PACKAGES: &str = include_str!("../fixtures/packages.json");
const COMMUNITIES: &str = include_str!("../fixtures/communities.json");
const CATEGORIES: &str = include_str!("../fixtures/categories.json");
const CYBERSTORM: &str = include_str!("../fixtures/cyberstorm.json");

#[derive(Debug, Clone, Default)]
pub struct MockOptions {
    /// When set, every request must carry `Authorization: Bearer <token>`.
    pub required_token: Option<String>,
    /// When set, requests past this count are answered with 429.
    pub request_budget: Option<usize>,
}

/// The records served by the mock, keyed the way the endpoints look them up.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// v1 package records, tagged with the community they are listed in.
    packages: Vec<(String, Value)>,
    communities: Vec<Value>,
    categories: Map<String, Value>,
    cyberstorm: Vec<Value>,
}

impl Catalog {
    /// The catalog built from the bundled fixtures.
    pub fn seeded() -> Self {
        let by_community: Map<String, Value> =
            serde_json::from_str(PACKAGES).expect("packages fixture is valid JSON");
        let packages = by_community
            .into_iter()
            .flat_map(|(community, list)| {
                let list = match list {
                    Value::Array(items) => items,
                    _ => Vec::new(),
                };
                list.into_iter().map(move |p| (community.clone(), p))
            })
            .collect();
        Self {
            packages,
            communities: serde_json::from_str(COMMUNITIES).expect("communities fixture is valid JSON"),
            categories: serde_json::from_str(CATEGORIES).expect("categories fixture is valid JSON"),
            cyberstorm: serde_json::from_str(CYBERSTORM).expect("cyberstorm fixture is valid JSON"),
        }
    }

    /// v1 package records, optionally restricted to one community.
    pub fn v1_packages(&self, community: Option<&str>) -> Vec<Value> {
        self.packages
            .iter()
            .filter(|(c, _)| community.map_or(true, |wanted| c.as_str() == wanted))
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn find_package(&self, namespace: &str, name: &str) -> Option<(&str, &Value)> {
        self.packages
            .iter()
            .find(|(_, p)| p["owner"] == namespace && p["name"] == name)
            .map(|(c, p)| (c.as_str(), p))
    }

    fn find_community(&self, identifier: &str) -> Option<&Value> {
        self.communities
            .iter()
            .find(|c| c["identifier"] == identifier)
    }
}

#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
    options: Arc<MockOptions>,
    served: Arc<AtomicUsize>,
}

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub fn app() -> Router {
    app_with(MockOptions::default())
}

pub fn app_with(options: MockOptions) -> Router {
    let state = AppState {
        catalog: Arc::new(Catalog::seeded()),
        options: Arc::new(options),
        served: Arc::new(AtomicUsize::new(0)),
    };
    Router::new()
        .route("/api/v1/package/", get(list_packages_v1))
        .route("/api/v1/community/", get(list_communities_v1))
        .route("/api/v1/community/{community}/", get(get_community_v1))
        .route("/api/v1/package-metrics/{namespace}/{name}/", get(package_metrics))
        .route(
            "/api/v1/package-metrics/{namespace}/{name}/{version}/",
            get(package_version_metrics),
        )
        .route("/api/experimental/package/", get(list_packages_experimental))
        .route(
            "/api/experimental/package/{namespace}/{name}/",
            get(get_package_experimental),
        )
        .route(
            "/api/experimental/package/{namespace}/{name}/{version}/",
            get(get_package_version_experimental),
        )
        .route("/api/experimental/community/", get(list_communities))
        .route("/api/experimental/community/{community}/", get(get_community))
        .route(
            "/api/experimental/community/{community}/category/",
            get(list_categories),
        )
        .route(
            "/api/cyberstorm/community/{community}/",
            get(get_cyberstorm_community),
        )
        .layer(middleware::from_fn_with_state(state.clone(), gate))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, options: MockOptions) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(options)).await
}

/// Rate limiting and token checks, in that order.
async fn gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    debug!(uri = %request.uri(), "mock request");
    if let Some(budget) = state.options.request_budget {
        if state.served.fetch_add(1, Ordering::SeqCst) >= budget {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"detail": "Request was throttled."})),
            )
                .into_response();
        }
    }
    if let Some(token) = &state.options.required_token {
        let expected = format!("Bearer {token}");
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Invalid token."})),
            )
                .into_response();
        }
    }
    next.run(request).await
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub community: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CursorParams {
    pub cursor: Option<String>,
}

// --- v1 ---

async fn list_packages_v1(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Reply {
    let mut packages = state.catalog.v1_packages(params.community.as_deref());
    if let Some(ordering) = &params.ordering {
        sort_packages(&mut packages, ordering)?;
    }
    let Some(page) = params.page else {
        return Ok(Json(Value::Array(packages)));
    };

    let pages = packages.len().div_ceil(PAGE_SIZE).max(1);
    if page == 0 || page > pages {
        return Err(detail(StatusCode::NOT_FOUND, "Invalid page."));
    }
    let link = |n: usize| page_link(&headers, "/api/v1/package/", &format!("page={n}"));
    let start = (page - 1) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(packages.len());
    Ok(Json(json!({
        "count": packages.len(),
        "next": (page < pages).then(|| link(page + 1)),
        "previous": (page > 1).then(|| link(page - 1)),
        "results": packages[start..end].to_vec(),
    })))
}

async fn list_communities_v1(State(state): State<AppState>) -> Json<Value> {
    Json(Value::Array(
        state.catalog.communities.iter().map(community_v1).collect(),
    ))
}

async fn get_community_v1(State(state): State<AppState>, Path(community): Path<String>) -> Reply {
    state
        .catalog
        .find_community(&community)
        .map(|c| Json(community_v1(c)))
        .ok_or_else(not_found)
}

async fn package_metrics(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> Reply {
    let (_, package) = state
        .catalog
        .find_package(&namespace, &name)
        .ok_or_else(not_found)?;
    Ok(Json(json!({
        "downloads": total_downloads(package),
        "rating_score": package["rating_score"],
        "latest_version": package["versions"][0]["version_number"],
    })))
}

async fn package_version_metrics(
    State(state): State<AppState>,
    Path((namespace, name, version)): Path<(String, String, String)>,
) -> Reply {
    let (_, package) = state
        .catalog
        .find_package(&namespace, &name)
        .ok_or_else(not_found)?;
    let version = find_version(package, &version).ok_or_else(not_found)?;
    Ok(Json(json!({"downloads": version["downloads"]})))
}

// --- experimental ---

async fn list_packages_experimental(
    State(state): State<AppState>,
    Query(params): Query<CursorParams>,
    headers: HeaderMap,
) -> Reply {
    let packages = state
        .catalog
        .packages
        .iter()
        .map(|(community, p)| experimental_package(community, p))
        .collect();
    cursor_page(packages, params.cursor.as_deref(), |cursor| {
        page_link(&headers, "/api/experimental/package/", &format!("cursor={cursor}"))
    })
}

async fn get_package_experimental(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> Reply {
    state
        .catalog
        .find_package(&namespace, &name)
        .map(|(community, p)| Json(experimental_package(community, p)))
        .ok_or_else(not_found)
}

async fn get_package_version_experimental(
    State(state): State<AppState>,
    Path((namespace, name, version)): Path<(String, String, String)>,
) -> Reply {
    let (_, package) = state
        .catalog
        .find_package(&namespace, &name)
        .ok_or_else(not_found)?;
    let version = find_version(package, &version).ok_or_else(not_found)?;
    Ok(Json(experimental_version(package, version)))
}

async fn list_communities(State(state): State<AppState>) -> Json<Value> {
    let results: Vec<Value> = state
        .catalog
        .communities
        .iter()
        .map(community_experimental)
        .collect();
    Json(json!({"next": null, "previous": null, "results": results}))
}

async fn get_community(State(state): State<AppState>, Path(community): Path<String>) -> Reply {
    state
        .catalog
        .find_community(&community)
        .map(|c| Json(community_experimental(c)))
        .ok_or_else(not_found)
}

async fn list_categories(
    State(state): State<AppState>,
    Path(community): Path<String>,
    Query(params): Query<CursorParams>,
    headers: HeaderMap,
) -> Reply {
    let categories = match state.catalog.categories.get(&community) {
        Some(Value::Array(items)) => items.clone(),
        _ => return Err(not_found()),
    };
    let path = format!("/api/experimental/community/{community}/category/");
    cursor_page(categories, params.cursor.as_deref(), |cursor| {
        page_link(&headers, &path, &format!("cursor={cursor}"))
    })
}

// --- cyberstorm ---

async fn get_cyberstorm_community(
    State(state): State<AppState>,
    Path(community): Path<String>,
) -> Reply {
    state
        .catalog
        .cyberstorm
        .iter()
        .find(|c| c["identifier"] == community.as_str())
        .map(|c| Json(c.clone()))
        .ok_or_else(not_found)
}

// --- rendering ---

fn community_v1(community: &Value) -> Value {
    pick(
        community,
        &[
            "identifier",
            "name",
            "discord_url",
            "wiki_url",
            "require_package_category_choice",
        ],
    )
}

fn community_experimental(community: &Value) -> Value {
    pick(
        community,
        &[
            "identifier",
            "name",
            "discord_url",
            "wiki_url",
            "require_package_listing_approval",
        ],
    )
}

fn experimental_package(community: &str, package: &Value) -> Value {
    let latest = package["versions"]
        .get(0)
        .map(|version| experimental_version(package, version));
    json!({
        "namespace": package["owner"],
        "name": package["name"],
        "full_name": package["full_name"],
        "owner": package["owner"],
        "package_url": package["package_url"],
        "date_created": package["date_created"],
        "date_updated": package["date_updated"],
        "rating_score": package["rating_score"].to_string(),
        "is_pinned": package["is_pinned"],
        "is_deprecated": package["is_deprecated"],
        "total_downloads": total_downloads(package).to_string(),
        "latest": latest,
        "community_listings": [{
            "has_nsfw_content": package["has_nsfw_content"],
            "categories": package["categories"],
            "community": community,
            "review_status": "approved",
        }],
    })
}

fn experimental_version(package: &Value, version: &Value) -> Value {
    json!({
        "namespace": package["owner"],
        "name": version["name"],
        "version_number": version["version_number"],
        "full_name": version["full_name"],
        "description": version["description"],
        "icon": version["icon"],
        "dependencies": version["dependencies"],
        "download_url": version["download_url"],
        "downloads": version["downloads"],
        "date_created": version["date_created"],
        "website_url": version["website_url"],
        "is_active": version["is_active"],
    })
}

fn pick(object: &Value, keys: &[&str]) -> Value {
    Value::Object(
        keys.iter()
            .map(|key| (key.to_string(), object[*key].clone()))
            .collect(),
    )
}

fn find_version<'a>(package: &'a Value, version: &str) -> Option<&'a Value> {
    package["versions"]
        .as_array()?
        .iter()
        .find(|v| v["version_number"] == version)
}

fn total_downloads(package: &Value) -> u64 {
    package["versions"]
        .as_array()
        .map(|versions| versions.iter().filter_map(|v| v["downloads"].as_u64()).sum())
        .unwrap_or(0)
}

/// Sort by `ordering`, a field name with an optional `-` for descending.
fn sort_packages(packages: &mut [Value], ordering: &str) -> Result<(), (StatusCode, Json<Value>)> {
    let (field, descending) = match ordering.strip_prefix('-') {
        Some(field) => (field, true),
        None => (ordering, false),
    };
    if !["name", "rating_score", "date_created", "date_updated"].contains(&field) {
        return Err(detail(StatusCode::BAD_REQUEST, "Invalid ordering."));
    }
    packages.sort_by(|a, b| {
        let order = match (&a[field], &b[field]) {
            (Value::Number(x), Value::Number(y)) => x.as_i64().cmp(&y.as_i64()),
            (x, y) => x.as_str().cmp(&y.as_str()),
        };
        if descending {
            order.reverse()
        } else {
            order
        }
    });
    Ok(())
}

/// Slice `items` at an opaque cursor and render the experimental envelope.
fn cursor_page(items: Vec<Value>, cursor: Option<&str>, link: impl Fn(String) -> String) -> Reply {
    let offset = match cursor {
        None => 0,
        Some(cursor) => decode_cursor(cursor)
            .filter(|offset| *offset < items.len())
            .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Invalid cursor"))?,
    };
    let end = (offset + PAGE_SIZE).min(items.len());
    Ok(Json(json!({
        "next": (end < items.len()).then(|| link(encode_cursor(end))),
        "previous": (offset > 0).then(|| link(encode_cursor(offset.saturating_sub(PAGE_SIZE)))),
        "results": items[offset..end].to_vec(),
    })))
}

fn encode_cursor(offset: usize) -> String {
    format!("o{offset}")
}

fn decode_cursor(cursor: &str) -> Option<usize> {
    cursor.strip_prefix('o')?.parse().ok()
}

/// Absolute link to `path?query` on the host the request was sent to.
fn page_link(headers: &HeaderMap, path: &str, query: &str) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}{path}?{query}")
}

fn detail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({"detail": message})))
}

fn not_found() -> (StatusCode, Json<Value>) {
    detail(StatusCode::NOT_FOUND, "Not found.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_catalog_has_every_fixture() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.v1_packages(None).len(), 4);
        assert_eq!(catalog.v1_packages(Some("riskofrain2")).len(), 3);
        assert_eq!(catalog.v1_packages(Some("lethal-company")).len(), 1);
        assert!(catalog.v1_packages(Some("valheim")).is_empty());
        assert_eq!(catalog.communities.len(), 2);
        assert_eq!(catalog.cyberstorm.len(), 2);
    }

    #[test]
    fn find_package_by_owner_and_name() {
        let catalog = Catalog::seeded();
        let (community, package) = catalog.find_package("bbepis", "BepInExPack").unwrap();
        assert_eq!(community, "riskofrain2");
        assert_eq!(package["full_name"], "bbepis-BepInExPack");
        assert!(catalog.find_package("bbepis", "Nothing").is_none());
    }

    #[test]
    fn experimental_rendering_stringifies_rating_and_downloads() {
        let catalog = Catalog::seeded();
        let (community, package) = catalog.find_package("ebkr", "r2modman").unwrap();
        let rendered = experimental_package(community, package);
        assert_eq!(rendered["rating_score"], "870");
        assert_eq!(rendered["total_downloads"], "219245");
        assert_eq!(rendered["namespace"], "ebkr");
        assert_eq!(rendered["latest"]["version_number"], "3.1.47");
        assert_eq!(rendered["community_listings"][0]["community"], "riskofrain2");
    }

    #[test]
    fn community_views_pick_their_flag() {
        let catalog = Catalog::seeded();
        let community = catalog.find_community("riskofrain2").unwrap();
        let v1 = community_v1(community);
        let experimental = community_experimental(community);
        assert_eq!(v1["require_package_category_choice"], true);
        assert!(v1.get("require_package_listing_approval").is_none());
        assert_eq!(experimental["require_package_listing_approval"], false);
        assert!(experimental.get("require_package_category_choice").is_none());
    }

    #[test]
    fn sort_by_rating_descending() {
        let mut packages = Catalog::seeded().v1_packages(None);
        sort_packages(&mut packages, "-rating_score").unwrap();
        let scores: Vec<_> = packages.iter().map(|p| p["rating_score"].as_i64().unwrap()).collect();
        assert_eq!(scores, [5412, 3105, 870, -2]);
    }

    #[test]
    fn sort_by_name_ascending() {
        let mut packages = Catalog::seeded().v1_packages(None);
        sort_packages(&mut packages, "name").unwrap();
        let names: Vec<_> = packages.iter().map(|p| p["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["BepInExPack", "ItemStatsMod", "MoreCompany", "r2modman"]);
    }

    #[test]
    fn unknown_ordering_is_rejected() {
        let mut packages = Catalog::seeded().v1_packages(None);
        let (status, _) = sort_packages(&mut packages, "-uuid4").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn cursor_round_trip() {
        assert_eq!(decode_cursor(&encode_cursor(4)), Some(4));
        assert_eq!(decode_cursor("bogus"), None);
    }
}
