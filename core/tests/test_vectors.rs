//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Responses are fed straight into the `parse_*`
//! methods, so no server is involved.

use serde_json::Value;
use thunderstore_sdk::{
    ApiError, ClientConfig, HttpRequest, HttpResponse, PackageCategory, PackageQuery,
    ThunderstoreApi, ValidationError,
};

const BASE_URL: &str = "http://localhost:3000";

fn api() -> ThunderstoreApi {
    ThunderstoreApi::new(&ClientConfig::new(BASE_URL).unwrap())
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn str_field<'a>(input: &'a Value, key: &str) -> &'a str {
    input[key].as_str().unwrap_or_else(|| panic!("missing input `{key}`"))
}

/// Name of the `ApiError` variant, for comparison with the vectors.
fn variant(err: &ApiError) -> &'static str {
    match err {
        ApiError::Authentication { .. } => "Authentication",
        ApiError::NotFound { .. } => "NotFound",
        ApiError::RateLimited { .. } => "RateLimited",
        ApiError::HttpError { .. } => "HttpError",
        ApiError::Timeout => "Timeout",
        ApiError::Transport(_) => "Transport",
        ApiError::InvalidPathSegment(_) => "InvalidPathSegment",
        ApiError::Validation(_) => "Validation",
    }
}

fn validation_variant(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::MissingField { .. } => "MissingField",
        ValidationError::TypeMismatch { .. } => "TypeMismatch",
        ValidationError::UnexpectedShape(_) => "UnexpectedShape",
        ValidationError::InvalidJson(_) => "InvalidJson",
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn build(api: &ThunderstoreApi, operation: &str, input: &Value) -> Result<HttpRequest, ApiError> {
    let cursor = input["cursor"].as_str();
    match operation {
        "list_packages" => {
            let query = PackageQuery {
                community: input["community"].as_str().map(str::to_string),
                ordering: input["ordering"].as_str().map(str::to_string),
                page: input["page"].as_u64().map(|p| p as u32),
            };
            Ok(api.build_list_packages(&query))
        }
        "search_packages" => Ok(api.build_search_packages(input["community"].as_str())),
        "get_package" => Ok(api.build_get_package()),
        "list_communities" => Ok(api.build_list_communities()),
        "get_community" => api.build_get_community(str_field(input, "identifier")),
        "list_communities_v1" => Ok(api.build_list_communities_v1()),
        "get_community_v1" => api.build_get_community_v1(str_field(input, "identifier")),
        "get_cyberstorm_community" => {
            api.build_get_cyberstorm_community(str_field(input, "identifier"))
        }
        "list_community_categories" => {
            api.build_list_community_categories(str_field(input, "identifier"), cursor)
        }
        "list_packages_experimental" => Ok(api.build_list_packages_experimental(cursor)),
        "get_package_experimental" => {
            api.build_get_package_experimental(str_field(input, "namespace"), str_field(input, "name"))
        }
        "get_package_version_experimental" => api.build_get_package_version_experimental(
            str_field(input, "namespace"),
            str_field(input, "name"),
            str_field(input, "version"),
        ),
        "get_package_metrics" => {
            api.build_get_package_metrics(str_field(input, "namespace"), str_field(input, "name"))
        }
        "get_package_version_metrics" => api.build_get_package_version_metrics(
            str_field(input, "namespace"),
            str_field(input, "name"),
            str_field(input, "version"),
        ),
        other => panic!("unknown operation: {other}"),
    }
}

#[test]
fn request_test_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/requests.json")) {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected_request"];
        let built = build(&api, case["operation"].as_str().unwrap(), &case["input"]);
        if let Some(expected_error) = case["expected_error"].as_str() {
            assert_eq!(variant(&built.unwrap_err()), expected_error, "{name}: error");
            continue;
        }
        let req = built.unwrap();

        assert_eq!(
            req.url,
            format!("{BASE_URL}{}", expected["path"].as_str().unwrap()),
            "{name}: url"
        );

        let expected_query: Vec<(String, String)> = expected["query"]
            .as_array()
            .unwrap()
            .iter()
            .map(|pair| {
                let pair = pair.as_array().unwrap();
                (
                    pair[0].as_str().unwrap().to_string(),
                    pair[1].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(req.query, expected_query, "{name}: query");

        assert_eq!(req.header("Accept"), Some("application/json"), "{name}: accept");
        assert!(
            req.header("User-Agent").unwrap().starts_with("thunderstore-sdk/"),
            "{name}: user agent"
        );
        assert_eq!(req.header("Authorization"), None, "{name}: authorization");
    }
}

// ---------------------------------------------------------------------------
// Status classification
// ---------------------------------------------------------------------------

#[test]
fn status_test_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/status.json")) {
        let name = case["name"].as_str().unwrap();
        let status = case["response"]["status"].as_u64().unwrap() as u16;
        let body = case["response"]["body"].as_str().unwrap();
        let expected = case["expected_error"].as_str().unwrap();

        // The same classification must hold on a list, a record and an
        // optional lookup, except that the optional lookup absorbs 404.
        let list = api
            .parse_list_communities(HttpResponse::new(status, body))
            .unwrap_err();
        assert_eq!(variant(&list), expected, "{name}: list");
        assert_eq!(list.status(), Some(status), "{name}: status");

        let record = api
            .parse_get_community(HttpResponse::new(status, body))
            .unwrap_err();
        assert_eq!(variant(&record), expected, "{name}: record");

        if let ApiError::HttpError { body: raw, .. } = &record {
            assert_eq!(raw, body, "{name}: raw body kept");
        }

        let optional = api.parse_get_package_metrics(HttpResponse::new(status, body));
        if expected == "NotFound" {
            assert!(optional.unwrap().is_none(), "{name}: optional lookup");
        } else {
            assert_eq!(variant(&optional.unwrap_err()), expected, "{name}: optional lookup");
        }
    }
}

// ---------------------------------------------------------------------------
// List shapes
// ---------------------------------------------------------------------------

#[test]
fn list_shape_test_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/list_shapes.json")) {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected"];

        let page = api
            .parse_list_community_categories(HttpResponse::new(200, case["body"].to_string()))
            .unwrap();

        assert_eq!(page.count, expected["count"].as_u64(), "{name}: count");
        assert_eq!(page.next.as_deref(), expected["next"].as_str(), "{name}: next");
        assert_eq!(
            page.previous.as_deref(),
            expected["previous"].as_str(),
            "{name}: previous"
        );
        assert_eq!(
            page.next_cursor().as_deref(),
            expected["next_cursor"].as_str(),
            "{name}: next cursor"
        );
        let slugs: Vec<&str> = page.results.iter().map(|c: &PackageCategory| c.slug.as_str()).collect();
        let expected_slugs: Vec<&str> = expected["slugs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_str().unwrap())
            .collect();
        assert_eq!(slugs, expected_slugs, "{name}: results");
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn validation_test_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/validation.json")) {
        let name = case["name"].as_str().unwrap();
        let err = api
            .parse_get_community(HttpResponse::new(200, case["body"].to_string()))
            .unwrap_err();

        let err = match err {
            ApiError::Validation(err) => err,
            other => panic!("{name}: expected a validation error, got {other:?}"),
        };
        assert_eq!(
            validation_variant(&err),
            case["expected_error"].as_str().unwrap(),
            "{name}: variant"
        );
        assert_eq!(err.field(), case["expected_field"].as_str(), "{name}: field");
    }
}
