use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt as _;
use serde_json::Value;
use uuidify_rs::config::AppConfig;
use uuidify_rs::routing::dispatch::dispatch_request;
use uuidify_rs::state::AppState;

fn build_state(config: AppConfig) -> Arc<AppState> {
    Arc::new(AppState::from_config(config).unwrap())
}

async fn send(
    state: &Arc<AppState>,
    base_path: &str,
    method: Method,
    uri: &str,
    body: Body,
) -> (StatusCode, Option<String>, bytes::Bytes) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap();
    let response = dispatch_request(Arc::clone(state), Arc::<str>::from(base_path), request)
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap();
    (status, content_type, body)
}

async fn get(state: &Arc<AppState>, uri: &str) -> (StatusCode, Option<String>, bytes::Bytes) {
    send(state, "", Method::GET, uri, Body::empty()).await
}

async fn post_batch(state: &Arc<AppState>, payload: &str) -> (StatusCode, Value) {
    let (status, _, body) = send(
        state,
        "",
        Method::POST,
        "/uuid/batch",
        Body::from(payload.to_string()),
    )
    .await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn version_digit(text: &str) -> char {
    text.as_bytes()[14] as char
}

#[tokio::test]
async fn single_routes_return_plain_text() {
    let state = build_state(AppConfig::default());
    for (uri, version) in [
        ("/uuid", '1'),
        ("/uuid/v1", '1'),
        ("/uuid/v4", '4'),
        ("/uuid/v3?namespace=DNS&name=python.org", '3'),
        ("/uuid/v5?ns=URL&name=https%3A%2F%2Fexample.com%2F", '5'),
    ] {
        let (status, content_type, body) = get(&state, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(content_type.unwrap().starts_with("text/plain"));
        let text = std::str::from_utf8(&body).unwrap();
        assert_eq!(text.len(), 36, "{uri}");
        assert_eq!(version_digit(text), version, "{uri}");
    }
}

#[tokio::test]
async fn v3_route_matches_published_vector() {
    let state = build_state(AppConfig::default());
    let (status, _, body) = get(&state, "/uuid/v3?namespace=ns:DNS&name=python.org").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"6fa459ea-ee8a-3ca4-894e-db77e160355e");
}

#[tokio::test]
async fn name_based_errors_map_to_bad_request() {
    let state = build_state(AppConfig::default());

    let (status, _, body) = get(&state, "/uuid/v5?name=python.org").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["code"], "missing_argument");

    let (status, _, body) = get(&state, "/uuid/v3?namespace=dns&name=python.org").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["code"], "invalid_namespace");
}

#[tokio::test]
async fn health_reports_engine_settings() {
    let state = build_state(AppConfig::default());
    let (status, _, body) = get(&state, "/").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["engine"]["node_id"], "process");
    assert_eq!(json["engine"]["random_source"], "os-random");
    assert_eq!(json["engine"]["max_batch_size"], 16);
    assert!(json["engine"]["shared_node"].is_string());
}

#[tokio::test]
async fn unknown_routes_and_methods_are_rejected() {
    let state = build_state(AppConfig::default());
    let (status, _, _) = get(&state, "/uuid/v2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _, _) = send(&state, "", Method::POST, "/uuid/v4", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let (status, _, _) = get(&state, "/uuid/batch").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn base_path_prefixes_every_route() {
    let mut config = AppConfig::default();
    config.server.base_path = "/ids".to_string();
    let state = build_state(config);
    let (status, _, body) = send(&state, "/ids", Method::GET, "/ids/uuid/v4", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.len(), 36);
    let (status, _, _) = send(&state, "/ids", Method::GET, "/uuid/v4", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn batch_reports_per_item_results() {
    let state = build_state(AppConfig::default());
    let (status, json) = post_batch(
        &state,
        r#"{"requests":[
            {"version":"v1"},
            {"version":"v3","namespace":"DNS","name":"python.org"},
            {"version":"v5","namespace":"bogus","name":"x"},
            {"version":"v4"},
            {"version":"default"}
        ]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(
        results[1]["uuid"],
        "6fa459ea-ee8a-3ca4-894e-db77e160355e"
    );
    assert_eq!(results[2]["error"]["code"], "invalid_namespace");
    assert_eq!(version_digit(results[3]["uuid"].as_str().unwrap()), '4');

    let first = results[0]["uuid"].as_str().unwrap();
    let last = results[4]["uuid"].as_str().unwrap();
    assert_ne!(first, last);
    assert_eq!(first[24..], last[24..]);
}

#[tokio::test]
async fn batch_rejects_bad_bodies() {
    let state = build_state(AppConfig::default());

    let (status, json) = post_batch(&state, r#"{"requests":[]}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "invalid_request");

    let (status, json) = post_batch(&state, r#"{"requests":[{"version":"v9"}]}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "invalid_request");

    let items = vec![r#"{"version":"v4"}"#; 17].join(",");
    let (status, json) = post_batch(&state, &format!(r#"{{"requests":[{items}]}}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn oversized_batch_body_is_rejected() {
    let state = build_state(AppConfig::default());
    let (status, _, _) = send(
        &state,
        "",
        Method::POST,
        "/uuid/batch",
        Body::from(vec![b' '; 70 * 1024]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn largest_allowed_batch_fits_the_workspace() {
    let state = build_state(AppConfig::default());
    let items = vec![r#"{"version":"v1"}"#; state.max_batch_size()].join(",");
    let (status, json) = post_batch(&state, &format!(r#"{{"requests":[{items}]}}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), state.max_batch_size());
    let mut seen = std::collections::HashSet::new();
    for result in results {
        let text = result["uuid"].as_str().unwrap();
        assert_eq!(version_digit(text), '1');
        assert!(seen.insert(text.to_string()));
    }
}

#[tokio::test]
async fn workspaces_return_to_the_pool() {
    let state = build_state(AppConfig::default());
    for _ in 0..4 {
        let (status, _, _) = get(&state, "/uuid/v4").await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(state.idle_workspaces(), 1);
}
