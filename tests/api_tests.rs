mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{
    FakeClassifier, FakeSearch, jpeg_bytes, multipart_body, multipart_content_type, png_bytes,
    test_config,
};
use http_body_util::BodyExt;
use snapshop::api::{AppState, UPLOAD_FIELD};
use tower::ServiceExt;

const SNEAKER_QUERY: &str = "sneaker buy OR shop OR store OR online";

async fn spawn_app(classifier: Arc<FakeClassifier>, search: Arc<FakeSearch>) -> (Router, Arc<AppState>) {
    let state = snapshop::api::create_app_state_with(test_config(), classifier, search)
        .await
        .expect("Failed to create app state");
    (snapshop::api::router(state.clone()), state)
}

fn upload_request(uri: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(multipart_body(
            UPLOAD_FIELD,
            filename,
            "application/octet-stream",
            bytes,
        )))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_upload_returns_stored_results() {
    let search = FakeSearch::returning(
        SNEAKER_QUERY,
        &[("Buy Sneakers - StoreX", "https://storex.example/sneakers")],
    );
    let (app, _) = spawn_app(FakeClassifier::labeling("sneaker"), search.clone()).await;

    let response = app
        .clone()
        .oneshot(upload_request("/upload/", "shoe.jpg", &jpeg_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let items = body.as_array().expect("array body");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Buy Sneakers - StoreX");
    assert_eq!(items[0]["link"], "https://storex.example/sneakers");
    assert!(items[0]["id"].is_string());
    assert!(items[0]["created_at"].is_string());
    assert_eq!(search.queries(), vec![SNEAKER_QUERY.to_string()]);

    let response = app.clone().oneshot(get("/items/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed, body);
}

#[tokio::test]
async fn test_routes_answer_without_trailing_slash() {
    let search = FakeSearch::returning(SNEAKER_QUERY, &[("Shop", "https://shop.example/x")]);
    let (app, _) = spawn_app(FakeClassifier::labeling("sneaker"), search).await;

    let response = app
        .clone()
        .oneshot(upload_request("/upload", "shoe.png", &png_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/items")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_is_not_found_when_empty() {
    let (app, _) = spawn_app(FakeClassifier::finding_nothing(), FakeSearch::empty()).await;

    let response = app.oneshot(get("/items/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No results found");
}

#[tokio::test]
async fn test_upload_with_no_detection_returns_empty_array() {
    let classifier = FakeClassifier::finding_nothing();
    let (app, state) = spawn_app(classifier, FakeSearch::empty()).await;

    let seed = snapshop::models::NewSearchResult::parse("Stale", "https://stale.example/").unwrap();
    state.store().results().replace_all(&[seed]).await.unwrap();

    let response = app
        .clone()
        .oneshot(upload_request("/upload/", "blank.png", &png_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));

    let response = app.oneshot(get("/items/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_image_upload_is_bad_request() {
    let classifier = FakeClassifier::labeling("sneaker");
    let search = FakeSearch::empty();
    let (app, _) = spawn_app(classifier.clone(), search.clone()).await;

    let response = app
        .clone()
        .oneshot(upload_request("/upload/", "doc.pdf", b"%PDF-1.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Uploaded file is not an image");

    let response = app
        .oneshot(upload_request("/upload/", "notes.jpg", b"plain text"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(classifier.calls(), 0);
    assert_eq!(search.calls(), 0);
}

#[tokio::test]
async fn test_missing_file_field_is_bad_request() {
    let (app, _) = spawn_app(FakeClassifier::labeling("sneaker"), FakeSearch::empty()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/upload/")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(multipart_body(
            "image",
            "shoe.png",
            "image/png",
            &png_bytes(),
        )))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_failure_is_bad_gateway() {
    let (app, _) = spawn_app(FakeClassifier::labeling("sneaker"), FakeSearch::failing(503)).await;

    let response = app
        .oneshot(upload_request("/upload/", "shoe.png", &png_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Search service is unavailable");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let mut config = test_config();
    config.server.max_upload_bytes = 1024;
    let classifier = FakeClassifier::labeling("sneaker");
    let state = snapshop::api::create_app_state_with(config, classifier.clone(), FakeSearch::empty())
        .await
        .unwrap();
    let app = snapshop::api::router(state);

    let response = app
        .oneshot(upload_request("/upload/", "big.png", &vec![0u8; 4096]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn test_health() {
    let (app, _) = spawn_app(FakeClassifier::finding_nothing(), FakeSearch::empty()).await;

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["stored_results"], 0);
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let (app, _) = spawn_app(FakeClassifier::finding_nothing(), FakeSearch::empty()).await;

    let response = app.oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("Metrics not enabled"));
}
