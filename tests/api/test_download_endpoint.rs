// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /download and GET /download/:id tests

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`
use yolo_detection_node::api::create_app;

use crate::support::{
    anchor, app_state, canned_output, multipart_body, multipart_content_type, png_bytes,
    CannedEngine,
};

async fn test_app(dir: &std::path::Path) -> Router {
    let engine = CannedEngine::new(canned_output(&[anchor(64.0, 64.0, 32.0, 32.0, 0, 0.9)]));
    create_app(app_state(Arc::new(engine), dir).await)
}

async fn upload(app: &Router, file_name: &str) -> Value {
    let body = multipart_body("image_file", file_name, "image/png", &png_bytes(128, 128));
    let request = Request::builder()
        .method("POST")
        .uri("/detect")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_download_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    let detect = upload(&app, "scene.png").await;
    let url = detect["downloadUrl"].as_str().unwrap();

    let response = app.clone().oneshot(get(url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"scene.png\""
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let image = image::load_from_memory(&bytes).unwrap();
    assert_eq!((image.width(), image.height()), (128, 128));
}

#[tokio::test]
async fn test_download_latest() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    upload(&app, "first.png").await;
    upload(&app, "second.jpg").await;

    let response = app.clone().oneshot(get("/download")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"second.jpg\""
    );
}

#[tokio::test]
async fn test_download_latest_before_any_upload_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    let response = app.oneshot(get("/download")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["errorType"], "not_found");
}

#[tokio::test]
async fn test_download_unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    let unknown = format!("/download/{}", uuid::Uuid::new_v4());
    let response = app.clone().oneshot(get(&unknown)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/download/not-a-uuid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_each_request_keeps_its_own_image() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    let first = upload(&app, "one.png").await;
    let second = upload(&app, "two.png").await;

    let response = app
        .clone()
        .oneshot(get(first["downloadUrl"].as_str().unwrap()))
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"one.png\""
    );

    let response = app
        .oneshot(get(second["downloadUrl"].as_str().unwrap()))
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"two.png\""
    );
}
