// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /detect tests with a canned inference engine

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`
use yolo_detection_node::{
    api::{create_app, DetectResponse},
    vision::DetectionError,
};

use crate::support::{
    anchor, app_state, canned_output, jpeg_bytes, multipart_body, multipart_content_type,
    png_bytes, CannedEngine,
};

fn detect_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/detect")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn app_with(engine: CannedEngine, dir: &std::path::Path) -> Router {
    create_app(app_state(Arc::new(engine), dir).await)
}

#[tokio::test]
async fn test_detect_returns_created_with_detections() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(
        CannedEngine::new(canned_output(&[
            anchor(320.0, 320.0, 100.0, 50.0, 2, 0.9),
            anchor(322.0, 321.0, 100.0, 50.0, 2, 0.6),
        ])),
        dir.path(),
    )
    .await;

    let body = multipart_body("image_file", "street.png", "image/png", &png_bytes(1280, 640));
    let response = app.oneshot(detect_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = json_body(response).await;
    let parsed: DetectResponse = serde_json::from_value(json.clone()).unwrap();

    assert_eq!(parsed.width, 1280);
    assert_eq!(parsed.height, 640);
    assert_eq!(parsed.file_name, "street.png");
    assert_eq!(parsed.content_type, "image/png");
    assert_eq!(parsed.download_url, format!("/download/{}", parsed.id));
    assert_eq!(parsed.detections.len(), 1);
    assert_eq!(parsed.detections[0].label, "car");
    assert_eq!(json["detections"][0]["bbox"]["x1"], 540.0);
    assert!(json["processingTimeMs"].is_u64());

    // The rendered image was written under the request id
    let stored = dir.path().join(format!("{}.png", parsed.id));
    assert!(stored.is_file());
}

#[tokio::test]
async fn test_detect_non_png_upload_is_rendered_as_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(CannedEngine::new(canned_output(&[])), dir.path()).await;

    let body = multipart_body("image_file", "photo.jpeg", "image/jpeg", &jpeg_bytes(64, 48));
    let response = app.oneshot(detect_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = json_body(response).await;
    assert_eq!(json["contentType"], "image/jpeg");
    assert_eq!(json["fileName"], "photo.jpg");
    assert_eq!(json["detections"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_detect_missing_field_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(CannedEngine::new(canned_output(&[])), dir.path()).await;

    let body = multipart_body("picture", "a.png", "image/png", &png_bytes(8, 8));
    let response = app.oneshot(detect_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["errorType"], "invalid_request");
    assert!(json["message"].as_str().unwrap().contains("image_file"));
    assert!(json["requestId"].is_string());
}

#[tokio::test]
async fn test_detect_without_multipart_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(CannedEngine::new(canned_output(&[])), dir.path()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/detect")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_detect_undecodable_image_is_unprocessable() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(CannedEngine::new(canned_output(&[])));
    let app = create_app(app_state(engine.clone(), dir.path()).await);

    let body = multipart_body("image_file", "broken.png", "image/png", b"\x89PNG garbage");
    let response = app.oneshot(detect_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = json_body(response).await;
    assert_eq!(json["errorType"], "decode_error");
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_detect_inference_failure_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(
        CannedEngine::failing(DetectionError::Inference("session crashed".to_string())),
        dir.path(),
    )
    .await;

    let body = multipart_body("image_file", "a.png", "image/png", &png_bytes(16, 16));
    let response = app.oneshot(detect_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert_eq!(json["errorType"], "inference_error");
}

#[tokio::test]
async fn test_detect_shape_mismatch_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let bad_output =
        yolo_detection_node::vision::yolo::RawOutput::new(vec![1, 85, 10], vec![0.0; 850]).unwrap();
    let app = app_with(CannedEngine::new(bad_output), dir.path()).await;

    let body = multipart_body("image_file", "a.png", "image/png", &png_bytes(16, 16));
    let response = app.oneshot(detect_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert_eq!(json["errorType"], "shape_mismatch_error");
}

#[tokio::test]
async fn test_detect_upload_over_limit_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(Arc::new(CannedEngine::new(canned_output(&[]))), dir.path())
        .await
        .with_max_upload_bytes(1024);
    let app = create_app(state);

    let body = multipart_body("image_file", "big.png", "image/png", &vec![0u8; 64 * 1024]);
    let response = app.oneshot(detect_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_concurrent_requests_get_distinct_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(
        CannedEngine::new(canned_output(&[anchor(100.0, 100.0, 50.0, 50.0, 0, 0.8)])),
        dir.path(),
    )
    .await;

    let mut handles = Vec::new();
    for i in 0..4 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("img{}.png", i);
            let body = multipart_body("image_file", &name, "image/png", &png_bytes(32, 32));
            let response = app.oneshot(detect_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            json_body(response).await["id"].as_str().unwrap().to_string()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
