// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection endpoint handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use bytes::Bytes;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::response::DetectResponse;
use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image_file";

struct Upload {
    bytes: Bytes,
    file_name: Option<String>,
}

/// POST /detect - Detect objects in an uploaded image
///
/// Accepts a multipart form with the image in the `image_file` field. Runs
/// the detection pipeline, stores the rendered image under the request id
/// and returns the detections.
///
/// # Response
/// `201 Created` with a [`DetectResponse`]. The processed image is PNG when
/// the uploaded file name ends in `.png`, JPEG otherwise.
///
/// # Errors
/// - 400 Bad Request: Not a multipart request, or no `image_file` field
/// - 413 Payload Too Large: Upload exceeds the configured limit
/// - 422 Unprocessable Entity: Image cannot be decoded or has zero size
/// - 500 Internal Server Error: Inference, encoding or storage failed
pub async fn detect_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<DetectResponse>), ApiErrorResponse> {
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    let fail = |e: ApiError| {
        warn!("Detect request {} failed: {}", request_id, e);
        e.with_request_id(request_id.to_string())
    };

    let mut multipart = multipart.map_err(|e| fail(ApiError::InvalidRequest(e.body_text())))?;

    // 1. Read the image field
    let upload = read_image_field(&mut multipart).await.map_err(fail)?;
    debug!(
        "Detect request {}: {} bytes ({:?})",
        request_id,
        upload.bytes.len(),
        upload.file_name
    );

    // 2. Run the pipeline off the async runtime
    let pipeline = state.pipeline.clone();
    let file_name = upload.file_name.clone();
    let processed = tokio::task::spawn_blocking(move || {
        pipeline.process(&upload.bytes, upload.file_name.as_deref())
    })
    .await
    .map_err(|e| fail(ApiError::InternalError(format!("detection task failed: {}", e))))?
    .map_err(|e| fail(ApiError::from(e)))?;

    // 3. Store the rendered image
    let artifact = state
        .store
        .store_with_id(
            request_id,
            &processed.bytes,
            processed.format,
            file_name.as_deref(),
        )
        .await
        .map_err(|e| fail(ApiError::from(e)))?;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    info!(
        "Detect request {} complete: {} detections, {}ms",
        request_id,
        processed.outcome.detections.len(),
        processing_time_ms
    );

    let response = DetectResponse::new(&artifact, processed.outcome, processing_time_ms);
    Ok((StatusCode::CREATED, Json(response)))
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload { bytes, file_name });
    }

    Err(ApiError::InvalidRequest(format!(
        "missing multipart field '{}'",
        IMAGE_FIELD
    )))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::InvalidRequest(e.body_text())
    }
}
