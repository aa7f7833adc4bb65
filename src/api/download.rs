// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Processed image download endpoints

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;
use crate::storage::{ArtifactStore, StoredArtifact};

/// GET /download/:id - Fetch the processed image of one request
///
/// # Errors
/// - 404 Not Found: Unknown or malformed id
/// - 500 Internal Server Error: Stored file could not be read
pub async fn download_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiErrorResponse> {
    let artifact_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::NotFound(format!("artifact not found: {}", id)))?;

    let artifact = state.store.get(artifact_id).await.map_err(|e| {
        debug!("Download of {} failed: {}", id, e);
        ApiError::from(e)
    })?;

    Ok(artifact_response(&state.store, &artifact).await?)
}

/// GET /download - Fetch the most recently processed image
pub async fn download_latest_handler(
    State(state): State<AppState>,
) -> Result<Response, ApiErrorResponse> {
    let artifact = state.store.latest().await.map_err(ApiError::from)?;
    Ok(artifact_response(&state.store, &artifact).await?)
}

async fn artifact_response(
    store: &ArtifactStore,
    artifact: &StoredArtifact,
) -> Result<Response, ApiError> {
    let bytes = store.read(artifact).await.map_err(|e| {
        warn!("Stored image {} is unreadable: {}", artifact.id, e);
        ApiError::from(e)
    })?;

    let headers = [
        (header::CONTENT_TYPE, artifact.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.file_name),
        ),
    ];

    Ok((headers, bytes).into_response())
}
