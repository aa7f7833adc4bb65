// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::detect::detect_handler;
use super::docs::{api_docs_handler, root_handler};
use super::download::{download_handler, download_latest_handler};
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::storage::ArtifactStore;
use crate::vision::yolo::DetectionPipeline;

/// Shared state of the HTTP server
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DetectionPipeline>,
    pub store: Arc<ArtifactStore>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Arc<DetectionPipeline>, store: Arc<ArtifactStore>) -> Self {
        Self {
            pipeline,
            store,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub classes: usize,
}

/// Build the router with all endpoints and middleware
pub fn create_app(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(root_handler))
        .route("/api", get(api_docs_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/detect", post(detect_handler))
        .route("/download", get(download_latest_handler))
        .route("/download/:id", get(download_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::version::VERSION_NUMBER.to_string(),
        model: state.pipeline.model_name().to_string(),
        classes: state.pipeline.classes().len(),
    })
}

async fn version_handler() -> Json<serde_json::Value> {
    Json(crate::version::get_version_info())
}
