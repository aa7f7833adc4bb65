// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, sync::Arc};
use tracing::info;

use yolo_detection_node::{
    api::{start_server, AppState},
    config::NodeConfig,
    storage::ArtifactStore,
    version,
    vision::{
        yolo::{DetectionPipeline, YoloOnnxModel},
        ClassTable, Renderer,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = NodeConfig::parse();
    config.validate().context("invalid configuration")?;

    info!("🚀 Starting {}", version::get_version_string());

    // Class table: custom label file or the built-in COCO-80 list
    let classes = match &config.labels_path {
        Some(path) => ClassTable::from_file(path)
            .with_context(|| format!("failed to load labels from {}", path.display()))?,
        None => ClassTable::coco(),
    };
    info!("Using {} class labels", classes.len());

    // Load the model once; every request shares this session
    let model_path = config.model_path.clone();
    let intra_threads = config.intra_threads;
    let model = tokio::task::spawn_blocking(move || YoloOnnxModel::load(model_path, intra_threads))
        .await
        .context("model loading task panicked")??;

    let renderer = Renderer::new()?;
    let pipeline = DetectionPipeline::new(
        Arc::new(model),
        Arc::new(classes),
        Arc::new(renderer),
        config.detection_settings(),
    );
    info!("✅ Detection pipeline ready: {:?}", pipeline);

    let store = ArtifactStore::open(&config.output_dir)
        .await
        .with_context(|| format!("failed to open output directory {}", config.output_dir.display()))?
        .with_max_artifacts(config.max_artifacts);

    let state = AppState::new(Arc::new(pipeline), Arc::new(store))
        .with_max_upload_bytes(config.max_upload_bytes);

    start_server(state, config.listen_addr).await
}
