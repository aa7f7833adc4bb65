// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration
//!
//! Every option can be given on the command line or through the matching
//! environment variable.

use anyhow::{bail, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::storage::DEFAULT_MAX_ARTIFACTS;
use crate::vision::yolo::{DetectionSettings, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD};

/// Default upload limit: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// YOLOv8 object detection node
#[derive(Parser, Debug, Clone)]
#[command(name = "yolo-detection-node")]
#[command(version)]
#[command(about = "HTTP service running YOLOv8 object detection on uploaded images", long_about = None)]
pub struct NodeConfig {
    /// Address the HTTP server binds to
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    pub listen_addr: SocketAddr,

    /// Path to the YOLOv8 ONNX model
    #[arg(long, env = "MODEL_PATH", default_value = "./models/yolov8m.onnx")]
    pub model_path: PathBuf,

    /// Optional class label file, one label per line (defaults to COCO-80)
    #[arg(long, env = "LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// Directory for processed images
    #[arg(long, env = "OUTPUT_DIR", default_value = "./processed")]
    pub output_dir: PathBuf,

    /// Minimum class probability to keep a detection
    #[arg(long, env = "CONFIDENCE_THRESHOLD", default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    pub confidence_threshold: f32,

    /// IoU at which overlapping detections are suppressed
    #[arg(long, env = "IOU_THRESHOLD", default_value_t = DEFAULT_IOU_THRESHOLD)]
    pub iou_threshold: f32,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Maximum accepted upload size in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Number of processed images kept in the output directory
    #[arg(long, env = "MAX_ARTIFACTS", default_value_t = DEFAULT_MAX_ARTIFACTS)]
    pub max_artifacts: usize,
}

impl NodeConfig {
    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            bail!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            bail!(
                "IoU threshold must be within [0, 1], got {}",
                self.iou_threshold
            );
        }
        if self.intra_threads == 0 {
            bail!("intra threads must be at least 1");
        }
        if self.max_upload_bytes == 0 {
            bail!("max upload bytes must be greater than 0");
        }
        if self.max_artifacts == 0 {
            bail!("max artifacts must be at least 1");
        }
        Ok(())
    }

    pub fn detection_settings(&self) -> DetectionSettings {
        DetectionSettings {
            confidence_threshold: self.confidence_threshold,
            iou_threshold: self.iou_threshold,
        }
    }
}
