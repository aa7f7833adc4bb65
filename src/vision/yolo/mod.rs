// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 object detection
//!
//! Components:
//! - `preprocessing` - Stretch-resize and planar normalization to `[1, 3, 640, 640]`
//! - `model` - Inference boundary and the ONNX Runtime detector
//! - `decoder` - Raw `[1, 84, 8400]` output to candidate boxes
//! - `nms` - Class-agnostic greedy non-maximum suppression
//! - `pipeline` - Orchestration of all stages plus rendering

pub mod decoder;
pub mod model;
pub mod nms;
pub mod pipeline;
pub mod preprocessing;

pub use decoder::{decode_output, Detection, DEFAULT_CONFIDENCE_THRESHOLD, NUM_ANCHORS};
pub use model::{InferenceEngine, RawOutput, YoloOnnxModel};
pub use nms::{non_max_suppression, DEFAULT_IOU_THRESHOLD};
pub use pipeline::{
    DetectionOutcome, DetectionPipeline, DetectionSettings, ProcessedImage, StageTimings,
};
pub use preprocessing::{preprocess, preprocess_bytes, PreprocessInfo, YOLO_INPUT_SIZE};
