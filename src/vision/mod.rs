// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for CPU-based object detection
//!
//! This module provides:
//! - YOLOv8 detection via ONNX Runtime (`yolo`)
//! - Box geometry and the class table shared by the detector
//! - Rendering of detections back onto the source image

pub mod error;
pub mod geometry;
pub mod image_utils;
pub mod labels;
pub mod render;
pub mod yolo;

pub use error::DetectionError;
pub use geometry::{intersection, iou, union, BoundingBox};
pub use image_utils::{decode_image_bytes, detect_format, ImageInfo, OutputFormat};
pub use labels::{ClassTable, LabelError, COCO_CLASSES};
pub use render::Renderer;
