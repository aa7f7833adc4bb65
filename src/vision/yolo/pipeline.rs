// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end detection pipeline
//!
//! bytes → decode → preprocess → inference → decode output → NMS → render.
//! Every stage is synchronous CPU work; callers on an async runtime should
//! run the pipeline on a blocking thread.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::decoder::{decode_output, Detection, DEFAULT_CONFIDENCE_THRESHOLD};
use super::model::InferenceEngine;
use super::nms::{non_max_suppression, DEFAULT_IOU_THRESHOLD};
use super::preprocessing::preprocess;
use crate::vision::error::DetectionError;
use crate::vision::image_utils::{decode_image_bytes, OutputFormat};
use crate::vision::labels::ClassTable;
use crate::vision::render::Renderer;

/// Thresholds used by the post-processing stages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSettings {
    /// Minimum class probability for a candidate (inclusive)
    pub confidence_threshold: f32,
    /// IoU at which overlapping boxes are suppressed (inclusive)
    pub iou_threshold: f32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }
}

/// Wall-clock time spent in each stage, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTimings {
    pub decode_ms: u64,
    pub preprocess_ms: u64,
    pub inference_ms: u64,
    pub postprocess_ms: u64,
    pub render_ms: u64,
}

impl StageTimings {
    pub fn total_ms(&self) -> u64 {
        self.decode_ms + self.preprocess_ms + self.inference_ms + self.postprocess_ms + self.render_ms
    }
}

/// Result of running detection on one image
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    /// Final detections, descending by score
    pub detections: Vec<Detection>,
    pub original_width: u32,
    pub original_height: u32,
    pub timings: StageTimings,
}

/// Detection result plus the rendered image
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub outcome: DetectionOutcome,
    /// Encoded image with boxes drawn
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

/// Shared, immutable detection pipeline
///
/// Cheap to share behind an `Arc`; the model handle inside is loaded once.
#[derive(Clone)]
pub struct DetectionPipeline {
    engine: Arc<dyn InferenceEngine>,
    classes: Arc<ClassTable>,
    renderer: Arc<Renderer>,
    settings: DetectionSettings,
}

impl std::fmt::Debug for DetectionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionPipeline")
            .field("engine", &self.engine.name())
            .field("classes", &self.classes.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

impl DetectionPipeline {
    pub fn new(
        engine: Arc<dyn InferenceEngine>,
        classes: Arc<ClassTable>,
        renderer: Arc<Renderer>,
        settings: DetectionSettings,
    ) -> Self {
        Self {
            engine,
            classes,
            renderer,
            settings,
        }
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn settings(&self) -> DetectionSettings {
        self.settings
    }

    pub fn model_name(&self) -> &str {
        self.engine.name()
    }

    /// Decode `bytes` and run detection on it
    ///
    /// # Errors
    /// `Decode`/`Dimension` for unusable input, `Inference` when the engine
    /// fails, `ShapeMismatch` when its output has an unexpected layout.
    pub fn detect(&self, bytes: &[u8]) -> Result<DetectionOutcome, DetectionError> {
        let start = Instant::now();
        let (image, _) = decode_image_bytes(bytes)?;
        let decode_ms = elapsed_ms(start);

        let mut outcome = self.detect_image(&image)?;
        outcome.timings.decode_ms = decode_ms;
        Ok(outcome)
    }

    /// Run detection on an already decoded image
    pub fn detect_image(&self, image: &DynamicImage) -> Result<DetectionOutcome, DetectionError> {
        let mut timings = StageTimings::default();

        let start = Instant::now();
        let (input, info) = preprocess(image)?;
        timings.preprocess_ms = elapsed_ms(start);

        let start = Instant::now();
        let output = self.engine.run(&input)?;
        timings.inference_ms = elapsed_ms(start);

        let start = Instant::now();
        let candidates = decode_output(
            &output,
            &info,
            &self.classes,
            self.settings.confidence_threshold,
        )?;
        let detections = non_max_suppression(&candidates, self.settings.iou_threshold);
        timings.postprocess_ms = elapsed_ms(start);

        debug!(
            "Detection stages: preprocess={}ms inference={}ms postprocess={}ms ({} candidates -> {} detections)",
            timings.preprocess_ms,
            timings.inference_ms,
            timings.postprocess_ms,
            candidates.len(),
            detections.len()
        );

        Ok(DetectionOutcome {
            detections,
            original_width: info.original_width,
            original_height: info.original_height,
            timings,
        })
    }

    /// Detect and render
    ///
    /// The output codec is PNG when `file_name` ends in `.png`, JPEG otherwise.
    pub fn process(
        &self,
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> Result<ProcessedImage, DetectionError> {
        let start = Instant::now();
        let (image, image_info) = decode_image_bytes(bytes)?;
        let decode_ms = elapsed_ms(start);

        let mut outcome = self.detect_image(&image)?;
        outcome.timings.decode_ms = decode_ms;

        let format = OutputFormat::from_file_name(file_name);
        let start = Instant::now();
        let rendered = self.renderer.render(&image, &outcome.detections, format)?;
        outcome.timings.render_ms = elapsed_ms(start);

        info!(
            "Processed {}x{} {:?} image: {} detections in {}ms",
            image_info.width,
            image_info.height,
            image_info.format,
            outcome.detections.len(),
            outcome.timings.total_ms()
        );

        Ok(ProcessedImage {
            outcome,
            bytes: rendered,
            format,
        })
    }
}
