// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error kinds produced by the detection pipeline
//!
//! Every variant is terminal for the current request. Nothing in the
//! pipeline retries, and no variant is ever converted into a success.

use thiserror::Error;

/// Failure of one stage of the detection pipeline
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DetectionError {
    /// Input bytes are not a supported or well-formed raster image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Decoded image has degenerate geometry
    #[error("Invalid image dimensions: {width}x{height}")]
    Dimension { width: u32, height: u32 },

    /// Model artifact is missing or could not be turned into a session
    #[error("Failed to load detection model: {0}")]
    ModelLoad(String),

    /// Execution engine rejected the input or failed internally
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Output tensor does not match the expected `[1, 4 + K, N]` layout
    #[error("Output tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Rendered image could not be encoded
    #[error("Failed to encode rendered image: {0}")]
    Encode(String),
}

impl DetectionError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            DetectionError::Decode(_) => "decode_error",
            DetectionError::Dimension { .. } => "dimension_error",
            DetectionError::ModelLoad(_) => "model_load_error",
            DetectionError::Inference(_) => "inference_error",
            DetectionError::ShapeMismatch { .. } => "shape_mismatch_error",
            DetectionError::Encode(_) => "encode_error",
        }
    }

    /// Whether the failure was caused by the client's input rather than the node
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DetectionError::Decode(_) | DetectionError::Dimension { .. }
        )
    }

    pub(crate) fn shape_mismatch(expected: impl Into<String>, actual: &[usize]) -> Self {
        DetectionError::ShapeMismatch {
            expected: expected.into(),
            actual: format!("{:?}", actual),
        }
    }
}
