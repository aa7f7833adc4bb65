// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection response types

use serde::{Deserialize, Serialize};

use crate::storage::StoredArtifact;
use crate::vision::yolo::{Detection, DetectionOutcome};

/// Response from object detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    /// Request id, also the key of the processed image
    pub id: String,
    /// Download name of the processed image
    pub file_name: String,
    /// MIME type of the processed image
    pub content_type: String,
    /// Original image width
    pub width: u32,
    /// Original image height
    pub height: u32,
    /// Final detections in original image coordinates, descending by score
    pub detections: Vec<Detection>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Where to fetch the processed image
    pub download_url: String,
}

impl DetectResponse {
    pub fn new(
        artifact: &StoredArtifact,
        outcome: DetectionOutcome,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            id: artifact.id.to_string(),
            file_name: artifact.file_name.clone(),
            content_type: artifact.content_type().to_string(),
            width: outcome.original_width,
            height: outcome.original_height,
            detections: outcome.detections,
            processing_time_ms,
            download_url: format!("/download/{}", artifact.id),
        }
    }
}
