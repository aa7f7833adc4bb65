// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 output decoding
//!
//! The detection head emits a `[1, 4 + K, N]` tensor: for every anchor `n`
//! rows 0..4 hold `xc, yc, w, h` in 640x640 model space and rows 4.. hold one
//! probability per class. Element `(c, n)` lives at flat offset `c * N + n`.

use serde::{Deserialize, Serialize};

use super::model::RawOutput;
use super::preprocessing::PreprocessInfo;
use crate::vision::error::DetectionError;
use crate::vision::geometry::BoundingBox;
use crate::vision::labels::ClassTable;

/// Number of anchors produced by a 640x640 YOLOv8 head
pub const NUM_ANCHORS: usize = 8400;

/// Number of box parameter rows preceding the class rows
pub const BOX_ROWS: usize = 4;

/// Minimum winning class probability for a candidate to be kept
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// A labeled box in original image coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub label: String,
    pub score: f32,
}

/// Argmax over the class rows of one anchor
///
/// Starts from `(0, 0.0)` and only moves on a strictly greater probability,
/// so ties resolve to the lowest class id.
fn best_class(data: &[f32], anchor: usize, num_classes: usize, num_anchors: usize) -> (usize, f32) {
    let mut best = (0usize, 0.0f32);
    for class_id in 0..num_classes {
        let prob = data[(BOX_ROWS + class_id) * num_anchors + anchor];
        if prob > best.1 {
            best = (class_id, prob);
        }
    }
    best
}

/// Validate the `[1, 4 + K, N]` layout and return `(K, N)`
fn check_shape(output: &RawOutput, num_classes: usize) -> Result<(usize, usize), DetectionError> {
    let expected_rows = BOX_ROWS + num_classes;
    let expected = || format!("[1, {}, N]", expected_rows);

    let (rows, anchors) = match output.shape() {
        [1, rows, anchors] => (*rows, *anchors),
        other => return Err(DetectionError::shape_mismatch(expected(), other)),
    };

    if rows != expected_rows {
        return Err(DetectionError::shape_mismatch(expected(), output.shape()));
    }

    if output.data().len() != rows * anchors {
        return Err(DetectionError::ShapeMismatch {
            expected: format!("{} values", rows * anchors),
            actual: format!("{} values", output.data().len()),
        });
    }

    Ok((num_classes, anchors))
}

/// Convert the raw head output into candidate detections
///
/// For every anchor the winning class is chosen by argmax; anchors whose
/// winning probability is below `confidence_threshold` are dropped. Surviving
/// boxes are converted to corners and rescaled per axis to the original image
/// size described by `info`. No suppression happens here.
///
/// # Errors
/// `ShapeMismatch` when the output is not `[1, 4 + K, N]` with `K` equal to
/// the class table length.
pub fn decode_output(
    output: &RawOutput,
    info: &PreprocessInfo,
    classes: &ClassTable,
    confidence_threshold: f32,
) -> Result<Vec<Detection>, DetectionError> {
    let (num_classes, num_anchors) = check_shape(output, classes.len())?;
    let data = output.data();

    let mut detections = Vec::new();
    for anchor in 0..num_anchors {
        let (class_id, prob) = best_class(data, anchor, num_classes, num_anchors);
        if prob < confidence_threshold {
            continue;
        }

        let xc = data[anchor];
        let yc = data[num_anchors + anchor];
        let w = data[2 * num_anchors + anchor];
        let h = data[3 * num_anchors + anchor];

        let model_box = BoundingBox::from_center(xc, yc, w, h);
        let (x1, y1) = info.map_to_original(model_box.x1, model_box.y1);
        let (x2, y2) = info.map_to_original(model_box.x2, model_box.y2);

        let label = classes
            .get(class_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("class_{}", class_id));

        detections.push(Detection {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            class_id,
            label,
            score: prob,
        });
    }

    Ok(detections)
}
