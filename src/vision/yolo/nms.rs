// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Greedy non-maximum suppression
//!
//! Suppression is class-agnostic: a confident box suppresses any overlapping
//! lower-scoring box, whatever its class.

use std::cmp::Ordering;

use super::decoder::Detection;
use crate::vision::geometry::iou;

/// IoU at or above which the lower-scoring box is suppressed
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;

/// Reduce candidates to a set with no two members overlapping at `iou_threshold` or more
///
/// Candidates are stably sorted by descending score, so equal scores keep
/// their anchor order. The highest remaining box is kept and every other
/// candidate with IoU >= `iou_threshold` against it is dropped, until no
/// candidates remain. The input is left untouched and the result is ordered
/// by descending score.
pub fn non_max_suppression(candidates: &[Detection], iou_threshold: f32) -> Vec<Detection> {
    let mut remaining: Vec<Detection> = candidates.to_vec();
    remaining.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut kept = Vec::with_capacity(remaining.len().min(64));
    while !remaining.is_empty() {
        // The head is removed explicitly so degenerate boxes, whose self-IoU
        // is 0, cannot survive as their own duplicate.
        let best = remaining.remove(0);
        remaining.retain(|other| iou(&best.bbox, &other.bbox) < iou_threshold);
        kept.push(best);
    }

    kept
}
