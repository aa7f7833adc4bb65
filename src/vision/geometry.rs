// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Axis-aligned box geometry used by the detection post-processing

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in corner form
///
/// Corners are stored exactly as decoded. `x1 < x2` and `y1 < y2` hold for
/// well-formed detections but are not enforced: a degenerate decode may
/// produce inverted corners, which every function here tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a corner-form box from center/size parameters
    pub fn from_center(xc: f32, yc: f32, w: f32, h: f32) -> Self {
        Self {
            x1: xc - w / 2.0,
            y1: yc - h / 2.0,
            x2: xc + w / 2.0,
            y2: yc + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Raw area, `width * height` without clamping
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// True when the box has a strictly positive extent on both axes
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }
}

/// Overlapping area of two boxes, zero when they do not overlap
///
/// A non-positive overlap on either axis contributes no intersection, which
/// also covers boxes with inverted corners.
pub fn intersection(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let w = x2 - x1;
    let h = y2 - y1;
    if w <= 0.0 || h <= 0.0 {
        return 0.0;
    }
    w * h
}

/// Combined area of two boxes
pub fn union(a: &BoundingBox, b: &BoundingBox) -> f32 {
    a.area() + b.area() - intersection(a, b)
}

/// Intersection over union, in `[0, 1]` for well-formed boxes
///
/// Returns 0.0 when the union is not positive or the result is not finite.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let inter = intersection(a, b);
    if inter <= 0.0 {
        return 0.0;
    }

    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        return 0.0;
    }

    let value = inter / union;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
