// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the YOLOv8 detector

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

use crate::vision::error::DetectionError;
use crate::vision::image_utils::decode_image_bytes;

/// Square input resolution of the detection model
pub const YOLO_INPUT_SIZE: u32 = 640;

/// Number of colour channels in the model input
pub const INPUT_CHANNELS: usize = 3;

/// Original image geometry, needed to map detections back from model space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessInfo {
    /// Original image width
    pub original_width: u32,
    /// Original image height
    pub original_height: u32,
}

impl PreprocessInfo {
    /// Horizontal factor from model space to original space
    pub fn scale_x(&self) -> f32 {
        self.original_width as f32 / YOLO_INPUT_SIZE as f32
    }

    /// Vertical factor from model space to original space
    pub fn scale_y(&self) -> f32 {
        self.original_height as f32 / YOLO_INPUT_SIZE as f32
    }

    /// Map a point from the 640x640 model space to original image space
    ///
    /// Axes are scaled independently, matching the stretch resize.
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x / YOLO_INPUT_SIZE as f32 * self.original_width as f32,
            y / YOLO_INPUT_SIZE as f32 * self.original_height as f32,
        )
    }
}

/// Normalize one 8-bit sample to `[0, 1]`
#[inline]
pub fn normalize_sample(value: u8) -> f32 {
    value as f32 / 255.0
}

/// Preprocess a decoded image for detection
///
/// Steps:
/// 1. Reject zero-sized images
/// 2. Strip alpha (convert to RGB8)
/// 3. Stretch to exactly 640x640, scaling X and Y independently
/// 4. Normalize each sample: pixel / 255
/// 5. Re-layout interleaved RGB to planar NCHW `[1, 3, 640, 640]`
pub fn preprocess(image: &DynamicImage) -> Result<(Array4<f32>, PreprocessInfo), DetectionError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(DetectionError::Dimension { width, height });
    }

    let rgb = image.to_rgb8();
    let resized = image::imageops::resize(
        &rgb,
        YOLO_INPUT_SIZE,
        YOLO_INPUT_SIZE,
        FilterType::Lanczos3,
    );

    let tensor = interleaved_to_planar(
        resized.as_raw(),
        YOLO_INPUT_SIZE as usize,
        YOLO_INPUT_SIZE as usize,
    );

    Ok((
        tensor,
        PreprocessInfo {
            original_width: width,
            original_height: height,
        },
    ))
}

/// Decode image bytes and preprocess them in one step
pub fn preprocess_bytes(bytes: &[u8]) -> Result<(Array4<f32>, PreprocessInfo), DetectionError> {
    let (image, _info) = decode_image_bytes(bytes)?;
    preprocess(&image)
}

/// Convert interleaved `R,G,B,R,G,B,...` bytes into a normalized planar tensor
///
/// `raw` must hold exactly `width * height * 3` samples.
pub fn interleaved_to_planar(raw: &[u8], width: usize, height: usize) -> Array4<f32> {
    debug_assert_eq!(raw.len(), width * height * INPUT_CHANNELS);

    let mut tensor = Array4::zeros((1, INPUT_CHANNELS, height, width));

    for (idx, pixel) in raw
        .chunks_exact(INPUT_CHANNELS)
        .take(width * height)
        .enumerate()
    {
        let (y, x) = (idx / width, idx % width);
        for c in 0..INPUT_CHANNELS {
            tensor[[0, c, y, x]] = normalize_sample(pixel[c]);
        }
    }

    tensor
}
