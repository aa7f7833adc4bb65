// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading and codec selection for the detection pipeline

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::DetectionError;

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Decode raw image bytes (for multipart uploads)
///
/// # Returns
/// * `Ok((DynamicImage, ImageInfo))` - The decoded image and metadata
/// * `Err(DetectionError::Decode)` - Empty, unrecognised or corrupted data
/// * `Err(DetectionError::Dimension)` - Image decoded to zero width or height
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), DetectionError> {
    if bytes.is_empty() {
        return Err(DetectionError::Decode("image data is empty".to_string()));
    }

    // Detect format from magic bytes
    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DetectionError::Decode(e.to_string()))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(DetectionError::Dimension {
            width: img.width(),
            height: img.height(),
        });
    }

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detect image format from magic bytes
///
/// Recognises every signature the `image` crate knows.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, DetectionError> {
    image::guess_format(bytes)
        .map_err(|_| DetectionError::Decode("unsupported image format".to_string()))
}

/// Encoding used for the rendered output image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Pick the codec from the target file name: PNG for `.png`, JPEG otherwise
    pub fn from_file_name(file_name: Option<&str>) -> Self {
        let is_png = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("png"))
            .unwrap_or(false);

        if is_png {
            OutputFormat::Png
        } else {
            OutputFormat::Jpeg
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
        }
    }
}
