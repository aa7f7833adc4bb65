// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Drawing detections onto the source image

use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::io::Cursor;
use tracing::debug;

use super::error::DetectionError;
use super::image_utils::OutputFormat;
use super::yolo::decoder::Detection;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Box outline thickness in pixels
pub const STROKE_WIDTH: i32 = 3;

const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TAG_HEIGHT: u32 = 25;
const LABEL_TAG_PADDING: u32 = 5;

/// Renders labeled boxes and encodes the result
///
/// Holds the embedded label font; build once and share.
#[derive(Clone)]
pub struct Renderer {
    font: FontArc,
    scale: PxScale,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    pub fn new() -> Result<Self, DetectionError> {
        let font_data: &'static [u8] = include_bytes!("../../assets/DejaVuSans.ttf");
        let font = FontArc::try_from_slice(font_data)
            .map_err(|e| DetectionError::Encode(format!("failed to load label font: {}", e)))?;

        Ok(Self {
            font,
            scale: PxScale::from(LABEL_FONT_SIZE),
        })
    }

    /// Draw every detection on a copy of `image` and encode it as `format`
    ///
    /// Box coordinates are in original image space. They are clamped to the
    /// image here; boxes that collapse after clamping are skipped.
    pub fn render(
        &self,
        image: &DynamicImage,
        detections: &[Detection],
        format: OutputFormat,
    ) -> Result<Vec<u8>, DetectionError> {
        let mut canvas = image.to_rgb8();

        for detection in detections {
            self.draw_detection(&mut canvas, detection);
        }

        debug!(
            "Rendered {} detections onto {}x{} image",
            detections.len(),
            canvas.width(),
            canvas.height()
        );

        encode(canvas, format)
    }

    fn draw_detection(&self, canvas: &mut RgbImage, detection: &Detection) {
        let Some((x1, y1, x2, y2)) = clamp_box(detection, canvas.width(), canvas.height()) else {
            debug!("Skipping box outside the image: {:?}", detection.bbox);
            return;
        };

        // Stroke centred on the box edge, like a 3 px canvas stroke
        let half = STROKE_WIDTH / 2;
        for offset in -half..=half {
            let w = x2 - x1 - 2 * offset + 1;
            let h = y2 - y1 - 2 * offset + 1;
            if w <= 0 || h <= 0 {
                continue;
            }
            let rect = Rect::at(x1 + offset, y1 + offset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
        }

        let text = format!("{} {:.2}", detection.label, detection.score);
        let (text_w, text_h) = text_size(self.scale, &self.font, &text);

        let tag_w = (text_w + 2 * LABEL_TAG_PADDING).min(canvas.width());
        let tag_h = LABEL_TAG_HEIGHT.min(canvas.height());
        let tag_x = x1.min(canvas.width() as i32 - tag_w as i32).max(0);
        let tag_y = y1.min(canvas.height() as i32 - tag_h as i32).max(0);

        draw_filled_rect_mut(canvas, Rect::at(tag_x, tag_y).of_size(tag_w, tag_h), BOX_COLOR);

        let text_y = tag_y + (LABEL_TAG_HEIGHT.saturating_sub(text_h) / 2) as i32;
        draw_text_mut(
            canvas,
            TEXT_COLOR,
            tag_x + LABEL_TAG_PADDING as i32,
            text_y,
            self.scale,
            &self.font,
            &text,
        );
    }
}

/// Integer corners of a detection clamped to the image, `None` if nothing is left
fn clamp_box(detection: &Detection, width: u32, height: u32) -> Option<(i32, i32, i32, i32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let bbox = &detection.bbox;
    let max_x = width as f32 - 1.0;
    let max_y = height as f32 - 1.0;

    // f32::min/max ignore a NaN operand, and a NaN result casts to 0
    let x1 = bbox.x1.min(bbox.x2).clamp(0.0, max_x).floor() as i32;
    let y1 = bbox.y1.min(bbox.y2).clamp(0.0, max_y).floor() as i32;
    let x2 = bbox.x1.max(bbox.x2).clamp(0.0, max_x).ceil() as i32;
    let y2 = bbox.y1.max(bbox.y2).clamp(0.0, max_y).ceil() as i32;

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some((x1, y1, x2, y2))
}

fn encode(canvas: RgbImage, format: OutputFormat) -> Result<Vec<u8>, DetectionError> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut Cursor::new(&mut buffer), format.image_format())
        .map_err(|e| DetectionError::Encode(format!("failed to encode {:?}: {}", format, e)))?;
    Ok(buffer)
}
