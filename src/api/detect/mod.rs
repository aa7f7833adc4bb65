// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection API endpoint module
//!
//! Provides POST /detect for running YOLOv8 detection on an uploaded image.

pub mod handler;
pub mod response;

pub use handler::{detect_handler, IMAGE_FIELD};
pub use response::DetectResponse;
