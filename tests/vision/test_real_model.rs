// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detection against a real YOLOv8 ONNX export
//!
//! Requires the model at `MODEL_PATH` (default `./models/yolov8m.onnx`).

use std::sync::Arc;
use yolo_detection_node::vision::yolo::{
    preprocess_bytes, InferenceEngine, YoloOnnxModel, NUM_ANCHORS,
};

use crate::support::{pipeline, png_bytes};

fn model_path() -> String {
    std::env::var("MODEL_PATH").unwrap_or_else(|_| "./models/yolov8m.onnx".to_string())
}

#[test]
#[ignore] // Requires downloaded YOLOv8 model
fn test_real_model_output_shape() {
    let model = YoloOnnxModel::load(model_path(), 4).expect("Failed to load YOLOv8 model");
    assert_eq!(model.input_name(), "images");
    assert_eq!(model.output_name(), "output0");

    let (input, _) = preprocess_bytes(&png_bytes(640, 480)).unwrap();
    let output = model.run(&input).unwrap();
    assert_eq!(output.shape(), &[1, 84, NUM_ANCHORS]);
}

#[test]
#[ignore] // Requires downloaded YOLOv8 model
fn test_real_model_on_blank_image() {
    let model = YoloOnnxModel::load(model_path(), 4).expect("Failed to load YOLOv8 model");
    let pipeline = pipeline(Arc::new(model));

    let outcome = pipeline.detect(&png_bytes(640, 480)).unwrap();
    assert_eq!((outcome.original_width, outcome.original_height), (640, 480));
    assert!(outcome.detections.iter().all(|d| d.score >= 0.5));
}
