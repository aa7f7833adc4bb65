// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 ONNX model and the inference boundary
//!
//! The execution engine is consumed as a black box through the
//! [`InferenceEngine`] trait: a `[1, 3, 640, 640]` planar tensor goes in, the
//! raw `[1, 84, 8400]` head output comes out. [`YoloOnnxModel`] is the ONNX
//! Runtime implementation. It is loaded once at startup and shared by every
//! request.

use ndarray::Array4;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::{INPUT_CHANNELS, YOLO_INPUT_SIZE};
use crate::vision::error::DetectionError;

/// Default input tensor name of Ultralytics YOLOv8 exports
pub const DEFAULT_INPUT_NAME: &str = "images";

/// Default output tensor name of Ultralytics YOLOv8 exports
pub const DEFAULT_OUTPUT_NAME: &str = "output0";

/// Raw output tensor: flat `f32` data plus its shape
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutput {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl RawOutput {
    /// Wrap flat data, checking it matches the shape
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, DetectionError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(DetectionError::ShapeMismatch {
                expected: format!("{} elements for shape {:?}", expected, shape),
                actual: format!("{} elements", data.len()),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Boundary to the tensor-execution engine
///
/// Implementations must be safe to call from several requests at once.
pub trait InferenceEngine: Send + Sync {
    /// Run the model on a `[1, 3, 640, 640]` input
    fn run(&self, input: &Array4<f32>) -> Result<RawOutput, DetectionError>;

    /// Human-readable model name for logs and health reporting
    fn name(&self) -> &str {
        "yolov8"
    }
}

/// Validate that `input` is the planar `[1, 3, 640, 640]` tensor the model expects
pub fn validate_input_shape(input: &Array4<f32>) -> Result<(), DetectionError> {
    let size = YOLO_INPUT_SIZE as usize;
    let expected = [1, INPUT_CHANNELS, size, size];
    if input.shape() != expected {
        return Err(DetectionError::Inference(format!(
            "invalid input shape: {:?}, expected {:?}",
            input.shape(),
            expected
        )));
    }
    Ok(())
}

/// YOLOv8 detector running on ONNX Runtime
///
/// Runs on CPU. The session is created once and kept behind a mutex since
/// ONNX Runtime sessions need exclusive access while running.
#[derive(Clone)]
pub struct YoloOnnxModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Model output name
    output_name: String,
    /// File name of the loaded model
    model_name: String,
}

impl std::fmt::Debug for YoloOnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloOnnxModel")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_name", &self.model_name)
            .finish_non_exhaustive()
    }
}

impl YoloOnnxModel {
    /// Load the detection model from an ONNX file
    ///
    /// # Errors
    /// Returns `DetectionError::ModelLoad` if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    /// - The file is not a valid model
    pub fn load<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self, DetectionError> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            return Err(DetectionError::ModelLoad(format!(
                "detection model not found: {}",
                model_path.display()
            )));
        }

        info!("Loading detection model from {}", model_path.display());

        let load_err = |stage: &str, e: ort::Error| {
            DetectionError::ModelLoad(format!("{}: {}", stage, e))
        };

        let session = Session::builder()
            .map_err(|e| load_err("failed to create session builder", e))?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(|e| load_err("failed to set CPU execution provider", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_err("failed to set optimization level", e))?
            .with_intra_threads(intra_threads.max(1))
            .map_err(|e| load_err("failed to set intra threads", e))?
            .commit_from_file(model_path)
            .map_err(|e| {
                load_err(
                    &format!("failed to load model from {}", model_path.display()),
                    e,
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| DEFAULT_INPUT_NAME.to_string());

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Detection model input type: {:?}", input.input_type);
        }

        let model_name = model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("yolov8")
            .to_string();

        info!(
            "✅ Detection model {} loaded (input: {}, output: {})",
            model_name, input_name, output_name
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
            model_name,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }
}

impl InferenceEngine for YoloOnnxModel {
    fn run(&self, input: &Array4<f32>) -> Result<RawOutput, DetectionError> {
        validate_input_shape(input)?;

        let input_value = Tensor::from_array(input.to_owned())
            .map_err(|e| DetectionError::Inference(format!("failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectionError::Inference("session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let output_tensor = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| {
                DetectionError::Inference(format!("failed to extract output tensor: {}", e))
            })?;

        let shape = output_tensor.shape().to_vec();
        debug!("Detection output shape: {:?}", shape);

        let data: Vec<f32> = output_tensor.iter().copied().collect();
        RawOutput::new(shape, data)
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
