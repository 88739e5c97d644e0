//! ONNX Runtime session construction shared by all model adapters.
//!
//! Execution provider selection:
//! - CUDA on Linux when the `cuda` feature is enabled
//! - CoreML on macOS
//! - CPU fallback on all platforms

use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info};

use crate::error::{VisionError, VisionResult};

/// Create an ONNX Runtime session for the model at `model_path`.
pub fn create_session(model_path: &Path, model_name: &str) -> VisionResult<Session> {
    if !model_path.exists() {
        return Err(VisionError::model_not_found(model_path.display().to_string()));
    }

    let model_bytes = std::fs::read(model_path)?;

    let builder = Session::builder()
        .map_err(|e| VisionError::inference_failed(format!("ORT session builder: {e}")))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| VisionError::inference_failed(format!("ORT opt level: {e}")))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!(model = model_name, "Using CUDA execution provider");
                return Ok(session);
            }
        }
        debug!(model = model_name, "CUDA execution provider not available");
    }

    #[cfg(target_os = "macos")]
    {
        use ort::execution_providers::CoreMLExecutionProvider;
        if let Ok(coreml_builder) = builder
            .clone()
            .with_execution_providers([CoreMLExecutionProvider::default().build()])
        {
            if let Ok(session) = coreml_builder.commit_from_memory(&model_bytes) {
                info!(model = model_name, "Using CoreML execution provider");
                return Ok(session);
            }
        }
        debug!(model = model_name, "CoreML execution provider not available");
    }

    info!(model = model_name, path = %model_path.display(), "Using CPU execution provider");
    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| VisionError::inference_failed(format!("ORT load {model_name}: {e}")))
}

/// Run a single-input session and return the first output as (shape, data).
pub(crate) fn run_single(
    session: &std::sync::Mutex<Session>,
    input: Value,
) -> VisionResult<(Vec<i64>, Vec<f32>)> {
    let mut session = session
        .lock()
        .map_err(|_| VisionError::inference_failed("ORT session poisoned"))?;

    let outputs = session
        .run(ort::inputs![input])
        .map_err(|e| VisionError::inference_failed(format!("ORT run failed: {e}")))?;

    if outputs.len() == 0 {
        return Err(VisionError::inference_failed("ORT returned no outputs"));
    }

    let (shape, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| VisionError::inference_failed(format!("ORT extract: {e}")))?;

    Ok((shape.iter().copied().collect(), data.to_vec()))
}

/// Build an NCHW float tensor value.
pub(crate) fn nchw_tensor(data: Vec<f32>, height: usize, width: usize) -> VisionResult<Value> {
    let shape = vec![1usize, 3, height, width];
    ort::value::Tensor::from_array((shape, data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| VisionError::inference_failed(format!("ORT tensor: {e}")))
}
