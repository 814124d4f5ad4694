//! ONNX autoencoder wrapper around the pretrained lung-segmentation graph.

use crate::error::{LungsegError, Result};
use crate::preprocess::{NormalizedScan, INPUT_SIZE};

use ndarray::Array3;
use std::path::Path;
use tract_onnx::prelude::*;

/// Fixed input fact: one scan per call, channel folded into the leading dim.
const INPUT_SHAPE: [usize; 3] = [1, INPUT_SIZE, INPUT_SIZE];

/// Raw model output: per-pixel segmentation confidence, same spatial shape
/// as the input. No value-range invariant is enforced here; the renderer
/// clamps on visualization.
pub type MaskTensor = Array3<f32>;

pub struct Autoencoder {
    plan: TypedRunnableModel<TypedModel>,
}

impl std::fmt::Debug for Autoencoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autoencoder")
            .field("input_shape", &INPUT_SHAPE)
            .finish()
    }
}

impl Autoencoder {
    /// Load the pretrained graph and specialize it to a fixed `f32` scan
    /// input.
    ///
    /// Any failure here must be treated as fatal by the caller: the service
    /// refuses to serve traffic without a runnable model.
    pub fn load(path: &Path) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| LungsegError::ModelLoad(format!("onnx load failed: {e}")))?;

        let mut shape = tvec!();
        for d in INPUT_SHAPE {
            shape.push(d);
        }

        let plan = model
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))
            .map_err(|e| LungsegError::ModelLoad(format!("onnx input fact failed: {e}")))?
            .into_optimized()
            .map_err(|e| LungsegError::ModelLoad(format!("onnx optimize failed: {e}")))?
            .into_runnable()
            .map_err(|e| LungsegError::ModelLoad(format!("onnx runnable failed: {e}")))?;

        Ok(Self { plan })
    }

    /// Run the graph's single declared input against its single declared
    /// output.
    ///
    /// The plan is borrowed immutably, so a shared `Arc<Autoencoder>` serves
    /// concurrent requests without locking.
    pub fn predict(&self, scan: &NormalizedScan) -> Result<MaskTensor> {
        let input = tract_ndarray::ArrayD::<f32>::from_shape_vec(
            tract_ndarray::IxDyn(&INPUT_SHAPE),
            scan.tensor().iter().copied().collect(),
        )
        .map_err(|e| LungsegError::Shape(format!("input reshape failed: {e}")))?
        .into_tvalue();

        let outputs = self
            .plan
            .run(tvec!(input))
            .map_err(|e| LungsegError::Inference(format!("onnx run failed: {e}")))?;
        if outputs.is_empty() {
            return Err(LungsegError::Inference(
                "onnx produced no outputs".to_string(),
            ));
        }

        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| LungsegError::Inference(format!("onnx output decode failed: {e}")))?;

        let elems = view.len();
        Array3::from_shape_vec((1, INPUT_SIZE, INPUT_SIZE), view.iter().copied().collect())
            .map_err(|_| {
                LungsegError::Inference(format!(
                    "onnx output has {elems} elements, expected {}",
                    INPUT_SIZE * INPUT_SIZE
                ))
            })
    }
}
