//! Upload preprocessing: decode, grayscale, resize, and scale an uploaded
//! chest X-ray into the fixed-shape tensor the autoencoder expects.

use crate::error::{LungsegError, Result};
use image::imageops::FilterType;
use ndarray::Array3;

/// Model input spatial size (pixels per side).
pub const INPUT_SIZE: usize = 400;

/// A chest X-ray normalized for inference: single channel, 400x400,
/// values scaled into [0, 1].
#[derive(Debug, Clone)]
pub struct NormalizedScan {
    tensor: Array3<f32>,
}

impl NormalizedScan {
    /// Decode an uploaded image buffer and normalize it for the model.
    ///
    /// Multi-channel sources are reduced to one channel with the ITU-R 601
    /// luminance conversion before resizing. The resize is exact, with no
    /// aspect-preserving padding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| LungsegError::Decode(format!("not a decodable raster image: {e}")))?;

        let gray = decoded.to_luma8();
        let resized = image::imageops::resize(
            &gray,
            INPUT_SIZE as u32,
            INPUT_SIZE as u32,
            FilterType::Triangle,
        );

        let pixels: Vec<f32> = resized
            .into_raw()
            .into_iter()
            .map(|p| f32::from(p) / 255.0)
            .collect();

        let tensor = Array3::from_shape_vec((1, INPUT_SIZE, INPUT_SIZE), pixels)
            .map_err(|e| LungsegError::Shape(format!("tensor assembly failed: {e}")))?;

        Ok(Self { tensor })
    }

    /// Shape is always (1, INPUT_SIZE, INPUT_SIZE).
    pub fn tensor(&self) -> &Array3<f32> {
        &self.tensor
    }

    pub fn into_tensor(self) -> Array3<f32> {
        self.tensor
    }
}
