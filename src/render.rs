//! Mask rendering: a raw mask tensor becomes a grayscale JPEG, persisted to
//! the output directory and kept in memory for the response.

use crate::error::{LungsegError, Result};
use crate::ml::MaskTensor;

use image::{GrayImage, ImageFormat};
use ndarray::Axis;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A rendered segmentation mask.
///
/// The response is served from `bytes`; the on-disk copy is disposable and
/// is cleared later by the janitor sweep.
#[derive(Debug, Clone)]
pub struct RenderedMask {
    name: String,
    path: PathBuf,
    bytes: Vec<u8>,
}

impl RenderedMask {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Writes rendered masks into a fixed output directory.
pub struct MaskRenderer {
    output_dir: PathBuf,
}

impl MaskRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Verify the output-directory precondition. The directory is
    /// provisioned by deployment; the renderer never creates it.
    pub fn check_output_dir(&self) -> Result<()> {
        if !self.output_dir.is_dir() {
            return Err(LungsegError::Write(format!(
                "output directory {} does not exist",
                self.output_dir.display()
            )));
        }
        Ok(())
    }

    /// Render a mask tensor to a grayscale JPEG.
    ///
    /// The leading singleton dimension is squeezed, each value clamped to
    /// [0, 1] and mapped linearly to 8-bit gray. Raw model output is
    /// visualized as-is, with no thresholding. The filename is a time-ordered
    /// UUID, unique across concurrent calls without synchronization.
    pub fn render(&self, mask: &MaskTensor) -> Result<RenderedMask> {
        if mask.shape()[0] != 1 {
            return Err(LungsegError::Shape(format!(
                "mask has non-squeezable leading dimension {}",
                mask.shape()[0]
            )));
        }
        let plane = mask.index_axis(Axis(0), 0);
        let (h, w) = plane.dim();

        let mut img = GrayImage::new(w as u32, h as u32);
        for ((y, x), v) in plane.indexed_iter() {
            let p = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            img.put_pixel(x as u32, y as u32, image::Luma([p]));
        }

        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .map_err(|e| LungsegError::Write(format!("jpeg encode failed: {e}")))?;

        let name = format!("{}.jpg", Uuid::now_v7());
        let path = self.output_dir.join(&name);
        std::fs::write(&path, &bytes).map_err(|e| {
            LungsegError::Write(format!("write {} failed: {e}", path.display()))
        })?;

        Ok(RenderedMask { name, path, bytes })
    }
}
