//! Model inference (pure Rust via `tract-onnx`).
//!
//! This module is intentionally dependency-light so the service can run on
//! small instances without GPU/toolchain complexity.

pub mod autoencoder;

pub use autoencoder::{Autoencoder, MaskTensor};
