use crate::ml::Autoencoder;
use crate::render::MaskRenderer;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded segmentation model; read-only, shared across requests
    pub engine: Arc<Autoencoder>,

    /// Rendered-mask writer
    pub renderer: Arc<MaskRenderer>,

    /// Model artifact path, echoed by the health probe
    pub model_path: String,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        engine: Arc<Autoencoder>,
        renderer: Arc<MaskRenderer>,
        model_path: String,
    ) -> Self {
        Self {
            engine,
            renderer,
            model_path,
            start_time: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.start_time).num_seconds().max(0) as u64
    }
}
