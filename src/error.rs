use thiserror::Error;

/// Main error type for the segmentation service
#[derive(Error, Debug)]
pub enum LungsegError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Upload / preprocessing errors
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Tensor shape mismatch: {0}")]
    Shape(String),

    #[error("Malformed upload: {0}")]
    Multipart(String),

    // Model lifecycle errors
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    // Rendering errors
    #[error("Mask write failed: {0}")]
    Write(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for LungsegError
pub type Result<T> = std::result::Result<T, LungsegError>;

impl LungsegError {
    /// Whether the failure is the caller's fault (a bad upload) rather than
    /// the service's. Drives the 4xx/5xx split in the API layer.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::Shape(_) | Self::Multipart(_)
        )
    }
}
