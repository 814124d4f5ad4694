pub mod api;
pub mod config;
pub mod error;
pub mod ml;
pub mod preprocess;
pub mod render;
pub mod services;

pub use api::{create_router, AppState};
pub use config::AppConfig;
pub use error::{LungsegError, Result};
pub use ml::{Autoencoder, MaskTensor};
pub use preprocess::{NormalizedScan, INPUT_SIZE};
pub use render::{MaskRenderer, RenderedMask};
pub use services::Janitor;
