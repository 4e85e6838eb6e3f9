pub mod analyze;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod model_handle;
pub mod port;
pub mod responses;
pub mod routes;
pub mod staging;
pub mod state;
pub mod validation;

pub use config::ApiConfig;
pub use errors::ApiError;
pub use model_handle::{ModelHandle, ModelStatus};
pub use routes::{router, run_server};
pub use state::AppState;

/// Reported to the OTLP collector and used as the meter name.
pub const SERVICE_NAME: &str = "yolo-api";
