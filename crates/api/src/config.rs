use detector::{ExecutionProvider, ModelOptions};
use std::env;
use std::path::{Path, PathBuf};

pub use common::Environment;

pub const DEFAULT_MODEL_FILE: &str = "best.onnx";
pub const PORT_FILE_NAME: &str = "yolo_api_port.txt";
const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub environment: Environment,
    pub service_dir: PathBuf,
    pub model_file: String,
    pub model_options: ModelOptions,
    pub port_start: u16,
    pub port_max_attempts: u16,
    pub port_file: PathBuf,
    pub staging_dir: PathBuf,
    pub body_limit_bytes: usize,
    pub otel_endpoint: Option<String>,
}

impl ApiConfig {
    /// Defaults rooted at `service_dir`, without reading the environment.
    pub fn for_service_dir(service_dir: impl Into<PathBuf>) -> Self {
        let service_dir = service_dir.into();
        let port_file = service_dir.join(PORT_FILE_NAME);

        Self {
            environment: Environment::Development,
            service_dir,
            model_file: DEFAULT_MODEL_FILE.to_string(),
            model_options: ModelOptions::default(),
            port_start: crate::port::DEFAULT_START_PORT,
            port_max_attempts: crate::port::DEFAULT_MAX_ATTEMPTS,
            port_file,
            staging_dir: env::temp_dir(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            otel_endpoint: None,
        }
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let service_dir = match env::var("SERVICE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => env::current_dir()?,
        };

        let mut config = Self::for_service_dir(service_dir);
        config.environment = Environment::from_env();

        if let Ok(model_file) = env::var("MODEL_FILE") {
            config.model_file = model_file;
        }

        if let Ok(provider) = env::var("EXECUTION_PROVIDER") {
            config.model_options.provider = ExecutionProvider::try_from(provider.as_str())?;
        }

        config.model_options.confidence_threshold = env::var("CONFIDENCE_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.model_options.confidence_threshold);

        config.model_options.iou_threshold = env::var("IOU_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.model_options.iou_threshold);

        config.port_start = env::var("PORT_START")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.port_start);

        config.port_max_attempts = env::var("PORT_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.port_max_attempts);

        if let Ok(port_file) = env::var("PORT_FILE") {
            config.port_file = PathBuf::from(port_file);
        }

        if let Ok(staging_dir) = env::var("STAGING_DIR") {
            config.staging_dir = PathBuf::from(staging_dir);
        }

        config.body_limit_bytes = env::var("BODY_LIMIT_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.body_limit_bytes);

        config.otel_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .filter(|s| !s.is_empty());

        Ok(config)
    }

    /// Model locations in lookup order: next to the service, then the sibling
    /// `public/models` and `models` directories.
    pub fn model_candidates(&self) -> Vec<PathBuf> {
        model_candidates(&self.service_dir, &self.model_file)
    }
}

pub fn model_candidates(service_dir: &Path, model_file: &str) -> Vec<PathBuf> {
    let parent = service_dir.join("..");
    vec![
        service_dir.join(model_file),
        parent.join("public").join("models").join(model_file),
        parent.join("models").join(model_file),
    ]
}
