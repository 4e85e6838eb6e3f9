use crate::{config::ApiConfig, metrics::AnalyzeMetrics, model_handle::ModelHandle};
use detector::InferenceBackend;
use std::sync::Arc;

pub struct AppState<B: InferenceBackend> {
    pub model: Arc<ModelHandle<B>>,
    pub config: Arc<ApiConfig>,
    pub metrics: Arc<AnalyzeMetrics>,
}

impl<B: InferenceBackend> AppState<B> {
    pub fn new(model: Arc<ModelHandle<B>>, config: ApiConfig) -> Self {
        Self {
            model,
            config: Arc::new(config),
            metrics: Arc::new(AnalyzeMetrics::new(crate::SERVICE_NAME)),
        }
    }
}

// Manual impl: derive would require `B: Clone`
impl<B: InferenceBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            config: Arc::clone(&self.config),
            metrics: Arc::clone(&self.metrics),
        }
    }
}
