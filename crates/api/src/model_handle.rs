use detector::{InferenceBackend, Model, ModelOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

pub type SharedModel<B> = Arc<Mutex<Model<B>>>;

/// Snapshot of the handle for status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelStatus {
    pub loaded: bool,
    pub source_path: Option<PathBuf>,
    pub last_error: Option<String>,
}

struct Slot<B: InferenceBackend> {
    model: Option<SharedModel<B>>,
    source_path: Option<PathBuf>,
    last_error: Option<String>,
}

/// Process-wide record of whether and where the detection model is loaded.
pub struct ModelHandle<B: InferenceBackend> {
    candidates: Vec<PathBuf>,
    options: ModelOptions,
    slot: RwLock<Slot<B>>,
}

impl<B: InferenceBackend> ModelHandle<B> {
    /// Starts unloaded; call [`ModelHandle::load_model`] to populate.
    pub fn new(candidates: Vec<PathBuf>, options: ModelOptions) -> Self {
        Self {
            candidates,
            options,
            slot: RwLock::new(Slot {
                model: None,
                source_path: None,
                last_error: None,
            }),
        }
    }

    /// Try each candidate in order and keep the first that loads.
    ///
    /// Blocking. Returns whether a model is loaded afterwards.
    pub fn load_model(&self) -> bool {
        let mut last_error = None;

        for path in &self.candidates {
            if !path.exists() {
                tracing::info!(path = %path.display(), "No model file at candidate path");
                continue;
            }

            tracing::info!(path = %path.display(), "Loading detection model");
            match Model::<B>::load(path, &self.options) {
                Ok(model) => {
                    tracing::info!(path = %path.display(), "Successfully loaded detection model");
                    let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
                    slot.model = Some(Arc::new(Mutex::new(model)));
                    slot.source_path = Some(path.clone());
                    slot.last_error = None;
                    return true;
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Error loading detection model");
                    last_error = Some(format!("{e:#}"));
                }
            }
        }

        let error = last_error.unwrap_or_else(|| {
            let searched: Vec<String> = self
                .candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            format!("Model file not found in any of: {}", searched.join(", "))
        });
        tracing::error!(error = %error, "Detection model unavailable");

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.model = None;
        slot.source_path = None;
        slot.last_error = Some(error);
        false
    }

    pub fn model(&self) -> Option<SharedModel<B>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .model
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .model
            .is_some()
    }

    pub fn status(&self) -> ModelStatus {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        ModelStatus {
            loaded: slot.model.is_some(),
            source_path: slot.source_path.clone(),
            last_error: slot.last_error.clone(),
        }
    }
}
