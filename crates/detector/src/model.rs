use crate::{
    backend::{ExecutionProvider, InferenceBackend},
    labels::ClassNames,
    processing::{
        post::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, Detection, PostProcessor},
        pre::PreProcessor,
    },
};
use anyhow::Context;
use image::RgbImage;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ModelOptions {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub provider: ExecutionProvider,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            provider: ExecutionProvider::default(),
        }
    }
}

/// Detections together with the image they were found on.
pub struct Prediction {
    pub image: RgbImage,
    pub detections: Vec<Detection>,
}

pub struct Model<B: InferenceBackend> {
    backend: B,
    preprocessor: PreProcessor,
    postprocessor: PostProcessor,
}

impl<B: InferenceBackend> Model<B> {
    pub fn load(path: &Path, options: &ModelOptions) -> anyhow::Result<Self> {
        let backend = B::load_model(path, options.provider)?;
        Ok(Self::from_backend(backend, options))
    }

    pub fn from_backend(backend: B, options: &ModelOptions) -> Self {
        let preprocessor = PreProcessor::new(backend.input_size());
        let postprocessor = PostProcessor::new(options.confidence_threshold, options.iou_threshold);
        Self {
            backend,
            preprocessor,
            postprocessor,
        }
    }

    pub fn class_names(&self) -> &ClassNames {
        self.backend.class_names()
    }

    /// Read the image at `path` and run detection on it.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn predict_path(&mut self, path: &Path) -> anyhow::Result<Prediction> {
        let image = image::open(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?
            .to_rgb8();

        self.predict(image)
    }

    pub fn predict(&mut self, image: RgbImage) -> anyhow::Result<Prediction> {
        let (input, transform) = self.preprocessor.preprocess(&image)?;

        let output = self.backend.infer(&input).context("Model invocation failed")?;

        let detections = self
            .postprocessor
            .parse_detections(&output.predictions.view(), &transform)?;

        Ok(Prediction { image, detections })
    }
}
