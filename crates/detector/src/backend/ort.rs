use super::{ExecutionProvider, InferenceBackend, InferenceOutput};
use crate::labels::{ClassNames, parse_imgsz};
use ndarray::{Array, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use std::path::Path;

const INPUT_NAME: &str = "images";
const OUTPUT_NAME: &str = "output0";
const DEFAULT_INPUT_SIZE: (u32, u32) = (640, 640);

/// YOLOv8 detection export served through ONNX Runtime.
pub struct OrtBackend {
    session: Session,
    class_names: ClassNames,
    input_size: (u32, u32),
}

impl OrtBackend {
    fn read_metadata(session: &Session) -> (ClassNames, (u32, u32)) {
        let metadata = match session.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(error = %e, "Model metadata unavailable, using defaults");
                return (ClassNames::default(), DEFAULT_INPUT_SIZE);
            }
        };

        let class_names = match metadata.custom("names") {
            Some(raw) => ClassNames::parse_ultralytics(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Could not parse class names, ids will be reported");
                ClassNames::default()
            }),
            _ => {
                tracing::warn!("Model carries no class names, ids will be reported");
                ClassNames::default()
            }
        };

        let input_size = match metadata.custom("imgsz") {
            Some(raw) => parse_imgsz(&raw).unwrap_or(DEFAULT_INPUT_SIZE),
            _ => DEFAULT_INPUT_SIZE,
        };

        (class_names, input_size)
    }
}

impl InferenceBackend for OrtBackend {
    fn load_model(path: &Path, provider: ExecutionProvider) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;

        tracing::info!(provider = provider.as_str(), "Initializing ONNX Runtime session");

        match provider {
            ExecutionProvider::Cuda => {
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {}
        }

        let session = builder.commit_from_file(path)?;
        let (class_names, input_size) = Self::read_metadata(&session);

        tracing::info!(
            path = %path.display(),
            classes = class_names.len(),
            input_width = input_size.0,
            input_height = input_size.1,
            "Model loaded"
        );

        Ok(Self {
            session,
            class_names,
            input_size,
        })
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
        let outputs = self.session.run(ort::inputs![
            INPUT_NAME => TensorRef::from_array_view(images.view())?
        ])?;

        let predictions = outputs[OUTPUT_NAME].try_extract_array::<f32>()?;

        Ok(InferenceOutput {
            predictions: predictions.into_owned(),
        })
    }
}
