//! The analyze pipeline: stage, validate, infer, render, release.

use crate::{
    errors::ApiError,
    model_handle::SharedModel,
    responses::{AnalysisResult, DetectionBody},
    staging::StagedUpload,
    state::AppState,
    validation,
};
use anyhow::Context;
use axum::{body::Bytes, extract::Multipart};
use base64::{Engine, engine::general_purpose::STANDARD};
use detector::{InferenceBackend, Model, Prediction, annotate};
use std::path::Path;
use std::sync::Arc;

const FILE_FIELD: &str = "file";

pub async fn analyze_upload<B: InferenceBackend>(
    state: &AppState<B>,
    multipart: Multipart,
) -> Result<AnalysisResult, ApiError> {
    let model = ensure_model(state).await?;

    let upload = read_upload(multipart).await?;
    if upload.is_empty() {
        return Err(ApiError::EmptyUpload);
    }

    let staging_dir = state.config.staging_dir.clone();
    tokio::task::spawn_blocking(move || process_upload(&staging_dir, &upload, &model))
        .await
        .map_err(|e| ApiError::Internal(format!("Analysis task failed: {e}")))?
}

/// Return the loaded model, reloading once if it is missing.
async fn ensure_model<B: InferenceBackend>(
    state: &AppState<B>,
) -> Result<SharedModel<B>, ApiError> {
    if let Some(model) = state.model.model() {
        return Ok(model);
    }

    tracing::warn!("Detection model not loaded, attempting reload");
    let handle = Arc::clone(&state.model);
    let reloaded = tokio::task::spawn_blocking(move || handle.load_model())
        .await
        .map_err(|e| ApiError::Internal(format!("Model reload task failed: {e}")))?;

    if !reloaded {
        return Err(ApiError::ModelUnavailable);
    }

    state.model.model().ok_or(ApiError::ModelUnavailable)
}

async fn read_upload(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        tracing::info!(
            file_name = ?field.file_name(),
            content_type = ?field.content_type(),
            "Receiving file"
        );

        let bytes = field.bytes().await?;
        tracing::info!(size = bytes.len(), "Received file");

        return Ok(bytes);
    }

    Err(ApiError::MissingFile)
}

/// Blocking part of the pipeline. The staged file never outlives this call.
pub fn process_upload<B: InferenceBackend>(
    staging_dir: &Path,
    upload: &[u8],
    model: &SharedModel<B>,
) -> Result<AnalysisResult, ApiError> {
    let staged = StagedUpload::stage(staging_dir, upload)
        .map_err(|e| ApiError::Internal(format!("Failed to stage upload: {e}")))?;

    tracing::info!(path = %staged.path().display(), "Processing image file");

    let size = staged
        .size_on_disk()
        .map_err(|e| ApiError::Internal(format!("Failed to inspect staged upload: {e}")))?;
    if size == 0 {
        return Err(ApiError::EmptyStagedFile);
    }

    let validated = validation::inspect(upload).inspect_err(|e| {
        validation::log_rejected_upload(upload, e);
    })?;
    validation::normalize(&validated, staged.path())?;

    let (prediction, detections) = {
        // A panicking inference leaves no partial state behind: preprocessing
        // refills its buffers and the session is stateless between runs.
        let mut model = model.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Previous inference panicked, reusing detection model");
            model.clear_poison();
            poisoned.into_inner()
        });

        let prediction = infer(staged.path(), &mut model)?;
        let names = model.class_names();
        let detections: Vec<DetectionBody> = prediction
            .detections
            .iter()
            .map(|d| DetectionBody {
                bbox: d.bbox(),
                confidence: d.confidence,
                class_name: names.resolve(d.class_id),
            })
            .collect();

        (prediction, detections)
    };

    tracing::info!(count = detections.len(), "Found detections");

    let annotated_image = render_preview(&prediction);

    staged.release();

    Ok(AnalysisResult::success(detections, annotated_image))
}

/// Run the model on the staged file.
pub fn infer<B: InferenceBackend>(path: &Path, model: &mut Model<B>) -> Result<Prediction, ApiError> {
    model
        .predict_path(path)
        .with_context(|| format!("Inference failed for {}", path.display()))
        .map_err(|e| {
            tracing::error!(error = ?e, "Error during image analysis");
            ApiError::Inference(format!("{e:#}"))
        })
}

/// Base64 JPEG preview, `None` if rendering fails.
fn render_preview(prediction: &Prediction) -> Option<String> {
    match annotate::render_annotated_jpeg(&prediction.image, &prediction.detections) {
        Ok(jpeg) => Some(STANDARD.encode(jpeg)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to render annotated image, omitting it");
            None
        }
    }
}
