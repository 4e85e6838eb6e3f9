use crate::{
    analyze::analyze_upload,
    errors::ApiError,
    responses::{AnalysisResult, ModelStatusResponse, RootResponse, SERVICE_STATUS},
    state::AppState,
};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
};
use detector::InferenceBackend;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn router<B: InferenceBackend>(state: AppState<B>) -> Router {
    let body_limit = state.config.body_limit_bytes;

    Router::new()
        .route("/", get(root::<B>))
        .route("/model-status", get(model_status::<B>))
        .route("/analyze", post(analyze::<B>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        // Any origin, method and header, with credentials
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

pub async fn run_server<B: InferenceBackend>(
    listener: tokio::net::TcpListener,
    state: AppState<B>,
) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn root<B: InferenceBackend>(State(state): State<AppState<B>>) -> Json<RootResponse> {
    Json(RootResponse {
        status: SERVICE_STATUS.to_string(),
        model_loaded: state.model.is_loaded(),
    })
}

async fn model_status<B: InferenceBackend>(
    State(state): State<AppState<B>>,
) -> Json<ModelStatusResponse> {
    let status = state.model.status();

    Json(ModelStatusResponse {
        model_loaded: status.loaded,
        status: if status.loaded {
            "Model loaded successfully".to_string()
        } else {
            "Model not loaded".to_string()
        },
        model_path: status.source_path.map(|p| p.display().to_string()),
        error: status.last_error,
    })
}

async fn analyze<B: InferenceBackend>(
    State(state): State<AppState<B>>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let start = Instant::now();

    let result = analyze_upload(&state, multipart).await;

    let detections = result.as_ref().map(|r| r.detections.len()).unwrap_or(0);
    state.metrics.record(start.elapsed(), &result, detections);

    if let Err(e) = &result {
        if e.is_client_error() {
            tracing::warn!(error = %e, "Rejected analyze request");
        } else {
            tracing::error!(error = %e, "Analyze request failed");
        }
    }

    result.map(Json)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
