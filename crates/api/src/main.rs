use anyhow::Context;
use api::{
    ApiConfig, AppState, ModelHandle, SERVICE_NAME,
    port::{select_port, write_port_file},
    run_server,
};
use common::{TelemetryGuard, setup_logging};
use detector::backend::ort::OrtBackend as Backend;
use std::net::Ipv4Addr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;

    // TelemetryGuard installs the subscriber itself
    let _telemetry = match config.otel_endpoint.as_ref() {
        Some(endpoint) => Some(TelemetryGuard::init(
            SERVICE_NAME,
            endpoint,
            config.environment,
        )?),
        None => {
            setup_logging(config.environment)?;
            None
        }
    };

    tracing::info!(config = ?config, "Loaded configuration");

    let model = Arc::new(ModelHandle::<Backend>::new(
        config.model_candidates(),
        config.model_options.clone(),
    ));
    if !model.load_model() {
        tracing::warn!("Starting without a detection model, analyze will retry loading");
    }

    let port = select_port(config.port_start, config.port_max_attempts);
    tracing::info!(port, "Starting detection API server");

    write_port_file(&config.port_file, port)
        .with_context(|| format!("Failed to write port file {}", config.port_file.display()))?;

    let listener = tokio::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    run_server(listener, AppState::new(model, config)).await
}
