use crate::config::Environment;
use opentelemetry::global::BoxedTracer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Directives used when `RUST_LOG` is unset. ort reports every graph
/// optimisation pass at info.
pub const DEFAULT_FILTER: &str = "info,ort=warn";

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber: pretty output in development, JSON in
/// production.
///
/// Fails if a subscriber is already installed.
pub fn setup_logging(environment: Environment) -> anyhow::Result<()> {
    install(environment, None)
}

/// Same as [`setup_logging`], additionally bridging spans to `tracer`.
pub(crate) fn install(environment: Environment, tracer: Option<BoxedTracer>) -> anyhow::Result<()> {
    let otel_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let registry = tracing_subscriber::registry()
        .with(env_filter())
        .with(otel_layer);

    match environment {
        Environment::Production => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_level(true)
                    .with_current_span(true),
            )
            .try_init()?,
        Environment::Development => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
            .try_init()?,
    }

    Ok(())
}
