use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Initialize structured JSON logging. Log level comes from RUST_LOG, falling
/// back to the configured default.
pub fn init_telemetry(default_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(filter)
        .init();

    tracing::info!("stackhand telemetry initialized with structured logging");
    Ok(())
}

/// Correlation id linking every log line of one workflow invocation.
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping one workflow invocation end to end.
pub fn workflow_span(operation: &str, scope: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "workflow",
        operation = operation,
        scope = scope,
        correlation.id = correlation_id,
    )
}
