use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info, warn};

/// Logs every request with a generated request id, its status and latency.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = uuid::Uuid::new_v4().to_string();

    let response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    match status {
        500..=599 => error!(%request_id, %method, %path, status, latency_ms, "Server error"),
        400..=499 => warn!(%request_id, %method, %path, status, latency_ms, "Client error"),
        _ => info!(%request_id, %method, %path, status, latency_ms, "Request completed"),
    }

    response
}

/// Initialize the global subscriber.
///
/// With the `observability` feature and `OBSERVABILITY_ENABLED` not set to false,
/// structured JSON logs are also written to a daily rolling file under
/// `LOG_DIR` (default: `storage/logs`). Otherwise logging goes to the console only.
#[cfg(feature = "observability")]
pub fn init_tracing() {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    if !crate::metrics::is_observability_enabled() {
        crate::basic_logging::init_basic_console_logging();
        return;
    }

    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "storage/logs".to_string());
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        crate::basic_logging::init_basic_console_logging();
        warn!(error = %e, %log_dir, "Cannot create log directory; console logging only");
        return;
    }

    // JSON file layer for structured logs (can be ingested by Loki)
    let json_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "scanlearn.json");
    let json_layer = fmt::layer()
        .json()
        .with_writer(json_appender)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(crate::basic_logging::console_layer())
        .with(json_layer)
        .init();

    info!(%log_dir, "Tracing initialized with console and file logging");
}

#[cfg(not(feature = "observability"))]
pub fn init_tracing() {
    crate::basic_logging::init_basic_console_logging();
}
