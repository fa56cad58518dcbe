//! Scanlearn Observability Module
//!
//! Provides configurable observability features including:
//! - Console and rolling-file logging via `tracing`
//! - HTTP request/response logging
//! - Access gate decision metrics via Prometheus
//!
//! The file appender and metrics exporter are compiled in with the `observability`
//! feature. At runtime they can be switched off with `OBSERVABILITY_ENABLED=false`,
//! leaving console logging only.
//!
//! # Examples
//!
//! ```no_run
//! use scanlearn_observability::init_tracing;
//!
//! #[tokio::main]
//! async fn main() {
//!     init_tracing();
//!     // ... application code ...
//! }
//! ```

pub mod basic_logging;
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

pub use basic_logging::init_basic_console_logging;
pub use logging::{init_tracing, logging_middleware};

#[cfg(feature = "observability")]
pub use self::metrics::{
    init_metrics, is_observability_enabled, metrics_app, track_gate_decision,
    track_session_refresh,
};
#[cfg(feature = "observability")]
pub use metrics_exporter_prometheus::PrometheusHandle;

// No-op stubs when observability is disabled
#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::Router;

    /// No-op observability check when feature disabled
    pub fn is_observability_enabled() -> bool {
        false
    }

    /// No-op metrics initialization when feature disabled
    pub fn init_metrics() -> Option<()> {
        None
    }

    pub fn metrics_app(_handle: ()) -> Router {
        Router::new()
    }

    pub fn track_gate_decision(_outcome: &str, _reason: &str) {}
    pub fn track_session_refresh() {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
