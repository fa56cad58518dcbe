use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter: `LOG_LEVEL` for Scanlearn crates, noisy dependencies at warn.
pub(crate) fn default_env_filter() -> EnvFilter {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "scanlearn={level},scanlearn_auth={level},scanlearn_db={level},tower_http=warn,hyper=warn,sqlx=warn",
            level = log_level
        ))
    })
}

pub(crate) fn console_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .compact()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(default_env_filter())
}

/// Initialize console-only logging.
///
/// # Configuration
///
/// - **Log Level**: `LOG_LEVEL` (default: "info"), or a full `RUST_LOG` directive
/// - **Format**: compact, with module targets and source locations
pub fn init_basic_console_logging() {
    tracing_subscriber::registry().with(console_layer()).init();
}
