//! Tracing setup. Everything goes to stderr; stdout belongs to the stdio
//! transport.

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset, empty or unparsable.
pub const DEFAULT_LOG_DIRECTIVES: &str = "jyotish_mcp=info,rmcp=warn";

/// Build the log filter from a `RUST_LOG` value.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}

/// Install the global subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();
}
