// src/logging.rs

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// Thread names are shown because several seeds may run side by side.
pub fn init(default_level: &str) {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_thread_names(true)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .init()
}
