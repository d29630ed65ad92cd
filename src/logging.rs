//! Diagnostics sink for the CLI. Store failures are logged here and also
//! returned as values, so nothing depends on the subscriber being installed.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "warn";

/// Installs a stderr subscriber; `filter` uses `EnvFilter` directive syntax.
///
/// Returns `false` when a global subscriber was already set. That one stays
/// in place, so a second call only loses its own filter.
pub fn init(filter: Option<&str>) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

fn env_filter(filter: Option<&str>) -> EnvFilter {
    filter
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
