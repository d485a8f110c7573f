//! Logging setup for embedders and tests

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a tracing subscriber with env-filter support
///
/// Respects `RUST_LOG`; defaults to `info` for this crate. Safe to call
/// more than once; later calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("curtain_skill_rust=info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
