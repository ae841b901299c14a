//! Tracing setup for the binaries.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive, e.g. `montecarlo=debug`.
pub const LOG_ENV: &str = "MONTECARLO_LOG";

/// Initialize the tracing subscriber.
///
/// Respects `MONTECARLO_LOG`; defaults to `info` when unset or invalid.
/// Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .try_init();
}
