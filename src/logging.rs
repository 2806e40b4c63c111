//! Tracing subscriber setup for the binary and for tests.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber.
///
/// Reads the filter from `RUST_LOG` and falls back to `info`, e.g.
/// `RUST_LOG=retrofit_eval=debug` to see every trial.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Debug-level subscriber routed through the test harness. Safe to call repeatedly.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
