//! Logging setup for test binaries.
//!
//! The helpers in this crate emit `tracing` events at the decision
//! points of the polling and probing protocols (mismatch, absent
//! endpoint, probe outcome). Test binaries that want to see them can
//! call [`init_test_logging`] once per process.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes a text-format subscriber honoring `RUST_LOG`.
///
/// Falls back to `INFO` when `RUST_LOG` is unset. Safe to call from
/// multiple tests in the same binary: later calls are no-ops.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    // try_init so parallel tests racing to install the subscriber
    // don't panic.
    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
