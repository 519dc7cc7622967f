//! Tracing/logging setup shared by the stockroom binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogConfig, LogFormat};

/// Initialize process-wide tracing with the defaults (JSON, `RUST_LOG` or
/// `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogConfig::default());
}
