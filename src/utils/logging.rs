//! Logging utilities
//!
//! Provides logging setup and configuration.

use env_logger::Env;

/// Setup logging for the storage manager.
///
/// `RUST_LOG` still wins; without it only warnings and errors are shown so
/// log lines don't interleave with shell output.
pub fn setup_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
}
