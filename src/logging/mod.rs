//! Logging and output control
//!
//! This module provides the [`Logger`] carried by every registry operation.
//! Messages are always emitted as `tracing` events; which of them are shown
//! is up to the installed subscriber. The `verbose` and `quiet` flags only
//! choose the default filter [`init_tracing`] installs for the command-line
//! binary.

use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Logger responsible for all diagnostic output of the client
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
        }
    }

    pub fn trace(&self, message: &str) {
        tracing::trace!("{}", message);
    }

    /// Detailed information, shown at debug level
    pub fn detail(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    pub fn success(&self, message: &str) {
        tracing::info!(outcome = "success", "{}", message);
    }

    pub fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    /// Filter directive used when `RUST_LOG` is not set
    pub fn default_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Format a byte count in human-readable units
    pub fn format_size(&self, bytes: u64) -> String {
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else if bytes < 1024 * 1024 * 1024 {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        } else {
            format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
        }
    }

    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{}.{:03}s", secs, duration.subsec_millis())
        } else if secs < 3600 {
            format!("{}m{}s", secs / 60, secs % 60)
        } else {
            format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }
}

/// Install the global `tracing` subscriber used by the binary.
///
/// `RUST_LOG` wins when set; otherwise the level follows the logger flags.
pub fn init_tracing(logger: &Logger) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logger.default_filter()));

    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
