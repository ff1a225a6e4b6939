//! Run logging.
//!
//! Two layers live here. [`JobLogger`] is the per-run log: one file per
//! montage run plus an optional console callback, with compact-mode
//! progress filtering and a tail buffer that replays the last lines of
//! a failed command. The `init_tracing*` functions set up the global
//! `tracing` subscriber for everything that is not tied to a run.
//!
//! ```no_run
//! use montage_core::logging::{JobLogger, LogConfig};
//!
//! let logger = JobLogger::new(
//!     "montage_20250821_120000",
//!     "/path/to/logs",
//!     LogConfig::default(),
//!     None,
//! ).unwrap();
//!
//! logger.phase("PROCESSING VIDEO FILES");
//! logger.command("ffmpeg -y -i input.mp4 ...");
//! logger.progress(50);
//! logger.success("Montage complete");
//! ```

mod job_logger;
mod types;

pub use job_logger::{JobLogger, JobLoggerBuilder};
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr with timestamps
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Initialize global tracing with output to a daily-rolled file in
/// `log_dir` instead of stderr.
///
/// Used by the interactive runner, whose terminal belongs to the menu
/// and progress output. The returned guard flushes the background
/// writer on drop and must be held for the life of the program.
pub fn init_tracing_with_file(default_level: LogLevel, log_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    let appender = tracing_appender::rolling::daily(log_dir, "montage.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(writer),
        )
        .with(filter)
        .init();

    guard
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
