//! Severity levels, run-logger configuration, and line prefixes.

use serde::{Deserialize, Serialize};

/// Severity threshold for run log output.
///
/// Ordered so that comparison works as filtering: a message passes when
/// its level is `>=` the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The equivalent `tracing` level.
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// How a run logger filters and formats its output.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Suppress per-frame encoder chatter, keeping a tail buffer so a
    /// failed command can still show its last lines.
    pub compact: bool,
    /// Granularity of progress lines, in percent. A step of 20 logs at
    /// 0, 20, 40, 60, 80, 100 and drops everything between.
    pub progress_step: u32,
    /// How many buffered lines to replay when a command fails.
    pub error_tail: usize,
    /// Prepend wall-clock timestamps to file output.
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            progress_step: 20,
            error_tail: 20,
            show_timestamps: true,
        }
    }
}

impl LogConfig {
    /// Everything on, nothing filtered. For chasing encoder problems.
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
            compact: false,
            progress_step: 10,
            error_tail: 50,
            show_timestamps: true,
        }
    }

    /// Build from the `[logging]` section of the settings file, with the
    /// level already resolved from settings and command-line flags.
    pub fn from_settings(settings: &crate::config::LoggingSettings, level: LogLevel) -> Self {
        Self {
            level,
            compact: settings.compact,
            progress_step: settings.progress_step,
            error_tail: settings.error_tail as usize,
            show_timestamps: true,
        }
    }
}

/// Callback that receives each formatted log line for console display.
///
/// The interactive runner installs one that prints to the terminal; the
/// file side of the logger is unaffected by what the callback does.
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Line prefixes that give the run log its visual structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// `$ ffmpeg -y ...` for every external command launched.
    Command,
    /// `=== PROCESSING VIDEO FILES ===` phase banners.
    Phase,
    /// `--- file 3 of 12 ---` sub-sections within a phase.
    Section,
    /// `[Validation]` for cache and output checks.
    Validation,
    /// `[SUCCESS]`
    Success,
    /// `[WARNING]`
    Warning,
    /// `[ERROR]`
    Error,
    /// `[DEBUG]`
    Debug,
    /// Plain line, no prefix.
    None,
}

impl MessagePrefix {
    pub fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Command => format!("$ {}", message),
            MessagePrefix::Phase => format!("=== {} ===", message),
            MessagePrefix::Section => format!("--- {} ---", message),
            MessagePrefix::Validation => format!("[Validation] {}", message),
            MessagePrefix::Success => format!("[SUCCESS] {}", message),
            MessagePrefix::Warning => format!("[WARNING] {}", message),
            MessagePrefix::Error => format!("[ERROR] {}", message),
            MessagePrefix::Debug => format!("[DEBUG] {}", message),
            MessagePrefix::None => message.to_string(),
        }
    }
}
