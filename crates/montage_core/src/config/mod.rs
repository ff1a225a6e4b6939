//! Configuration management.
//!
//! Settings live in a single `montage.toml` with one table per
//! concern. The manager loads it, fills gaps with defaults, and writes
//! changes back atomically so a crash mid-save never leaves a torn
//! config behind.
//!
//! # Example
//!
//! ```ignore
//! use montage_core::config::ConfigManager;
//!
//! let mut manager = ConfigManager::new("montage.toml");
//! manager.load_or_create()?;
//! let crf = manager.settings().encoding.crf;
//! ```

pub mod manager;
pub mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AudioSettings, BehaviorSettings, CacheSettings, ConfigSection, DirectorySettings,
    EncodingSettings, LoggingSettings, ResolvedDirs, Settings,
};
