//! Montage Core - Backend logic for the media montage batch processor
//!
//! This crate contains all business logic with zero terminal-UI
//! dependencies: discovery and ordering of source files, ffmpeg command
//! construction, artifact caching, and the run pipeline. The CLI crate
//! drives it; nothing here prompts or reads keys.

pub mod cache;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod environment;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod probe;
pub mod range;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
