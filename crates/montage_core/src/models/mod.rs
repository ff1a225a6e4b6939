//! Data models for the montage pipeline.
//!
//! This module contains the shared vocabulary of the crate: media
//! categories, ordered file entries, and the enums that settings and
//! reports are expressed in. Models are plain data with serde support
//! and carry no behavior beyond small derived helpers.
//!
//! # Example
//!
//! ```ignore
//! use montage_core::models::{IndexedFile, MediaKind};
//!
//! let entry = IndexedFile::new(1, "title.png", MediaKind::Intro);
//! assert_eq!(entry.artifact_name(), "temp_0.mp4");
//! ```

pub mod enums;
pub mod media;

pub use enums::{AudioVisual, MediaKind, TrackKind};
pub use media::IndexedFile;
