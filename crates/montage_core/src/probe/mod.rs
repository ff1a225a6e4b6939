//! Media probing via ffprobe.
//!
//! Everything the pipeline knows about a source file comes through
//! here: duration, stream layout, codecs, and resolution. Probes are
//! read-only and degrade gracefully; a missing field is `None`, not an
//! error.
//!
//! # Example
//!
//! ```ignore
//! use montage_core::probe::probe_media;
//!
//! let info = probe_media(Path::new("clip - Alice.mp4"))?;
//! if let Some(res) = info.resolution() {
//!     println!("source is {}", res);
//! }
//! ```

pub mod ffprobe;
pub mod types;

pub use ffprobe::{parse_media_info, probe_duration, probe_media};
pub use types::{MediaInfo, ProbeError, StreamInfo};
