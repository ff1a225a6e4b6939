//! Core enumerations used throughout the montage pipeline.

use serde::{Deserialize, Serialize};

/// Category of a source file in the processing order.
///
/// The category decides which transform is applied to the file and
/// where it lands in the final montage (intro first, then videos,
/// then audio-only submissions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Title card rendered from a still image.
    Intro,
    /// Video submission (may or may not carry audio).
    Video,
    /// Audio-only submission rendered over a generated visual.
    Audio,
}

impl MediaKind {
    /// Uppercase tag used in log lines and per-file headers.
    pub fn tag(&self) -> &'static str {
        match self {
            MediaKind::Intro => "INTRO",
            MediaKind::Video => "VIDEO",
            MediaKind::Audio => "AUDIO",
        }
    }

    /// Human-readable name for display.
    pub fn name(&self) -> &'static str {
        match self {
            MediaKind::Intro => "Intro",
            MediaKind::Video => "Video",
            MediaKind::Audio => "Audio",
        }
    }

    /// All kinds in processing order.
    pub fn all() -> &'static [MediaKind] {
        &[MediaKind::Intro, MediaKind::Video, MediaKind::Audio]
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Which half of a codec pair a name belongs to.
///
/// Encoder names are normalized per track kind because the same
/// shorthand can mean different things for video and audio streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    pub fn name(&self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Visual rendered behind an audio-only submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioVisual {
    /// Static backdrop: a background image when one is available,
    /// otherwise a black frame with a caption.
    #[default]
    Backdrop,
    /// Waveform visualization generated from the audio itself.
    Waveform,
}

impl AudioVisual {
    pub fn name(&self) -> &'static str {
        match self {
            AudioVisual::Backdrop => "backdrop",
            AudioVisual::Waveform => "waveform",
        }
    }

    pub fn all() -> &'static [AudioVisual] {
        &[AudioVisual::Backdrop, AudioVisual::Waveform]
    }
}

impl std::fmt::Display for AudioVisual {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
