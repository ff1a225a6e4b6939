//! Probe results and errors.

use std::path::Path;

use thiserror::Error;

/// Errors raised while measuring a media file.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The probe tool could not be launched at all.
    #[error("Failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The probe tool ran but reported failure.
    #[error("{tool} exited with status {status} for '{path}': {stderr}")]
    ToolFailed {
        tool: String,
        status: i32,
        path: String,
        stderr: String,
    },

    /// The tool produced output we could not interpret.
    #[error("Unreadable probe output for '{path}': {reason}")]
    Malformed { path: String, reason: String },

    /// The file was probed but carries no usable duration.
    #[error("No readable duration in '{path}'")]
    MissingDuration { path: String },

    /// The file lacks a stream the transform needs.
    #[error("No {stream} stream in '{path}'")]
    MissingStream { stream: String, path: String },
}

impl ProbeError {
    pub fn launch(tool: impl Into<String>, source: std::io::Error) -> Self {
        ProbeError::Launch {
            tool: tool.into(),
            source,
        }
    }

    pub fn tool_failed(
        tool: impl Into<String>,
        status: i32,
        path: &Path,
        stderr: impl Into<String>,
    ) -> Self {
        ProbeError::ToolFailed {
            tool: tool.into(),
            status,
            path: path.display().to_string(),
            stderr: stderr.into(),
        }
    }

    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        ProbeError::Malformed {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing_duration(path: &Path) -> Self {
        ProbeError::MissingDuration {
            path: path.display().to_string(),
        }
    }

    pub fn missing_stream(stream: impl Into<String>, path: &Path) -> Self {
        ProbeError::MissingStream {
            stream: stream.into(),
            path: path.display().to_string(),
        }
    }
}

/// Properties of a single stream, as far as the probe reported them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamInfo {
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pixel_format: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
}

/// Everything the pipeline wants to know about a media file.
///
/// All fields are optional: probes degrade gracefully, and callers that
/// need a particular value ask for it through the `require_*` helpers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds, when the file reports one.
    pub duration: Option<f64>,
    /// First video stream, if any.
    pub video: Option<StreamInfo>,
    /// First audio stream, if any.
    pub audio: Option<StreamInfo>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Video resolution as `WxH`, when both dimensions were reported.
    pub fn resolution(&self) -> Option<String> {
        let video = self.video.as_ref()?;
        match (video.width, video.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        }
    }

    /// Duration in seconds, or an error naming the file.
    pub fn require_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        self.duration.ok_or_else(|| ProbeError::missing_duration(path))
    }
}
