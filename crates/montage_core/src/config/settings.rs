//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::AudioVisual;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory layout.
    #[serde(default)]
    pub directories: DirectorySettings,

    /// Video encoding parameters.
    #[serde(default)]
    pub encoding: EncodingSettings,

    /// Audio encoding and loudness parameters.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Artifact cache behavior.
    #[serde(default)]
    pub cache: CacheSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Interactive behavior.
    #[serde(default)]
    pub behavior: BehaviorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            directories: DirectorySettings::default(),
            encoding: EncodingSettings::default(),
            audio: AudioSettings::default(),
            cache: CacheSettings::default(),
            logging: LoggingSettings::default(),
            behavior: BehaviorSettings::default(),
        }
    }
}

/// Directory layout around the current working directory.
///
/// Each named directory is used when it exists and quietly falls back
/// to the base directory when it does not, so the tool works both in a
/// prepared project layout and in a flat folder of submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySettings {
    /// Folder scanned for source files.
    #[serde(default = "default_input_dir")]
    pub input: String,

    /// Folder the finished montage is written to.
    #[serde(default = "default_output_dir")]
    pub output: String,

    /// Folder for run logs.
    #[serde(default = "default_logs_dir")]
    pub logs: String,

    /// Name of the working directory created inside the input folder.
    #[serde(default = "default_work_dir_name")]
    pub work_dir_name: String,
}

fn default_input_dir() -> String {
    "INPUT".to_string()
}

fn default_output_dir() -> String {
    "OUTPUT".to_string()
}

fn default_logs_dir() -> String {
    "LOGS".to_string()
}

fn default_work_dir_name() -> String {
    "temp_".to_string()
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            input: default_input_dir(),
            output: default_output_dir(),
            logs: default_logs_dir(),
            work_dir_name: default_work_dir_name(),
        }
    }
}

/// Concrete directories for one run, after fallbacks are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDirs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub logs: PathBuf,
    pub work: PathBuf,
}

impl DirectorySettings {
    /// Resolve the layout against a base directory.
    ///
    /// A configured directory that does not exist falls back to the
    /// base itself. The working directory always lives inside the
    /// resolved input directory and is created later, on demand.
    pub fn resolve(&self, base: &Path) -> ResolvedDirs {
        let pick = |name: &str| {
            let candidate = base.join(name);
            if candidate.is_dir() {
                candidate
            } else {
                base.to_path_buf()
            }
        };
        let input = pick(&self.input);
        ResolvedDirs {
            work: input.join(&self.work_dir_name),
            input,
            output: pick(&self.output),
            logs: pick(&self.logs),
        }
    }
}

/// Video encoding parameters shared by every transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingSettings {
    /// Use the GPU encoder instead of libx264.
    #[serde(default)]
    pub use_gpu: bool,

    /// Output frame width.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output frame height.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Output frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Constant rate factor / quality level.
    #[serde(default = "default_crf")]
    pub crf: u32,

    /// Encoder preset.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Output pixel format.
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// H.264 profile.
    #[serde(default = "default_video_profile")]
    pub video_profile: String,

    /// Seconds each submission is trimmed to.
    #[serde(default = "default_clip_duration")]
    pub clip_duration_secs: f64,

    /// Seconds the intro card is shown.
    #[serde(default = "default_intro_duration")]
    pub intro_duration_secs: f64,
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_fps() -> u32 {
    30
}

fn default_crf() -> u32 {
    23
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_pixel_format() -> String {
    "yuv420p".to_string()
}

fn default_video_profile() -> String {
    "high".to_string()
}

fn default_clip_duration() -> f64 {
    15.0
}

fn default_intro_duration() -> f64 {
    3.0
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            use_gpu: false,
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            crf: default_crf(),
            preset: default_preset(),
            pixel_format: default_pixel_format(),
            video_profile: default_video_profile(),
            clip_duration_secs: default_clip_duration(),
            intro_duration_secs: default_intro_duration(),
        }
    }
}

/// Audio encoding and loudness normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Output sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Audio bitrate passed to the encoder.
    #[serde(default = "default_audio_bitrate")]
    pub bitrate: String,

    /// Integrated loudness target in LUFS.
    #[serde(default = "default_loudness_target")]
    pub loudness_target: f64,

    /// True peak ceiling in dBTP.
    #[serde(default = "default_true_peak")]
    pub true_peak: f64,

    /// Loudness range target in LU.
    #[serde(default = "default_loudness_range")]
    pub loudness_range: f64,

    /// Visual rendered behind audio-only submissions.
    #[serde(default)]
    pub visual: AudioVisual,

    /// Background image for audio-only submissions, relative to the
    /// input directory. Overrides the per-file and shared image lookup.
    #[serde(default)]
    pub background_image: Option<String>,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_audio_bitrate() -> String {
    "128k".to_string()
}

fn default_loudness_target() -> f64 {
    -16.0
}

fn default_true_peak() -> f64 {
    -1.5
}

fn default_loudness_range() -> f64 {
    11.0
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            bitrate: default_audio_bitrate(),
            loudness_target: default_loudness_target(),
            true_peak: default_true_peak(),
            loudness_range: default_loudness_range(),
            visual: AudioVisual::default(),
            background_image: None,
        }
    }
}

/// Artifact cache behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Reuse intermediate artifacts when their records still hold.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of error lines to show in tail.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Log full ffmpeg commands one argument per line.
    #[serde(default)]
    pub show_commands: bool,
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_commands: false,
        }
    }
}

/// Interactive behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorSettings {
    /// Seconds the start menu waits before running everything.
    #[serde(default = "default_countdown")]
    pub countdown_secs: u64,

    /// Remove intermediates after a successful run without asking.
    #[serde(default)]
    pub auto_cleanup: bool,
}

fn default_countdown() -> u64 {
    20
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown(),
            auto_cleanup: false,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Directories,
    Encoding,
    Audio,
    Cache,
    Logging,
    Behavior,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Directories => "directories",
            ConfigSection::Encoding => "encoding",
            ConfigSection::Audio => "audio",
            ConfigSection::Cache => "cache",
            ConfigSection::Logging => "logging",
            ConfigSection::Behavior => "behavior",
        }
    }
}
