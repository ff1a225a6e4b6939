//! Command-line arguments.
//!
//! Every flag here is an override or a shortcut: the durable knobs live
//! in `montage.toml` and the start menu covers the interactive choices.
//! `--merge-only` and `--re-render` exist so scripts can run partial
//! jobs without a terminal.

use std::path::PathBuf;

use clap::Parser;

use montage_core::logging::LogLevel;

/// Normalize a folder of video and audio submissions and splice them
/// into one montage.
#[derive(Parser, Debug)]
#[command(name = "montage")]
#[command(version)]
#[command(about = "Normalize a folder of submissions and splice them into one montage")]
pub struct Args {
    /// Project directory to run in (defaults to the current directory).
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Config file, created with defaults when missing.
    #[arg(long, default_value = "montage.toml")]
    pub config: PathBuf,

    /// Skip the start menu and run everything.
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// File selection for partial runs, e.g. "1,3,5-7" or "3-".
    #[arg(long)]
    pub range: Option<String>,

    /// Merge only the selected files, regenerating missing intermediates.
    #[arg(long, requires = "range", conflicts_with = "re_render")]
    pub merge_only: bool,

    /// Re-encode the selected files even when their cache is valid.
    #[arg(long, requires = "range")]
    pub re_render: bool,

    /// Ignore existing intermediates for this run.
    #[arg(long)]
    pub no_cache: bool,

    /// Use the GPU encoder.
    #[arg(long)]
    pub gpu: bool,

    /// Render waveforms behind audio submissions.
    #[arg(long)]
    pub waveform: bool,

    /// Background image for audio submissions, relative to the input
    /// directory.
    #[arg(long)]
    pub audio_bg: Option<String>,

    /// Console verbosity.
    #[arg(long, value_enum, default_value = "normal")]
    pub log_level: Verbosity,

    /// Do not write a log file for this run.
    #[arg(long)]
    pub no_log_file: bool,
}

/// Console verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Verbosity {
    /// Errors only.
    Silent,
    /// Warnings and errors.
    Quiet,
    /// Run progress and results.
    Normal,
    /// Everything, including per-file cache decisions.
    Verbose,
}

impl Verbosity {
    pub fn to_log_level(self) -> LogLevel {
        match self {
            Verbosity::Silent => LogLevel::Error,
            Verbosity::Quiet => LogLevel::Warn,
            Verbosity::Normal => LogLevel::Info,
            Verbosity::Verbose => LogLevel::Debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_interactive() {
        let args = Args::try_parse_from(["montage"]).unwrap();

        assert!(args.base_dir.is_none());
        assert_eq!(args.config, PathBuf::from("montage.toml"));
        assert!(!args.yes);
        assert!(args.range.is_none());
        assert!(!args.merge_only);
        assert!(!args.no_cache);
        assert_eq!(args.log_level, Verbosity::Normal);
    }

    #[test]
    fn merge_only_needs_a_range() {
        assert!(Args::try_parse_from(["montage", "--merge-only"]).is_err());
        assert!(Args::try_parse_from(["montage", "--merge-only", "--range", "1-5"]).is_ok());
    }

    #[test]
    fn re_render_needs_a_range() {
        assert!(Args::try_parse_from(["montage", "--re-render"]).is_err());
        assert!(Args::try_parse_from(["montage", "--re-render", "--range", "3"]).is_ok());
    }

    #[test]
    fn merge_only_and_re_render_conflict() {
        let result = Args::try_parse_from([
            "montage",
            "--merge-only",
            "--re-render",
            "--range",
            "1-5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn log_levels_parse() {
        let args = Args::try_parse_from(["montage", "--log-level", "verbose"]).unwrap();
        assert_eq!(args.log_level, Verbosity::Verbose);
        assert_eq!(args.log_level.to_log_level(), LogLevel::Debug);

        let args = Args::try_parse_from(["montage", "--log-level", "silent"]).unwrap();
        assert_eq!(args.log_level.to_log_level(), LogLevel::Error);
    }

    #[test]
    fn encoder_overrides_parse() {
        let args = Args::try_parse_from([
            "montage",
            "--gpu",
            "--waveform",
            "--audio-bg",
            "backdrop.png",
            "--no-log-file",
        ])
        .unwrap();

        assert!(args.gpu);
        assert!(args.waveform);
        assert_eq!(args.audio_bg.as_deref(), Some("backdrop.png"));
        assert!(args.no_log_file);
    }
}
