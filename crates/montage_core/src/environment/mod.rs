//! Start-of-run environment validation.
//!
//! Confirms the external tools answer and the directories are usable
//! before any interactive prompt is shown, so a missing ffmpeg fails
//! the run in the first second instead of after the countdown.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::ResolvedDirs;

const WRITE_PROBE_NAME: &str = ".montage_write_test";

/// How long a tool gets to answer its version check.
const TOOL_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// What a successful validation found.
#[derive(Debug, Clone)]
pub struct EnvironmentReport {
    /// First line of `ffmpeg -version`.
    pub ffmpeg_version: String,
    /// First line of `ffprobe -version`.
    pub ffprobe_version: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("{tool} not found on PATH: {source}")]
    ToolMissing {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{tool} is present but failed its version check (exit {status})")]
    ToolBroken { tool: &'static str, status: i32 },

    #[error("{tool} did not answer its version check within {seconds}s")]
    ToolHung { tool: &'static str, seconds: u64 },

    #[error("{role} directory {path:?} is not usable: {reason}")]
    DirectoryUnavailable {
        role: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("output directory {path:?} is not writable: {source}")]
    OutputNotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Validate tools and directories for one run.
///
/// The input directory must already exist; output, logs, and work
/// directories are created on demand. The output directory also gets a
/// write probe since `create_dir_all` succeeding says nothing about
/// whether files can land there.
pub fn validate(dirs: &ResolvedDirs) -> Result<EnvironmentReport, EnvironmentError> {
    let ffmpeg_version = check_tool("ffmpeg")?;
    let ffprobe_version = check_tool("ffprobe")?;
    tracing::debug!(ffmpeg = %ffmpeg_version, ffprobe = %ffprobe_version, "tools found");

    ensure_input_dir(&dirs.input)?;
    prepare_directory("output", &dirs.output)?;
    prepare_directory("logs", &dirs.logs)?;
    prepare_directory("work", &dirs.work)?;
    check_writable(&dirs.output)?;

    Ok(EnvironmentReport {
        ffmpeg_version,
        ffprobe_version,
    })
}

/// Run `{tool} -version` and return the banner line.
///
/// The check is bounded by [`TOOL_CHECK_TIMEOUT`]: a tool that hangs on
/// its version flag (a broken wrapper script, a stuck network mount) is
/// killed and reported rather than stalling the run before it starts.
pub fn check_tool(tool: &'static str) -> Result<String, EnvironmentError> {
    let mut child = Command::new(tool)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| EnvironmentError::ToolMissing { tool, source })?;

    let deadline = Instant::now() + TOOL_CHECK_TIMEOUT;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(EnvironmentError::ToolHung {
                        tool,
                        seconds: TOOL_CHECK_TIMEOUT.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(source) => return Err(EnvironmentError::ToolMissing { tool, source }),
        }
    };

    let mut stdout = Vec::new();
    if let Some(mut pipe) = child.stdout.take() {
        let _ = pipe.read_to_end(&mut stdout);
    }

    if !status.success() {
        return Err(EnvironmentError::ToolBroken {
            tool,
            status: status.code().unwrap_or(-1),
        });
    }
    Ok(first_line(&stdout))
}

fn ensure_input_dir(path: &Path) -> Result<(), EnvironmentError> {
    let meta = fs::metadata(path).map_err(|e| EnvironmentError::DirectoryUnavailable {
        role: "input",
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !meta.is_dir() {
        return Err(EnvironmentError::DirectoryUnavailable {
            role: "input",
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(())
}

fn prepare_directory(role: &'static str, path: &Path) -> Result<(), EnvironmentError> {
    fs::create_dir_all(path).map_err(|e| EnvironmentError::DirectoryUnavailable {
        role,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn check_writable(path: &Path) -> Result<(), EnvironmentError> {
    let probe = path.join(WRITE_PROBE_NAME);
    fs::write(&probe, b"probe").map_err(|source| EnvironmentError::OutputNotWritable {
        path: path.to_path_buf(),
        source,
    })?;
    let _ = fs::remove_file(&probe);
    Ok(())
}

fn first_line(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}
