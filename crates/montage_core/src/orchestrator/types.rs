//! Core types for the orchestrator pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::RecordStore;
use crate::config::{ResolvedDirs, Settings};
use crate::logging::JobLogger;
use crate::models::{IndexedFile, MediaKind};

use super::plan::RunPlan;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Contains the run plan and shared resources that steps can read but
/// not modify. Mutable state goes in `JobState`.
pub struct Context {
    /// What this run transforms and merges.
    pub plan: RunPlan,
    /// Application settings.
    pub settings: Settings,
    /// Run name (for logging and error context).
    pub job_name: String,
    /// Directory the source files live in.
    pub input_dir: PathBuf,
    /// Directory for intermediates and their cache records.
    pub work_dir: PathBuf,
    /// Directory the finished montage is written to.
    pub output_dir: PathBuf,
    /// File name of the finished montage.
    pub output_filename: String,
    /// Per-run logger.
    pub logger: Arc<JobLogger>,
    /// Cache record store rooted at the work directory.
    pub store: RecordStore,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a new context for a run.
    pub fn new(
        plan: RunPlan,
        settings: Settings,
        job_name: impl Into<String>,
        dirs: &ResolvedDirs,
        output_filename: impl Into<String>,
        logger: Arc<JobLogger>,
        store: RecordStore,
    ) -> Self {
        Self {
            plan,
            settings,
            job_name: job_name.into(),
            input_dir: dirs.input.clone(),
            work_dir: dirs.work.clone(),
            output_dir: dirs.output.clone(),
            output_filename: output_filename.into(),
            logger,
            store,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    /// Absolute path of a source file.
    pub fn source_path(&self, file: &IndexedFile) -> PathBuf {
        self.input_dir.join(&file.name)
    }

    /// Absolute path of a file's intermediate artifact.
    pub fn artifact_path(&self, file: &IndexedFile) -> PathBuf {
        self.work_dir.join(file.artifact_name())
    }

    /// Absolute path of the finished montage.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_filename)
    }
}

/// Mutable run state that accumulates results from pipeline steps.
///
/// This is the "write-once manifest": steps add their own section and
/// should not overwrite existing values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Unique run identifier.
    pub job_id: String,
    /// When the run started.
    pub started_at: Option<String>,
    /// Transform results (from Normalize step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize: Option<NormalizeOutput>,
    /// Merge results (from Concat step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concat: Option<ConcatOutput>,
}

impl JobState {
    /// Create a new run state with the given ID.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Check if the transform step has completed.
    pub fn has_normalize(&self) -> bool {
        self.normalize.is_some()
    }

    /// Check if the merge step has completed.
    pub fn has_concat(&self) -> bool {
        self.concat.is_some()
    }
}

/// Output from the Normalize step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizeOutput {
    /// Every file that now has a usable intermediate, in order.
    pub processed: Vec<ProcessedFile>,
    /// How many intermediates were reused from cache.
    pub cache_hits: usize,
    /// How many intermediates were freshly encoded.
    pub encoded: usize,
    /// Files that could not be transformed.
    pub failures: Vec<FailedFile>,
    /// Intermediates that came out longer than commanded.
    pub duration_violations: Vec<DurationViolation>,
}

/// One file the Normalize step finished, by encode or by cache reuse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub index: usize,
    pub name: String,
    pub kind: MediaKind,
    pub artifact: PathBuf,
    pub from_cache: bool,
}

/// One file the Normalize step gave up on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFile {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// An intermediate whose measured length exceeds the commanded cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationViolation {
    pub name: String,
    pub commanded: f64,
    pub actual: f64,
}

/// Output from the Concat step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcatOutput {
    /// Path to the finished montage.
    pub output_path: PathBuf,
    /// How many intermediates were spliced together.
    pub merged: usize,
    /// ffmpeg exit code.
    pub exit_code: i32,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (nothing to do, but not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_tracks_completion() {
        let mut state = JobState::new("montage-20260821");
        assert!(!state.has_normalize());

        state.normalize = Some(NormalizeOutput {
            processed: vec![ProcessedFile {
                index: 1,
                name: "clip - Alice.mp4".to_string(),
                kind: MediaKind::Video,
                artifact: PathBuf::from("temp_0.mp4"),
                from_cache: true,
            }],
            cache_hits: 1,
            ..NormalizeOutput::default()
        });

        assert!(state.has_normalize());
        assert!(!state.has_concat());
    }

    #[test]
    fn job_state_serializes() {
        let state = JobState::new("montage-456");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"job_id\":\"montage-456\""));
        assert!(!json.contains("normalize"));
    }
}
