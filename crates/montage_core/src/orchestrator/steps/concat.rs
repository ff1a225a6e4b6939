//! Concat step - splices the intermediates into the finished montage.

use std::fs;
use std::path::PathBuf;

use crate::commands::{filelist_content, FfmpegCommandBuilder};
use crate::discovery::FILELIST_NAME;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{ConcatOutput, Context, JobState, StepOutcome};

use super::run_ffmpeg;

/// Concat step for joining the intermediates in order.
///
/// Writes the concat demuxer filelist and runs the final re-encoding
/// join. The result is never cached; it is the product, not an
/// intermediate.
pub struct ConcatStep {
    /// Path to ffmpeg executable (None = find in PATH).
    ffmpeg_path: Option<PathBuf>,
}

impl ConcatStep {
    pub fn new() -> Self {
        Self { ffmpeg_path: None }
    }

    /// Set a custom path to the ffmpeg executable.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = Some(path.into());
        self
    }

    /// Get the ffmpeg executable path/command.
    fn ffmpeg_cmd(&self) -> &str {
        self.ffmpeg_path
            .as_ref()
            .map(|p| p.to_str().unwrap_or("ffmpeg"))
            .unwrap_or("ffmpeg")
    }
}

impl Default for ConcatStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ConcatStep {
    fn name(&self) -> &str {
        "Concat"
    }

    fn description(&self) -> &str {
        "Splice the intermediates into the finished montage"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let files = ctx.plan.files_to_merge();
        if files.is_empty() {
            return Err(StepError::invalid_input("Nothing selected to merge"));
        }

        // Every clip going into the montage must exist and be non-empty
        // before ffmpeg starts; the concat demuxer's own error for a
        // missing entry is far less helpful.
        for file in files {
            let artifact = ctx.artifact_path(file);
            let usable = fs::metadata(&artifact)
                .map(|m| m.len() > 0)
                .unwrap_or(false);
            if !usable {
                return Err(StepError::file_not_found(
                    artifact.to_string_lossy().to_string(),
                ));
            }
        }

        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let paths: Vec<PathBuf> = ctx
            .plan
            .files_to_merge()
            .iter()
            .map(|f| ctx.artifact_path(f))
            .collect();

        let filelist = ctx.work_dir.join(FILELIST_NAME);
        fs::write(&filelist, filelist_content(&paths))
            .map_err(|e| StepError::io_error("writing concat filelist", e))?;

        let output_path = ctx.output_path();
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StepError::io_error("creating output directory", e))?;
        }

        ctx.logger.info(&format!(
            "Splicing {} clips into {}",
            paths.len(),
            ctx.output_filename
        ));

        let builder = FfmpegCommandBuilder::new(&ctx.settings);
        let command = builder.concat_command(&filelist, &output_path);

        ctx.logger.section("Merging intermediates");
        let exit_code = match run_ffmpeg(ctx, self.ffmpeg_cmd(), &command.tokens) {
            Ok(code) => code,
            Err(e) => {
                // A half-written montage would pass for a finished one.
                if output_path.exists() {
                    let _ = fs::remove_file(&output_path);
                }
                return Err(e);
            }
        };

        state.concat = Some(ConcatOutput {
            output_path: output_path.clone(),
            merged: paths.len(),
            exit_code,
        });

        ctx.logger
            .success(&format!("Merged to: {}", output_path.display()));

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let concat = state
            .concat
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Merge results not recorded"))?;

        if !concat.output_path.exists() {
            return Err(StepError::invalid_output(format!(
                "Output file not created: {}",
                concat.output_path.display()
            )));
        }

        Ok(())
    }
}
