//! Normalize step - transforms every source into a uniform intermediate.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::{check_artifact, expected_params, CacheRecord, ParameterSet, DURATION_TOLERANCE_SECS};
use crate::commands::{drawtext_caption, AudioBackdrop, FfmpegCommandBuilder, TransformCommand};
use crate::discovery::find_audio_background;
use crate::models::{AudioVisual, IndexedFile, MediaKind};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::pipeline::CancelHandle;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{
    Context, DurationViolation, FailedFile, JobState, NormalizeOutput, ProcessedFile, StepOutcome,
};
use crate::probe::{self, MediaInfo};

use super::run_ffmpeg;

/// Normalize step for producing the uniform intermediates.
///
/// Walks the plan's process list one file at a time. Each file is
/// probed, its transform command built, and the cache consulted; only
/// files whose record no longer holds get re-encoded. Failures are
/// collected rather than aborting, so one broken submission does not
/// cost the encodes of the files after it.
pub struct NormalizeStep {
    /// Path to ffmpeg executable (None = find in PATH).
    ffmpeg_path: Option<PathBuf>,
    /// Checked between files; set from the pipeline's handle.
    cancel: Option<CancelHandle>,
}

impl NormalizeStep {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: None,
            cancel: None,
        }
    }

    /// Set a custom path to the ffmpeg executable.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = Some(path.into());
        self
    }

    /// Stop between files when this handle fires.
    pub fn with_cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    /// Get the ffmpeg executable path/command.
    fn ffmpeg_cmd(&self) -> &str {
        self.ffmpeg_path
            .as_ref()
            .map(|p| p.to_str().unwrap_or("ffmpeg"))
            .unwrap_or("ffmpeg")
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }

    /// Build the transform command for one file.
    fn build_command(
        &self,
        ctx: &Context,
        builder: &FfmpegCommandBuilder,
        file: &IndexedFile,
        source: &Path,
        artifact: &Path,
        info: &MediaInfo,
    ) -> TransformCommand {
        match file.kind {
            MediaKind::Intro => builder.intro_command(source, artifact),
            MediaKind::Video => builder.video_command(source, artifact, info.has_audio()),
            MediaKind::Audio => {
                let backdrop = self.backdrop_for(ctx, file);
                builder.audio_command(source, &backdrop, artifact)
            }
        }
    }

    /// Decide what plays behind an audio file.
    fn backdrop_for(&self, ctx: &Context, file: &IndexedFile) -> AudioBackdrop {
        if matches!(ctx.settings.audio.visual, AudioVisual::Waveform) {
            return AudioBackdrop::Waveform;
        }
        let configured = ctx.settings.audio.background_image.as_deref().map(Path::new);
        match find_audio_background(&ctx.input_dir, &file.name, configured) {
            Some(image) => AudioBackdrop::Image(image),
            None => AudioBackdrop::Black {
                caption: drawtext_caption(&file.name),
            },
        }
    }

    /// Warn when an encode came out longer than its commanded cap.
    ///
    /// Shorter is normal (the source simply ran out); longer means the
    /// cap was not honored and the montage timing is off.
    fn check_duration(
        &self,
        ctx: &Context,
        file: &IndexedFile,
        artifact: &Path,
        fresh: &ParameterSet,
        output: &mut NormalizeOutput,
    ) {
        let Some(commanded) = fresh.duration else {
            return;
        };
        match probe::probe_duration(artifact) {
            Ok(actual) => {
                if actual > commanded + DURATION_TOLERANCE_SECS {
                    ctx.logger.warn(&format!(
                        "{} came out {:.2}s long, commanded {}",
                        file.name, actual, commanded
                    ));
                    output.duration_violations.push(DurationViolation {
                        name: file.name.clone(),
                        commanded,
                        actual,
                    });
                }
            }
            Err(e) => {
                ctx.logger
                    .debug(&format!("Could not verify duration of {}: {}", file.name, e));
            }
        }
    }
}

impl Default for NormalizeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for NormalizeStep {
    fn name(&self) -> &str {
        "Normalize"
    }

    fn description(&self) -> &str {
        "Transform each source into a uniform intermediate clip"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.plan.entries.is_empty() {
            return Err(StepError::invalid_input("No media files to work on"));
        }
        fs::create_dir_all(&ctx.work_dir)
            .map_err(|e| StepError::io_error("creating work directory", e))?;
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let files = ctx.plan.files_to_process();
        if files.is_empty() {
            return Ok(StepOutcome::Skipped(
                "all intermediates already on disk".to_string(),
            ));
        }

        let builder = FfmpegCommandBuilder::new(&ctx.settings);
        let consult_cache = ctx.settings.cache.enabled && !ctx.plan.force;
        let mut output = NormalizeOutput::default();
        let total = files.len();

        for (pos, file) in files.iter().enumerate() {
            if self.is_cancelled() {
                state.normalize = Some(output);
                return Err(StepError::Cancelled);
            }

            let percent = ((pos as f64 / total as f64) * 100.0) as u32;
            ctx.report_progress(self.name(), percent, &file.name);
            ctx.logger
                .section(&format!("[{}/{}] {}", pos + 1, total, file.name));

            let source = ctx.source_path(file);
            let artifact = ctx.artifact_path(file);

            let info = match probe::probe_media(&source) {
                Ok(info) => info,
                Err(e) => {
                    ctx.logger.error(&format!("Cannot read {}: {}", file.name, e));
                    output.failures.push(FailedFile {
                        index: file.index,
                        name: file.name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let command = self.build_command(ctx, &builder, file, &source, &artifact, &info);
            let fresh = match expected_params(&command.tokens, file.kind, &source, &info) {
                Ok(params) => params,
                Err(e) => {
                    ctx.logger.error(&format!("Unusable source {}: {}", file.name, e));
                    output.failures.push(FailedFile {
                        index: file.index,
                        name: file.name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if consult_cache && check_artifact(&ctx.store, &artifact, &source, &fresh) {
                ctx.logger.info("Intermediate is current, skipping encode");
                output.cache_hits += 1;
                output.processed.push(ProcessedFile {
                    index: file.index,
                    name: file.name.clone(),
                    kind: file.kind,
                    artifact,
                    from_cache: true,
                });
                continue;
            }

            // A record that just failed validation describes bytes the
            // encode is about to rewrite, so it goes before the encode
            // starts. Runs that skipped the consult keep their record
            // until a successful encode supersedes it.
            if consult_cache {
                if let Err(e) = ctx.store.remove(&artifact) {
                    ctx.logger.warn(&format!("Could not drop stale record: {}", e));
                }
            }

            let source_mtime = match fs::metadata(&source).and_then(|m| m.modified()) {
                Ok(mtime) => mtime,
                Err(e) => {
                    output.failures.push(FailedFile {
                        index: file.index,
                        name: file.name.clone(),
                        reason: format!("cannot stat source: {}", e),
                    });
                    continue;
                }
            };

            if let Err(e) = run_ffmpeg(ctx, self.ffmpeg_cmd(), &command.tokens) {
                // A half-written intermediate must not survive.
                if artifact.exists() {
                    let _ = fs::remove_file(&artifact);
                }
                ctx.logger.error(&format!("Transform failed for {}", file.name));
                output.failures.push(FailedFile {
                    index: file.index,
                    name: file.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }

            if command.has_explicit_duration {
                self.check_duration(ctx, file, &artifact, &fresh, &mut output);
            }

            let record = CacheRecord::new(&source, source_mtime, &artifact, fresh);
            if let Err(e) = ctx.store.save(&record) {
                ctx.logger.warn(&format!("Could not write cache record: {}", e));
            }

            output.encoded += 1;
            output.processed.push(ProcessedFile {
                index: file.index,
                name: file.name.clone(),
                kind: file.kind,
                artifact,
                from_cache: false,
            });
        }

        ctx.logger.info(&format!(
            "{} cached, {} encoded, {} failed",
            output.cache_hits,
            output.encoded,
            output.failures.len()
        ));

        let failed = output.failures.len();
        state.normalize = Some(output);
        if failed > 0 {
            return Err(StepError::transforms_failed(failed, total));
        }
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let normalize = state
            .normalize
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Transform results not recorded"))?;

        for file in &normalize.processed {
            if !file.artifact.exists() {
                return Err(StepError::invalid_output(format!(
                    "Intermediate not created: {}",
                    file.artifact.display()
                )));
            }
        }

        Ok(())
    }
}
