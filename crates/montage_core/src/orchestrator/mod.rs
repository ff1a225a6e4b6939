//! Pipeline orchestrator for coordinating a montage run.
//!
//! This module provides the infrastructure for running the processing
//! pipeline. Each run consists of a sequence of steps that validate,
//! execute, and record their results.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Normalize   (source files → uniform intermediates)
//!     └── Step: Concat      (intermediates → finished montage)
//! ```
//!
//! Discovery, the interactive menu, and cleanup happen around the
//! pipeline, not inside it; the pipeline starts once the run plan is
//! settled.
//!
//! # Example
//!
//! ```ignore
//! use montage_core::orchestrator::{create_standard_pipeline, Context, JobState};
//!
//! let pipeline = create_standard_pipeline();
//! let ctx = Context::new(plan, settings, "holiday", &dirs, filename, logger, store);
//! let mut state = JobState::new("holiday-20260821");
//!
//! let result = pipeline.run(&ctx, &mut state)?;
//! println!("Completed: {:?}", result.steps_completed);
//! ```

mod errors;
mod pipeline;
mod plan;
mod step;
pub mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use plan::{plan_run, RunMode, RunPlan};
pub use step::PipelineStep;
pub use steps::{ConcatStep, NormalizeStep};
pub use types::{
    ConcatOutput, Context, DurationViolation, FailedFile, JobState, NormalizeOutput, ProcessedFile,
    ProgressCallback, StepOutcome,
};

/// Create the standard pipeline with both steps in order.
///
/// The transform step gets a clone of the pipeline's own cancel handle
/// so a cancellation lands between files, not just between steps.
pub fn create_standard_pipeline() -> Pipeline {
    let mut pipeline = Pipeline::new();
    let cancel = pipeline.cancel_handle();
    pipeline.add_step(NormalizeStep::new().with_cancel_handle(cancel));
    pipeline.add_step(ConcatStep::new());
    pipeline
}
