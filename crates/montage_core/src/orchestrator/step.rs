//! The step contract every pipeline stage implements.

use super::errors::StepResult;
use super::types::{Context, JobState, StepOutcome};

/// One stage of a montage run.
///
/// The runner drives each step through the same three calls, in order:
/// `validate_input`, `execute`, `validate_output`. Checks that belong
/// before work starts (does the work directory exist, did the previous
/// step leave its results in [`JobState`]) go in the first; checks on
/// what the step claims to have produced (are the intermediates on
/// disk, is the merged file non-empty) go in the last. Keeping them out
/// of `execute` means a failed precondition never leaves half-finished
/// artifacts behind.
///
/// Steps share data only through [`JobState`]; the [`Context`] is
/// read-only run configuration plus the run logger.
pub trait PipelineStep: Send + Sync {
    /// Short name used in log lines and error context.
    fn name(&self) -> &str;

    /// Check preconditions. Runs before `execute`; an `Err` here
    /// aborts the run without the step doing any work.
    fn validate_input(&self, ctx: &Context) -> StepResult<()>;

    /// Do the step's work, recording results in `state`.
    ///
    /// A step with nothing to do (every intermediate already valid,
    /// for instance) returns `StepOutcome::Skipped` with a reason
    /// rather than an error.
    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome>;

    /// Check what `execute` produced. Only called after a `Success`
    /// outcome.
    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// One-line description for the run plan summary.
    fn description(&self) -> &str {
        self.name()
    }
}
