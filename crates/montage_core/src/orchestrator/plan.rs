//! Run planning: which files to transform, which to merge.
//!
//! The interactive menu (or the flags that stand in for it) picks a
//! mode; this module turns that choice plus the ordered file list into
//! the concrete work lists the pipeline steps execute against.

use std::path::Path;

use crate::models::IndexedFile;

/// How the run treats existing intermediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Transform everything (cache deciding per file), merge everything.
    Full,
    /// Re-encode the selected files even when their cache is valid,
    /// then merge everything.
    ReRender,
    /// Merge only the selected files, regenerating just the ones whose
    /// intermediate is missing. Existing intermediates are taken as-is.
    MergeOnly,
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::Full => "full",
            RunMode::ReRender => "re-render",
            RunMode::MergeOnly => "merge-only",
        }
    }

    /// Letter that lands in the output filename for partial runs.
    pub fn indicator_tag(&self) -> Option<char> {
        match self {
            RunMode::Full => None,
            RunMode::ReRender => Some('R'),
            RunMode::MergeOnly => Some('M'),
        }
    }
}

/// The resolved work for one run.
///
/// `entries` is the complete ordered list; the index vectors refer into
/// it by the 1-based position numbers shown to the user. `force` tells
/// the transform step to skip the cache consult entirely.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub mode: RunMode,
    pub entries: Vec<IndexedFile>,
    pub to_process: Vec<usize>,
    pub to_merge: Vec<usize>,
    pub force: bool,
}

impl RunPlan {
    pub fn files_to_process(&self) -> Vec<&IndexedFile> {
        self.files_at(&self.to_process)
    }

    pub fn files_to_merge(&self) -> Vec<&IndexedFile> {
        self.files_at(&self.to_merge)
    }

    fn files_at(&self, indices: &[usize]) -> Vec<&IndexedFile> {
        indices
            .iter()
            .filter_map(|&i| self.entries.get(i.wrapping_sub(1)))
            .collect()
    }
}

/// Build the plan for a run.
///
/// `selection` is ignored for full runs. Merge-only consults the work
/// directory to find which of the selected intermediates are missing;
/// everything still on disk is used without a cache check, since the
/// point of that mode is to splice what already exists.
pub fn plan_run(
    mode: RunMode,
    selection: &[usize],
    entries: Vec<IndexedFile>,
    work_dir: &Path,
) -> RunPlan {
    let all: Vec<usize> = entries.iter().map(|f| f.index).collect();
    let (to_process, to_merge, force) = match mode {
        RunMode::Full => (all.clone(), all, false),
        RunMode::ReRender => (selection.to_vec(), all, true),
        RunMode::MergeOnly => {
            let missing = selection
                .iter()
                .copied()
                .filter(|&i| {
                    entries
                        .get(i.wrapping_sub(1))
                        .map(|f| !work_dir.join(f.artifact_name()).exists())
                        .unwrap_or(false)
                })
                .collect();
            (missing, selection.to_vec(), false)
        }
    };

    RunPlan {
        mode,
        entries,
        to_process,
        to_merge,
        force,
    }
}
