//! Cache validity decisions.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use tracing::{debug, warn};

use super::params::ParameterSet;
use super::record::{mtime_nanos, CacheRecord};
use super::store::RecordStore;

/// Decide whether a cached artifact can be reused.
///
/// Checks run cheapest first and short-circuit on the first failure:
///
/// 1. the record describes this source file,
/// 2. the artifact exists and is non-empty,
/// 3. the source has not been modified since the artifact was produced,
/// 4. every freshly computed parameter matches the stored one.
///
/// This function never fails. Anything that cannot be verified, a
/// stat error included, makes the artifact invalid and forces a fresh
/// transform; the worst outcome of a wrong answer here is redundant
/// work, never a stale montage.
pub fn is_valid(
    record: &CacheRecord,
    source_path: &Path,
    source_mtime: SystemTime,
    fresh: &ParameterSet,
) -> bool {
    if record.source_path != source_path {
        debug!(
            artifact = %record.artifact_path.display(),
            recorded = %record.source_path.display(),
            actual = %source_path.display(),
            "cache miss: record belongs to a different source"
        );
        return false;
    }

    match fs::metadata(&record.artifact_path) {
        Ok(meta) if meta.len() > 0 => {}
        Ok(_) => {
            debug!(
                artifact = %record.artifact_path.display(),
                "cache miss: artifact is empty"
            );
            return false;
        }
        Err(_) => {
            debug!(
                artifact = %record.artifact_path.display(),
                "cache miss: artifact is missing or unreadable"
            );
            return false;
        }
    }

    if mtime_nanos(source_mtime) > record.source_mtime_ns {
        debug!(
            source = %source_path.display(),
            "cache miss: source modified since artifact was produced"
        );
        return false;
    }

    if let Some(key) = fresh.first_mismatch(&record.params) {
        debug!(
            artifact = %record.artifact_path.display(),
            parameter = key,
            "cache miss: output parameters changed"
        );
        return false;
    }

    true
}

/// Full cache consult for one artifact: load, stat, validate.
///
/// Every failure mode folds into `false`. A corrupt record is logged
/// and treated as a miss, and a source that cannot be stat-ed forces a
/// fresh transform.
pub fn check_artifact(
    store: &RecordStore,
    artifact: &Path,
    source: &Path,
    fresh: &ParameterSet,
) -> bool {
    let record = match store.load(artifact) {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!(artifact = %artifact.display(), "cache miss: no record");
            return false;
        }
        Err(e) => {
            warn!("treating unreadable cache record as a miss: {}", e);
            return false;
        }
    };

    let source_mtime = match fs::metadata(source).and_then(|m| m.modified()) {
        Ok(mtime) => mtime,
        Err(e) => {
            debug!(source = %source.display(), "cache miss: cannot stat source: {}", e);
            return false;
        }
    };

    is_valid(&record, source, source_mtime, fresh)
}
