//! On-disk store for cache records.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::record::{self, CacheRecord};

/// Errors from reading or writing cache records.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A sidecar exists but cannot be interpreted. Consumers treat
    /// this as a cache miss, never as a fatal condition.
    #[error("Malformed cache record at '{path}': {reason}")]
    RecordCorrupt { path: String, reason: String },

    /// The filesystem refused an operation.
    #[error("Cache {operation} failed at '{path}': {source}")]
    Io {
        operation: String,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    pub fn record_corrupt(path: &Path, reason: impl Into<String>) -> Self {
        CacheError::RecordCorrupt {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(operation: impl Into<String>, path: &Path, source: io::Error) -> Self {
        CacheError::Io {
            operation: operation.into(),
            path: path.display().to_string(),
            source,
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Explicit handle to the record sidecars under one working directory.
///
/// All record access goes through a store instance; there is no global
/// state. Records live next to their artifacts as `.cache` sidecars,
/// and the store's root is only used for bulk operations like
/// [`RecordStore::clear`].
///
/// The store assumes a single writer per working directory. Nothing
/// locks the sidecars; two processes pointed at the same directory
/// will race and the last writer wins.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sidecar path for an artifact.
    pub fn sidecar_path(&self, artifact: &Path) -> PathBuf {
        record::sidecar_path(artifact)
    }

    /// Load the record for an artifact.
    ///
    /// `Ok(None)` means no record exists. A sidecar that cannot be
    /// parsed is [`CacheError::RecordCorrupt`]; callers downgrade that
    /// to a miss.
    pub fn load(&self, artifact: &Path) -> CacheResult<Option<CacheRecord>> {
        let path = self.sidecar_path(artifact);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io("read", &path, e)),
        };
        match CacheRecord::from_sidecar_str(&text) {
            Ok(rec) => {
                debug!(sidecar = %path.display(), "loaded cache record");
                Ok(Some(rec))
            }
            Err(reason) => Err(CacheError::record_corrupt(&path, reason)),
        }
    }

    /// Write the record for its artifact, replacing any previous one.
    pub fn save(&self, record: &CacheRecord) -> CacheResult<()> {
        let path = self.sidecar_path(&record.artifact_path);
        fs::write(&path, record.to_sidecar_string())
            .map_err(|e| CacheError::io("write", &path, e))?;
        debug!(sidecar = %path.display(), "saved cache record");
        Ok(())
    }

    /// Delete the record for an artifact, if one exists.
    pub fn remove(&self, artifact: &Path) -> CacheResult<bool> {
        let path = self.sidecar_path(artifact);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(sidecar = %path.display(), "removed cache record");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io("remove", &path, e)),
        }
    }

    /// Delete every record under the store's root.
    ///
    /// Artifacts are left in place; only the sidecars go. Returns how
    /// many records were removed.
    pub fn clear(&self) -> CacheResult<usize> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::io("scan", &self.root, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("cache") {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(file = %path.display(), "could not remove record: {}", e),
                }
            }
        }
        debug!(root = %self.root.display(), removed, "cleared cache records");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::params::ParameterSet;
    use std::time::SystemTime;

    fn record_for(dir: &Path, artifact: &str) -> CacheRecord {
        CacheRecord::new(
            dir.join("clip - Alice.mp4"),
            SystemTime::now(),
            dir.join(artifact),
            ParameterSet {
                duration: Some(15.0),
                video_codec: Some("h264".to_string()),
                ..ParameterSet::default()
            },
        )
    }

    #[test]
    fn missing_record_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let loaded = store.load(&dir.path().join("temp_0.mp4")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load_returns_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let record = record_for(dir.path(), "temp_1.mp4");

        store.save(&record).unwrap();
        let loaded = store.load(&record.artifact_path).unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn corrupt_sidecar_is_reported_not_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let artifact = dir.path().join("temp_2.mp4");
        fs::write(store.sidecar_path(&artifact), "pickles").unwrap();

        let err = store.load(&artifact).unwrap_err();
        assert!(matches!(err, CacheError::RecordCorrupt { .. }));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let record = record_for(dir.path(), "temp_3.mp4");

        store.save(&record).unwrap();
        assert!(store.remove(&record.artifact_path).unwrap());
        assert!(!store.remove(&record.artifact_path).unwrap());
    }

    #[test]
    fn clear_removes_only_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        for artifact in ["temp_0.mp4", "temp_1.mp4"] {
            store.save(&record_for(dir.path(), artifact)).unwrap();
        }
        let artifact = dir.path().join("temp_0.mp4");
        fs::write(&artifact, b"frames").unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(artifact.exists());
        assert!(store.load(&artifact).unwrap().is_none());
    }

    #[test]
    fn clear_on_missing_root_is_a_noop() {
        let store = RecordStore::new("/definitely/not/here");
        assert_eq!(store.clear().unwrap(), 0);
    }
}
