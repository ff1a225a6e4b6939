//! Cache records and their sidecar text format.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::params::ParameterSet;

/// Current sidecar format version.
const RECORD_VERSION: &str = "1";

/// Provenance of one rendered artifact.
///
/// A record answers the question "what produced this artifact, from
/// what source, at what point in time". It is written next to the
/// artifact after a successful transform and consulted before the next
/// one; it never outlives a deliberate cache clear or an overwrite by
/// a newer successful transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    /// Source file the artifact was rendered from.
    pub source_path: PathBuf,
    /// Source modification time when the artifact was produced,
    /// in nanoseconds since the epoch.
    pub source_mtime_ns: u128,
    /// The artifact this record describes.
    pub artifact_path: PathBuf,
    /// Output parameters the producing command promised.
    pub params: ParameterSet,
}

impl CacheRecord {
    pub fn new(
        source_path: impl Into<PathBuf>,
        source_mtime: SystemTime,
        artifact_path: impl Into<PathBuf>,
        params: ParameterSet,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            source_mtime_ns: mtime_nanos(source_mtime),
            artifact_path: artifact_path.into(),
            params,
        }
    }

    /// Render the record as sidecar text.
    ///
    /// One `key: value` pair per line, parameters prefixed with
    /// `params.` and kept in their canonical order.
    pub fn to_sidecar_string(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("version: {}\n", RECORD_VERSION));
        out.push_str(&format!("source_path: {}\n", self.source_path.display()));
        out.push_str(&format!("source_mtime: {}\n", self.source_mtime_ns));
        out.push_str(&format!(
            "artifact_path: {}\n",
            self.artifact_path.display()
        ));
        for (key, value) in self.params.entries() {
            out.push_str(&format!("params.{}: {}\n", key, value));
        }
        out
    }

    /// Parse sidecar text back into a record.
    ///
    /// Any structural problem is an error string describing what broke;
    /// callers treat a failed parse as a cache miss, never as a fatal
    /// condition.
    pub fn from_sidecar_str(text: &str) -> Result<CacheRecord, String> {
        let mut version: Option<String> = None;
        let mut source_path: Option<PathBuf> = None;
        let mut source_mtime_ns: Option<u128> = None;
        let mut artifact_path: Option<PathBuf> = None;
        let mut params = ParameterSet::default();

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| format!("line {} has no key", lineno + 1))?;
            let key = key.trim();
            let value = value.trim();

            match key {
                "version" => version = Some(value.to_string()),
                "source_path" => source_path = Some(PathBuf::from(value)),
                "source_mtime" => {
                    source_mtime_ns = Some(
                        value
                            .parse()
                            .map_err(|_| format!("bad source_mtime '{}'", value))?,
                    );
                }
                "artifact_path" => artifact_path = Some(PathBuf::from(value)),
                _ => {
                    if let Some(param_key) = key.strip_prefix("params.") {
                        params.set_entry(param_key, value)?;
                    }
                    // Unknown top-level keys are tolerated.
                }
            }
        }

        match version.as_deref() {
            Some(RECORD_VERSION) => {}
            Some(other) => return Err(format!("unsupported record version '{}'", other)),
            None => return Err("missing version field".to_string()),
        }

        Ok(CacheRecord {
            source_path: source_path.ok_or("missing source_path field")?,
            source_mtime_ns: source_mtime_ns.ok_or("missing source_mtime field")?,
            artifact_path: artifact_path.ok_or("missing artifact_path field")?,
            params,
        })
    }
}

/// A file's modification time as nanoseconds since the epoch.
///
/// Pre-epoch timestamps clamp to zero; comparisons only care about
/// relative ordering.
pub fn mtime_nanos(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

/// Sidecar path for an artifact: same name, `.cache` extension.
pub fn sidecar_path(artifact: &Path) -> PathBuf {
    artifact.with_extension("cache")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> ParameterSet {
        ParameterSet {
            duration: Some(15.0),
            video_codec: Some("h264".to_string()),
            audio_codec: Some("aac".to_string()),
            resolution: Some("1920x1080".to_string()),
            audio_filter: Some(
                "aresample=48000,aformat=channel_layouts=stereo,loudnorm=I=-16:TP=-1.5:LRA=11"
                    .to_string(),
            ),
            sample_rate: Some(48000),
            channels: Some(2),
            ..ParameterSet::default()
        }
    }

    #[test]
    fn sidecar_text_round_trips() {
        let record = CacheRecord::new(
            "INPUT/clip - Alice.mp4",
            SystemTime::now(),
            "INPUT/temp_/temp_1.mp4",
            sample_params(),
        );
        let text = record.to_sidecar_string();
        let back = CacheRecord::from_sidecar_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn filter_values_survive_embedded_colons() {
        let record = CacheRecord::new(
            "a.wav",
            SystemTime::now(),
            "temp_2.mp4",
            sample_params(),
        );
        let text = record.to_sidecar_string();
        let back = CacheRecord::from_sidecar_str(&text).unwrap();
        assert_eq!(
            back.params.audio_filter.as_deref(),
            record.params.audio_filter.as_deref()
        );
    }

    #[test]
    fn rejects_structurally_broken_text() {
        assert!(CacheRecord::from_sidecar_str("").is_err());
        assert!(CacheRecord::from_sidecar_str("not a record").is_err());
        assert!(CacheRecord::from_sidecar_str("version: 1\nsource_path: a\n").is_err());
    }

    #[test]
    fn rejects_unknown_version() {
        let record = CacheRecord::new("a.mp4", SystemTime::now(), "t.mp4", sample_params());
        let text = record.to_sidecar_string().replace("version: 1", "version: 9");
        let err = CacheRecord::from_sidecar_str(&text).unwrap_err();
        assert!(err.contains("version"));
    }

    #[test]
    fn rejects_bad_mtime() {
        let text = "version: 1\nsource_path: a.mp4\nsource_mtime: soon\nartifact_path: t.mp4\n";
        assert!(CacheRecord::from_sidecar_str(text).is_err());
    }

    #[test]
    fn tolerates_unknown_keys() {
        let record = CacheRecord::new("a.mp4", SystemTime::now(), "t.mp4", sample_params());
        let mut text = record.to_sidecar_string();
        text.push_str("params.some_future_key: 7\nnote: hand edited\n");
        let back = CacheRecord::from_sidecar_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn sidecar_path_swaps_extension() {
        assert_eq!(
            sidecar_path(Path::new("temp_/temp_3.mp4")),
            PathBuf::from("temp_/temp_3.cache")
        );
    }

    #[test]
    fn pre_epoch_times_clamp_to_zero() {
        let before = UNIX_EPOCH - std::time::Duration::from_secs(10);
        assert_eq!(mtime_nanos(before), 0);
    }
}
