//! Artifact caching: records, validation, and reuse decisions.
//!
//! Rendering a source file into its intermediate artifact is by far the
//! most expensive thing this tool does, so every successful transform
//! leaves a record sidecar next to the artifact describing what
//! produced it. On the next run the validator compares that record
//! against the world as it stands now; only when everything still holds
//! is the transform skipped.
//!
//! The design is deliberately fail-open: a missing, corrupt, or
//! unverifiable record costs one redundant encode, never a wrong
//! montage. No check in this module aborts a run.
//!
//! # Example
//!
//! ```ignore
//! use montage_core::cache::{check_artifact, RecordStore};
//!
//! let store = RecordStore::new(&work_dir);
//! let fresh = params_from_command(&command.tokens);
//! if check_artifact(&store, &artifact, &source, &fresh) {
//!     // reuse the artifact, skip the encode
//! }
//! ```

pub mod normalizer;
pub mod params;
pub mod record;
pub mod store;
pub mod validator;

pub use normalizer::normalize_codec_name;
pub use params::{expected_params, params_from_command, ParameterSet, DURATION_TOLERANCE_SECS};
pub use record::{mtime_nanos, sidecar_path, CacheRecord};
pub use store::{CacheError, CacheResult, RecordStore};
pub use validator::{check_artifact, is_valid};
