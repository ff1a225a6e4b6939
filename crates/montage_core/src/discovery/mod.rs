//! Source discovery and processing order.
//!
//! A run starts by scanning the input directory: classify files by
//! extension, throw out our own products from earlier runs, sort
//! submissions by the person name in the filename, and lay everything
//! out in a total 1-based order (intro, then videos, then audio). That
//! order is the backbone of the run; selection expressions, artifact
//! names, and the concat list all speak in its indices.
//!
//! # Example
//!
//! ```ignore
//! use montage_core::discovery::{order_from_scan, scan_input_dir};
//!
//! let scan = scan_input_dir(&input_dir)?;
//! let order = order_from_scan(&scan);
//! for entry in &order {
//!     println!("{}", entry);
//! }
//! ```

pub mod naming;
pub mod order;
pub mod scan;

pub use naming::{output_filename, sanitize_component};
pub use order::{build_order, order_from_scan};
pub use scan::{
    classify_extension, cleanup_intermediates, find_audio_background, is_own_product,
    person_sort_key, scan_input_dir, ScanResult, FILELIST_NAME, SHARED_BACKGROUND,
};
