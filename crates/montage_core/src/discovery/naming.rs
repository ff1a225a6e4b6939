//! Output file naming.

use std::path::Path;

use chrono::Local;

/// Longest base name carried into an output filename.
const MAX_BASE_LEN: usize = 35;

/// Make a string safe to embed in a filename on every platform.
///
/// Characters Windows forbids are replaced with underscores and the
/// result is capped at [`MAX_BASE_LEN`] characters.
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .take(MAX_BASE_LEN)
        .collect()
}

/// Name for the finished montage.
///
/// Full runs produce `{base}-MERGED-{timestamp}.mp4`; partial runs
/// carry their selection indicator instead of `MERGED`. The base is the
/// input directory's name, sanitized, so outputs sort next to the
/// project they came from.
pub fn output_filename(input_dir: &Path, indicator: Option<&str>) -> String {
    let base = base_name(input_dir);
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    match indicator {
        Some(indicator) => format!("{}-{}-{}.mp4", base, indicator, timestamp),
        None => format!("{}-MERGED-{}.mp4", base, timestamp),
    }
}

fn base_name(input_dir: &Path) -> String {
    let name = input_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .or_else(|| {
            // Relative paths like `.` have no file name until resolved.
            input_dir.canonicalize().ok().and_then(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| "montage".to_string());
    sanitize_component(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_forbidden_characters() {
        assert_eq!(sanitize_component("a:b/c|d"), "a_b_c_d");
        assert_eq!(sanitize_component("plain name"), "plain name");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(60);
        assert_eq!(sanitize_component(&long).chars().count(), 35);
    }

    #[test]
    fn full_run_name_carries_merged_marker() {
        let name = output_filename(Path::new("/projects/Spring Party"), None);
        assert!(name.starts_with("Spring Party-MERGED-"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn partial_run_name_carries_indicator() {
        let name = output_filename(Path::new("/projects/Spring Party"), Some("M1_5"));
        assert!(name.starts_with("Spring Party-M1_5-"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn dot_directory_still_yields_a_usable_name() {
        let name = output_filename(Path::new("."), None);
        assert!(name.contains("-MERGED-"));
        assert!(name.ends_with(".mp4"));
    }
}
