//! Input directory scanning and file classification.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::models::MediaKind;

/// Shared background image for audio-only submissions.
pub const SHARED_BACKGROUND: &str = "audio_background.png";

/// Concat file list written into the working directory.
pub const FILELIST_NAME: &str = "filelist.txt";

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "m4v", "3gp", "ts", "mts", "vob",
];
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "wav", "flac", "aac", "ogg", "wma", "opus", "mp2",
];

/// Source files found in the input directory, grouped and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Intro card image, when one exists (first PNG alphabetically,
    /// the shared audio background excluded).
    pub intro: Option<String>,
    /// Video submissions, sorted by person name.
    pub videos: Vec<String>,
    /// Audio submissions, sorted by person name.
    pub audios: Vec<String>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.intro.is_none() && self.videos.is_empty() && self.audios.is_empty()
    }

    pub fn total(&self) -> usize {
        usize::from(self.intro.is_some()) + self.videos.len() + self.audios.len()
    }
}

/// Scan the input directory for source files.
///
/// Only the top level is considered. Hidden files, our own products
/// (intermediates, merged outputs, partial outputs), and anything with
/// an unrecognized extension are skipped. Videos and audios come back
/// sorted by the person name embedded in the filename so the montage
/// order is stable across runs.
pub fn scan_input_dir(dir: &Path) -> io::Result<ScanResult> {
    let mut intro_candidates: Vec<String> = Vec::new();
    let mut videos: Vec<String> = Vec::new();
    let mut audios: Vec<String> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!("skipping file with non-UTF-8 name: {:?}", raw);
                continue;
            }
        };
        if name.starts_with('.') || name.starts_with('~') || is_own_product(&name) {
            continue;
        }

        match classify_extension(&name) {
            Some(MediaKind::Intro) => {
                if !name.eq_ignore_ascii_case(SHARED_BACKGROUND) {
                    intro_candidates.push(name);
                }
            }
            Some(MediaKind::Video) => videos.push(name),
            Some(MediaKind::Audio) => audios.push(name),
            None => {}
        }
    }

    intro_candidates.sort();
    videos.sort_by_cached_key(|name| person_sort_key(name));
    audios.sort_by_cached_key(|name| person_sort_key(name));

    let result = ScanResult {
        intro: intro_candidates.into_iter().next(),
        videos,
        audios,
    };
    debug!(
        dir = %dir.display(),
        intro = result.intro.is_some(),
        videos = result.videos.len(),
        audios = result.audios.len(),
        "scanned input directory"
    );
    Ok(result)
}

/// Classify a filename by extension.
///
/// PNG files are intro candidates; whether one actually becomes the
/// intro is decided during the scan.
pub fn classify_extension(name: &str) -> Option<MediaKind> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    if ext == "png" {
        Some(MediaKind::Intro)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

/// Is this one of our own products rather than a submission?
///
/// Intermediates (`temp_*`), merged outputs (`*-MERGED-*`), and partial
/// outputs (`*-M1_5-*`, `*-R1,3,5-*`) must never be picked up as
/// sources, otherwise a second run would feed the first run's results
/// back into the montage.
pub fn is_own_product(name: &str) -> bool {
    name.starts_with("temp_") || name.contains("-MERGED-") || has_partial_marker(name)
}

/// Detect a partial-output marker: `-M` or `-R`, then an index list of
/// digits joined by `_` or `,`, closed by another `-`.
fn has_partial_marker(name: &str) -> bool {
    let bytes = name.as_bytes();
    let mut i = 0;
    while i + 3 < bytes.len() {
        if bytes[i] == b'-'
            && (bytes[i + 1] == b'M' || bytes[i + 1] == b'R')
            && bytes[i + 2].is_ascii_digit()
        {
            let mut j = i + 3;
            while j < bytes.len()
                && (bytes[j].is_ascii_digit() || bytes[j] == b'_' || bytes[j] == b',')
            {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'-' {
                return true;
            }
        }
        i += 1;
    }
    false
}

/// Sort key for submissions: the person name after the last ` - `,
/// lowercased; the whole filename when no separator is present.
pub fn person_sort_key(name: &str) -> String {
    let stem = match name.rfind('.') {
        Some(dot) => &name[..dot],
        None => name,
    };
    match stem.rfind(" - ") {
        Some(sep) => stem[sep + 3..].to_lowercase(),
        None => name.to_lowercase(),
    }
}

/// Find the background image for an audio submission.
///
/// Resolution order: an explicitly configured image, then a PNG sharing
/// the submission's stem, then the shared [`SHARED_BACKGROUND`]. `None`
/// means there is no image and the caller renders a generated visual.
pub fn find_audio_background(
    input_dir: &Path,
    audio_name: &str,
    configured: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(image) = configured {
        let path = if image.is_absolute() {
            image.to_path_buf()
        } else {
            input_dir.join(image)
        };
        if path.is_file() {
            return Some(path);
        }
        warn!(image = %path.display(), "configured audio background not found");
    }

    let per_stem = input_dir.join(audio_name).with_extension("png");
    if per_stem.is_file() {
        return Some(per_stem);
    }

    let shared = input_dir.join(SHARED_BACKGROUND);
    if shared.is_file() {
        return Some(shared);
    }

    None
}

/// Remove intermediates, cache records, and the concat list from the
/// working directory, then the directory itself if it ended up empty.
///
/// Returns the number of files removed.
pub fn cleanup_intermediates(work_dir: &Path) -> io::Result<usize> {
    let entries = match fs::read_dir(work_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let is_intermediate = (name.starts_with("temp_") && name.ends_with(".mp4"))
            || name.ends_with(".cache")
            || name == FILELIST_NAME;
        if is_intermediate {
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => warn!(file = %entry.path().display(), "could not remove: {}", e),
            }
        }
    }

    // Drop the directory too when nothing else lives in it.
    let _ = fs::remove_dir(work_dir);

    debug!(work_dir = %work_dir.display(), removed, "cleaned up intermediates");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify_extension("clip - Ann.mp4"), Some(MediaKind::Video));
        assert_eq!(classify_extension("clip - Ann.MOV"), Some(MediaKind::Video));
        assert_eq!(classify_extension("song - Bo.wav"), Some(MediaKind::Audio));
        assert_eq!(classify_extension("old - Cy.wmv"), Some(MediaKind::Video));
        assert_eq!(classify_extension("voice - Di.opus"), Some(MediaKind::Audio));
        assert_eq!(classify_extension("title.png"), Some(MediaKind::Intro));
        assert_eq!(classify_extension("notes.txt"), None);
        assert_eq!(classify_extension("noextension"), None);
    }

    #[test]
    fn own_products_are_recognized() {
        assert!(is_own_product("temp_3.mp4"));
        assert!(is_own_product("INPUT-MERGED-20250821_120000.mp4"));
        assert!(is_own_product("INPUT-M1_5-20250821_120000.mp4"));
        assert!(is_own_product("INPUT-R1,3,5-20250821_120000.mp4"));
        assert!(!is_own_product("clip - Alice.mp4"));
        assert!(!is_own_product("re-Mix - Dana.mp4"));
    }

    #[test]
    fn person_key_uses_last_separator() {
        assert_eq!(person_sort_key("clip - Alice.mp4"), "alice");
        assert_eq!(person_sort_key("intro - take 2 - Bob.mov"), "bob");
        assert_eq!(person_sort_key("plain.mp4"), "plain.mp4");
    }

    #[test]
    fn scan_groups_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "zz clip - Alice.mp4",
            "aa clip - Zoe.mp4",
            "song - Mia.wav",
            "title.png",
            "audio_background.png",
            "temp_0.mp4",
            "party-MERGED-20250820_090000.mp4",
            ".hidden.mp4",
            "~backup clip.mp4",
            "notes.txt",
        ] {
            touch(dir.path(), name);
        }

        let result = scan_input_dir(dir.path()).unwrap();
        assert_eq!(result.intro.as_deref(), Some("title.png"));
        // Sorted by person, not by filename.
        assert_eq!(result.videos, vec!["zz clip - Alice.mp4", "aa clip - Zoe.mp4"]);
        assert_eq!(result.audios, vec!["song - Mia.wav"]);
        assert_eq!(result.total(), 4);
    }

    #[test]
    fn shared_background_is_not_an_intro() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), SHARED_BACKGROUND);

        let result = scan_input_dir(dir.path()).unwrap();
        assert!(result.intro.is_none());
        assert!(result.is_empty());
    }

    #[test]
    fn background_lookup_prefers_per_stem_image() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "song - Mia.png");
        touch(dir.path(), SHARED_BACKGROUND);

        let found = find_audio_background(dir.path(), "song - Mia.wav", None).unwrap();
        assert!(found.ends_with("song - Mia.png"));

        let shared = find_audio_background(dir.path(), "other - Jo.wav", None).unwrap();
        assert!(shared.ends_with(SHARED_BACKGROUND));
    }

    #[test]
    fn background_lookup_honors_configured_image() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "custom.png");
        touch(dir.path(), SHARED_BACKGROUND);

        let found =
            find_audio_background(dir.path(), "song - Mia.wav", Some(Path::new("custom.png")))
                .unwrap();
        assert!(found.ends_with("custom.png"));

        // Missing configured image falls back down the chain.
        let fallback =
            find_audio_background(dir.path(), "song - Mia.wav", Some(Path::new("absent.png")))
                .unwrap();
        assert!(fallback.ends_with(SHARED_BACKGROUND));
    }

    #[test]
    fn background_lookup_can_come_up_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_audio_background(dir.path(), "song - Mia.wav", None).is_none());
    }

    #[test]
    fn cleanup_removes_intermediates_and_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("temp_");
        fs::create_dir(&work).unwrap();
        touch(&work, "temp_0.mp4");
        touch(&work, "temp_0.cache");
        touch(&work, FILELIST_NAME);

        assert_eq!(cleanup_intermediates(&work).unwrap(), 3);
        assert!(!work.exists());
    }

    #[test]
    fn cleanup_leaves_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("temp_");
        fs::create_dir(&work).unwrap();
        touch(&work, "temp_0.mp4");
        touch(&work, "keep.txt");

        assert_eq!(cleanup_intermediates(&work).unwrap(), 1);
        assert!(work.join("keep.txt").exists());
        assert!(work.exists());
    }

    #[test]
    fn cleanup_of_missing_dir_is_a_noop() {
        assert_eq!(
            cleanup_intermediates(Path::new("/no/such/work/dir")).unwrap(),
            0
        );
    }
}
