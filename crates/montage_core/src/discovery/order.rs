//! Processing order construction.

use crate::models::{IndexedFile, MediaKind};

use super::scan::ScanResult;

/// Build the processing order from classified, sorted file groups.
///
/// The order is total and 1-based: the intro (when present) is index 1,
/// videos follow, audio submissions come last. Within a run the indices
/// are stable; they name the intermediate artifacts and drive every
/// selection expression the user types.
pub fn build_order(intro: Option<&str>, videos: &[String], audios: &[String]) -> Vec<IndexedFile> {
    let mut order = Vec::with_capacity(usize::from(intro.is_some()) + videos.len() + audios.len());
    let mut index = 1;

    if let Some(name) = intro {
        order.push(IndexedFile::new(index, name, MediaKind::Intro));
        index += 1;
    }
    for name in videos {
        order.push(IndexedFile::new(index, name.clone(), MediaKind::Video));
        index += 1;
    }
    for name in audios {
        order.push(IndexedFile::new(index, name.clone(), MediaKind::Audio));
        index += 1;
    }

    order
}

/// Build the processing order straight from a scan.
pub fn order_from_scan(scan: &ScanResult) -> Vec<IndexedFile> {
    build_order(scan.intro.as_deref(), &scan.videos, &scan.audios)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn intro_comes_first() {
        let order = build_order(
            Some("title.png"),
            &names(&["clip - Alice.mp4", "clip - Bob.mp4"]),
            &names(&["song - Mia.wav"]),
        );

        assert_eq!(order.len(), 4);
        assert_eq!(order[0].index, 1);
        assert_eq!(order[0].kind, MediaKind::Intro);
        assert_eq!(order[1].name, "clip - Alice.mp4");
        assert_eq!(order[3].index, 4);
        assert_eq!(order[3].kind, MediaKind::Audio);
    }

    #[test]
    fn order_without_intro_starts_at_one() {
        let order = build_order(None, &names(&["clip - Alice.mp4"]), &[]);
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].index, 1);
        assert_eq!(order[0].kind, MediaKind::Video);
        assert_eq!(order[0].artifact_name(), "temp_0.mp4");
    }

    #[test]
    fn empty_groups_build_empty_order() {
        assert!(build_order(None, &[], &[]).is_empty());
    }

    #[test]
    fn indices_are_consecutive() {
        let order = build_order(
            Some("title.png"),
            &names(&["a - A.mp4", "b - B.mp4", "c - C.mp4"]),
            &names(&["d - D.wav", "e - E.mp3"]),
        );
        for (position, entry) in order.iter().enumerate() {
            assert_eq!(entry.index, position + 1);
        }
    }
}
