//! File entries as they appear in the processing order.

use serde::{Deserialize, Serialize};

use super::enums::MediaKind;

/// One source file with its position in the processing order.
///
/// Indices are 1-based and stable for the lifetime of a run: the intro
/// (when present) is always index 1, videos follow, audio submissions
/// come last. The index also names the intermediate artifact the file
/// is rendered into, so reordering between runs invalidates nothing
/// more than the positions that actually moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFile {
    /// 1-based position in the montage.
    pub index: usize,
    /// File name relative to the input directory.
    pub name: String,
    /// Category that decides the transform applied to this file.
    pub kind: MediaKind,
}

impl IndexedFile {
    pub fn new(index: usize, name: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            index,
            name: name.into(),
            kind,
        }
    }

    /// Name of the intermediate artifact this entry renders into.
    ///
    /// Artifacts are numbered from zero so the intro (index 1) becomes
    /// `temp_0.mp4`, keeping the on-disk names aligned with positions
    /// in the concat list.
    pub fn artifact_name(&self) -> String {
        format!("temp_{}.mp4", self.index - 1)
    }
}

impl std::fmt::Display for IndexedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>3}. [{}] {}", self.index, self.kind.tag(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_are_zero_based() {
        let intro = IndexedFile::new(1, "title.png", MediaKind::Intro);
        assert_eq!(intro.artifact_name(), "temp_0.mp4");

        let clip = IndexedFile::new(7, "clip - Dana.mp4", MediaKind::Video);
        assert_eq!(clip.artifact_name(), "temp_6.mp4");
    }

    #[test]
    fn display_includes_index_and_tag() {
        let entry = IndexedFile::new(3, "song - Lee.wav", MediaKind::Audio);
        assert_eq!(entry.to_string(), "  3. [AUDIO] song - Lee.wav");
    }
}
