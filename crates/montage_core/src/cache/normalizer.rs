//! Codec name normalization.

use crate::models::TrackKind;

/// Collapse an encoder or decoder name to its canonical codec family.
///
/// Hardware and software encoders that produce the same bitstream must
/// compare equal, otherwise switching between CPU and GPU encoding
/// would invalidate every cached artifact. Names not in the table fall
/// through to simple lowercasing, so an unknown codec still compares
/// stably against itself.
pub fn normalize_codec_name(name: &str, kind: TrackKind) -> String {
    let lowered = name.trim().to_ascii_lowercase();
    let canonical = match kind {
        TrackKind::Video => match lowered.as_str() {
            "libx264" | "h264_nvenc" | "h264_qsv" | "h264" => "h264",
            "libx265" | "hevc_nvenc" | "hevc_qsv" | "hevc" => "hevc",
            _ => return lowered,
        },
        TrackKind::Audio => match lowered.as_str() {
            "libfdk_aac" | "aac" => "aac",
            "libmp3lame" | "mp3" => "mp3",
            "libopus" | "opus" => "opus",
            _ => return lowered,
        },
    };
    canonical.to_string()
}
