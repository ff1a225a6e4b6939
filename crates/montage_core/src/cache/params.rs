//! Expected output parameters derived from a transform command.

use std::path::Path;

use crate::models::{MediaKind, TrackKind};
use crate::probe::{MediaInfo, ProbeError};

use super::normalizer::normalize_codec_name;

/// Tolerance applied when comparing durations, in seconds.
///
/// Container timestamps drift by a frame or two between what was
/// requested and what ffmpeg writes, so durations within this window
/// count as equal.
pub const DURATION_TOLERANCE_SECS: f64 = 0.1;

/// The output properties a transform command promises to produce.
///
/// Values are read from the command tokens themselves, never from the
/// artifact, so the set is a pure function of the command. The commanded
/// `-t` duration is authoritative for comparison even when the source
/// runs shorter; whether the encode actually honored it is checked
/// separately after the transform.
///
/// Only properties of the *output* belong here. Encoder-internal knobs
/// like preset or rate control are deliberately excluded: the CPU and
/// GPU encoders use different ones, and switching between them must
/// not invalidate artifacts that are otherwise identical.
///
/// Fields are optional because not every command carries every flag.
/// Comparison and serialization both walk [`ParameterSet::entries`],
/// which fixes the canonical ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    pub duration: Option<f64>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub resolution: Option<String>,
    pub video_filter: Option<String>,
    pub audio_filter: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
    pub pixel_format: Option<String>,
}

impl ParameterSet {
    /// Present fields in canonical order, values rendered as text.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(d) = self.duration {
            out.push(("duration", format!("{}", d)));
        }
        for (key, value) in [
            ("video_codec", &self.video_codec),
            ("audio_codec", &self.audio_codec),
            ("resolution", &self.resolution),
            ("video_filter", &self.video_filter),
            ("audio_filter", &self.audio_filter),
        ] {
            if let Some(v) = value {
                out.push((key, v.clone()));
            }
        }
        if let Some(r) = self.sample_rate {
            out.push(("sample_rate", r.to_string()));
        }
        if let Some(c) = self.channels {
            out.push(("channels", c.to_string()));
        }
        if let Some(p) = &self.pixel_format {
            out.push(("pixel_format", p.clone()));
        }
        out
    }

    /// Set a field from its sidecar key and textual value.
    ///
    /// Unknown keys are ignored so older records with extra fields stay
    /// readable; a value that fails to parse is an error.
    pub fn set_entry(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "duration" => {
                self.duration = Some(
                    value
                        .parse()
                        .map_err(|_| format!("bad duration '{}'", value))?,
                );
            }
            "sample_rate" => {
                self.sample_rate = Some(
                    value
                        .parse()
                        .map_err(|_| format!("bad sample_rate '{}'", value))?,
                );
            }
            "channels" => {
                self.channels = Some(
                    value
                        .parse()
                        .map_err(|_| format!("bad channels '{}'", value))?,
                );
            }
            "video_codec" => self.video_codec = Some(value.to_string()),
            "audio_codec" => self.audio_codec = Some(value.to_string()),
            "resolution" => self.resolution = Some(value.to_string()),
            "video_filter" => self.video_filter = Some(value.to_string()),
            "audio_filter" => self.audio_filter = Some(value.to_string()),
            "pixel_format" => self.pixel_format = Some(value.to_string()),
            _ => {}
        }
        Ok(())
    }

    /// Compare a freshly computed set (self) against a stored one.
    ///
    /// Every field present in the fresh set must match the stored value;
    /// durations compare within [`DURATION_TOLERANCE_SECS`]. Returns the
    /// first mismatching key, or `None` when the stored set still
    /// describes what the current command would produce.
    pub fn first_mismatch(&self, stored: &ParameterSet) -> Option<&'static str> {
        if let Some(fresh) = self.duration {
            match stored.duration {
                Some(old) if (fresh - old).abs() <= DURATION_TOLERANCE_SECS => {}
                _ => return Some("duration"),
            }
        }

        fn differs(fresh: &Option<String>, stored: &Option<String>) -> bool {
            matches!(fresh, Some(f) if stored.as_ref() != Some(f))
        }

        for (key, fresh, old) in [
            ("video_codec", &self.video_codec, &stored.video_codec),
            ("audio_codec", &self.audio_codec, &stored.audio_codec),
            ("resolution", &self.resolution, &stored.resolution),
            ("video_filter", &self.video_filter, &stored.video_filter),
            ("audio_filter", &self.audio_filter, &stored.audio_filter),
            ("pixel_format", &self.pixel_format, &stored.pixel_format),
        ] {
            if differs(fresh, old) {
                return Some(key);
            }
        }

        if matches!(self.sample_rate, Some(f) if stored.sample_rate != Some(f)) {
            return Some("sample_rate");
        }
        if matches!(self.channels, Some(f) if stored.channels != Some(f)) {
            return Some("channels");
        }
        None
    }
}

/// Extract the expected parameters from a transform's argument tokens.
///
/// Walks the token list flag by flag. Codec names are normalized so
/// equivalent hardware and software encoders compare equal; filter
/// chains are kept verbatim; the resolution is read out of the scale
/// filter when one is present. The last occurrence of a repeated flag
/// wins, matching how ffmpeg itself resolves duplicates.
pub fn params_from_command(tokens: &[String]) -> ParameterSet {
    let mut set = ParameterSet::default();

    let mut i = 0;
    while i < tokens.len() {
        let flag = tokens[i].as_str();
        let value = tokens.get(i + 1).map(String::as_str);
        let consumed = match (flag, value) {
            ("-c:v" | "-vcodec", Some(v)) => {
                set.video_codec = Some(normalize_codec_name(v, TrackKind::Video));
                true
            }
            ("-c:a" | "-acodec", Some(v)) => {
                set.audio_codec = Some(normalize_codec_name(v, TrackKind::Audio));
                true
            }
            ("-vf" | "-filter_complex", Some(v)) => {
                set.video_filter = Some(v.to_string());
                true
            }
            ("-af", Some(v)) => {
                set.audio_filter = Some(v.to_string());
                true
            }
            ("-t", Some(v)) => {
                set.duration = v.parse().ok();
                true
            }
            ("-ar", Some(v)) => {
                set.sample_rate = v.parse().ok();
                true
            }
            ("-ac", Some(v)) => {
                set.channels = v.parse().ok();
                true
            }
            ("-pix_fmt", Some(v)) => {
                set.pixel_format = Some(v.to_string());
                true
            }
            _ => false,
        };
        i += if consumed { 2 } else { 1 };
    }

    if set.resolution.is_none() {
        if let Some(filter) = &set.video_filter {
            set.resolution = resolution_from_filter(filter);
        }
    }

    set
}

/// Expected parameters for one file, gated on the source being usable.
///
/// The values come entirely from the command; the caller's probe report
/// only verifies that the source can be measured at all, so an
/// unreadable file fails here instead of deep inside ffmpeg. Intro
/// images carry no duration, so only the stream they need is required.
pub fn expected_params(
    tokens: &[String],
    kind: MediaKind,
    source: &Path,
    info: &MediaInfo,
) -> Result<ParameterSet, ProbeError> {
    match kind {
        MediaKind::Intro => {
            if !info.has_video() {
                return Err(ProbeError::missing_stream("video", source));
            }
        }
        MediaKind::Video => {
            if !info.has_video() {
                return Err(ProbeError::missing_stream("video", source));
            }
            info.require_duration(source)?;
        }
        MediaKind::Audio => {
            if !info.has_audio() {
                return Err(ProbeError::missing_stream("audio", source));
            }
            info.require_duration(source)?;
        }
    }
    Ok(params_from_command(tokens))
}

/// Pull `WxH` out of a scale filter, when the dimensions are literal.
fn resolution_from_filter(filter: &str) -> Option<String> {
    let start = filter.find("scale=")? + "scale=".len();
    let rest = &filter[start..];
    let (width, rest) = take_digits(rest)?;
    let rest = rest.strip_prefix(':')?;
    let (height, _) = take_digits(rest)?;
    Some(format!("{}x{}", width, height))
}

fn take_digits(s: &str) -> Option<(&str, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        None
    } else {
        Some(s.split_at(end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn cpu_video_command() -> Vec<String> {
        toks(&[
            "-y",
            "-i",
            "clip - Alice.mp4",
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-crf",
            "23",
            "-vf",
            "scale=1920:1080:force_original_aspect_ratio=decrease,pad=1920:1080:(ow-iw)/2:(oh-ih)/2,setsar=1,fps=30",
            "-pix_fmt",
            "yuv420p",
            "-profile:v",
            "high",
            "-c:a",
            "aac",
            "-ar",
            "48000",
            "-ac",
            "2",
            "-b:a",
            "128k",
            "-af",
            "aresample=48000,aformat=channel_layouts=stereo,loudnorm=I=-16:TP=-1.5:LRA=11",
            "-t",
            "15",
            "temp_1.mp4",
        ])
    }

    fn gpu_video_command() -> Vec<String> {
        let mut tokens = cpu_video_command();
        // GPU runs swap encoder and rate control, nothing else.
        let pos = tokens.iter().position(|t| t == "libx264").unwrap();
        tokens[pos] = "h264_nvenc".to_string();
        let pos = tokens.iter().position(|t| t == "medium").unwrap();
        tokens[pos] = "fast".to_string();
        let pos = tokens.iter().position(|t| t == "-crf").unwrap();
        tokens.splice(pos..pos + 2, toks(&["-rc:v", "vbr", "-cq:v", "23", "-b:v", "0"]));
        tokens
    }

    #[test]
    fn extracts_fields_from_command() {
        let set = params_from_command(&cpu_video_command());
        assert_eq!(set.duration, Some(15.0));
        assert_eq!(set.video_codec.as_deref(), Some("h264"));
        assert_eq!(set.audio_codec.as_deref(), Some("aac"));
        assert_eq!(set.resolution.as_deref(), Some("1920x1080"));
        assert_eq!(set.sample_rate, Some(48000));
        assert_eq!(set.channels, Some(2));
        assert_eq!(set.pixel_format.as_deref(), Some("yuv420p"));
        assert!(set
            .audio_filter
            .as_deref()
            .is_some_and(|f| f.contains("loudnorm")));
    }

    #[test]
    fn gpu_and_cpu_commands_extract_identical_sets() {
        let cpu_set = params_from_command(&cpu_video_command());
        let gpu_set = params_from_command(&gpu_video_command());
        assert_eq!(cpu_set, gpu_set);
        assert!(gpu_set.first_mismatch(&cpu_set).is_none());
    }

    #[test]
    fn filter_complex_counts_as_video_filter() {
        let set = params_from_command(&toks(&[
            "-filter_complex",
            "[0:a]showwaves=s=1920x1080:mode=cline:colors=cyan:scale=lin[v]",
        ]));
        assert!(set
            .video_filter
            .as_deref()
            .is_some_and(|f| f.contains("showwaves")));
        // showwaves sizes with s=, not scale=, so no resolution here.
        assert!(set.resolution.is_none());
    }

    #[test]
    fn last_duration_flag_wins() {
        let set = params_from_command(&toks(&["-t", "10", "-t", "15"]));
        assert_eq!(set.duration, Some(15.0));
    }

    #[test]
    fn resolution_requires_literal_dimensions() {
        let set = params_from_command(&toks(&["-vf", "scale=iw:-2"]));
        assert!(set.resolution.is_none());
    }

    #[test]
    fn identical_sets_match() {
        let fresh = params_from_command(&cpu_video_command());
        let stored = fresh.clone();
        assert_eq!(fresh.first_mismatch(&stored), None);
    }

    #[test]
    fn duration_within_tolerance_matches() {
        let fresh = params_from_command(&cpu_video_command());
        let mut stored = fresh.clone();
        stored.duration = Some(15.02);
        assert_eq!(fresh.first_mismatch(&stored), None);

        stored.duration = Some(16.0);
        assert_eq!(fresh.first_mismatch(&stored), Some("duration"));
    }

    #[test]
    fn changed_filter_chain_mismatches() {
        let fresh = params_from_command(&cpu_video_command());
        let mut stored = fresh.clone();
        stored.audio_filter = Some("aresample=44100".to_string());
        assert_eq!(fresh.first_mismatch(&stored), Some("audio_filter"));
    }

    #[test]
    fn stored_extras_are_ignored() {
        let fresh = ParameterSet {
            duration: Some(15.0),
            ..ParameterSet::default()
        };
        let stored = params_from_command(&cpu_video_command());
        assert_eq!(fresh.first_mismatch(&stored), None);
    }

    #[test]
    fn entries_keep_canonical_order() {
        let set = params_from_command(&cpu_video_command());
        let keys: Vec<&str> = set.entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys[0], "duration");
        let vc = keys.iter().position(|k| *k == "video_codec").unwrap();
        let sr = keys.iter().position(|k| *k == "sample_rate").unwrap();
        let pf = keys.iter().position(|k| *k == "pixel_format").unwrap();
        assert!(vc < sr && sr < pf);
    }

    #[test]
    fn entries_round_trip_through_set_entry() {
        let set = params_from_command(&cpu_video_command());
        let mut rebuilt = ParameterSet::default();
        for (key, value) in set.entries() {
            rebuilt.set_entry(key, &value).unwrap();
        }
        assert_eq!(rebuilt, set);
    }

    #[test]
    fn set_entry_rejects_bad_numbers() {
        let mut set = ParameterSet::default();
        assert!(set.set_entry("duration", "fast").is_err());
        assert!(set.set_entry("sample_rate", "many").is_err());
        assert!(set.set_entry("crf", "23").is_ok());
    }

    #[test]
    fn expected_params_requires_the_stream_the_kind_needs() {
        use crate::probe::StreamInfo;

        let audio_only = MediaInfo {
            duration: Some(42.0),
            video: None,
            audio: Some(StreamInfo::default()),
        };
        let source = Path::new("song - Cleo.mp3");
        let tokens = cpu_video_command();

        let err = expected_params(&tokens, MediaKind::Video, source, &audio_only).unwrap_err();
        assert!(matches!(err, ProbeError::MissingStream { .. }));

        let set = expected_params(&tokens, MediaKind::Audio, source, &audio_only).unwrap();
        assert_eq!(set.duration, Some(15.0));
    }

    #[test]
    fn expected_params_requires_a_measurable_duration() {
        use crate::probe::StreamInfo;

        let info = MediaInfo {
            duration: None,
            video: Some(StreamInfo::default()),
            audio: Some(StreamInfo::default()),
        };
        let err = expected_params(
            &cpu_video_command(),
            MediaKind::Video,
            Path::new("clip.mp4"),
            &info,
        )
        .unwrap_err();
        assert!(matches!(err, ProbeError::MissingDuration { .. }));

        // An intro image has no duration to measure.
        let image = MediaInfo {
            duration: None,
            video: Some(StreamInfo::default()),
            audio: None,
        };
        assert!(expected_params(
            &cpu_video_command(),
            MediaKind::Intro,
            Path::new("INTRO.png"),
            &image
        )
        .is_ok());
    }
}
