//! ffprobe invocation and output parsing.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

use super::types::{MediaInfo, ProbeError, StreamInfo};

const FFPROBE: &str = "ffprobe";

/// Probe a media file with ffprobe.
///
/// Runs `ffprobe -v error -print_format json -show_format -show_streams`
/// and folds the JSON report into a [`MediaInfo`]. Fields the file does
/// not report stay `None`; only a failed or unparseable probe is an
/// error.
pub fn probe_media(path: &Path) -> Result<MediaInfo, ProbeError> {
    let output = Command::new(FFPROBE)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| ProbeError::launch(FFPROBE, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ProbeError::tool_failed(
            FFPROBE,
            output.status.code().unwrap_or(-1),
            path,
            stderr,
        ));
    }

    let report: Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| ProbeError::malformed(path, e.to_string()))?;

    Ok(parse_media_info(&report))
}

/// Probe a file and insist on a duration.
pub fn probe_duration(path: &Path) -> Result<f64, ProbeError> {
    probe_media(path)?.require_duration(path)
}

/// Fold an ffprobe JSON report into a [`MediaInfo`].
///
/// Split out from [`probe_media`] so parsing stays testable without
/// shelling out.
pub fn parse_media_info(report: &Value) -> MediaInfo {
    let mut info = MediaInfo {
        duration: duration_from_format(report),
        ..MediaInfo::default()
    };

    if let Some(streams) = report.get("streams").and_then(Value::as_array) {
        for stream in streams {
            match stream.get("codec_type").and_then(Value::as_str) {
                Some("video") if info.video.is_none() => {
                    info.video = Some(parse_stream(stream));
                }
                Some("audio") if info.audio.is_none() => {
                    info.audio = Some(parse_stream(stream));
                    if info.duration.is_none() {
                        info.duration = parse_float_field(stream, "duration");
                    }
                }
                _ => {}
            }
        }
    }

    // Some containers only report duration on the streams.
    if info.duration.is_none() {
        if let Some(streams) = report.get("streams").and_then(Value::as_array) {
            info.duration = streams
                .iter()
                .find_map(|s| parse_float_field(s, "duration"));
        }
    }

    info
}

fn parse_stream(stream: &Value) -> StreamInfo {
    StreamInfo {
        codec_name: stream
            .get("codec_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        width: parse_u32_field(stream, "width"),
        height: parse_u32_field(stream, "height"),
        pixel_format: stream
            .get("pix_fmt")
            .and_then(Value::as_str)
            .map(str::to_string),
        sample_rate: stream
            .get("sample_rate")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok()),
        channels: parse_u32_field(stream, "channels"),
    }
}

fn duration_from_format(report: &Value) -> Option<f64> {
    report
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

/// ffprobe reports numbers inconsistently; accept both forms.
fn parse_float_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key) {
        Some(Value::String(s)) => s.parse().ok(),
        Some(v) => v.as_f64(),
        None => None,
    }
}

fn parse_u32_field(value: &Value, key: &str) -> Option<u32> {
    value.get(key).and_then(Value::as_u64).map(|v| v as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_video_report() {
        let report = json!({
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080,
                    "pix_fmt": "yuv420p"
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac",
                    "sample_rate": "48000",
                    "channels": 2
                }
            ],
            "format": { "duration": "15.023000" }
        });

        let info = parse_media_info(&report);
        assert!(info.has_video());
        assert!(info.has_audio());
        assert_eq!(info.resolution().as_deref(), Some("1920x1080"));
        assert_eq!(info.video.as_ref().unwrap().codec_name.as_deref(), Some("h264"));
        assert_eq!(info.audio.as_ref().unwrap().sample_rate, Some(48000));
        assert_eq!(info.audio.as_ref().unwrap().channels, Some(2));
        assert!((info.duration.unwrap() - 15.023).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_stream_duration() {
        let report = json!({
            "streams": [
                { "codec_type": "audio", "codec_name": "mp3",
                  "sample_rate": "44100", "channels": 2, "duration": "30.5" }
            ],
            "format": {}
        });

        let info = parse_media_info(&report);
        assert!((info.duration.unwrap() - 30.5).abs() < 1e-9);
    }

    #[test]
    fn still_image_has_no_duration() {
        let report = json!({
            "streams": [
                { "codec_type": "video", "codec_name": "png",
                  "width": 1280, "height": 720, "pix_fmt": "rgba" }
            ],
            "format": {}
        });

        let info = parse_media_info(&report);
        assert!(info.has_video());
        assert!(!info.has_audio());
        assert!(info.duration.is_none());
        assert!(info
            .require_duration(Path::new("title.png"))
            .is_err());
    }

    #[test]
    fn empty_report_yields_empty_info() {
        let info = parse_media_info(&json!({}));
        assert_eq!(info, MediaInfo::default());
        assert!(info.resolution().is_none());
    }
}
