//! ffmpeg command construction.
//!
//! Builds argument token lists for the transforms that produce uniform
//! intermediate clips, and for the final concat. Every knob that shapes
//! the output appears in the tokens themselves, which makes a command
//! self-describing: the caching layer derives its expected parameters
//! from these tokens and from nothing else.

use std::path::{Path, PathBuf};

use crate::config::Settings;

/// A ready-to-run ffmpeg invocation.
///
/// `tokens` are the arguments after the program name. Transforms that
/// cut to a fixed length carry `-t` and set `has_explicit_duration`;
/// the concat does not, since its length is the sum of its inputs.
#[derive(Debug, Clone)]
pub struct TransformCommand {
    pub tokens: Vec<String>,
    pub has_explicit_duration: bool,
}

/// What to put on screen while an audio file plays.
#[derive(Debug, Clone)]
pub enum AudioBackdrop {
    /// A still image, looped for the clip duration.
    Image(PathBuf),
    /// A plain black frame with the title drawn in the middle.
    Black { caption: String },
    /// A rendered waveform of the audio itself.
    Waveform,
}

/// Builder for ffmpeg argument lists.
///
/// Holds a reference to the active settings; each method returns the
/// complete token vector for one kind of transform.
pub struct FfmpegCommandBuilder<'a> {
    settings: &'a Settings,
}

impl<'a> FfmpegCommandBuilder<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Command for the intro card: a still image over generated silence.
    ///
    /// The intro runs for its own, shorter duration. No loudness filter
    /// is applied since the generated track is already silent stereo at
    /// the target rate.
    pub fn intro_command(&self, image: &Path, output: &Path) -> TransformCommand {
        let mut tokens = vec!["-y".to_string()];
        push(&mut tokens, &["-loop", "1", "-i"]);
        tokens.push(path_token(image));
        push(&mut tokens, &["-f", "lavfi", "-i"]);
        tokens.push(self.anullsrc_source());

        self.add_video_encoder_options(&mut tokens);
        push(&mut tokens, &["-vf", &self.video_filter()]);
        self.add_output_format_options(&mut tokens);
        self.add_audio_encoder_options(&mut tokens);

        push(&mut tokens, &["-shortest", "-t"]);
        tokens.push(secs(self.settings.encoding.intro_duration_secs));
        tokens.push(path_token(output));

        TransformCommand {
            tokens,
            has_explicit_duration: true,
        }
    }

    /// Command that normalizes one video clip.
    ///
    /// Sources without an audio track get generated silence muxed in,
    /// so every intermediate carries exactly one video and one audio
    /// stream. The loudness filter only runs on real audio.
    pub fn video_command(&self, source: &Path, output: &Path, has_audio: bool) -> TransformCommand {
        let mut tokens = vec!["-y".to_string(), "-i".to_string(), path_token(source)];
        if !has_audio {
            push(&mut tokens, &["-f", "lavfi", "-i"]);
            tokens.push(self.anullsrc_source());
            push(&mut tokens, &["-map", "0:v:0", "-map", "1:a:0"]);
        }

        self.add_video_encoder_options(&mut tokens);
        push(&mut tokens, &["-vf", &self.video_filter()]);
        self.add_output_format_options(&mut tokens);
        self.add_audio_encoder_options(&mut tokens);
        if has_audio {
            push(&mut tokens, &["-af", &self.audio_filter()]);
        } else {
            tokens.push("-shortest".to_string());
        }

        tokens.push("-t".to_string());
        tokens.push(secs(self.settings.encoding.clip_duration_secs));
        tokens.push(path_token(output));

        TransformCommand {
            tokens,
            has_explicit_duration: true,
        }
    }

    /// Command that turns one audio file into a video clip.
    pub fn audio_command(
        &self,
        source: &Path,
        backdrop: &AudioBackdrop,
        output: &Path,
    ) -> TransformCommand {
        let mut tokens = vec!["-y".to_string()];
        match backdrop {
            AudioBackdrop::Image(image) => {
                push(&mut tokens, &["-loop", "1", "-i"]);
                tokens.push(path_token(image));
                tokens.push("-i".to_string());
                tokens.push(path_token(source));
                push(&mut tokens, &["-map", "0:v:0", "-map", "1:a:0"]);

                self.add_video_encoder_options(&mut tokens);
                push(&mut tokens, &["-vf", &self.video_filter()]);
            }
            AudioBackdrop::Black { caption } => {
                push(&mut tokens, &["-f", "lavfi", "-i"]);
                tokens.push(self.black_source());
                tokens.push("-i".to_string());
                tokens.push(path_token(source));
                push(&mut tokens, &["-map", "0:v:0", "-map", "1:a:0"]);

                self.add_video_encoder_options(&mut tokens);
                let filter = format!(
                    "{},drawtext=text='{}':fontcolor=white:fontsize=64:\
                     x=(w-text_w)/2:y=(h-text_h)/2",
                    self.video_filter(),
                    caption
                );
                push(&mut tokens, &["-vf", &filter]);
            }
            AudioBackdrop::Waveform => {
                tokens.push("-i".to_string());
                tokens.push(path_token(source));
                let enc = &self.settings.encoding;
                let filter = format!(
                    "[0:a]showwaves=s={}x{}:mode=cline:colors=cyan:scale=lin,fps={}[v]",
                    enc.width, enc.height, enc.fps
                );
                push(&mut tokens, &["-filter_complex", &filter]);
                push(&mut tokens, &["-map", "[v]", "-map", "0:a:0"]);

                self.add_video_encoder_options(&mut tokens);
            }
        }

        self.add_output_format_options(&mut tokens);
        self.add_audio_encoder_options(&mut tokens);
        push(&mut tokens, &["-af", &self.audio_filter()]);

        // The image and black backdrops loop forever without -shortest.
        if !matches!(backdrop, AudioBackdrop::Waveform) {
            tokens.push("-shortest".to_string());
        }
        tokens.push("-t".to_string());
        tokens.push(secs(self.settings.encoding.clip_duration_secs));
        tokens.push(path_token(output));

        TransformCommand {
            tokens,
            has_explicit_duration: true,
        }
    }

    /// Command that joins the intermediates into the final montage.
    ///
    /// The inputs are already uniform, so there are no filters here, but
    /// the join still re-encodes to keep timestamps clean across the
    /// splice points. No duration cap and no cache record for this one.
    pub fn concat_command(&self, filelist: &Path, output: &Path) -> TransformCommand {
        let mut tokens = vec!["-y".to_string()];
        push(&mut tokens, &["-f", "concat", "-safe", "0", "-i"]);
        tokens.push(path_token(filelist));

        self.add_video_encoder_options(&mut tokens);
        self.add_output_format_options(&mut tokens);
        self.add_audio_encoder_options(&mut tokens);
        tokens.push(path_token(output));

        TransformCommand {
            tokens,
            has_explicit_duration: false,
        }
    }

    fn add_video_encoder_options(&self, tokens: &mut Vec<String>) {
        let enc = &self.settings.encoding;
        if enc.use_gpu {
            push(tokens, &["-c:v", "h264_nvenc", "-preset", "fast", "-rc:v", "vbr"]);
            tokens.push("-cq:v".to_string());
            tokens.push(enc.crf.to_string());
            push(tokens, &["-b:v", "0"]);
        } else {
            push(tokens, &["-c:v", "libx264", "-preset", &enc.preset]);
            tokens.push("-crf".to_string());
            tokens.push(enc.crf.to_string());
        }
    }

    fn add_output_format_options(&self, tokens: &mut Vec<String>) {
        let enc = &self.settings.encoding;
        push(tokens, &["-pix_fmt", &enc.pixel_format, "-profile:v", &enc.video_profile]);
        push(
            tokens,
            &[
                "-colorspace",
                "bt709",
                "-color_primaries",
                "bt709",
                "-color_trc",
                "bt709",
                "-color_range",
                "tv",
            ],
        );
    }

    fn add_audio_encoder_options(&self, tokens: &mut Vec<String>) {
        let audio = &self.settings.audio;
        push(tokens, &["-c:a", "aac", "-ar"]);
        tokens.push(audio.sample_rate.to_string());
        push(tokens, &["-ac", "2", "-b:a"]);
        tokens.push(audio.bitrate.clone());
    }

    /// Scale into the frame, pad the rest, square pixels, fixed rate.
    fn video_filter(&self) -> String {
        let enc = &self.settings.encoding;
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}",
            w = enc.width,
            h = enc.height,
            fps = enc.fps
        )
    }

    /// Resample, force stereo, then normalize loudness.
    fn audio_filter(&self) -> String {
        let audio = &self.settings.audio;
        format!(
            "aresample={},aformat=channel_layouts=stereo,loudnorm=I={}:TP={}:LRA={}",
            audio.sample_rate, audio.loudness_target, audio.true_peak, audio.loudness_range
        )
    }

    fn anullsrc_source(&self) -> String {
        format!(
            "anullsrc=channel_layout=stereo:sample_rate={}",
            self.settings.audio.sample_rate
        )
    }

    fn black_source(&self) -> String {
        let enc = &self.settings.encoding;
        format!("color=c=black:s={}x{}:r={}", enc.width, enc.height, enc.fps)
    }
}

/// Contents of the concat demuxer filelist for the given inputs.
///
/// One `file '...'` line per input, with embedded single quotes escaped
/// the way the demuxer expects.
pub fn filelist_content(paths: &[PathBuf]) -> String {
    let mut out = String::new();
    for path in paths {
        let escaped = path.to_string_lossy().replace('\'', "'\\''");
        out.push_str("file '");
        out.push_str(&escaped);
        out.push_str("'\n");
    }
    out
}

/// Turn a file name into text safe to embed in a drawtext filter.
///
/// Drops the extension and the characters drawtext treats as syntax.
pub fn drawtext_caption(file_name: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem);
    stem.chars()
        .filter(|c| !matches!(c, '\'' | ':' | '\\' | '%' | ','))
        .collect()
}

fn push(tokens: &mut Vec<String>, parts: &[&str]) {
    tokens.extend(parts.iter().map(|p| p.to_string()));
}

fn path_token(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Render a duration the way it appears on the command line.
///
/// Whole seconds print without a trailing `.0` so the tokens stay
/// byte-stable across runs.
fn secs(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::params_from_command;

    fn settings() -> Settings {
        Settings::default()
    }

    fn flag_value<'t>(tokens: &'t [String], flag: &str) -> Option<&'t str> {
        tokens
            .iter()
            .position(|t| t == flag)
            .and_then(|i| tokens.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn video_command_shape() {
        let settings = settings();
        let builder = FfmpegCommandBuilder::new(&settings);
        let cmd = builder.video_command(
            Path::new("clip - Alice.mp4"),
            Path::new("temp_1.mp4"),
            true,
        );

        assert!(cmd.has_explicit_duration);
        assert_eq!(cmd.tokens[0], "-y");
        assert_eq!(cmd.tokens.last().map(String::as_str), Some("temp_1.mp4"));
        assert_eq!(flag_value(&cmd.tokens, "-c:v"), Some("libx264"));
        assert_eq!(flag_value(&cmd.tokens, "-crf"), Some("23"));
        assert_eq!(flag_value(&cmd.tokens, "-t"), Some("15"));
        assert!(flag_value(&cmd.tokens, "-vf").is_some_and(|f| f.contains("fps=30")));
        assert!(flag_value(&cmd.tokens, "-af").is_some_and(|f| f.contains("loudnorm=I=-16:TP=-1.5:LRA=11")));
    }

    #[test]
    fn gpu_swaps_encoder_but_not_expected_output() {
        let cpu = settings();
        let mut gpu = settings();
        gpu.encoding.use_gpu = true;

        let cpu_cmd = FfmpegCommandBuilder::new(&cpu).video_command(
            Path::new("a.mp4"),
            Path::new("temp_0.mp4"),
            true,
        );
        let gpu_cmd = FfmpegCommandBuilder::new(&gpu).video_command(
            Path::new("a.mp4"),
            Path::new("temp_0.mp4"),
            true,
        );

        assert_eq!(flag_value(&gpu_cmd.tokens, "-c:v"), Some("h264_nvenc"));
        assert_eq!(flag_value(&gpu_cmd.tokens, "-cq:v"), Some("23"));
        assert!(!gpu_cmd.tokens.iter().any(|t| t == "-crf"));

        let cpu_params = params_from_command(&cpu_cmd.tokens);
        let gpu_params = params_from_command(&gpu_cmd.tokens);
        assert_eq!(cpu_params, gpu_params);
    }

    #[test]
    fn silent_video_gets_generated_audio() {
        let settings = settings();
        let builder = FfmpegCommandBuilder::new(&settings);
        let cmd = builder.video_command(Path::new("mute.mp4"), Path::new("temp_2.mp4"), false);

        assert!(cmd.tokens.iter().any(|t| t.starts_with("anullsrc=")));
        assert!(cmd.tokens.iter().any(|t| t == "-shortest"));
        assert!(!cmd.tokens.iter().any(|t| t == "-af"));
    }

    #[test]
    fn intro_runs_for_its_own_duration() {
        let settings = settings();
        let builder = FfmpegCommandBuilder::new(&settings);
        let cmd = builder.intro_command(Path::new("INTRO.png"), Path::new("temp_0.mp4"));

        assert_eq!(flag_value(&cmd.tokens, "-t"), Some("3"));
        assert!(cmd.tokens.iter().any(|t| t == "-loop"));
        assert!(!cmd.tokens.iter().any(|t| t == "-af"));
        assert!(cmd.has_explicit_duration);
    }

    #[test]
    fn black_backdrop_draws_the_caption() {
        let settings = settings();
        let builder = FfmpegCommandBuilder::new(&settings);
        let backdrop = AudioBackdrop::Black {
            caption: "song - Alice".to_string(),
        };
        let cmd = builder.audio_command(Path::new("song - Alice.mp3"), &backdrop, Path::new("temp_3.mp4"));

        assert!(cmd.tokens.iter().any(|t| t.starts_with("color=c=black:s=1920x1080")));
        assert!(flag_value(&cmd.tokens, "-vf")
            .is_some_and(|f| f.contains("drawtext=text='song - Alice'")));
    }

    #[test]
    fn waveform_backdrop_uses_filter_complex() {
        let settings = settings();
        let builder = FfmpegCommandBuilder::new(&settings);
        let cmd = builder.audio_command(
            Path::new("song.mp3"),
            &AudioBackdrop::Waveform,
            Path::new("temp_3.mp4"),
        );

        assert!(flag_value(&cmd.tokens, "-filter_complex")
            .is_some_and(|f| f.starts_with("[0:a]showwaves=s=1920x1080") && f.ends_with("[v]")));
        assert_eq!(flag_value(&cmd.tokens, "-map"), Some("[v]"));
        assert!(!cmd.tokens.iter().any(|t| t == "-vf"));
    }

    #[test]
    fn image_backdrop_loops_the_still() {
        let settings = settings();
        let builder = FfmpegCommandBuilder::new(&settings);
        let backdrop = AudioBackdrop::Image(PathBuf::from("song - Alice.png"));
        let cmd = builder.audio_command(Path::new("song - Alice.mp3"), &backdrop, Path::new("temp_3.mp4"));

        assert_eq!(cmd.tokens[1], "-loop");
        assert!(cmd.tokens.iter().any(|t| t == "song - Alice.png"));
        assert!(cmd.tokens.iter().any(|t| t == "-shortest"));
    }

    #[test]
    fn concat_carries_no_duration_cap() {
        let settings = settings();
        let builder = FfmpegCommandBuilder::new(&settings);
        let cmd = builder.concat_command(Path::new("filelist.txt"), Path::new("out.mp4"));

        assert!(!cmd.has_explicit_duration);
        assert!(!cmd.tokens.iter().any(|t| t == "-t"));
        assert!(!cmd.tokens.iter().any(|t| t == "-vf"));
        assert_eq!(flag_value(&cmd.tokens, "-f"), Some("concat"));
        assert_eq!(flag_value(&cmd.tokens, "-safe"), Some("0"));
    }

    #[test]
    fn command_tokens_describe_the_expected_output() {
        let settings = settings();
        let builder = FfmpegCommandBuilder::new(&settings);
        let cmd = builder.video_command(Path::new("a.mp4"), Path::new("temp_0.mp4"), true);

        let params = params_from_command(&cmd.tokens);
        assert_eq!(params.duration, Some(15.0));
        assert_eq!(params.video_codec.as_deref(), Some("h264"));
        assert_eq!(params.resolution.as_deref(), Some("1920x1080"));
        assert_eq!(params.sample_rate, Some(48000));
        assert_eq!(params.channels, Some(2));
        assert_eq!(params.pixel_format.as_deref(), Some("yuv420p"));
    }

    #[test]
    fn filelist_escapes_single_quotes() {
        let paths = vec![PathBuf::from("temp_0.mp4"), PathBuf::from("Alice's clip.mp4")];
        let content = filelist_content(&paths);
        assert_eq!(
            content,
            "file 'temp_0.mp4'\nfile 'Alice'\\''s clip.mp4'\n"
        );
    }

    #[test]
    fn caption_drops_extension_and_filter_syntax() {
        assert_eq!(drawtext_caption("song - Alice.mp3"), "song - Alice");
        assert_eq!(drawtext_caption("it's: 100%))].mp3"), "its 100))]");
        assert_eq!(drawtext_caption("noext"), "noext");
    }
}
