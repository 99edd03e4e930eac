//! FFmpeg-based audio/video backend.

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;

use crate::format::{extension_of, BackendId, Category, FormatRegistry};

use super::command::{arg, run_tool};
use super::config::BackendConfig;
use super::error::BackendError;
use super::traits::{Backend, TransformOptions};
use super::types::{AudioEncoding, MediaInfo, VideoProfile};

/// Keeps both dimensions even; most encoders reject odd sizes.
const EVEN_SCALE: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2";

const GIF_FILTER: &str = "fps=10,scale=480:-1:flags=lanczos";

/// Transcodes audio and video, and renders video to animated GIF.
pub struct FfmpegBackend {
    config: BackendConfig,
}

impl FfmpegBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(BackendConfig::default())
    }

    fn common_args(&self, input: &Path) -> Vec<OsString> {
        vec![
            arg("-nostdin"),
            arg("-y"),
            arg("-loglevel"),
            arg(&self.config.ffmpeg_log_level),
            arg("-i"),
            arg(input),
        ]
    }

    /// Builds ffmpeg arguments for audio output.
    fn build_audio_args(
        &self,
        input: &Path,
        output: &Path,
        encoding: AudioEncoding,
    ) -> Vec<OsString> {
        let mut args = self.common_args(input);
        args.extend([arg("-vn"), arg("-c:a"), arg(encoding.ffmpeg_codec())]);

        if let Some(bitrate) = encoding.bitrate() {
            args.extend([arg("-b:a"), arg(bitrate)]);
        }

        args.extend(self.config.extra_ffmpeg_args.iter().map(arg));
        args.push(arg(output));
        args
    }

    /// Builds ffmpeg arguments for video output.
    fn build_video_args(&self, input: &Path, output: &Path, profile: &VideoProfile) -> Vec<OsString> {
        let mut args = self.common_args(input);

        args.extend([arg("-c:v"), arg(profile.video_codec)]);
        args.extend(profile.video_params.iter().map(arg));
        args.extend([arg("-c:a"), arg(profile.audio_codec)]);
        args.extend(profile.audio_params.iter().map(arg));
        args.extend([arg("-vf"), arg(EVEN_SCALE)]);
        args.extend(profile.format_params.iter().map(arg));

        args.extend(self.config.extra_ffmpeg_args.iter().map(arg));
        args.push(arg(output));
        args
    }

    /// First GIF pass: build a palette from the whole clip.
    fn build_palette_args(&self, input: &Path, palette: &Path) -> Vec<OsString> {
        let mut args = self.common_args(input);
        args.extend([
            arg("-vf"),
            arg(format!("{},palettegen=stats_mode=diff", GIF_FILTER)),
            arg(palette),
        ]);
        args
    }

    /// Second GIF pass: map frames onto the palette.
    fn build_gif_args(&self, input: &Path, palette: &Path, output: &Path) -> Vec<OsString> {
        let mut args = self.common_args(input);
        args.extend([
            arg("-i"),
            arg(palette),
            arg("-filter_complex"),
            arg(format!(
                "[0:v]{}[s];[s][1:v]paletteuse=dither=bayer:bayer_scale=5",
                GIF_FILTER
            )),
            arg("-r"),
            arg("10"),
            arg("-loop"),
            arg("0"),
            arg(output),
        ]);
        args
    }

    async fn run_ffmpeg(&self, args: &[OsString]) -> Result<(), BackendError> {
        run_tool("ffmpeg", &self.config.ffmpeg_path, args)
            .await?
            .require_success("ffmpeg")?;
        Ok(())
    }

    /// Probes a media file with ffprobe.
    pub async fn probe(&self, path: &Path) -> Result<MediaInfo, BackendError> {
        if !path.exists() {
            return Err(BackendError::probe_failed(format!(
                "file not found: {}",
                path.display()
            )));
        }

        let args = [
            arg("-v"),
            arg("quiet"),
            arg("-print_format"),
            arg("json"),
            arg("-show_format"),
            arg("-show_streams"),
            arg(path),
        ];
        let output = run_tool("ffprobe", &self.config.ffprobe_path, &args).await?;

        if !output.success() {
            return Err(BackendError::probe_failed(format!(
                "ffprobe failed: {}",
                output.stderr.trim()
            )));
        }

        Self::parse_probe_output(path, &output.stdout)
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, BackendError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            bit_rate: Option<String>,
            sample_rate: Option<String>,
            channels: Option<u8>,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
        }

        let probe: ProbeOutput = serde_json::from_str(output)
            .map_err(|e| BackendError::probe_failed(format!("invalid ffprobe output: {}", e)))?;

        let audio = probe.streams.iter().find(|s| s.codec_type == "audio");
        let video = probe.streams.iter().find(|s| s.codec_type == "video");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes: probe
                .format
                .size
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            duration_secs: probe
                .format
                .duration
                .as_deref()
                .and_then(|d| d.parse().ok())
                .unwrap_or(0.0),
            format: format_name.to_string(),
            audio_codec: audio.and_then(|s| s.codec_name.clone()),
            audio_bitrate_kbps: audio
                .and_then(|s| s.bit_rate.as_deref())
                .and_then(|b| b.parse::<u32>().ok())
                .map(|b| b / 1000),
            audio_sample_rate: audio
                .and_then(|s| s.sample_rate.as_deref())
                .and_then(|r| r.parse().ok()),
            audio_channels: audio.and_then(|s| s.channels),
            video_codec: video.and_then(|s| s.codec_name.clone()),
            video_width: video.and_then(|s| s.width),
            video_height: video.and_then(|s| s.height),
            video_fps: video
                .and_then(|s| s.r_frame_rate.as_deref())
                .and_then(parse_frame_rate),
        })
    }
}

/// Parses a frame rate like "24000/1001" or "30".
fn parse_frame_rate(rate: &str) -> Option<f32> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f32>().ok()?;
            let den = den.parse::<f32>().ok()?;
            (den > 0.0).then(|| num / den)
        }
        None => rate.parse().ok(),
    }
}

#[async_trait]
impl Backend for FfmpegBackend {
    fn id(&self) -> BackendId {
        BackendId::Ffmpeg
    }

    async fn transform(
        &self,
        input: &Path,
        output: &Path,
        options: &TransformOptions,
    ) -> Result<(), BackendError> {
        let target_ext = extension_of(output)
            .ok_or_else(|| BackendError::unsupported("output has no extension"))?;
        let target = FormatRegistry::global()
            .descriptor(&target_ext)
            .map_err(|e| BackendError::unsupported(e.to_string()))?;

        match target.category {
            Category::Audio => {
                let encoding = AudioEncoding::for_extension(target.extension).ok_or_else(|| {
                    BackendError::unsupported(format!("no audio encoding for {}", target.dotted()))
                })?;
                self.run_ffmpeg(&self.build_audio_args(input, output, encoding))
                    .await
            }
            Category::Video => {
                let profile = VideoProfile::for_extension(target.extension).ok_or_else(|| {
                    BackendError::unsupported(format!("no video profile for {}", target.dotted()))
                })?;
                self.run_ffmpeg(&self.build_video_args(input, output, &profile))
                    .await
            }
            Category::Image if target.extension == "gif" => {
                let palette = options.work_dir.join("palette.png");
                self.run_ffmpeg(&self.build_palette_args(input, &palette))
                    .await?;
                self.run_ffmpeg(&self.build_gif_args(input, &palette, output))
                    .await
            }
            other => Err(BackendError::unsupported(format!(
                "ffmpeg cannot produce {} output",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has(args: &[OsString], value: &str) -> bool {
        args.iter().any(|a| a == value)
    }

    fn position(args: &[OsString], value: &str) -> usize {
        args.iter().position(|a| a == value).unwrap()
    }

    #[test]
    fn test_build_audio_args_mp3() {
        let backend = FfmpegBackend::with_defaults();
        let args = backend.build_audio_args(
            Path::new("/input.flac"),
            Path::new("/output.mp3"),
            AudioEncoding::Mp3,
        );

        assert!(has(&args, "-vn"));
        assert!(has(&args, "libmp3lame"));
        assert!(has(&args, "192k"));
        assert_eq!(args.last().unwrap(), "/output.mp3");
    }

    #[test]
    fn test_build_audio_args_lossless_has_no_bitrate() {
        let backend = FfmpegBackend::with_defaults();
        let args = backend.build_audio_args(
            Path::new("/input.mp3"),
            Path::new("/output.flac"),
            AudioEncoding::Flac,
        );

        assert!(has(&args, "flac"));
        assert!(!has(&args, "-b:a"));
    }

    #[test]
    fn test_build_video_args_mp4() {
        let backend = FfmpegBackend::with_defaults();
        let profile = VideoProfile::for_extension("mp4").unwrap();
        let args = backend.build_video_args(
            Path::new("/input.mkv"),
            Path::new("/output.mp4"),
            &profile,
        );

        assert!(has(&args, "libx264"));
        assert!(has(&args, "ultrafast"));
        assert!(has(&args, "aac"));
        assert!(has(&args, "+faststart"));
        assert!(has(&args, EVEN_SCALE));
        assert!(position(&args, "-c:v") > position(&args, "-i"));
    }

    #[test]
    fn test_build_video_args_extra_args_before_output() {
        let mut config = BackendConfig::default();
        config.extra_ffmpeg_args = vec!["-threads".to_string(), "2".to_string()];
        let backend = FfmpegBackend::new(config);
        let profile = VideoProfile::for_extension("webm").unwrap();
        let args = backend.build_video_args(
            Path::new("/input.mp4"),
            Path::new("/output.webm"),
            &profile,
        );

        assert!(has(&args, "libvpx-vp9"));
        assert!(has(&args, "libopus"));
        assert!(position(&args, "-threads") < args.len() - 1);
        assert_eq!(args.last().unwrap(), "/output.webm");
    }

    #[test]
    fn test_build_gif_args_use_palette() {
        let backend = FfmpegBackend::with_defaults();
        let palette = Path::new("/work/palette.png");
        let first = backend.build_palette_args(Path::new("/clip.mp4"), palette);
        assert!(first.iter().any(|a| a.to_string_lossy().contains("palettegen")));
        assert_eq!(first.last().unwrap(), "/work/palette.png");

        let second = backend.build_gif_args(Path::new("/clip.mp4"), palette, Path::new("/out.gif"));
        assert!(has(&second, "/work/palette.png"));
        assert!(second
            .iter()
            .any(|a| a.to_string_lossy().contains("paletteuse=dither=bayer")));
        assert_eq!(second.last().unwrap(), "/out.gif");
    }

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "format": {
                "filename": "test.mkv",
                "format_name": "matroska,webm",
                "duration": "60.5",
                "size": "3000000"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "24000/1001"
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac",
                    "bit_rate": "128000",
                    "sample_rate": "48000",
                    "channels": 2
                }
            ]
        }"#;

        let info = FfmpegBackend::parse_probe_output(Path::new("test.mkv"), json).unwrap();
        assert_eq!(info.format, "matroska");
        assert!((info.duration_secs - 60.5).abs() < 0.01);
        assert_eq!(info.size_bytes, 3_000_000);
        assert_eq!(info.video_width, Some(1920));
        assert_eq!(info.audio_bitrate_kbps, Some(128));
        assert!((info.video_fps.unwrap() - 23.976).abs() < 0.01);
    }

    #[test]
    fn test_parse_probe_output_invalid() {
        let err = FfmpegBackend::parse_probe_output(Path::new("x"), "not json").unwrap_err();
        assert!(matches!(err, BackendError::ProbeFailed { .. }));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("1/0"), None);
    }

    #[tokio::test]
    async fn test_transform_rejects_document_output() {
        let backend = FfmpegBackend::with_defaults();
        let options = TransformOptions::new(std::env::temp_dir());
        let err = backend
            .transform(Path::new("/in.mp4"), Path::new("/out.docx"), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unsupported { .. }));
    }
}
