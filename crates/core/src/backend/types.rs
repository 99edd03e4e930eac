//! Types for the backend module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Audio encoding chosen from the target extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    Mp3,
    Aac,
    Wav,
    Vorbis,
    Flac,
}

impl AudioEncoding {
    /// Encoding for a canonical audio extension.
    pub fn for_extension(ext: &str) -> Option<Self> {
        match ext {
            "mp3" => Some(Self::Mp3),
            "m4a" | "aac" => Some(Self::Aac),
            "wav" => Some(Self::Wav),
            "ogg" => Some(Self::Vorbis),
            "flac" => Some(Self::Flac),
            _ => None,
        }
    }

    /// Returns the ffmpeg codec name.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::Aac => "aac",
            Self::Wav => "pcm_s16le",
            Self::Vorbis => "libvorbis",
            Self::Flac => "flac",
        }
    }

    /// Target bitrate for lossy encodings.
    pub fn bitrate(&self) -> Option<&'static str> {
        match self {
            Self::Mp3 | Self::Aac | Self::Vorbis => Some("192k"),
            Self::Wav | Self::Flac => None,
        }
    }
}

/// Video encoding settings chosen from the target container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoProfile {
    pub video_codec: &'static str,
    pub video_params: &'static [&'static str],
    pub audio_codec: &'static str,
    pub audio_params: &'static [&'static str],
    pub format_params: &'static [&'static str],
}

const X264: &[&str] = &["-crf", "23", "-preset", "ultrafast"];
const AUDIO_128K: &[&str] = &["-b:a", "128k"];
const FASTSTART: &[&str] = &["-movflags", "+faststart"];

impl VideoProfile {
    /// Profile for a canonical video extension.
    pub fn for_extension(ext: &str) -> Option<Self> {
        let profile = match ext {
            "webm" => Self {
                video_codec: "libvpx-vp9",
                video_params: &[
                    "-crf",
                    "30",
                    "-b:v",
                    "0",
                    "-deadline",
                    "realtime",
                    "-cpu-used",
                    "5",
                ],
                audio_codec: "libopus",
                audio_params: AUDIO_128K,
                format_params: &[],
            },
            "mp4" | "mov" => Self {
                video_codec: "libx264",
                video_params: X264,
                audio_codec: "aac",
                audio_params: AUDIO_128K,
                format_params: FASTSTART,
            },
            "mkv" | "avi" | "flv" => Self {
                video_codec: "libx264",
                video_params: X264,
                audio_codec: "aac",
                audio_params: AUDIO_128K,
                format_params: &[],
            },
            "wmv" => Self {
                video_codec: "wmv2",
                video_params: &["-q:v", "5"],
                audio_codec: "wmav2",
                audio_params: AUDIO_128K,
                format_params: &[],
            },
            _ => return None,
        };
        Some(profile)
    }
}

/// Media file information from ffprobe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_secs: f64,
    /// Container format (e.g., "flac", "mov").
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_bitrate_kbps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_channels: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_fps: Option<f32>,
}
