//! Backends: the external tools that transform bytes.
//!
//! Each backend wraps one tool family behind the [`Backend`] trait and is
//! invoked by path. All tools run through a single process runner with no
//! stdin, captured stderr and `kill_on_drop`, so an outer timeout terminates
//! the child.
//!
//! | Backend | Tool | Handles |
//! |---|---|---|
//! | [`PandocBackend`] | `pandoc` (+ `pdftotext`, `qpdf`) | Document → Document |
//! | [`ImageMagickBackend`] | `magick` | Image → Image, Image → pdf |
//! | [`FfmpegBackend`] | `ffmpeg`, `ffprobe` | Audio → Audio, Video → Video, Video → gif |
//! | [`SevenZipBackend`] | `7z` | Archive → Archive |

mod capabilities;
mod command;
mod config;
mod error;
mod ffmpeg;
mod imagemagick;
mod pandoc;
mod set;
mod sevenzip;
mod traits;
mod types;

pub use capabilities::{detect_tools, ToolStatus};
pub use config::BackendConfig;
pub use error::BackendError;
pub use ffmpeg::FfmpegBackend;
pub use imagemagick::ImageMagickBackend;
pub use pandoc::PandocBackend;
pub use set::BackendSet;
pub use sevenzip::SevenZipBackend;
pub use traits::{Backend, TransformOptions};
pub use types::{AudioEncoding, MediaInfo, VideoProfile};

pub(crate) use command::{arg, run_tool, ToolOutput};
