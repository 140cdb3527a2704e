//! Video path: metadata probing, transcoding and thumbnail extraction
//!
//! All subprocess work goes through [`MediaToolkit`]. [`FfmpegToolkit`] is the
//! production implementation.

pub mod capabilities;
pub mod codec;
pub mod ffmpeg;
pub mod probe;
pub mod staging;
pub mod thumbnails;
pub mod toolkit;
pub mod transcoder;

pub use capabilities::detect_capabilities;
pub use codec::{select_codec, CodecProfile, CODEC_PREFERENCE};
pub use ffmpeg::FfmpegToolkit;
pub use probe::VideoMetadataProbe;
pub use staging::StagedFile;
pub use thumbnails::{ThumbnailExtractor, DEFAULT_THUMBNAIL_COUNT};
pub use toolkit::{EncodeJob, EncodeTick, MediaToolkit, ProgressParser, TickStream};
pub use transcoder::{TranscodeOptions, TranscodeOutput, VideoTranscoder};
