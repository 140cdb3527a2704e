//! Touchline Processing Library
//!
//! The media ingestion pipeline behind the message composer: file validation,
//! image re-encoding, video probing, transcoding and thumbnailing, and the
//! orchestrator that routes a batch of selected files through them.

pub mod compression;
pub mod image;
pub mod metadata;
pub mod upload;
pub mod validator;
pub mod video;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use compression::{EncodableFormat, ImageCompressor, MIN_COMPRESSIBLE_SIZE};
pub use metadata::VideoMetadata;
pub use upload::{
    FileRejection, FileState, NoOpObserver, UploadObserver, UploadProgressTracker,
    UploadQueueOrchestrator,
};
pub use validator::{AcceptRule, FileValidator};
pub use video::{
    detect_capabilities, select_codec, CodecProfile, EncodeJob, EncodeTick, FfmpegToolkit,
    MediaToolkit, ThumbnailExtractor, TickStream, TranscodeOptions, TranscodeOutput,
    VideoMetadataProbe, VideoTranscoder,
};
