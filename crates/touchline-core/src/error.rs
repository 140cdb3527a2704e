//! Error types module
//!
//! Precondition failures (`ValidationError`, `BatchError`) are reported before any
//! processing starts. Image and video failures are recoverable: the orchestrator
//! degrades to the best payload it already has.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected failures such as rejected files
    Debug,
    /// Recoverable issues that degrade output
    Warn,
    /// Unexpected failures
    Error,
}

/// Describes how an error should be presented and handled
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether the pipeline can continue with a fallback
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;

    /// Message suitable for an alert shown to the user
    fn user_message(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {name} is {size} bytes (max: {max} bytes)")]
    FileTooLarge { name: String, size: usize, max: usize },

    #[error("Unsupported format: {name} ({content_type})")]
    UnsupportedFormat { name: String, content_type: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BatchError {
    #[error("Too many files: {existing} attached + {incoming} selected exceeds the limit of {max}")]
    BatchTooLarge {
        existing: usize,
        incoming: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImageError {
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Image encode failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VideoError {
    #[error("Video metadata unavailable: {0}")]
    Metadata(String),

    #[error("Thumbnail extraction failed: {0}")]
    ThumbnailExtraction(String),

    #[error("Video recording is not supported on this platform")]
    UnsupportedPlatform,

    #[error("No supported output codec")]
    NoSupportedCodec,

    #[error("Transcode failed: {0}")]
    Transcode(String),
}

/// Every failure the pipeline can produce
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Video(#[from] VideoError),
}

/// Static metadata per variant: (error_code, recoverable, log_level).
fn static_metadata(err: &ProcessingError) -> (&'static str, bool, LogLevel) {
    match err {
        ProcessingError::Validation(ValidationError::FileTooLarge { .. }) => {
            ("FILE_TOO_LARGE", false, LogLevel::Debug)
        }
        ProcessingError::Validation(ValidationError::UnsupportedFormat { .. }) => {
            ("UNSUPPORTED_FORMAT", false, LogLevel::Debug)
        }
        ProcessingError::Batch(BatchError::BatchTooLarge { .. }) => {
            ("BATCH_TOO_LARGE", false, LogLevel::Debug)
        }
        ProcessingError::Image(ImageError::Decode(_)) => ("IMAGE_DECODE_ERROR", true, LogLevel::Warn),
        ProcessingError::Image(ImageError::Encode(_)) => ("IMAGE_ENCODE_ERROR", true, LogLevel::Warn),
        ProcessingError::Video(VideoError::Metadata(_)) => {
            ("VIDEO_METADATA_ERROR", true, LogLevel::Warn)
        }
        ProcessingError::Video(VideoError::ThumbnailExtraction(_)) => {
            ("THUMBNAIL_EXTRACTION_ERROR", true, LogLevel::Warn)
        }
        ProcessingError::Video(VideoError::UnsupportedPlatform) => {
            ("UNSUPPORTED_PLATFORM", true, LogLevel::Debug)
        }
        ProcessingError::Video(VideoError::NoSupportedCodec) => {
            ("NO_SUPPORTED_CODEC", true, LogLevel::Warn)
        }
        ProcessingError::Video(VideoError::Transcode(_)) => ("TRANSCODE_ERROR", true, LogLevel::Warn),
    }
}

impl ErrorMetadata for ProcessingError {
    fn error_code(&self) -> &'static str {
        static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        static_metadata(self).2
    }

    fn user_message(&self) -> String {
        match self {
            ProcessingError::Validation(ValidationError::FileTooLarge { name, max, .. }) => format!(
                "{} is too large. Maximum size is {} MB.",
                name,
                max / (1024 * 1024)
            ),
            ProcessingError::Validation(ValidationError::UnsupportedFormat { name, .. }) => {
                format!("{} is not a supported file type.", name)
            }
            ProcessingError::Batch(BatchError::BatchTooLarge { max, .. }) => {
                format!("You can attach at most {} files.", max)
            }
            other => other.to_string(),
        }
    }
}
