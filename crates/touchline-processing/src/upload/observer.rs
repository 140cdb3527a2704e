use touchline_core::{
    BatchError, CompressionProgress, ErrorMetadata, ProcessedAttachment, ProcessingError, RawFile,
    ValidationError,
};

/// A file the validator turned away
#[derive(Debug, Clone, PartialEq)]
pub struct FileRejection {
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
    pub error: ValidationError,
}

impl FileRejection {
    pub fn new(file: &RawFile, error: ValidationError) -> Self {
        Self {
            file_name: file.name.clone(),
            content_type: file.content_type.clone(),
            size: file.size(),
            error,
        }
    }

    /// Text for the alert shown to the user
    pub fn user_message(&self) -> String {
        ProcessingError::from(self.error.clone()).user_message()
    }

    pub fn error_code(&self) -> &'static str {
        ProcessingError::from(self.error.clone()).error_code()
    }
}

/// Side channel for everything `process` reports besides its return value.
///
/// All methods default to no-ops so implementors pick what they need.
pub trait UploadObserver: Send + Sync {
    fn on_rejected(&self, _rejection: &FileRejection) {}

    fn on_batch_rejected(&self, _error: &BatchError) {}

    /// Transcode progress for one video
    fn on_progress(&self, _file_name: &str, _progress: CompressionProgress) {}

    fn on_file_done(&self, _attachment: &ProcessedAttachment) {}
}

/// No-op observer (default)
pub struct NoOpObserver;

impl UploadObserver for NoOpObserver {}
