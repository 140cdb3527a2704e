use std::path::Path;
use std::sync::Arc;
use touchline_core::{RawFile, VideoError};

use crate::metadata::VideoMetadata;
use crate::video::staging::StagedFile;
use crate::video::toolkit::MediaToolkit;

/// Reads width, height and duration from a video without decoding it
#[derive(Clone)]
pub struct VideoMetadataProbe {
    toolkit: Arc<dyn MediaToolkit>,
}

impl VideoMetadataProbe {
    pub fn new(toolkit: Arc<dyn MediaToolkit>) -> Self {
        Self { toolkit }
    }

    /// Stage the payload in a scoped temp file and probe it. The temp file is
    /// removed before this returns, on success and on failure.
    #[tracing::instrument(skip(self, file), fields(file_name = %file.name))]
    pub async fn probe(&self, file: &RawFile) -> Result<VideoMetadata, VideoError> {
        let staged = StagedFile::write(file)
            .await
            .map_err(|e| VideoError::Metadata(format!("{:#}", e)))?;
        self.probe_path(staged.path()).await
    }

    pub async fn probe_path(&self, path: &Path) -> Result<VideoMetadata, VideoError> {
        let metadata = self
            .toolkit
            .probe(path)
            .await
            .map_err(|e| VideoError::Metadata(format!("{:#}", e)))?;
        check(metadata)
    }
}

fn check(metadata: VideoMetadata) -> Result<VideoMetadata, VideoError> {
    if metadata.width == 0 || metadata.height == 0 {
        return Err(VideoError::Metadata(format!(
            "no intrinsic dimensions ({}x{})",
            metadata.width, metadata.height
        )));
    }
    if !metadata.duration_seconds.is_finite() || metadata.duration_seconds < 0.0 {
        return Err(VideoError::Metadata(format!(
            "invalid duration {}",
            metadata.duration_seconds
        )));
    }
    Ok(metadata)
}
