use std::sync::Arc;
use touchline_core::{RawFile, Thumbnail, VideoError};

use crate::video::probe::VideoMetadataProbe;
use crate::video::staging::StagedFile;
use crate::video::toolkit::MediaToolkit;

pub const DEFAULT_THUMBNAIL_COUNT: usize = 3;

/// `count` points evenly spaced inside the video, excluding both ends.
/// Three points land at 25%, 50% and 75%. A video without length has only
/// the frame at 0.
pub fn default_timestamps(duration_seconds: f64, count: usize) -> Vec<f64> {
    if count > 0 && duration_seconds <= 0.0 {
        return vec![0.0];
    }
    (1..=count)
        .map(|i| duration_seconds * i as f64 / (count + 1) as f64)
        .collect()
}

/// Seeks a video to a set of timestamps and rasterizes each frame to JPEG
#[derive(Clone)]
pub struct ThumbnailExtractor {
    toolkit: Arc<dyn MediaToolkit>,
    count: usize,
}

impl ThumbnailExtractor {
    pub fn new(toolkit: Arc<dyn MediaToolkit>) -> Self {
        Self {
            toolkit,
            count: DEFAULT_THUMBNAIL_COUNT,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count.max(1);
        self
    }

    #[tracing::instrument(skip(self, file, timestamps), fields(file_name = %file.name))]
    pub async fn extract_thumbnails(
        &self,
        file: &RawFile,
        timestamps: Option<&[f64]>,
    ) -> Result<Vec<Thumbnail>, VideoError> {
        let staged = StagedFile::write(file)
            .await
            .map_err(|e| VideoError::ThumbnailExtraction(format!("{:#}", e)))?;

        let probed = VideoMetadataProbe::new(self.toolkit.clone())
            .probe_path(staged.path())
            .await;
        let duration = match (probed, timestamps) {
            (Ok(metadata), _) => Some(metadata.duration_seconds),
            (Err(e), None) => return Err(VideoError::ThumbnailExtraction(e.to_string())),
            (Err(e), Some(_)) => {
                tracing::debug!(error = %e, "Duration unknown; timestamps used as given");
                None
            }
        };

        self.extract_from(&staged, duration, timestamps).await
    }

    /// Extract from a staged payload. With `timestamps` absent, `duration`
    /// drives the default spacing; when known it also bounds explicit
    /// timestamps.
    pub async fn extract_from(
        &self,
        staged: &StagedFile,
        duration: Option<f64>,
        timestamps: Option<&[f64]>,
    ) -> Result<Vec<Thumbnail>, VideoError> {
        let requested = match (timestamps, duration) {
            (Some(ts), _) => ts.to_vec(),
            (None, Some(duration)) => default_timestamps(duration, self.count),
            (None, None) => {
                return Err(VideoError::ThumbnailExtraction(
                    "video duration unknown".to_string(),
                ))
            }
        };

        let mut seen: Vec<f64> = Vec::with_capacity(requested.len());
        let mut thumbnails = Vec::with_capacity(requested.len());
        for timestamp in requested {
            let timestamp = match duration {
                Some(duration) => timestamp.clamp(0.0, duration.max(0.0)),
                None => timestamp.max(0.0),
            };
            // Clamping can collapse several requests onto the same frame
            if seen.contains(&timestamp) {
                continue;
            }
            seen.push(timestamp);

            match self.toolkit.grab_frame(staged.path(), timestamp).await {
                Ok(data) => thumbnails.push(Thumbnail::jpeg(data, timestamp)),
                Err(e) => {
                    tracing::warn!(
                        timestamp_seconds = timestamp,
                        error = %e,
                        "Failed to extract thumbnail frame"
                    );
                }
            }
        }

        if thumbnails.is_empty() {
            return Err(VideoError::ThumbnailExtraction(
                "no frames could be extracted".to_string(),
            ));
        }

        tracing::debug!(count = thumbnails.len(), "Thumbnails extracted");
        Ok(thumbnails)
    }
}
