//! Batch intake for the message composer
//!
//! `process` checks the batch ceiling, validates files in input order, then
//! runs every accepted file down its media path concurrently. Video transcodes
//! are serialized through a single-permit queue; thumbnail extraction is not.
//! Per-file failures degrade to the best payload already available and never
//! fail the batch.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use touchline_core::{
    BatchError, CompressionProgress, CompressionSettings, MediaKind, PlatformCapabilities,
    ProcessedAttachment, RawFile, VideoError,
};
use uuid::Uuid;

use crate::compression::ImageCompressor;
use crate::upload::observer::{FileRejection, NoOpObserver, UploadObserver};
use crate::upload::progress::{UploadProgressTracker, DEFAULT_UPLOAD_TICK};
use crate::upload::state::{FileState, FileStateMachine};
use crate::validator::FileValidator;
use crate::video::{
    MediaToolkit, StagedFile, ThumbnailExtractor, TranscodeOptions, VideoMetadataProbe,
    VideoTranscoder,
};

pub struct UploadQueueOrchestrator {
    settings: CompressionSettings,
    validator: FileValidator,
    probe: VideoMetadataProbe,
    transcoder: VideoTranscoder,
    thumbnails: ThumbnailExtractor,
    transcode_queue: Semaphore,
    observer: Arc<dyn UploadObserver>,
    upload_progress: UploadProgressTracker,
}

impl UploadQueueOrchestrator {
    pub fn new(
        toolkit: Arc<dyn MediaToolkit>,
        capabilities: PlatformCapabilities,
        settings: CompressionSettings,
    ) -> Self {
        Self {
            validator: FileValidator::from_settings(&settings),
            probe: VideoMetadataProbe::new(toolkit.clone()),
            transcoder: VideoTranscoder::new(toolkit.clone(), capabilities),
            thumbnails: ThumbnailExtractor::new(toolkit),
            transcode_queue: Semaphore::new(1),
            observer: Arc::new(NoOpObserver),
            upload_progress: UploadProgressTracker::new(DEFAULT_UPLOAD_TICK),
            settings,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn UploadObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_upload_tick(mut self, tick: Duration) -> Self {
        self.upload_progress = UploadProgressTracker::new(tick);
        self
    }

    pub fn settings(&self) -> &CompressionSettings {
        &self.settings
    }

    /// Simulated upload progress of every accepted file
    pub fn upload_progress(&self) -> &UploadProgressTracker {
        &self.upload_progress
    }

    /// Cancel upload simulations and close the transcode queue. Videos still
    /// waiting for the queue keep their original payload.
    pub fn shutdown(&self) {
        self.upload_progress.shutdown();
        self.transcode_queue.close();
    }

    /// Turn the selected files into attachments.
    ///
    /// Fails only when `existing_count + files.len()` exceeds `max_files`; in
    /// that case no file is touched. Rejected files are reported through the
    /// observer and left out of the result, which otherwise keeps input order.
    #[tracing::instrument(skip(self, files), fields(files = files.len()))]
    pub async fn process(
        &self,
        files: Vec<RawFile>,
        existing_count: usize,
    ) -> Result<Vec<ProcessedAttachment>, BatchError> {
        let incoming = files.len();
        let max = self.settings.max_files;
        if existing_count.saturating_add(incoming) > max {
            let error = BatchError::BatchTooLarge {
                existing: existing_count,
                incoming,
                max,
            };
            tracing::error!(error = %error, "Batch rejected");
            self.observer.on_batch_rejected(&error);
            return Err(error);
        }

        let mut accepted = Vec::with_capacity(incoming);
        for file in files {
            let mut state = FileStateMachine::new(&file.name);
            state.advance(FileState::Validating);

            match self.validator.validate(&file) {
                Ok(()) => {
                    state.advance(FileState::Routing);
                    accepted.push((file, state));
                }
                Err(error) => {
                    state.advance(FileState::Rejected);
                    tracing::debug!(file_name = %file.name, error = %error, "File rejected");
                    self.observer.on_rejected(&FileRejection::new(&file, error));
                }
            }
        }

        let attachments = join_all(
            accepted
                .into_iter()
                .map(|(file, state)| self.process_file(file, state)),
        )
        .await;

        tracing::info!(
            accepted = attachments.len(),
            rejected = incoming - attachments.len(),
            "Batch processed"
        );
        Ok(attachments)
    }

    async fn process_file(&self, file: RawFile, mut state: FileStateMachine) -> ProcessedAttachment {
        let id = Uuid::new_v4();
        self.upload_progress.start(id);

        let attachment = match file.kind() {
            MediaKind::Image => {
                state.advance(FileState::ImagePath);
                self.process_image(id, file).await
            }
            MediaKind::Video => {
                state.advance(FileState::VideoPath);
                self.process_video(id, file).await
            }
            MediaKind::Document => {
                state.advance(FileState::PassthroughPath);
                ProcessedAttachment::new(id, file)
            }
        };

        state.advance(FileState::Done);
        self.observer.on_file_done(&attachment);
        attachment
    }

    async fn process_image(&self, id: Uuid, file: RawFile) -> ProcessedAttachment {
        let mut attachment = ProcessedAttachment::new(id, file.clone());
        if !self.settings.compress_images || ImageCompressor::plan(&file).is_none() {
            return attachment;
        }

        match ImageCompressor::compress(
            &file,
            self.settings.image_max_dimension,
            self.settings.image_quality,
        )
        .await
        {
            Ok(compressed) => attachment.replace_payload(compressed),
            Err(e) => {
                tracing::warn!(
                    file_name = %file.name,
                    error = %e,
                    "Image compression failed, keeping original"
                );
            }
        }

        attachment
    }

    async fn process_video(&self, id: Uuid, file: RawFile) -> ProcessedAttachment {
        let mut attachment = ProcessedAttachment::new(id, file.clone());

        let staged = match StagedFile::write(&file).await {
            Ok(staged) => staged,
            Err(e) => {
                tracing::warn!(file_name = %file.name, error = %e, "Failed to stage video");
                return attachment;
            }
        };

        let metadata = match self.probe.probe_path(staged.path()).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(
                    file_name = %file.name,
                    error = %e,
                    "Video metadata unavailable, keeping original"
                );
                return attachment;
            }
        };
        attachment.width = Some(metadata.width);
        attachment.height = Some(metadata.height);
        attachment.duration_seconds = Some(metadata.duration_seconds);

        let want_thumbnails = self.settings.generate_thumbnails;
        let want_transcode = self.settings.compress_videos && self.transcoder.is_supported();
        if self.settings.compress_videos && !want_transcode {
            tracing::debug!(file_name = %file.name, "Video compression unsupported, passing through");
        }

        let thumbnails = async {
            if !want_thumbnails {
                return None;
            }
            Some(
                self.thumbnails
                    .extract_from(&staged, Some(metadata.duration_seconds), None)
                    .await,
            )
        };

        let transcoded = async {
            if !want_transcode {
                return None;
            }
            let _permit = match self.transcode_queue.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    return Some(Err(VideoError::Transcode(
                        "transcode queue closed".to_string(),
                    )))
                }
            };

            let observer = self.observer.clone();
            let file_name = file.name.clone();
            let on_progress = move |progress: CompressionProgress| {
                tracing::debug!(
                    file_name = %file_name,
                    stage = %progress.stage,
                    progress = progress.progress,
                    "Transcode progress"
                );
                observer.on_progress(&file_name, progress);
            };

            let options = TranscodeOptions::from(&self.settings);
            Some(
                self.transcoder
                    .transcode_staged(&file, &staged, Some(metadata.clone()), &options, &on_progress)
                    .await,
            )
        };

        let (thumbnails, transcoded) = tokio::join!(thumbnails, transcoded);

        match thumbnails {
            Some(Ok(thumbnails)) => attachment.attach_thumbnails(thumbnails),
            Some(Err(e)) => {
                tracing::warn!(file_name = %file.name, error = %e, "No thumbnail for video");
            }
            None => {}
        }

        match transcoded {
            Some(Ok(output)) => {
                attachment.width = Some(output.width);
                attachment.height = Some(output.height);
                attachment.duration_seconds = Some(output.duration_seconds);
                attachment.replace_payload(output.file);
            }
            Some(Err(e)) => {
                tracing::warn!(
                    file_name = %file.name,
                    error = %e,
                    "Video transcode failed, keeping original"
                );
            }
            None => {}
        }

        attachment
    }
}

impl Drop for UploadQueueOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
