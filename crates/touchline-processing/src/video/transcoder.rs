use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use touchline_core::{
    CompressionProgress, CompressionSettings, CompressionStage, PlatformCapabilities, RawFile,
    VideoError,
};

use crate::image::even_dimensions_within;
use crate::metadata::VideoMetadata;
use crate::video::codec::select_codec;
use crate::video::probe::VideoMetadataProbe;
use crate::video::staging::StagedFile;
use crate::video::toolkit::{EncodeJob, MediaToolkit};

/// Progress sink for one transcode
pub type ProgressFn<'a> = &'a (dyn Fn(CompressionProgress) + Send + Sync);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// bits per second
    pub video_bitrate: u32,
    pub frame_rate: u32,
    /// bits per second
    pub audio_bitrate: u32,
}

impl From<&CompressionSettings> for TranscodeOptions {
    fn from(settings: &CompressionSettings) -> Self {
        Self {
            max_width: settings.video_max_width,
            max_height: settings.video_max_height,
            video_bitrate: settings.video_bitrate,
            frame_rate: settings.video_frame_rate,
            audio_bitrate: settings.audio_bitrate,
        }
    }
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self::from(&CompressionSettings::default())
    }
}

#[derive(Debug, Clone)]
pub struct TranscodeOutput {
    pub file: RawFile,
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
}

/// Fit the source inside the bounds, keeping aspect ratio, with even sides
pub fn target_dimensions(
    source_width: u32,
    source_height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    even_dimensions_within(source_width, source_height, max_width, max_height)
}

/// Percentage of `duration` covered by `out_time`, floored and capped at 100
fn compressing_percent(out_time: f64, duration: f64) -> u8 {
    if duration.is_nan() || duration <= 0.0 || !out_time.is_finite() {
        return 0;
    }
    (out_time / duration * 100.0).floor().clamp(0.0, 100.0) as u8
}

/// Forwards progress to the caller, dropping compressing updates that would
/// not move the bar forward.
struct ProgressEmitter<'a> {
    sink: ProgressFn<'a>,
    last_compressing: Option<u8>,
}

impl<'a> ProgressEmitter<'a> {
    fn new(sink: ProgressFn<'a>) -> Self {
        Self {
            sink,
            last_compressing: None,
        }
    }

    fn emit(&mut self, stage: CompressionStage, progress: u8) {
        if stage == CompressionStage::Compressing {
            self.last_compressing = Some(progress);
        }
        (self.sink)(CompressionProgress::new(stage, progress));
    }

    fn compressing(&mut self, progress: u8) {
        if self.last_compressing.is_some_and(|last| progress <= last) {
            return;
        }
        self.emit(CompressionStage::Compressing, progress);
    }
}

/// Re-encodes videos at bounded resolution, bitrate and frame rate
#[derive(Clone)]
pub struct VideoTranscoder {
    toolkit: Arc<dyn MediaToolkit>,
    capabilities: PlatformCapabilities,
}

impl VideoTranscoder {
    pub fn new(toolkit: Arc<dyn MediaToolkit>, capabilities: PlatformCapabilities) -> Self {
        Self {
            toolkit,
            capabilities,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.capabilities.supports_video_compression()
    }

    #[tracing::instrument(skip(self, file, options, on_progress), fields(file_name = %file.name))]
    pub async fn transcode(
        &self,
        file: &RawFile,
        options: &TranscodeOptions,
        on_progress: ProgressFn<'_>,
    ) -> Result<TranscodeOutput, VideoError> {
        if !self.is_supported() {
            return Err(VideoError::UnsupportedPlatform);
        }
        let staged = StagedFile::write(file)
            .await
            .map_err(|e| VideoError::Transcode(format!("{:#}", e)))?;
        self.transcode_staged(file, &staged, None, options, on_progress)
            .await
    }

    /// Transcode a payload that is already staged on disk. `probed` skips the
    /// metadata probe when the caller already has it.
    pub async fn transcode_staged(
        &self,
        file: &RawFile,
        staged: &StagedFile,
        probed: Option<VideoMetadata>,
        options: &TranscodeOptions,
        on_progress: ProgressFn<'_>,
    ) -> Result<TranscodeOutput, VideoError> {
        if !self.is_supported() {
            return Err(VideoError::UnsupportedPlatform);
        }

        let mut progress = ProgressEmitter::new(on_progress);

        progress.emit(CompressionStage::Analyzing, 0);
        let metadata = match probed {
            Some(metadata) => metadata,
            None => {
                VideoMetadataProbe::new(self.toolkit.clone())
                    .probe_path(staged.path())
                    .await?
            }
        };
        progress.emit(CompressionStage::Analyzing, 100);

        let (width, height) = target_dimensions(
            metadata.width,
            metadata.height,
            options.max_width,
            options.max_height,
        );
        let profile = select_codec(&self.capabilities).ok_or(VideoError::NoSupportedCodec)?;
        let output_path = staged.sibling(&format!("output.{}", profile.extension));

        tracing::debug!(
            source_width = metadata.width,
            source_height = metadata.height,
            width,
            height,
            codec = profile.mime_type,
            "Starting transcode"
        );

        progress.emit(CompressionStage::Compressing, 0);
        let job = EncodeJob {
            input: staged.path().to_path_buf(),
            output: output_path.clone(),
            width,
            height,
            profile,
            video_bitrate: options.video_bitrate,
            frame_rate: options.frame_rate,
            audio_bitrate: options.audio_bitrate,
        };

        let transcode_err = |e: anyhow::Error| VideoError::Transcode(format!("{:#}", e));
        let mut ticks = self.toolkit.encode(job).await.map_err(transcode_err)?;
        while let Some(tick) = ticks.next().await {
            let tick = tick.map_err(transcode_err)?;
            progress.compressing(compressing_percent(
                tick.out_time_seconds,
                metadata.duration_seconds,
            ));
        }
        drop(ticks);

        progress.emit(CompressionStage::Finalizing, 0);
        let data = tokio::fs::read(&output_path)
            .await
            .map_err(|e| VideoError::Transcode(format!("Failed to read encoder output: {}", e)))?;
        if data.is_empty() {
            return Err(VideoError::Transcode("encoder produced no output".to_string()));
        }
        if let Err(e) = tokio::fs::remove_file(&output_path).await {
            tracing::debug!(error = %e, "Failed to remove encoder output");
        }
        progress.emit(CompressionStage::Finalizing, 100);

        let output = file.reencoded(&profile.content_type(), profile.extension, data);

        tracing::info!(
            file_name = %file.name,
            original_size = file.size(),
            final_size = output.size(),
            width,
            height,
            "Video transcoded"
        );
        progress.emit(CompressionStage::Complete, 100);

        Ok(TranscodeOutput {
            file: output,
            width,
            height,
            duration_seconds: metadata.duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{metadata, ScriptedToolkit};
    use std::sync::Mutex;

    fn video() -> RawFile {
        RawFile::new("match.mov", "video/quicktime", vec![0u8; 4096])
    }

    fn recorder() -> (Arc<Mutex<Vec<CompressionProgress>>>, impl Fn(CompressionProgress) + Send + Sync) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        (events, move |p| sink.lock().unwrap().push(p))
    }

    #[test]
    fn test_target_dimensions() {
        assert_eq!(target_dimensions(1920, 1080, 1280, 720), (1280, 720));
        assert_eq!(target_dimensions(640, 480, 1280, 720), (640, 480));
        assert_eq!(target_dimensions(641, 481, 1280, 720), (640, 480));
        assert_eq!(target_dimensions(3840, 2160, 1280, 720), (1280, 720));
    }

    #[test]
    fn test_compressing_percent() {
        assert_eq!(compressing_percent(0.0, 10.0), 0);
        assert_eq!(compressing_percent(3.339, 10.0), 33);
        assert_eq!(compressing_percent(12.0, 10.0), 100);
        assert_eq!(compressing_percent(1.0, 0.0), 0);
        assert_eq!(compressing_percent(f64::NAN, 10.0), 0);
    }

    #[test]
    fn test_options_from_settings() {
        let options = TranscodeOptions::default();
        assert_eq!(options.max_width, 1280);
        assert_eq!(options.max_height, 720);
        assert_eq!(options.video_bitrate, 1_000_000);
        assert_eq!(options.frame_rate, 30);
        assert_eq!(options.audio_bitrate, 128_000);
    }

    #[tokio::test]
    async fn test_progress_sequence() {
        let toolkit = Arc::new(
            ScriptedToolkit::new(metadata(1920, 1080, 10.0))
                .with_ticks(&[1.0, 2.5, 2.5, 2.0, 6.0, 10.0, 10.4]),
        );
        let transcoder = VideoTranscoder::new(toolkit.clone(), PlatformCapabilities::supported());
        let (events, sink) = recorder();

        let output = transcoder
            .transcode(&video(), &TranscodeOptions::default(), &sink)
            .await
            .unwrap();

        use CompressionStage::*;
        let events: Vec<(CompressionStage, u8)> = events
            .lock()
            .unwrap()
            .iter()
            .map(|p| (p.stage, p.progress))
            .collect();
        assert_eq!(
            events,
            vec![
                (Analyzing, 0),
                (Analyzing, 100),
                (Compressing, 0),
                (Compressing, 10),
                (Compressing, 25),
                (Compressing, 60),
                (Compressing, 100),
                (Finalizing, 0),
                (Finalizing, 100),
                (Complete, 100),
            ]
        );

        assert_eq!((output.width, output.height), (1280, 720));
        assert_eq!(output.duration_seconds, 10.0);
        assert_eq!(output.file.name, "match.webm");
        assert_eq!(output.file.content_type, "video/webm");
        assert_eq!(&output.file.data[..], b"encoded");

        let job = &toolkit.jobs()[0];
        assert_eq!((job.width, job.height), (1280, 720));
        assert_eq!(job.profile.video_encoder, "libvpx-vp9");
        assert_eq!(job.video_bitrate, 1_000_000);
    }

    #[tokio::test]
    async fn test_uses_mp4_when_only_h264_available() {
        let toolkit = Arc::new(ScriptedToolkit::new(metadata(1280, 720, 4.0)));
        let caps = PlatformCapabilities::supported().with_encoders(["libx264", "aac"]);
        let transcoder = VideoTranscoder::new(toolkit, caps);

        let output = transcoder
            .transcode(&video(), &TranscodeOptions::default(), &|_| {})
            .await
            .unwrap();
        assert_eq!(output.file.content_type, "video/mp4");
        assert_eq!(output.file.name, "match.mp4");
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let toolkit = Arc::new(ScriptedToolkit::new(metadata(1280, 720, 4.0)));
        let transcoder = VideoTranscoder::new(toolkit.clone(), PlatformCapabilities::unsupported());
        let (events, sink) = recorder();

        let err = transcoder
            .transcode(&video(), &TranscodeOptions::default(), &sink)
            .await
            .unwrap_err();
        assert_eq!(err, VideoError::UnsupportedPlatform);
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(toolkit.probe_count(), 0);
    }

    #[tokio::test]
    async fn test_no_supported_codec() {
        let toolkit = Arc::new(ScriptedToolkit::new(metadata(1280, 720, 4.0)));
        let caps = PlatformCapabilities::supported().with_encoders(["mjpeg"]);
        let transcoder = VideoTranscoder::new(toolkit.clone(), caps);

        let err = transcoder
            .transcode(&video(), &TranscodeOptions::default(), &|_| {})
            .await
            .unwrap_err();
        assert_eq!(err, VideoError::NoSupportedCodec);
        assert_eq!(toolkit.encode_count(), 0);
    }

    #[tokio::test]
    async fn test_encoder_failure_is_transcode_error() {
        let toolkit = Arc::new(ScriptedToolkit::new(metadata(1280, 720, 4.0)).failing_encode());
        let transcoder = VideoTranscoder::new(toolkit, PlatformCapabilities::supported());
        let (events, sink) = recorder();

        let err = transcoder
            .transcode(&video(), &TranscodeOptions::default(), &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, VideoError::Transcode(_)));
        assert!(events
            .lock()
            .unwrap()
            .iter()
            .all(|p| p.stage < CompressionStage::Finalizing));
    }

    #[tokio::test]
    async fn test_empty_output_is_transcode_error() {
        let toolkit = Arc::new(ScriptedToolkit::new(metadata(1280, 720, 4.0)).with_output(b""));
        let transcoder = VideoTranscoder::new(toolkit, PlatformCapabilities::supported());

        let err = transcoder
            .transcode(&video(), &TranscodeOptions::default(), &|_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, VideoError::Transcode(_)));
    }

    #[tokio::test]
    async fn test_unreadable_source_is_metadata_error() {
        let transcoder =
            VideoTranscoder::new(Arc::new(ScriptedToolkit::broken()), PlatformCapabilities::supported());

        let err = transcoder
            .transcode(&video(), &TranscodeOptions::default(), &|_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, VideoError::Metadata(_)));
    }
}
