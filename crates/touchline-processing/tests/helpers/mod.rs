//! Shared fixtures for pipeline integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use touchline_core::{CompressionProgress, ProcessedAttachment, RawFile};
use touchline_processing::{
    EncodeJob, EncodeTick, FileRejection, MediaToolkit, TickStream, UploadObserver, VideoMetadata,
};

/// Payloads starting with this marker behave like unreadable files
pub const CORRUPT_MARKER: &[u8] = b"CORRUPT";

pub fn video(name: &str, size: usize) -> RawFile {
    RawFile::new(name, "video/mp4", vec![0u8; size])
}

pub fn corrupt_video(name: &str) -> RawFile {
    let mut data = CORRUPT_MARKER.to_vec();
    data.resize(4096, 0);
    RawFile::new(name, "video/mp4", data)
}

#[derive(Default)]
struct Counters {
    active_encodes: AtomicUsize,
    peak_encodes: AtomicUsize,
    encodes: AtomicUsize,
    probes: AtomicUsize,
    frames: AtomicUsize,
    frames_during_encode: AtomicUsize,
}

struct ActiveEncode(Arc<Counters>);

impl Drop for ActiveEncode {
    fn drop(&mut self) {
        self.0.active_encodes.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Stands in for ffmpeg. Every readable video reports the same metadata; the
/// encoder reports four evenly spaced ticks.
pub struct FakeToolkit {
    metadata: VideoMetadata,
    tick_delay: Duration,
    frame_delay: Duration,
    counters: Arc<Counters>,
}

impl FakeToolkit {
    pub fn new(width: u32, height: u32, duration_seconds: f64) -> Self {
        Self {
            metadata: VideoMetadata::new(width, height, duration_seconds),
            tick_delay: Duration::ZERO,
            frame_delay: Duration::ZERO,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_delays(mut self, tick_delay: Duration, frame_delay: Duration) -> Self {
        self.tick_delay = tick_delay;
        self.frame_delay = frame_delay;
        self
    }

    pub fn peak_encodes(&self) -> usize {
        self.counters.peak_encodes.load(Ordering::SeqCst)
    }

    pub fn encodes(&self) -> usize {
        self.counters.encodes.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.counters.probes.load(Ordering::SeqCst)
    }

    pub fn frames(&self) -> usize {
        self.counters.frames.load(Ordering::SeqCst)
    }

    pub fn frames_during_encode(&self) -> usize {
        self.counters.frames_during_encode.load(Ordering::SeqCst)
    }

    async fn readable(path: &Path) -> Result<()> {
        let data = tokio::fs::read(path).await?;
        if data.starts_with(CORRUPT_MARKER) {
            return Err(anyhow!("{}: Invalid data found when processing input", path.display()));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaToolkit for FakeToolkit {
    async fn probe(&self, path: &Path) -> Result<VideoMetadata> {
        self.counters.probes.fetch_add(1, Ordering::SeqCst);
        Self::readable(path).await?;
        Ok(self.metadata.clone())
    }

    async fn encode(&self, job: EncodeJob) -> Result<TickStream> {
        Self::readable(&job.input).await?;

        let counters = self.counters.clone();
        counters.encodes.fetch_add(1, Ordering::SeqCst);
        let active = counters.active_encodes.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_encodes.fetch_max(active, Ordering::SeqCst);
        let guard = ActiveEncode(counters);

        tokio::fs::write(&job.output, b"transcoded").await?;

        let duration = self.metadata.duration_seconds;
        let delay = self.tick_delay;
        let ticks: Vec<f64> = (1..=4).map(|i| duration * i as f64 / 4.0).collect();

        let stream = futures::stream::unfold(
            (ticks.into_iter(), guard),
            move |(mut remaining, guard)| async move {
                let out_time_seconds = remaining.next()?;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let tick = EncodeTick { out_time_seconds };
                Some((Ok::<_, anyhow::Error>(tick), (remaining, guard)))
            },
        );

        Ok(stream.boxed())
    }

    async fn grab_frame(&self, path: &Path, timestamp_seconds: f64) -> Result<Bytes> {
        Self::readable(path).await?;
        if !self.frame_delay.is_zero() {
            tokio::time::sleep(self.frame_delay).await;
        }
        self.counters.frames.fetch_add(1, Ordering::SeqCst);
        if self.counters.active_encodes.load(Ordering::SeqCst) > 0 {
            self.counters
                .frames_during_encode
                .fetch_add(1, Ordering::SeqCst);
        }
        Ok(Bytes::from(format!("jpeg@{}", timestamp_seconds)))
    }
}

/// Observer that records everything it is told
#[derive(Default)]
pub struct RecordingObserver {
    pub rejections: Mutex<Vec<FileRejection>>,
    pub progress: Mutex<Vec<(String, CompressionProgress)>>,
    pub done: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn progress_for(&self, file_name: &str) -> Vec<CompressionProgress> {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == file_name)
            .map(|(_, p)| *p)
            .collect()
    }
}

impl UploadObserver for RecordingObserver {
    fn on_rejected(&self, rejection: &FileRejection) {
        self.rejections.lock().unwrap().push(rejection.clone());
    }

    fn on_progress(&self, file_name: &str, progress: CompressionProgress) {
        self.progress
            .lock()
            .unwrap()
            .push((file_name.to_string(), progress));
    }

    fn on_file_done(&self, attachment: &ProcessedAttachment) {
        self.done
            .lock()
            .unwrap()
            .push(attachment.original_name.clone());
    }
}
