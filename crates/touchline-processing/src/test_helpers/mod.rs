//! Test helpers for unit tests
//!
//! [`ScriptedToolkit`] replays canned probe results, encoder ticks and frames
//! so the video path can be exercised without ffmpeg installed.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::metadata::VideoMetadata;
use crate::video::toolkit::{EncodeJob, EncodeTick, MediaToolkit, TickStream};

pub fn metadata(width: u32, height: u32, duration_seconds: f64) -> VideoMetadata {
    VideoMetadata::new(width, height, duration_seconds)
}

#[derive(Default)]
struct Counters {
    encodes: AtomicUsize,
    probes: AtomicUsize,
}

pub struct ScriptedToolkit {
    metadata: Option<VideoMetadata>,
    ticks: Vec<f64>,
    fail_encode: bool,
    output: Bytes,
    failing_frames: Vec<f64>,
    counters: Arc<Counters>,
    jobs: Mutex<Vec<EncodeJob>>,
    frames: Mutex<Vec<f64>>,
}

impl ScriptedToolkit {
    pub fn new(metadata: VideoMetadata) -> Self {
        let duration = metadata.duration_seconds;
        Self {
            metadata: Some(metadata),
            ticks: vec![duration * 0.25, duration * 0.5, duration * 0.75, duration],
            fail_encode: false,
            output: Bytes::from_static(b"encoded"),
            failing_frames: Vec::new(),
            counters: Arc::new(Counters::default()),
            jobs: Mutex::new(Vec::new()),
            frames: Mutex::new(Vec::new()),
        }
    }

    /// Every operation fails, like an unreadable file
    pub fn broken() -> Self {
        let mut toolkit = Self::new(metadata(1, 1, 1.0));
        toolkit.metadata = None;
        toolkit
    }

    pub fn with_ticks(mut self, ticks: &[f64]) -> Self {
        self.ticks = ticks.to_vec();
        self
    }

    pub fn with_output(mut self, output: &'static [u8]) -> Self {
        self.output = Bytes::from_static(output);
        self
    }

    pub fn failing_encode(mut self) -> Self {
        self.fail_encode = true;
        self
    }

    pub fn failing_frames_at(mut self, timestamps: &[f64]) -> Self {
        self.failing_frames = timestamps.to_vec();
        self
    }

    pub fn encode_count(&self) -> usize {
        self.counters.encodes.load(Ordering::SeqCst)
    }

    pub fn probe_count(&self) -> usize {
        self.counters.probes.load(Ordering::SeqCst)
    }

    pub fn jobs(&self) -> Vec<EncodeJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn frame_requests(&self) -> Vec<f64> {
        self.frames.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaToolkit for ScriptedToolkit {
    async fn probe(&self, _path: &Path) -> Result<VideoMetadata> {
        self.counters.probes.fetch_add(1, Ordering::SeqCst);
        self.metadata
            .clone()
            .ok_or_else(|| anyhow!("Invalid data found when processing input"))
    }

    async fn encode(&self, job: EncodeJob) -> Result<TickStream> {
        if self.metadata.is_none() {
            return Err(anyhow!("Invalid data found when processing input"));
        }

        self.counters.encodes.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(&job.output, &self.output).await?;
        self.jobs.lock().unwrap().push(job);

        let ticks: VecDeque<f64> = self.ticks.iter().copied().collect();
        let fail = self.fail_encode;

        let stream = futures::stream::unfold(Some(ticks), move |state| async move {
            let mut ticks = state?;
            match ticks.pop_front() {
                Some(t) => {
                    let tick = EncodeTick { out_time_seconds: t };
                    Some((Ok(tick), Some(ticks)))
                }
                None if fail => Some((Err(anyhow!("Error while decoding stream #0:0")), None)),
                None => None,
            }
        });

        Ok(stream.boxed())
    }

    async fn grab_frame(&self, _path: &Path, timestamp_seconds: f64) -> Result<Bytes> {
        self.frames.lock().unwrap().push(timestamp_seconds);
        if self.metadata.is_none() {
            return Err(anyhow!("Invalid data found when processing input"));
        }
        if self
            .failing_frames
            .iter()
            .any(|t| (t - timestamp_seconds).abs() < 1e-6)
        {
            return Err(anyhow!("No frame decoded at {}s", timestamp_seconds));
        }
        Ok(Bytes::from(format!("frame@{:.2}", timestamp_seconds)))
    }
}
