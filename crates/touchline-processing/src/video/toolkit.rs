use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::path::{Path, PathBuf};

use crate::metadata::VideoMetadata;
use crate::video::codec::CodecProfile;

/// One re-encode request
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub profile: CodecProfile,
    /// bits per second
    pub video_bitrate: u32,
    pub frame_rate: u32,
    /// bits per second
    pub audio_bitrate: u32,
}

/// Encoder position, reported roughly once per second of wall time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeTick {
    /// Media time written so far
    pub out_time_seconds: f64,
}

/// Pull-based encoder progress. The stream ends once the encoder exits
/// successfully and yields an error if it fails. Dropping the stream stops the
/// encoder.
pub type TickStream = BoxStream<'static, Result<EncodeTick>>;

/// External media tooling the video path depends on
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Read intrinsic metadata
    async fn probe(&self, path: &Path) -> Result<VideoMetadata>;

    /// Start encoding `job.input` into `job.output`
    async fn encode(&self, job: EncodeJob) -> Result<TickStream>;

    /// Rasterize the frame at `timestamp_seconds` to JPEG
    async fn grab_frame(&self, path: &Path, timestamp_seconds: f64) -> Result<Bytes>;
}

/// Incremental parser for `-progress` output.
///
/// The encoder writes `key=value` lines in blocks; each block ends with
/// `progress=continue` or `progress=end`.
#[derive(Debug, Default)]
pub struct ProgressParser {
    out_time_seconds: f64,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns a tick at the end of each block.
    pub fn push(&mut self, line: &str) -> Option<EncodeTick> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();

        match key.trim() {
            // Both are microseconds; out_time_ms is misnamed upstream
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    if us >= 0 {
                        self.out_time_seconds = us as f64 / 1_000_000.0;
                    }
                }
                None
            }
            "progress" => Some(EncodeTick {
                out_time_seconds: self.out_time_seconds,
            }),
            _ => None,
        }
    }
}
