//! Probed media metadata

use serde::{Deserialize, Serialize};

/// Intrinsic properties of a video, read from its container without a full decode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
    pub codec: String,
    pub bitrate: Option<u64>,
    pub frame_rate: Option<f32>,
}

impl VideoMetadata {
    pub fn new(width: u32, height: u32, duration_seconds: f64) -> Self {
        Self {
            width,
            height,
            duration_seconds,
            codec: "unknown".to_string(),
            bitrate: None,
            frame_rate: None,
        }
    }
}
