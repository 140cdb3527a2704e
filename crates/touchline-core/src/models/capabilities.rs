use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the host can do with video, detected once at startup and passed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Intrinsic metadata can be read (ffprobe)
    pub can_probe: bool,
    /// Frames can be re-encoded into a new stream (ffmpeg)
    pub can_record: bool,
    /// Single frames can be rasterized to stills
    pub can_capture_frames: bool,
    /// Encoder names the recorder offers, e.g. `libvpx-vp9`
    pub encoders: BTreeSet<String>,
}

impl PlatformCapabilities {
    /// Every capability present, with the encoders of a typical ffmpeg build.
    pub fn supported() -> Self {
        Self {
            can_probe: true,
            can_record: true,
            can_capture_frames: true,
            encoders: ["libvpx-vp9", "libvpx", "libopus", "libvorbis", "libx264", "aac", "mjpeg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// No recorder: videos pass through, thumbnails are still attempted.
    pub fn unsupported() -> Self {
        Self {
            can_probe: true,
            can_record: false,
            can_capture_frames: true,
            encoders: BTreeSet::new(),
        }
    }

    pub fn with_encoders<I, S>(mut self, encoders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.encoders = encoders.into_iter().map(Into::into).collect();
        self
    }

    pub fn supports_video_compression(&self) -> bool {
        self.can_probe && self.can_record && self.can_capture_frames
    }

    pub fn has_encoder(&self, name: &str) -> bool {
        self.encoders.contains(name)
    }
}
