use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_QUALITY: f32 = 0.8;
pub const DEFAULT_IMAGE_MAX_DIMENSION: u32 = 1920;
pub const DEFAULT_VIDEO_MAX_WIDTH: u32 = 1280;
pub const DEFAULT_VIDEO_MAX_HEIGHT: u32 = 720;
pub const DEFAULT_VIDEO_BITRATE: u32 = 1_000_000;
pub const DEFAULT_VIDEO_FRAME_RATE: u32 = 30;
pub const DEFAULT_AUDIO_BITRATE: u32 = 128_000;
pub const DEFAULT_MAX_FILES: usize = 5;
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;

const BYTES_PER_MB: usize = 1024 * 1024;

/// Accept list used by the message composer.
pub const DEFAULT_ACCEPTED_TYPES: &[&str] = &[
    "image/*",
    "video/*",
    "application/pdf",
    ".doc",
    ".docx",
    ".txt",
];

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    pub compress_images: bool,
    /// Encoder quality factor in `[0.5, 1.0]`
    pub image_quality: f32,
    pub image_max_dimension: u32,
    /// Only effective when the platform can record video
    pub compress_videos: bool,
    pub generate_thumbnails: bool,
    pub video_max_width: u32,
    pub video_max_height: u32,
    /// Bits per second
    pub video_bitrate: u32,
    pub video_frame_rate: u32,
    /// Bits per second
    pub audio_bitrate: u32,
    pub max_files: usize,
    pub max_file_size_mb: usize,
    /// Exact MIME types, `type/*` wildcards or `.ext` suffixes
    pub accepted_types: Vec<String>,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            compress_images: true,
            image_quality: DEFAULT_IMAGE_QUALITY,
            image_max_dimension: DEFAULT_IMAGE_MAX_DIMENSION,
            compress_videos: true,
            generate_thumbnails: true,
            video_max_width: DEFAULT_VIDEO_MAX_WIDTH,
            video_max_height: DEFAULT_VIDEO_MAX_HEIGHT,
            video_bitrate: DEFAULT_VIDEO_BITRATE,
            video_frame_rate: DEFAULT_VIDEO_FRAME_RATE,
            audio_bitrate: DEFAULT_AUDIO_BITRATE,
            max_files: DEFAULT_MAX_FILES,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            accepted_types: DEFAULT_ACCEPTED_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CompressionSettings {
    /// Saturates instead of overflowing for limits beyond the address space
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(0.5..=1.0).contains(&self.image_quality) {
            return Err(anyhow::anyhow!(
                "image_quality must be between 0.5 and 1.0, got {}",
                self.image_quality
            ));
        }
        if self.image_max_dimension == 0 {
            return Err(anyhow::anyhow!("image_max_dimension must be greater than 0"));
        }
        if self.video_max_width == 0 || self.video_max_height == 0 {
            return Err(anyhow::anyhow!(
                "video_max_width and video_max_height must be greater than 0"
            ));
        }
        if self.video_bitrate == 0 || self.audio_bitrate == 0 {
            return Err(anyhow::anyhow!("bitrates must be greater than 0"));
        }
        if self.video_frame_rate == 0 {
            return Err(anyhow::anyhow!("video_frame_rate must be greater than 0"));
        }
        if self.max_files == 0 {
            return Err(anyhow::anyhow!("max_files must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("max_file_size_mb must be greater than 0"));
        }
        if self.max_file_size_mb > usize::MAX / BYTES_PER_MB {
            return Err(anyhow::anyhow!(
                "max_file_size_mb must be at most {}, got {}",
                usize::MAX / BYTES_PER_MB,
                self.max_file_size_mb
            ));
        }
        Ok(())
    }
}
