//! Configuration module
//!
//! Reads the pipeline settings and external tool locations from the process
//! environment (after loading a `.env` file when one is present).

use std::env;
use std::str::FromStr;

use crate::models::CompressionSettings;

const UPLOAD_TICK_MS: u64 = 200;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Interval of the simulated upload progress counters
    pub upload_tick_ms: u64,
    pub settings: CompressionSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            upload_tick_ms: UPLOAD_TICK_MS,
            settings: CompressionSettings::default(),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().to_lowercase().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Build from an arbitrary key lookup; unset or unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = CompressionSettings::default();

        let accepted_types = lookup("ACCEPTED_TYPES")
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|types| !types.is_empty())
            .unwrap_or_else(|| defaults.accepted_types.clone());

        let settings = CompressionSettings {
            compress_images: parse_or(lookup("COMPRESS_IMAGES"), defaults.compress_images),
            image_quality: parse_or(lookup("IMAGE_QUALITY"), defaults.image_quality),
            image_max_dimension: parse_or(
                lookup("IMAGE_MAX_DIMENSION"),
                defaults.image_max_dimension,
            ),
            compress_videos: parse_or(lookup("COMPRESS_VIDEOS"), defaults.compress_videos),
            generate_thumbnails: parse_or(
                lookup("GENERATE_THUMBNAILS"),
                defaults.generate_thumbnails,
            ),
            video_max_width: parse_or(lookup("VIDEO_MAX_WIDTH"), defaults.video_max_width),
            video_max_height: parse_or(lookup("VIDEO_MAX_HEIGHT"), defaults.video_max_height),
            video_bitrate: parse_or(lookup("VIDEO_BITRATE"), defaults.video_bitrate),
            video_frame_rate: parse_or(lookup("VIDEO_FRAME_RATE"), defaults.video_frame_rate),
            audio_bitrate: parse_or(lookup("AUDIO_BITRATE"), defaults.audio_bitrate),
            max_files: parse_or(lookup("MAX_FILES"), defaults.max_files),
            max_file_size_mb: parse_or(lookup("MAX_FILE_SIZE_MB"), defaults.max_file_size_mb),
            accepted_types,
        };

        Self {
            ffmpeg_path: lookup("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            ffprobe_path: lookup("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),
            upload_tick_ms: parse_or(lookup("UPLOAD_TICK_MS"), UPLOAD_TICK_MS),
            settings,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.ffmpeg_path.trim().is_empty() || self.ffprobe_path.trim().is_empty() {
            return Err(anyhow::anyhow!("FFMPEG_PATH and FFPROBE_PATH must not be empty"));
        }
        if self.upload_tick_ms == 0 {
            return Err(anyhow::anyhow!("UPLOAD_TICK_MS must be greater than 0"));
        }
        self.settings.validate()
    }
}
