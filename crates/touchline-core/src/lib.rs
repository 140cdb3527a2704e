//! Touchline Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! the media ingestion pipeline and the command-line composer.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{
    BatchError, ErrorMetadata, ImageError, LogLevel, ProcessingError, ValidationError, VideoError,
};
pub use models::{
    mime_essence, CompressionProgress, CompressionSettings, CompressionStage, MediaKind,
    PlatformCapabilities, ProcessedAttachment, RawFile, Thumbnail,
};
