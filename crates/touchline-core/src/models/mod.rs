//! Data models for the media ingestion pipeline

mod attachment;
mod capabilities;
mod file;
mod progress;
mod settings;

pub use attachment::*;
pub use capabilities::*;
pub use file::*;
pub use progress::*;
pub use settings::*;
