//! Image geometry helpers shared by the compressor and the video transcoder

pub mod resize;

pub use resize::{even_dimensions_within, fit_within};
#[cfg(feature = "image")]
pub use resize::{resize_to, select_filter};
