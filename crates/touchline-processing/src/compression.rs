//! Still-image re-encoding
//!
//! Images are decoded, bounded to a maximum dimension and re-encoded in their
//! original format. Small files, GIFs and formats the encoders cannot reproduce
//! are returned untouched.

use touchline_core::{mime_essence, ImageError, MediaKind, RawFile};

/// Files below this size are not worth re-encoding.
pub const MIN_COMPRESSIBLE_SIZE: usize = 150 * 1024;

/// Formats the compressor can write back out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodableFormat {
    Jpeg,
    Png,
    WebP,
}

impl EncodableFormat {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match mime_essence(content_type).as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(EncodableFormat::Jpeg),
            "image/png" => Some(EncodableFormat::Png),
            "image/webp" => Some(EncodableFormat::WebP),
            _ => None,
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            EncodableFormat::Jpeg => "image/jpeg",
            EncodableFormat::Png => "image/png",
            EncodableFormat::WebP => "image/webp",
        }
    }
}

pub struct ImageCompressor;

impl ImageCompressor {
    /// Returns the format to re-encode into, or `None` when the file must pass
    /// through unchanged.
    pub fn plan(file: &RawFile) -> Option<EncodableFormat> {
        if file.kind() != MediaKind::Image {
            return None;
        }
        if mime_essence(&file.content_type) == "image/gif" {
            return None;
        }
        if file.size() < MIN_COMPRESSIBLE_SIZE {
            return None;
        }
        EncodableFormat::from_content_type(&file.content_type)
    }

    /// Downscale so neither side exceeds `max_dimension` and re-encode at
    /// `quality` (0.0 - 1.0). The result keeps the input's name and MIME type.
    pub async fn compress(
        file: &RawFile,
        max_dimension: u32,
        quality: f32,
    ) -> Result<RawFile, ImageError> {
        let Some(format) = Self::plan(file) else {
            tracing::debug!(
                file_name = %file.name,
                content_type = %file.content_type,
                size = file.size(),
                "Image left as-is"
            );
            return Ok(file.clone());
        };

        let data = file.data.clone();
        let encoded = tokio::task::spawn_blocking(move || {
            Self::recompress(&data, format, max_dimension, quality)
        })
        .await
        .map_err(|e| ImageError::Encode(format!("encoder task failed: {}", e)))??;

        tracing::info!(
            file_name = %file.name,
            original_size = file.size(),
            final_size = encoded.len(),
            "Image compressed"
        );

        Ok(file.with_data(encoded))
    }

    #[cfg(feature = "image")]
    fn recompress(
        data: &[u8],
        format: EncodableFormat,
        max_dimension: u32,
        quality: f32,
    ) -> Result<bytes::Bytes, ImageError> {
        use crate::image::{fit_within, resize_to};
        use image::GenericImageView;

        let img =
            image::load_from_memory(data).map_err(|e| ImageError::Decode(e.to_string()))?;
        let (width, height) = img.dimensions();
        let (new_width, new_height) = fit_within(width, height, max_dimension, max_dimension);

        tracing::debug!(
            width,
            height,
            new_width,
            new_height,
            format = ?format,
            "Re-encoding image"
        );

        let img = resize_to(img, new_width, new_height);
        let quality = quality.clamp(0.0, 1.0) * 100.0;

        match format {
            EncodableFormat::Jpeg => encode_jpeg(&img, quality),
            EncodableFormat::Png => encode_png(&img),
            EncodableFormat::WebP => Ok(encode_webp(&img, quality)),
        }
    }

    #[cfg(not(feature = "image"))]
    fn recompress(
        data: &[u8],
        _format: EncodableFormat,
        _max_dimension: u32,
        _quality: f32,
    ) -> Result<bytes::Bytes, ImageError> {
        Ok(bytes::Bytes::copy_from_slice(data))
    }
}

/// Encode to JPEG using mozjpeg
#[cfg(feature = "image")]
fn encode_jpeg(img: &image::DynamicImage, quality: f32) -> Result<bytes::Bytes, ImageError> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality);
    comp.set_progressive_mode();
    comp.set_optimize_coding(true);

    let encode_err = |e: std::io::Error| ImageError::Encode(e.to_string());
    let mut comp = comp.start_compress(Vec::new()).map_err(encode_err)?;
    comp.write_scanlines(&rgb_img).map_err(encode_err)?;
    let jpeg_data = comp.finish().map_err(encode_err)?;

    Ok(bytes::Bytes::from(jpeg_data))
}

/// PNG is lossless; quality does not apply
#[cfg(feature = "image")]
fn encode_png(img: &image::DynamicImage) -> Result<bytes::Bytes, ImageError> {
    let mut buffer = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(bytes::Bytes::from(buffer))
}

#[cfg(feature = "image")]
fn encode_webp(img: &image::DynamicImage, quality: f32) -> bytes::Bytes {
    let rgba_img = img.to_rgba8();
    let (width, height) = rgba_img.dimensions();
    let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
    let webp_data = encoder.encode(quality);
    bytes::Bytes::copy_from_slice(&webp_data)
}
