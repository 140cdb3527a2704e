/// Scale `(width, height)` down so neither side exceeds its bound, preserving
/// aspect ratio. Never upscales; results are at least 1.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let scale = (max_width as f64 / width as f64)
        .min(max_height as f64 / height as f64)
        .min(1.0);

    let w = ((width as f64 * scale).round() as u32).clamp(1, max_width.max(1));
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_height.max(1));
    (w, h)
}

/// Like [`fit_within`] but floors the scaled size and rounds both sides down to
/// even numbers, which most video encoders require. Minimum is 2x2.
pub fn even_dimensions_within(
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (2, 2);
    }

    let scale = (max_width as f64 / width as f64)
        .min(max_height as f64 / height as f64)
        .min(1.0);

    let even = |v: f64| ((v.floor() as u32) & !1).max(2);
    (even(width as f64 * scale), even(height as f64 * scale))
}

/// Select appropriate filter type based on resize ratio
#[cfg(feature = "image")]
pub fn select_filter(
    orig_width: u32,
    orig_height: u32,
    new_width: u32,
    new_height: u32,
) -> image::imageops::FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        image::imageops::FilterType::Triangle
    } else if max_ratio > 1.5 {
        image::imageops::FilterType::CatmullRom
    } else {
        image::imageops::FilterType::Lanczos3
    }
}

/// Resize to exact dimensions; returns the input untouched when nothing changes.
#[cfg(feature = "image")]
pub fn resize_to(img: image::DynamicImage, width: u32, height: u32) -> image::DynamicImage {
    use image::GenericImageView;

    let (orig_width, orig_height) = img.dimensions();
    if (orig_width, orig_height) == (width, height) {
        return img;
    }
    let filter = select_filter(orig_width, orig_height, width, height);
    img.resize_exact(width, height, filter)
}
