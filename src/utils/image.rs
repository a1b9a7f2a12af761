// Photo resize/re-encode used by the import pipeline.
// Pure function: image bytes in, resized JPEG bytes out.

use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

/// Longest-side cap applied before re-upload
pub const MAX_PHOTO_DIMENSION: u32 = 1200;

/// JPEG quality for re-encoded photos
const JPEG_QUALITY: u8 = 85;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Resize an image so its longest side is at most `max_dimension`,
/// preserving aspect ratio, and re-encode it as JPEG. Images already
/// within bounds are still re-encoded so stored photos share one format.
pub fn resize_image(bytes: &[u8], max_dimension: u32) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;

    let resized = if img.width() > max_dimension || img.height() > max_dimension {
        img.thumbnail(max_dimension, max_dimension)
    } else {
        img
    };

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    resized
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| ImageError::Encode(e.to_string()))?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 80, 200]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_oversized_image_is_capped() {
        let bytes = png_bytes(2400, 1200);
        let out = resize_image(&bytes, MAX_PHOTO_DIMENSION).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 1200);
        assert_eq!(decoded.height(), 600);
    }

    #[test]
    fn test_small_image_keeps_dimensions() {
        let bytes = png_bytes(300, 200);
        let out = resize_image(&bytes, MAX_PHOTO_DIMENSION).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 200));
    }

    #[test]
    fn test_output_is_jpeg() {
        let bytes = png_bytes(100, 100);
        let out = resize_image(&bytes, MAX_PHOTO_DIMENSION).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_garbage_input_fails_decode() {
        assert!(matches!(
            resize_image(b"not an image", MAX_PHOTO_DIMENSION),
            Err(ImageError::Decode(_))
        ));
    }
}
