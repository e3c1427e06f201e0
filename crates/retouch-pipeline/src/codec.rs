//! Image decoding and PNG encoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the RGBA
//! buffer the filters operate on, and turns a filtered buffer back into
//! PNG bytes for export. Both directions work on in-memory byte slices;
//! reading and writing files is left to the caller.

use image::{ExtendedColorType, ImageEncoder, codecs::png::PngEncoder};

use crate::types::{PipelineError, RgbaImage};

/// Decode raw image bytes into an 8-bit RGBA buffer.
///
/// Supports whatever formats the `image` crate was built with (PNG,
/// JPEG, BMP and WebP in this workspace). Images without an alpha
/// channel decode as fully opaque.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    log::debug!(
        "decoded {} bytes into {}x{} image ({:?})",
        bytes.len(),
        img.width(),
        img.height(),
        img.color(),
    );
    Ok(img.to_rgba8())
}

/// Encode an RGBA buffer as PNG bytes.
///
/// # Errors
///
/// Returns [`PipelineError::ImageEncode`] if the encoder rejects the
/// image.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(PipelineError::ImageEncode)?;
    Ok(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_returns_error() {
        let result = decode(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn png_round_trip_preserves_pixels() {
        #[allow(clippy::cast_possible_truncation)]
        let img = RgbaImage::from_fn(17, 31, |x, y| {
            image::Rgba([(x * 15) as u8, (y * 8) as u8, 64, (x + y) as u8])
        });
        let png = encode_png(&img).unwrap();
        let decoded = decode(&png).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn opaque_formats_decode_with_full_alpha() {
        let rgb = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(rgb.as_raw(), 3, 2, ExtendedColorType::Rgb8)
            .unwrap();

        let decoded = decode(&buf).unwrap();
        for pixel in decoded.pixels() {
            assert_eq!(pixel.0, [10, 20, 30, 255]);
        }
    }

    #[test]
    fn encoded_bytes_start_with_png_signature() {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
