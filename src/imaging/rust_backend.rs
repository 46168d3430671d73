//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image` crate, format sniffed from the bytes |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → PNG, GIF, TIFF, WebP | `DynamicImage::write_to` (lossless for WebP) |
//!
//! Decoding sniffs the container instead of trusting the extension, so a PNG
//! saved as `.jpg` still decodes. The output codec always follows the
//! extension the caller asked for.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(source: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode(e.to_string()))
}

/// Decode an in-memory image, whatever its container.
fn load_image(source: &[u8]) -> Result<DynamicImage, BackendError> {
    reader(source)?
        .decode()
        .map_err(|e| BackendError::Decode(e.to_string()))
}

/// Encode `img` as `format`. JPEG honours `quality`; the other codecs are lossless.
fn encode_image(
    img: &DynamicImage,
    format: ImageFormat,
    quality: u32,
) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let result = match format {
        ImageFormat::Jpeg => {
            // JPEG carries no alpha channel and only 8-bit samples
            let img = match img {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img.clone(),
                other => DynamicImage::ImageRgb8(other.to_rgb8()),
            };
            let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100) as u8);
            img.write_with_encoder(encoder)
        }
        ImageFormat::Gif | ImageFormat::WebP => {
            let img = DynamicImage::ImageRgba8(img.to_rgba8());
            img.write_to(&mut Cursor::new(&mut out), format)
        }
        other => img.write_to(&mut Cursor::new(&mut out), other),
    };
    match result {
        Ok(()) => Ok(out),
        Err(e) => Err(BackendError::Encode(format!("{format:?}: {e}"))),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(source)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, source: &[u8], params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
        let img = load_image(source)?;
        let resized = if img.width() == params.width && img.height() == params.height {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };
        encode_image(&resized, params.format, params.quality.value())
    }
}
