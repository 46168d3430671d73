//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_inside;
use super::params::{Quality, ResizeParams};
use image::ImageFormat;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &(impl ImageBackend + ?Sized), source: &[u8]) -> Result<(u32, u32)> {
    let dims = backend.identify(source)?;
    Ok((dims.width, dims.height))
}

/// Configuration for a single preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConfig {
    /// Bounding box edge, in pixels.
    pub max_dimension: u32,
    pub format: ImageFormat,
    pub quality: Quality,
}

/// Plan a preview resize without executing it.
pub fn plan_preview(original_dims: (u32, u32), config: &PreviewConfig) -> ResizeParams {
    let (width, height) = fit_inside(original_dims, config.max_dimension);
    ResizeParams {
        width,
        height,
        format: config.format,
        quality: config.quality,
    }
}

/// Create a preview of `source` that fits inside `config.max_dimension`.
///
/// Returns the encoded bytes. Sources already inside the box are re-encoded
/// at their own size.
pub fn create_preview(
    backend: &(impl ImageBackend + ?Sized),
    source: &[u8],
    config: &PreviewConfig,
) -> Result<Vec<u8>> {
    let dims = get_dimensions(backend, source)?;
    let params = plan_preview(dims, config);
    backend.resize(source, &params)
}
