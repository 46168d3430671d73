//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify and resize. Both work on in-memory bytes; reading the
//! source and persisting the result belong to the preview cache.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate's pure Rust codecs.

use super::params::ResizeParams;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Send + Sync` so one backend can be shared by every worker thread.
pub trait ImageBackend: Send + Sync {
    /// Read image dimensions, ideally from the header alone.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode `source`, scale it to exactly `params.width` x `params.height`
    /// and encode the result as `params.format`.
    fn resize(&self, source: &[u8], params: &ResizeParams) -> Result<Vec<u8>, BackendError>;
}
