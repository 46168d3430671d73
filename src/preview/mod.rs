//! On-demand previews.
//!
//! - [`key`]: parse `<path>@<dimension>` request identifiers
//! - [`cache`]: look up, generate, and optionally persist previews
//! - [`worker`]: the rayon pool that runs resize jobs

pub mod cache;
pub mod key;
pub mod worker;

pub use cache::{CacheSettings, CacheStats, PreviewArtifact, PreviewCache, PreviewError};
pub use key::{KeyError, PreviewKey};
pub use worker::{ResizePool, WorkerError};
