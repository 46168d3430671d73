//! Preview request identifiers.
//!
//! On the wire a preview is requested as `<path>@<dimension>`, e.g.
//! `vacation/beach/IMG_01.jpg@150`. The split happens at the **last** `@`, so
//! filenames that contain `@` themselves still parse:
//!
//! - `"a/b/c.jpg@150"` → path=`a/b/c.jpg`, dimension=150
//! - `"me@home.jpg@64"` → path=`me@home.jpg`, dimension=64
//! - `"a/b/c.jpg@"` → `InvalidDimension`
//! - `"a/b/c.jpg"` → `MalformedKey`

use crate::types::{PathError, ResourcePath};
use std::fmt;
use std::num::NonZeroU32;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("malformed preview key: {0}")]
    MalformedKey(&'static str),
    #[error("invalid preview dimension `{0}`")]
    InvalidDimension(String),
}

impl From<PathError> for KeyError {
    fn from(_: PathError) -> Self {
        KeyError::MalformedKey("invalid path")
    }
}

/// A source file plus the bounding box its preview must fit inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewKey {
    pub path: ResourcePath,
    pub dimension: NonZeroU32,
}

impl PreviewKey {
    pub fn new(path: ResourcePath, dimension: NonZeroU32) -> Self {
        Self { path, dimension }
    }

    /// Parse the textual `<path>@<dimension>` form.
    pub fn parse(request_id: &str) -> Result<Self, KeyError> {
        let (raw_path, raw_dim) = request_id
            .rsplit_once('@')
            .ok_or(KeyError::MalformedKey("missing `@<dimension>` suffix"))?;

        let path = ResourcePath::parse(raw_path)?;
        if path.is_root() {
            return Err(KeyError::MalformedKey("empty path"));
        }

        let dimension = parse_dimension(raw_dim)?;
        Ok(Self::new(path, dimension))
    }
}

/// Strict base-10 positive integer: no sign, no whitespace, no zero.
fn parse_dimension(raw: &str) -> Result<NonZeroU32, KeyError> {
    let invalid = || KeyError::InvalidDimension(raw.to_string());
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    raw.parse::<NonZeroU32>().map_err(|_| invalid())
}

impl fmt::Display for PreviewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.dimension)
    }
}
