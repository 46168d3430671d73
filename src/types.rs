//! Shared types used across the access, preview, and listing modules.
//!
//! [`ResourcePath`] is the one path type that crosses module boundaries. It is
//! always relative to the gallery root and can never climb out of it, so every
//! consumer can `join` it onto a root directory without re-checking.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path escapes the gallery root")]
    ParentTraversal,
    #[error("path contains a NUL byte")]
    NulByte,
    #[error("path contains a backslash")]
    Backslash,
}

/// A normalized, slash-separated path relative to the gallery root.
///
/// Normalization drops empty segments and `.`; `..` is rejected outright
/// rather than resolved, so `a/../b` is an error and not `b`. The empty path
/// is the gallery root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// The gallery root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a decoded request path such as `vacation/beach/` or `/a//b.jpg`.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.contains('\0') {
            return Err(PathError::NulByte);
        }
        if raw.contains('\\') {
            return Err(PathError::Backslash);
        }
        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(PathError::ParentTraversal),
                s => segments.push(s.to_string()),
            }
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Lowercased extension of the last segment, without the dot.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Path of the containing directory. The root is its own parent.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    pub fn join(&self, name: &str) -> Result<Self, PathError> {
        let mut joined = self.segments.clone();
        joined.extend(Self::parse(name)?.segments);
        Ok(Self { segments: joined })
    }

    /// True when any segment is a dotfile (`.git`, `.thumbs`, ...).
    pub fn has_hidden_segment(&self) -> bool {
        self.segments.iter().any(|s| s.starts_with('.'))
    }

    /// True when `self` equals `other` or lies beneath it, compared by segment.
    pub fn starts_with(&self, other: &ResourcePath) -> bool {
        self.segments.get(..other.segments.len()) == Some(&other.segments[..])
    }

    /// Resolve onto a filesystem root.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Percent-encode a string the way a browser's `encodeURIComponent` does.
///
/// Unreserved characters (`A-Z a-z 0-9 - _ . ! ~ * ' ( )`) pass through; every
/// other byte of the UTF-8 encoding becomes `%XX`.
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

/// Build a URL for `path` under a route base, encoding each segment.
///
/// `base` is expected to end with `/` (validated in config).
pub fn route_url(base: &str, path: &ResourcePath) -> String {
    let encoded: Vec<String> = path
        .segments()
        .iter()
        .map(|s| encode_component(s))
        .collect();
    format!("{}{}", base, encoded.join("/"))
}
