//! Directory listings for the HTML gallery.
//!
//! Reads one directory under the photos root and classifies what it finds:
//!
//! ```text
//! photos/vacation/
//! ├── .thumbs/          # skipped (hidden)
//! ├── beach/            # Directory
//! ├── city/             # Directory
//! ├── clip.mp4          # Video
//! ├── IMG_01.jpg        # Image
//! └── notes.txt         # Other
//! ```
//!
//! Directories sort first, then everything by name. Symlinks are followed;
//! dangling links and names that are not valid UTF-8 are skipped.
//! Access filtering is left to the caller, see [`Listing::retain_directories`].

use crate::media::{self, MediaKind};
use crate::types::ResourcePath;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Directory,
    Image,
    Video,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub path: ResourcePath,
    pub kind: EntryKind,
}

impl ListingEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Contents of one gallery directory, already sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub path: ResourcePath,
    pub entries: Vec<ListingEntry>,
}

impl Listing {
    /// Drop subdirectories for which `allowed` returns false.
    ///
    /// Files are kept: they share the visibility of the directory being listed.
    pub fn retain_directories(&mut self, mut allowed: impl FnMut(&ResourcePath) -> bool) {
        self.entries.retain(|e| !e.is_dir() || allowed(&e.path));
    }

    pub fn directories(&self) -> impl Iterator<Item = &ListingEntry> {
        self.entries.iter().filter(|e| e.is_dir())
    }

    pub fn files(&self) -> impl Iterator<Item = &ListingEntry> {
        self.entries.iter().filter(|e| !e.is_dir())
    }
}

/// Read `path` (relative to `root`) as a gallery directory.
pub async fn read_listing(root: &Path, path: &ResourcePath) -> Result<Listing, ListingError> {
    let dir = path.to_fs_path(root);
    let meta = match tokio::fs::metadata(&dir).await {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ListingError::NotFound(path.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    if !meta.is_dir() {
        return Err(ListingError::NotADirectory(path.to_string()));
    }

    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(&dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            debug!(dir = %dir.display(), "skipping non UTF-8 entry name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        // Follow symlinks; a dangling link has no metadata
        let Ok(meta) = tokio::fs::metadata(entry.path()).await else {
            debug!(entry = %entry.path().display(), "skipping unreadable entry");
            continue;
        };
        let Ok(entry_path) = path.join(&name) else {
            continue;
        };
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else {
            match media::classify(&entry_path) {
                MediaKind::Image => EntryKind::Image,
                MediaKind::Video => EntryKind::Video,
                MediaKind::Other => EntryKind::Other,
            }
        };
        entries.push(ListingEntry {
            name,
            path: entry_path,
            kind,
        });
    }

    sort_entries(&mut entries);
    Ok(Listing {
        path: path.clone(),
        entries,
    })
}

/// Directories first, then by name.
fn sort_entries(entries: &mut [ListingEntry]) {
    entries.sort_by(|a, b| {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| a.name.cmp(&b.name))
    });
}
