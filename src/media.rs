//! File classification by extension.
//!
//! | Extension | Kind | Content-Type | Resizable |
//! |---|---|---|---|
//! | `jpg`, `jpeg` | image | `image/jpeg` | yes |
//! | `png` | image | `image/png` | yes |
//! | `gif` | image | `image/gif` | yes (first frame) |
//! | `webp` | image | `image/webp` | yes (lossless output) |
//! | `tif`, `tiff` | image | `image/tiff` | yes |
//! | `mp4`, `m4v` | video | `video/mp4` | no |
//! | `webm` | video | `video/webm` | no |
//! | `mov` | video | `video/quicktime` | no |
//! | anything else | other | none | no |
//!
//! The extension is the only signal: file contents are never sniffed here.

use crate::types::ResourcePath;
use image::ImageFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

struct MediaType {
    ext: &'static str,
    kind: MediaKind,
    mime: &'static str,
    format: Option<ImageFormat>,
}

const fn image_type(ext: &'static str, mime: &'static str, format: ImageFormat) -> MediaType {
    MediaType {
        ext,
        kind: MediaKind::Image,
        mime,
        format: Some(format),
    }
}

const fn video_type(ext: &'static str, mime: &'static str) -> MediaType {
    MediaType {
        ext,
        kind: MediaKind::Video,
        mime,
        format: None,
    }
}

const MEDIA_TYPES: &[MediaType] = &[
    image_type("jpg", "image/jpeg", ImageFormat::Jpeg),
    image_type("jpeg", "image/jpeg", ImageFormat::Jpeg),
    image_type("png", "image/png", ImageFormat::Png),
    image_type("gif", "image/gif", ImageFormat::Gif),
    image_type("webp", "image/webp", ImageFormat::WebP),
    image_type("tif", "image/tiff", ImageFormat::Tiff),
    image_type("tiff", "image/tiff", ImageFormat::Tiff),
    video_type("mp4", "video/mp4"),
    video_type("m4v", "video/mp4"),
    video_type("webm", "video/webm"),
    video_type("mov", "video/quicktime"),
];

fn lookup(path: &ResourcePath) -> Option<&'static MediaType> {
    let ext = path.extension()?;
    MEDIA_TYPES.iter().find(|m| m.ext == ext)
}

pub fn classify(path: &ResourcePath) -> MediaKind {
    lookup(path).map(|m| m.kind).unwrap_or(MediaKind::Other)
}

/// Content type to announce for `path`, if the extension is known.
pub fn content_type(path: &ResourcePath) -> Option<&'static str> {
    lookup(path).map(|m| m.mime)
}

/// Codec used to re-encode previews of `path`.
pub fn image_format(path: &ResourcePath) -> Option<ImageFormat> {
    lookup(path).and_then(|m| m.format)
}
