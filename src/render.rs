//! HTML rendering.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping, so file
//! names taken straight from disk are safe to interpolate.
//!
//! ## Pages
//!
//! - **Listing**: one gallery directory. Heading, "Up" link, then
//!   subdirectories followed by files. Images show a preview thumbnail and
//!   link to the original; videos and other files link to the original.
//! - **Message**: a bare heading, used for authentication challenges and
//!   error responses.
//!
//! Styling is the Pico classless theme from a CDN plus `static/style.css`,
//! embedded at compile time.

use crate::config::GalleryConfig;
use crate::listing::{EntryKind, Listing, ListingEntry};
use crate::types::{ResourcePath, route_url};
use maud::{DOCTYPE, Markup, html};

const CSS: &str = include_str!("../static/style.css");
const PICO_CSS: &str =
    "https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.fluid.classless.lime.min.css";

/// Builds the URLs rendered pages link to.
#[derive(Debug, Clone)]
pub struct Links {
    pub html_base: String,
    pub files_base: String,
    pub previews_base: String,
    /// Bounding box of listing thumbnails.
    pub preview_size: u32,
}

impl Links {
    pub fn from_config(config: &GalleryConfig) -> Self {
        Self {
            html_base: config.routes.html_base.clone(),
            files_base: config.routes.files_base.clone(),
            previews_base: config.routes.previews_base.clone(),
            preview_size: config.previews.default_size,
        }
    }

    pub fn listing(&self, path: &ResourcePath) -> String {
        route_url(&self.html_base, path)
    }

    pub fn file(&self, path: &ResourcePath) -> String {
        route_url(&self.files_base, path)
    }

    pub fn preview(&self, path: &ResourcePath) -> String {
        let url = route_url(&self.previews_base, path);
        format!("{url}@{}", self.preview_size)
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="color-scheme" content="light dark";
                link rel="stylesheet" href=(PICO_CSS);
                style { (CSS) }
                title { (title) }
            }
            body {
                main {
                    (content)
                }
            }
        }
    }
}

fn render_entry(entry: &ListingEntry, links: &Links) -> Markup {
    let icon = match entry.kind {
        EntryKind::Video => "🎞️",
        _ => "📄",
    };
    html! {
        @match entry.kind {
            EntryKind::Directory => {}
            EntryKind::Image => {
                a href=(links.file(&entry.path)) {
                    figure {
                        img src=(links.preview(&entry.path)) alt=(entry.name) loading="lazy";
                        figcaption { (entry.name) }
                    }
                }
            }
            EntryKind::Video | EntryKind::Other => {
                a href=(links.file(&entry.path)) {
                    figure {
                        span.file-icon { (icon) }
                        figcaption { (entry.name) }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders a gallery directory listing
pub fn render_listing(listing: &Listing, links: &Links) -> Markup {
    let heading = if listing.path.is_root() {
        "Home".to_string()
    } else {
        listing.path.to_string()
    };

    let content = html! {
        header {
            h1 { (heading) }
        }
        @if !listing.path.is_root() {
            a.up-link href=(links.listing(&listing.path.parent())) {
                h4 { "⬆️ Up" }
            }
        }
        @for dir in listing.directories() {
            h4 {
                a href=(links.listing(&dir.path)) { "📁 " (dir.name) }
            }
        }
        div.entries {
            @for file in listing.files() {
                (render_entry(file, links))
            }
        }
    };

    base_document("Simple Gallery", content)
}

/// Renders a page holding a single heading
pub fn render_message(message: &str) -> Markup {
    base_document("Simple Gallery", html! { h1 { (message) } })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Links {
        Links::from_config(&GalleryConfig::default())
    }

    fn path(s: &str) -> ResourcePath {
        ResourcePath::parse(s).unwrap()
    }

    fn entry(p: &str, kind: EntryKind) -> ListingEntry {
        let path = path(p);
        ListingEntry {
            name: path.file_name().unwrap().to_string(),
            path,
            kind,
        }
    }

    fn vacation() -> Listing {
        Listing {
            path: path("vacation"),
            entries: vec![
                entry("vacation/beach", EntryKind::Directory),
                entry("vacation/IMG 01.jpg", EntryKind::Image),
                entry("vacation/clip.mp4", EntryKind::Video),
                entry("vacation/notes.txt", EntryKind::Other),
            ],
        }
    }

    // =========================================================================
    // Links
    // =========================================================================

    #[test]
    fn links_use_configured_bases() {
        let l = links();
        let p = path("vacation/IMG 01.jpg");
        assert_eq!(l.listing(&p.parent()), "/gallery/vacation");
        assert_eq!(l.file(&p), "/galleryfiles/vacation/IMG%2001.jpg");
        assert_eq!(l.preview(&p), "/gallerypreviews/vacation/IMG%2001.jpg@150");
    }

    #[test]
    fn preview_link_keeps_at_sign_in_file_name_encoded() {
        let l = links();
        assert_eq!(
            l.preview(&path("me@home.jpg")),
            "/gallerypreviews/me%40home.jpg@150"
        );
    }

    // =========================================================================
    // Components
    // =========================================================================

    #[test]
    fn base_document_includes_doctype() {
        let doc = base_document("Test", html! { p { "test" } }).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("pico"));
    }

    // =========================================================================
    // Page renderer tests
    // =========================================================================

    #[test]
    fn listing_heading_is_path() {
        let html = render_listing(&vacation(), &links()).into_string();
        assert!(html.contains("<h1>vacation</h1>"));
    }

    #[test]
    fn root_listing_heading_is_home_without_up_link() {
        let listing = Listing {
            path: ResourcePath::root(),
            entries: vec![],
        };
        let html = render_listing(&listing, &links()).into_string();
        assert!(html.contains("<h1>Home</h1>"));
        assert!(!html.contains("⬆️ Up"));
    }

    #[test]
    fn up_link_points_to_parent() {
        let listing = Listing {
            path: path("vacation/beach"),
            entries: vec![],
        };
        let html = render_listing(&listing, &links()).into_string();
        assert!(html.contains(r#"href="/gallery/vacation""#));
    }

    #[test]
    fn up_link_from_top_level_points_to_root() {
        let html = render_listing(&vacation(), &links()).into_string();
        assert!(html.contains(r#"href="/gallery/""#));
    }

    #[test]
    fn directories_link_to_listing_route() {
        let html = render_listing(&vacation(), &links()).into_string();
        assert!(html.contains(r#"href="/gallery/vacation/beach""#));
        assert!(html.contains("📁 beach"));
    }

    #[test]
    fn images_show_preview_and_link_to_original() {
        let html = render_listing(&vacation(), &links()).into_string();
        assert!(html.contains(r#"href="/galleryfiles/vacation/IMG%2001.jpg""#));
        assert!(html.contains(r#"src="/gallerypreviews/vacation/IMG%2001.jpg@150""#));
        assert!(html.contains("<figcaption>IMG 01.jpg</figcaption>"));
    }

    #[test]
    fn videos_and_other_files_link_to_original_without_preview() {
        let html = render_listing(&vacation(), &links()).into_string();
        assert!(html.contains(r#"href="/galleryfiles/vacation/clip.mp4""#));
        assert!(html.contains(r#"href="/galleryfiles/vacation/notes.txt""#));
        assert!(!html.contains("clip.mp4@"));
        assert!(!html.contains("notes.txt@"));
    }

    #[test]
    fn message_page_has_heading() {
        let html = render_message("Credentials rejected").into_string();
        assert!(html.contains("<h1>Credentials rejected</h1>"));
    }

    #[test]
    fn html_escape_in_maud() {
        let hostile = entry("x/<img src=x onerror=alert(1)>.txt", EntryKind::Other);
        let listing = Listing {
            path: path("x"),
            entries: vec![hostile],
        };
        let html = render_listing(&listing, &links()).into_string();

        assert!(!html.contains("<img src=x"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;.txt"));
    }
}
