//! # Simple Gallery
//!
//! A small HTTP server that publishes a directory tree of photos and videos.
//! The filesystem is the only data source: directories become listing pages,
//! files are served as-is, and image previews are produced on demand.
//!
//! # Request Flow
//!
//! ```text
//! request ─► auth (Basic, optional) ─► route
//!              │                ├─ <html_base>…       listing  ─► policy ─► HTML
//!              │                ├─ <files_base>…      original ─► file bytes
//!              │                └─ <previews_base>…@N preview  ─► cache ─► resize pool
//!              └─ 401 + WWW-Authenticate
//! ```
//!
//! Previews are keyed by `(path, size)`. Concurrent requests for the same key
//! share one resize job, and with `previews.persist` the result is written to
//! a mirror tree under the previews root so later requests skip decoding.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Layered configuration: stock defaults, `config.toml`, environment |
//! | [`types`] | Validated gallery-relative paths and URL encoding |
//! | [`access`] | Allow/deny policies and their evaluation against paths |
//! | [`users`] | Users file loading and credential checks |
//! | [`auth`] | Basic auth middleware that resolves an identity per request |
//! | [`media`] | Extension → media kind, MIME type, image format |
//! | [`listing`] | Directory reads for listing pages |
//! | [`render`] | Maud templates for listing pages |
//! | [`imaging`] | Image decode/resize/encode behind a backend trait |
//! | [`preview`] | Preview keys, the single-flight cache, and the resize pool |
//! | [`server`] | Router, shared state, handlers, error responses |
//! | [`check`] | Startup diagnostics for the `check` command |
//! | [`output`] | CLI formatting of check reports |
//! | [`observability`] | Tracing subscriber setup |

pub mod access;
pub mod auth;
pub mod check;
pub mod config;
pub mod imaging;
pub mod listing;
pub mod media;
pub mod observability;
pub mod output;
pub mod preview;
pub mod render;
pub mod server;
pub mod types;
pub mod users;

#[cfg(test)]
pub(crate) mod test_helpers;
