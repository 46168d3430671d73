//! Route handlers.
//!
//! | Route | Handler | Success |
//! |---|---|---|
//! | `<html_base>` | [`root_listing`] | HTML listing of the gallery root |
//! | `<html_base>*path` | [`listing`] | HTML listing of a directory |
//! | `<files_base>*path` | [`original`] | File bytes, typed by extension |
//! | `<previews_base>*path` | [`preview`] | Preview bytes with an `ETag` |
//!
//! Listings always run the access policy on the requested directory. The
//! file and preview routes only do so on the parent directory when
//! `access.enforce_on_media` is set.

use super::{AppState, GalleryError};
use crate::auth::Identity;
use crate::listing::read_listing;
use crate::media;
use crate::preview::PreviewKey;
use crate::render::render_listing;
use crate::types::ResourcePath;
use axum::Extension;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use maud::Markup;
use sha2::{Digest, Sha256};
use tracing::debug;

type Result<T> = std::result::Result<T, GalleryError>;

/// Parse a captured route path. Hidden segments are reported as missing.
fn resource_path(raw: &str) -> Result<ResourcePath> {
    let path = ResourcePath::parse(raw)?;
    if path.has_hidden_segment() {
        return Err(GalleryError::NotFound);
    }
    Ok(path)
}

fn authorize(state: &AppState, identity: &Identity, path: &ResourcePath) -> Result<()> {
    let profile = state.profile_for(identity);
    if state.evaluator.is_allowed(&profile, path) {
        Ok(())
    } else {
        Err(GalleryError::Forbidden {
            identity: identity.to_string(),
            path: path.to_string(),
        })
    }
}

fn authorize_media(state: &AppState, identity: &Identity, path: &ResourcePath) -> Result<()> {
    if state.config.access.enforce_on_media {
        authorize(state, identity, &path.parent())
    } else {
        Ok(())
    }
}

async fn render_directory(
    state: &AppState,
    identity: &Identity,
    path: ResourcePath,
) -> Result<Markup> {
    authorize(state, identity, &path)?;

    let mut listing = read_listing(&state.config.paths.photos_root, &path).await?;
    let profile = state.profile_for(identity);
    listing.retain_directories(|dir| state.evaluator.is_allowed(&profile, dir));
    debug!(%identity, path = %path, entries = listing.entries.len(), "listing rendered");

    Ok(render_listing(&listing, &state.links))
}

pub async fn root_listing(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Markup> {
    render_directory(&state, &identity, ResourcePath::root()).await
}

pub async fn listing(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(raw): Path<String>,
) -> Result<Markup> {
    let path = resource_path(&raw)?;
    render_directory(&state, &identity, path).await
}

pub async fn original(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(raw): Path<String>,
) -> Result<Response> {
    let path = resource_path(&raw)?;
    if path.is_root() {
        return Err(GalleryError::NotFound);
    }
    authorize_media(&state, &identity, &path)?;

    let file = path.to_fs_path(&state.config.paths.photos_root);
    let is_file = tokio::fs::metadata(&file)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(GalleryError::NotFound);
    }
    let bytes = match tokio::fs::read(&file).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let detail = format!("reading {}: {e}", file.display());
            return Err(GalleryError::Internal(detail));
        }
    };

    let mut response = bytes.into_response();
    if let Some(mime) = media::content_type(&path) {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
    }
    Ok(response)
}

pub async fn preview(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(raw): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let key = PreviewKey::parse(&raw)?;
    if key.path.has_hidden_segment() {
        return Err(GalleryError::NotFound);
    }
    authorize_media(&state, &identity, &key.path)?;

    let artifact = state.previews.get_or_create(&key).await?;
    let etag = format!("\"{:x}\"", Sha256::digest(&artifact.bytes));
    let etag_value = HeaderValue::from_str(&etag)
        .map_err(|e| GalleryError::Internal(format!("etag header: {e}")))?;

    if etag_matches(&headers, &etag) {
        let headers = [(header::ETAG, etag_value)];
        return Ok((StatusCode::NOT_MODIFIED, headers).into_response());
    }

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(artifact.mime)),
        (header::ETAG, etag_value),
    ];
    Ok((headers, artifact.bytes.clone()).into_response())
}

/// True when `If-None-Match` lists `etag` (or `*`).
fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|tag| tag.trim().trim_start_matches("W/"))
        .any(|tag| tag == "*" || tag == etag)
}

pub async fn not_found() -> GalleryError {
    GalleryError::NotFound
}
