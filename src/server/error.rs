//! HTTP error responses.
//!
//! Handlers return [`GalleryError`]; its [`IntoResponse`] impl picks the
//! status and a short body. Internal detail (I/O errors, decoder messages)
//! is logged and never sent to the client.

use crate::listing::ListingError;
use crate::preview::{KeyError, PreviewError};
use crate::render::render_message;
use crate::types::PathError;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("not found")]
    NotFound,
    #[error("access denied for {identity} on {path}")]
    Forbidden { identity: String, path: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("authentication required: {message}")]
    Unauthorized {
        realm: String,
        message: &'static str,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PathError> for GalleryError {
    fn from(err: PathError) -> Self {
        GalleryError::BadRequest(err.to_string())
    }
}

impl From<KeyError> for GalleryError {
    fn from(err: KeyError) -> Self {
        GalleryError::BadRequest(err.to_string())
    }
}

impl From<PreviewError> for GalleryError {
    fn from(err: PreviewError) -> Self {
        match err {
            PreviewError::SourceNotFound(_) => GalleryError::NotFound,
            PreviewError::UnsupportedFormat(_) | PreviewError::DimensionTooLarge { .. } => {
                GalleryError::BadRequest(err.to_string())
            }
            PreviewError::ResizeFailed(_) | PreviewError::Io(_) => {
                GalleryError::Internal(err.to_string())
            }
        }
    }
}

impl From<ListingError> for GalleryError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::NotFound(_) | ListingError::NotADirectory(_) => GalleryError::NotFound,
            ListingError::Io(e) => GalleryError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        match self {
            GalleryError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            GalleryError::Forbidden { identity, path } => {
                info!(%identity, %path, "access denied");
                (StatusCode::FORBIDDEN, "Access denied").into_response()
            }
            GalleryError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
            GalleryError::Unauthorized { realm, message } => {
                let body = render_message(message);
                let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
                // Realm is validated at startup to contain no quotes
                if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{realm}\"")) {
                    response
                        .headers_mut()
                        .insert(header::WWW_AUTHENTICATE, value);
                }
                response
            }
            GalleryError::Internal(detail) => {
                error!(%detail, "request failed");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, "Internal server error").into_response()
            }
        }
    }
}
