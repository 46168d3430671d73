//! HTTP Basic authentication.
//!
//! When a users file is configured every route sits behind
//! [`require_credentials`]. The middleware resolves the request to an
//! [`Identity`] and stores it in the request extensions, where handlers pick
//! it up to evaluate access policies. Without a users file every request is
//! [`Identity::Anonymous`], which is unrestricted.

use crate::server::{AppState, GalleryError};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use tracing::debug;

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Authentication is disabled.
    Anonymous,
    User(String),
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Anonymous => f.write_str("<anonymous>"),
            Identity::User(name) => f.write_str(name),
        }
    }
}

/// Credentials carried in an `Authorization: Basic ...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub user: String,
    pub password: String,
}

/// Extract Basic credentials. Anything malformed counts as absent.
pub fn basic_credentials(headers: &HeaderMap) -> Option<BasicCredentials> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some(BasicCredentials {
        user: user.to_string(),
        password: password.to_string(),
    })
}

/// Middleware that authenticates the request and attaches an [`Identity`].
pub async fn require_credentials(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(users) = state.users.as_deref() else {
        request.extensions_mut().insert(Identity::Anonymous);
        return next.run(request).await;
    };

    let realm = state.config.auth.realm.clone();
    let Some(credentials) = basic_credentials(request.headers()) else {
        return GalleryError::Unauthorized {
            realm,
            message: "No credentials provided",
        }
        .into_response();
    };

    if !users.verify(&credentials.user, &credentials.password) {
        debug!(user = %credentials.user, "credentials rejected");
        return GalleryError::Unauthorized {
            realm,
            message: "Credentials rejected",
        }
        .into_response();
    }

    request
        .extensions_mut()
        .insert(Identity::User(credentials.user));
    next.run(request).await
}
