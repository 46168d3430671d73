//! HTTP application wiring.
//!
//! Builds the axum router, installs middleware, and defines the shared state
//! injected into handlers. [`run`] is what the `serve` command calls.

mod error;
pub mod handlers;

pub use error::GalleryError;

use crate::access::{AccessProfile, PolicyEvaluator};
use crate::auth::{Identity, require_credentials};
use crate::config::{GalleryConfig, effective_threads};
use crate::imaging::{ImageBackend, RustBackend};
use crate::preview::{CacheSettings, PreviewCache, ResizePool, WorkerError};
use crate::render::Links;
use crate::users::UserRegistry;
use anyhow::Context;
use axum::Router;
use axum::middleware;
use axum::routing::get;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GalleryConfig>,
    /// `None` when authentication is disabled.
    pub users: Option<Arc<UserRegistry>>,
    pub evaluator: Arc<PolicyEvaluator>,
    pub previews: Arc<PreviewCache>,
    pub links: Arc<Links>,
}

impl AppState {
    pub fn new(
        config: GalleryConfig,
        users: Option<UserRegistry>,
        backend: Arc<dyn ImageBackend>,
    ) -> Result<Self, WorkerError> {
        let pool = Arc::new(ResizePool::new(effective_threads(&config.processing))?);
        let previews = PreviewCache::new(CacheSettings::from_config(&config), backend, pool);
        let mode = config.access.match_mode;
        let evaluator = PolicyEvaluator::new(config.routes.html_base.clone(), mode);
        let links = Links::from_config(&config);
        Ok(Self {
            config: Arc::new(config),
            users: users.map(Arc::new),
            evaluator: Arc::new(evaluator),
            previews: Arc::new(previews),
            links: Arc::new(links),
        })
    }

    /// Access profile for an authenticated identity.
    pub fn profile_for(&self, identity: &Identity) -> AccessProfile {
        match (identity, self.users.as_deref()) {
            (Identity::User(name), Some(users)) => users.profile_for(name),
            (Identity::Anonymous, None) => AccessProfile::All,
            _ => AccessProfile::None,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let routes = &state.config.routes;
    let html_root = routes.html_base.clone();
    let html = format!("{}*path", routes.html_base);
    let files = format!("{}*path", routes.files_base);
    let previews = format!("{}*path", routes.previews_base);

    Router::new()
        .route(&html_root, get(handlers::root_listing))
        .route(&html, get(handlers::listing))
        .route(&files, get(handlers::original))
        .route(&previews, get(handlers::preview))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), require_credentials))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load the users file (if any), bind, and serve until Ctrl-C.
pub async fn run(config: GalleryConfig) -> anyhow::Result<()> {
    let users = match &config.auth.users_file {
        Some(path) => {
            let registry = UserRegistry::load(path)?;
            info!(users = registry.len(), file = %path.display(), "loaded users for basic auth");
            Some(registry)
        }
        None => {
            info!("authentication disabled, every request is unrestricted");
            None
        }
    };

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let backend: Arc<dyn ImageBackend> = Arc::new(RustBackend::new());
    let state = AppState::new(config, users, backend)?;
    info!(
        photos = %state.config.paths.photos_root.display(),
        previews = %state.config.paths.previews_root.display(),
        persist = state.previews.persistent(),
        match_mode = ?state.evaluator.mode(),
        "gallery configured"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "server listening");

    let previews = Arc::clone(&state.previews);
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!(previews = %previews.stats(), "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed
        std::future::pending::<()>().await;
    }
}
