//! Server configuration module.
//!
//! Handles loading, validating, and layering the gallery configuration.
//! Values are resolved in this order, later layers winning:
//!
//! ```text
//! stock defaults  →  config.toml (--config)  →  environment variables
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! log_level = "info"          # error | info | debug
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 80
//!
//! [paths]
//! photos_root = "/photos"     # Gallery root served read-only
//! previews_root = "/previews" # Where persistent previews are written
//!
//! [previews]
//! persist = false             # Keep generated previews on disk
//! default_size = 150          # Bounding box used by listing thumbnails
//! max_size = 4096             # Largest bounding box a client may request
//! quality = 85                # JPEG encoding quality (1-100)
//!
//! [routes]
//! html_base = "/gallery/"
//! files_base = "/galleryfiles/"
//! previews_base = "/gallerypreviews/"
//!
//! [auth]
//! # users_file = "/etc/simple-gallery/users.json"
//! realm = "simple-gallery"
//!
//! [access]
//! match_mode = "substring"    # substring | prefix
//! enforce_on_media = false    # Also check policies on file/preview routes
//!
//! [processing]
//! max_processes = 4           # Resize workers (omit for auto = CPU cores)
//! ```
//!
//! ## Environment Overrides
//!
//! | Variable | Key |
//! |---|---|
//! | `PORT_NUMBER` | `server.port` |
//! | `PHOTOS_ROOT_PATH` | `paths.photos_root` |
//! | `PREVIEWS_ROOT_PATH` | `paths.previews_root` |
//! | `SAVE_PREVIEWS` | `previews.persist` (`"true"` enables) |
//! | `PREVIEW_SIZE` | `previews.default_size` |
//! | `HTML_URL_BASE` | `routes.html_base` |
//! | `FILES_URL_BASE` | `routes.files_base` |
//! | `PREVIEWS_URL_BASE` | `routes.previews_base` |
//! | `BASIC_AUTH_USERS_FILE` | `auth.users_file` |
//! | `BASIC_AUTH_REALM` | `auth.realm` |
//! | `LOG_LEVEL` | `log_level` |
//!
//! Unknown keys are rejected to catch typos early.

use crate::access::MatchMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration.
///
/// All fields have sensible defaults. Config files need only specify the
/// values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Log verbosity when `RUST_LOG` is not set.
    pub log_level: LogLevel,
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub previews: PreviewsConfig,
    pub routes: RoutesConfig,
    pub auth: AuthConfig,
    pub access: AccessConfig,
    pub processing: ProcessingConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.previews.default_size == 0 {
            return Err(ConfigError::Validation(
                "previews.default_size must be positive".into(),
            ));
        }
        if self.previews.max_size < self.previews.default_size {
            return Err(ConfigError::Validation(
                "previews.max_size must be >= previews.default_size".into(),
            ));
        }
        if !(1..=100).contains(&self.previews.quality) {
            return Err(ConfigError::Validation(
                "previews.quality must be 1-100".into(),
            ));
        }
        let bases = [
            ("routes.html_base", &self.routes.html_base),
            ("routes.files_base", &self.routes.files_base),
            ("routes.previews_base", &self.routes.previews_base),
        ];
        for (key, base) in bases {
            if base.len() < 3 || !base.starts_with('/') || !base.ends_with('/') {
                return Err(ConfigError::Validation(format!(
                    "{key} must look like \"/name/\", got {base:?}"
                )));
            }
            if base[1..base.len() - 1].contains(['/', '*', ':', '{', '}']) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a single path segment, got {base:?}"
                )));
            }
        }
        if bases[0].1 == bases[1].1 || bases[0].1 == bases[2].1 || bases[1].1 == bases[2].1 {
            return Err(ConfigError::Validation(
                "routes.html_base, routes.files_base and routes.previews_base must differ".into(),
            ));
        }
        if self.auth.realm.contains('"') {
            return Err(ConfigError::Validation(
                "auth.realm must not contain '\"'".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    /// Directive for `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 80,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory tree served as the gallery.
    pub photos_root: PathBuf,
    /// Directory tree that mirrors `photos_root` with generated previews.
    pub previews_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            photos_root: PathBuf::from("/photos"),
            previews_root: PathBuf::from("/previews"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewsConfig {
    /// Write generated previews under `paths.previews_root` and reuse them.
    pub persist: bool,
    /// Bounding box (pixels) of the thumbnails linked from listings.
    pub default_size: u32,
    /// Largest bounding box accepted from a preview request.
    pub max_size: u32,
    /// JPEG encoding quality.
    pub quality: u32,
}

impl Default for PreviewsConfig {
    fn default() -> Self {
        Self {
            persist: false,
            default_size: 150,
            max_size: 4096,
            quality: 85,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    pub html_base: String,
    pub files_base: String,
    pub previews_base: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            html_base: "/gallery/".to_string(),
            files_base: "/galleryfiles/".to_string(),
            previews_base: "/gallerypreviews/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// JSON users file. Authentication is enabled iff this is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_file: Option<PathBuf>,
    /// Realm announced in `WWW-Authenticate` challenges.
    pub realm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users_file: None,
            realm: "simple-gallery".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    /// How allow/deny entries are compared with request paths.
    pub match_mode: MatchMode,
    /// Also evaluate policies on the file and preview routes.
    pub enforce_on_media: bool,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel resize workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides through a lookup function.
///
/// Takes a closure instead of reading `std::env` directly so tests can feed
/// a fixed map.
pub fn apply_env_overrides(
    config: &mut GalleryConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    fn parse_num<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
        value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { var, value })
    }

    if let Some(v) = lookup("PORT_NUMBER") {
        config.server.port = parse_num("PORT_NUMBER", v)?;
    }
    if let Some(v) = lookup("PHOTOS_ROOT_PATH") {
        config.paths.photos_root = PathBuf::from(v);
    }
    if let Some(v) = lookup("PREVIEWS_ROOT_PATH") {
        config.paths.previews_root = PathBuf::from(v);
    }
    if let Some(v) = lookup("SAVE_PREVIEWS") {
        config.previews.persist = v == "true";
    }
    if let Some(v) = lookup("PREVIEW_SIZE") {
        config.previews.default_size = parse_num("PREVIEW_SIZE", v)?;
    }
    if let Some(v) = lookup("HTML_URL_BASE") {
        config.routes.html_base = v;
    }
    if let Some(v) = lookup("FILES_URL_BASE") {
        config.routes.files_base = v;
    }
    if let Some(v) = lookup("PREVIEWS_URL_BASE") {
        config.routes.previews_base = v;
    }
    if let Some(v) = lookup("BASIC_AUTH_USERS_FILE") {
        config.auth.users_file = (!v.is_empty()).then(|| PathBuf::from(v));
    }
    if let Some(v) = lookup("BASIC_AUTH_REALM") {
        config.auth.realm = v;
    }
    if let Some(v) = lookup("LOG_LEVEL") {
        config.log_level = LogLevel::parse(&v).ok_or(ConfigError::Env {
            var: "LOG_LEVEL",
            value: v,
        })?;
    }
    Ok(())
}

/// Merge an optional overlay onto the stock defaults and deserialize.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    Ok(merged.try_into()?)
}

/// Load the full configuration: defaults, optional file, environment.
pub fn load_config(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<GalleryConfig, ConfigError> {
    let overlay = path.map(load_raw_config).transpose()?;
    let mut config = resolve_config(overlay)?;
    apply_env_overrides(&mut config, lookup)?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Gallery Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Environment variables (PORT_NUMBER, PHOTOS_ROOT_PATH, SAVE_PREVIEWS, ...)
# override values from this file.
# Unknown keys will cause an error.

# Log verbosity when RUST_LOG is not set: "error", "info" or "debug".
log_level = "info"

# ---------------------------------------------------------------------------
# HTTP listener
# ---------------------------------------------------------------------------
[server]
bind = "0.0.0.0"
port = 80

# ---------------------------------------------------------------------------
# Filesystem locations
# ---------------------------------------------------------------------------
[paths]
# Directory tree served as the gallery (read-only).
photos_root = "/photos"

# Directory tree where persistent previews are written.
previews_root = "/previews"

# ---------------------------------------------------------------------------
# Preview generation
# ---------------------------------------------------------------------------
[previews]
# Keep generated previews on disk under paths.previews_root.
persist = false

# Bounding box (pixels) of the thumbnails shown in listings.
default_size = 150

# Largest bounding box a client may request.
max_size = 4096

# JPEG encoding quality (1 = worst, 100 = best).
quality = 85

# ---------------------------------------------------------------------------
# URL layout (each base must look like "/name/")
# ---------------------------------------------------------------------------
[routes]
html_base = "/gallery/"
files_base = "/galleryfiles/"
previews_base = "/gallerypreviews/"

# ---------------------------------------------------------------------------
# HTTP Basic authentication
# ---------------------------------------------------------------------------
[auth]
# JSON array of {"userName", "password", "accessLevel"} records.
# Authentication is disabled when this is not set.
# users_file = "/etc/simple-gallery/users.json"
realm = "simple-gallery"

# ---------------------------------------------------------------------------
# Access policies
# ---------------------------------------------------------------------------
[access]
# "substring": an entry matches anywhere inside the flattened path.
# "prefix":    an entry matches whole leading path segments.
match_mode = "substring"

# Also check policies on the file and preview routes.
enforce_on_media = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel resize workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
