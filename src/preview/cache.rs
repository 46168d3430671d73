//! Preview cache: generate on miss, optionally persist.
//!
//! A preview is looked up by its [`PreviewKey`]. Generation reads the source
//! from `photos_root`, resizes it on the [`ResizePool`] and, in persistent
//! mode, stores the result so the next request is a plain file read.
//!
//! # Storage layout
//!
//! Persistent artifacts mirror the gallery tree under `previews_root`, with
//! the dimension appended to the file name:
//!
//! ```text
//! photos/vacation/beach/IMG_01.jpg
//! previews/vacation/beach/IMG_01.jpg@150
//! ```
//!
//! An existing artifact is served as-is; nothing checks it against the
//! source again. Artifacts are never evicted.
//!
//! # Concurrency
//!
//! - **Single-flight**: concurrent requests for the same key share one
//!   generation through a per-key [`OnceCell`]. The entry is dropped from
//!   the in-flight map once the cell is filled.
//! - **Atomic writes**: artifacts are written to a temp file next to the
//!   target and renamed into place, so readers see either nothing or the
//!   complete file.
//! - **Detached work**: generation runs in its own tokio task. A client that
//!   disconnects mid-request does not abort a half-written artifact.
//!
//! A missing source never creates directories or files under
//! `previews_root`.

use super::key::PreviewKey;
use super::worker::ResizePool;
use crate::config::GalleryConfig;
use crate::imaging::{ImageBackend, PreviewConfig, Quality, create_preview};
use crate::media;
use image::ImageFormat;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("source not found: {0}")]
    SourceNotFound(String),
    #[error("no preview codec for {0}")]
    UnsupportedFormat(String),
    #[error("requested size {requested} exceeds the maximum of {max}")]
    DimensionTooLarge { requested: u32, max: u32 },
    #[error("resize failed: {0}")]
    ResizeFailed(String),
    #[error("cache I/O failed: {0}")]
    Io(String),
}

/// Rendered preview bytes and the content type to serve them with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewArtifact {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

/// Settings the cache needs from [`GalleryConfig`].
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub photos_root: PathBuf,
    pub previews_root: PathBuf,
    pub persist: bool,
    pub max_size: u32,
    pub quality: Quality,
}

impl CacheSettings {
    pub fn from_config(config: &GalleryConfig) -> Self {
        Self {
            photos_root: config.paths.photos_root.clone(),
            previews_root: config.paths.previews_root.clone(),
            persist: config.previews.persist,
            max_size: config.previews.max_size,
            quality: Quality::new(config.previews.quality),
        }
    }
}

type PreviewResult = Result<Arc<PreviewArtifact>, PreviewError>;

pub struct PreviewCache {
    settings: CacheSettings,
    backend: Arc<dyn ImageBackend>,
    pool: Arc<ResizePool>,
    in_flight: Mutex<HashMap<PreviewKey, Arc<OnceCell<PreviewResult>>>>,
    stats: CacheStats,
}

impl PreviewCache {
    pub fn new(
        settings: CacheSettings,
        backend: Arc<dyn ImageBackend>,
        pool: Arc<ResizePool>,
    ) -> Self {
        Self {
            settings,
            backend,
            pool,
            in_flight: Mutex::new(HashMap::new()),
            stats: CacheStats::default(),
        }
    }

    pub fn persistent(&self) -> bool {
        self.settings.persist
    }

    /// Where the artifact for `key` lives in persistent mode.
    pub fn artifact_path(&self, key: &PreviewKey) -> PathBuf {
        let file_name = key.path.file_name().unwrap_or_default();
        let name = format!("{file_name}@{}", key.dimension);
        key.path
            .parent()
            .to_fs_path(&self.settings.previews_root)
            .join(name)
    }

    /// Hit and miss counts since startup.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Return the preview for `key`, generating it on a miss.
    pub async fn get_or_create(self: &Arc<Self>, key: &PreviewKey) -> PreviewResult {
        let format = self.check_request(key)?;

        let cell = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };

        let cache = Arc::clone(self);
        let key = key.clone();
        let task = tokio::spawn(async move {
            let generate = || cache.load_or_generate(&key, format);
            let result = cell.get_or_init(generate).await.clone();
            cache.finish(&key, &cell);
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => Err(PreviewError::ResizeFailed(format!("preview task failed: {e}"))),
        }
    }

    /// Cheap checks that need no I/O.
    fn check_request(&self, key: &PreviewKey) -> Result<ImageFormat, PreviewError> {
        let format = media::image_format(&key.path)
            .ok_or_else(|| PreviewError::UnsupportedFormat(key.path.to_string()))?;
        let requested = key.dimension.get();
        if requested > self.settings.max_size {
            return Err(PreviewError::DimensionTooLarge {
                requested,
                max: self.settings.max_size,
            });
        }
        Ok(format)
    }

    fn finish(&self, key: &PreviewKey, cell: &Arc<OnceCell<PreviewResult>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = in_flight.get(key)
            && Arc::ptr_eq(current, cell)
        {
            in_flight.remove(key);
        }
    }

    async fn load_or_generate(&self, key: &PreviewKey, format: ImageFormat) -> PreviewResult {
        let mime = media::content_type(&key.path)
            .unwrap_or("application/octet-stream");
        let target = self.artifact_path(key);

        if self.settings.persist {
            match tokio::fs::read(&target).await {
                Ok(bytes) => {
                    self.stats.hit();
                    debug!(
                        %key,
                        path = %target.display(),
                        stats = %self.stats,
                        "preview served from disk"
                    );
                    return Ok(Arc::new(PreviewArtifact { bytes, mime }));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(PreviewError::Io(format!("{}: {e}", target.display()))),
            }
        }

        let source_path = key.path.to_fs_path(&self.settings.photos_root);
        let source = read_source(&source_path).await?;

        let config = PreviewConfig {
            max_dimension: key.dimension.get(),
            format,
            quality: self.settings.quality,
        };
        let backend = Arc::clone(&self.backend);
        let bytes = self
            .pool
            .run(move || create_preview(&*backend, &source, &config))
            .await
            .map_err(|e| PreviewError::ResizeFailed(e.to_string()))?
            .map_err(|e| PreviewError::ResizeFailed(e.to_string()))?;
        self.stats.miss();

        if self.settings.persist {
            write_atomic(&target, &bytes)
                .await
                .map_err(|e| PreviewError::Io(format!("{}: {e}", target.display())))?;
            debug!(
                %key,
                path = %target.display(),
                bytes = bytes.len(),
                stats = %self.stats,
                "preview stored"
            );
        } else {
            debug!(%key, bytes = bytes.len(), stats = %self.stats, "preview generated");
        }

        Ok(Arc::new(PreviewArtifact { bytes, mime }))
    }
}

/// Read a source image. Anything that is not a readable regular file is "not found".
async fn read_source(path: &Path) -> Result<Vec<u8>, PreviewError> {
    let not_found = || PreviewError::SourceNotFound(path.display().to_string());
    let meta = tokio::fs::metadata(path).await.map_err(|_| not_found())?;
    if !meta.is_file() {
        return Err(not_found());
    }
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "source exists but is unreadable");
            Err(not_found())
        }
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Hidden sibling of `target`, unique per process and call.
fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_name = format!(".{name}.{}.{n}.tmp", std::process::id());
    target.with_file_name(temp_name)
}

/// Write `bytes` to `target` via temp file + rename, creating parent directories.
async fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = temp_path(target);
    let written = match tokio::fs::write(&tmp, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp, target).await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    written
}

/// Running totals of disk hits and fresh generations.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> Self {
        Self {
            hits: AtomicU64::new(self.hits()),
            misses: AtomicU64::new(self.misses()),
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.hits() + self.misses()
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits() > 0 {
            write!(
                f,
                "{} cached, {} generated ({} total)",
                self.hits(),
                self.misses(),
                self.total()
            )
        } else {
            write!(f, "{} generated", self.misses())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{jpeg_bytes, png_bytes};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        photos: PathBuf,
        previews: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let photos = tmp.path().join("photos");
            let previews = tmp.path().join("previews");
            let beach = photos.join("vacation/beach");
            fs::create_dir_all(&beach).unwrap();
            fs::create_dir_all(&previews).unwrap();
            fs::write(beach.join("IMG_01.jpg"), jpeg_bytes(400, 300)).unwrap();
            fs::write(beach.join("shell.png"), png_bytes(60, 120)).unwrap();
            fs::write(photos.join("vacation/notes.txt"), "hello").unwrap();
            Self {
                _tmp: tmp,
                photos,
                previews,
            }
        }

        fn settings(&self, persist: bool) -> CacheSettings {
            CacheSettings {
                photos_root: self.photos.clone(),
                previews_root: self.previews.clone(),
                persist,
                max_size: 1024,
                quality: Quality::default(),
            }
        }

        fn cache(&self, persist: bool, backend: Arc<dyn ImageBackend>) -> Arc<PreviewCache> {
            let pool = Arc::new(ResizePool::new(2).unwrap());
            Arc::new(PreviewCache::new(self.settings(persist), backend, pool))
        }

        fn real_cache(&self, persist: bool) -> Arc<PreviewCache> {
            self.cache(persist, Arc::new(RustBackend::new()))
        }

        fn preview_files(&self) -> Vec<PathBuf> {
            let mut found = Vec::new();
            let mut stack = vec![self.previews.clone()];
            while let Some(dir) = stack.pop() {
                for entry in fs::read_dir(&dir).unwrap() {
                    let path = entry.unwrap().path();
                    found.push(path.clone());
                    if path.is_dir() {
                        stack.push(path);
                    }
                }
            }
            found
        }
    }

    fn key(raw: &str) -> PreviewKey {
        PreviewKey::parse(raw).unwrap()
    }

    fn decoded_dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        (img.width(), img.height())
    }

    // =========================================================================
    // Artifact layout
    // =========================================================================

    #[test]
    fn artifact_path_mirrors_gallery_tree() {
        let fx = Fixture::new();
        let cache = fx.real_cache(true);
        assert_eq!(
            cache.artifact_path(&key("vacation/beach/IMG_01.jpg@150")),
            fx.previews.join("vacation/beach/IMG_01.jpg@150")
        );
        let top = cache.artifact_path(&key("top.jpg@64"));
        assert_eq!(top, fx.previews.join("top.jpg@64"));
    }

    #[test]
    fn temp_paths_are_hidden_and_unique() {
        let target = Path::new("/previews/a/b.jpg@150");
        let first = temp_path(target);
        let second = temp_path(target);
        assert_ne!(first, second);
        assert_eq!(first.parent(), target.parent());
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".b.jpg@150."));
        assert!(name.ends_with(".tmp"));
    }

    // =========================================================================
    // Persistent mode
    // =========================================================================

    #[tokio::test]
    async fn persistent_miss_writes_artifact() {
        let fx = Fixture::new();
        let cache = fx.real_cache(true);
        let k = key("vacation/beach/IMG_01.jpg@150");

        let artifact = cache.get_or_create(&k).await.unwrap();
        assert_eq!(artifact.mime, "image/jpeg");
        assert_eq!(decoded_dimensions(&artifact.bytes), (150, 113));

        let stored = fs::read(cache.artifact_path(&k)).unwrap();
        assert_eq!(stored, artifact.bytes);
    }

    #[tokio::test]
    async fn persistent_hit_returns_stored_bytes_unchanged() {
        let fx = Fixture::new();
        let cache = fx.real_cache(true);
        let k = key("vacation/beach/IMG_01.jpg@150");

        let first = cache.get_or_create(&k).await.unwrap();
        let second = cache.get_or_create(&k).await.unwrap();
        assert_eq!(first.bytes, second.bytes);

        let stats = cache.stats();
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.to_string(), "1 cached, 1 generated (2 total)");
    }

    #[tokio::test]
    async fn existing_artifact_is_served_without_the_source() {
        let fx = Fixture::new();
        let cache = fx.real_cache(true);
        let k = key("gone/old.jpg@150");
        let target = cache.artifact_path(&k);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"previously rendered").unwrap();

        let artifact = cache.get_or_create(&k).await.unwrap();
        assert_eq!(artifact.bytes, b"previously rendered");
    }

    #[tokio::test]
    async fn missing_source_creates_nothing() {
        let fx = Fixture::new();
        let cache = fx.real_cache(true);
        let k = key("nowhere/missing.jpg@150");

        let result = cache.get_or_create(&k).await;
        assert!(matches!(result, Err(PreviewError::SourceNotFound(_))));
        assert!(!fx.previews.join("nowhere").exists());
        assert!(fx.preview_files().is_empty());
    }

    #[tokio::test]
    async fn directory_source_is_not_found() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.photos.join("album.jpg")).unwrap();
        let cache = fx.real_cache(true);

        let result = cache.get_or_create(&key("album.jpg@150")).await;
        assert!(matches!(result, Err(PreviewError::SourceNotFound(_))));
    }

    #[tokio::test]
    async fn undecodable_source_fails_and_stores_nothing() {
        let fx = Fixture::new();
        fs::write(fx.photos.join("vacation/broken.jpg"), b"not a jpeg").unwrap();
        let cache = fx.real_cache(true);

        let result = cache.get_or_create(&key("vacation/broken.jpg@150")).await;
        assert!(matches!(result, Err(PreviewError::ResizeFailed(_))));
        assert!(fx.preview_files().is_empty());
    }

    #[tokio::test]
    async fn no_temp_files_left_behind() {
        let fx = Fixture::new();
        let cache = fx.real_cache(true);
        cache
            .get_or_create(&key("vacation/beach/shell.png@30"))
            .await
            .unwrap();

        let names: Vec<String> = fx
            .preview_files()
            .iter()
            .filter(|p| p.is_file())
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["shell.png@30".to_string()]);
    }

    // =========================================================================
    // Ephemeral mode
    // =========================================================================

    #[tokio::test]
    async fn ephemeral_mode_writes_nothing() {
        let fx = Fixture::new();
        let cache = fx.real_cache(false);

        let artifact = cache
            .get_or_create(&key("vacation/beach/shell.png@60"))
            .await
            .unwrap();
        assert_eq!(artifact.mime, "image/png");
        assert_eq!(decoded_dimensions(&artifact.bytes), (30, 60));
        assert!(fx.preview_files().is_empty());
    }

    #[tokio::test]
    async fn ephemeral_mode_regenerates_every_time() {
        let fx = Fixture::new();
        let backend = Arc::new(MockBackend::with_dimensions(400, 300));
        let cache = fx.cache(false, backend.clone());
        let k = key("vacation/beach/IMG_01.jpg@150");

        cache.get_or_create(&k).await.unwrap();
        cache.get_or_create(&k).await.unwrap();
        assert_eq!(backend.resize_count(), 2);
        assert_eq!(cache.stats().to_string(), "2 generated");
    }

    // =========================================================================
    // Request checks
    // =========================================================================

    #[tokio::test]
    async fn non_image_extension_is_unsupported() {
        let fx = Fixture::new();
        let cache = fx.real_cache(true);
        let result = cache.get_or_create(&key("vacation/notes.txt@150")).await;
        assert!(matches!(result, Err(PreviewError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn oversized_dimension_is_rejected() {
        let fx = Fixture::new();
        let cache = fx.real_cache(true);
        let result = cache
            .get_or_create(&key("vacation/beach/IMG_01.jpg@5000"))
            .await;
        assert_eq!(
            result,
            Err(PreviewError::DimensionTooLarge {
                requested: 5000,
                max: 1024
            })
        );
    }

    // =========================================================================
    // Single-flight
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_share_one_generation() {
        let fx = Fixture::new();
        let backend = Arc::new(MockBackend::slow(400, 300, Duration::from_millis(200)));
        let cache = fx.cache(true, backend.clone());
        let k = key("vacation/beach/IMG_01.jpg@150");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let k = k.clone();
                tokio::spawn(async move { cache.get_or_create(&k).await })
            })
            .collect();

        let mut outputs = Vec::new();
        for handle in handles {
            outputs.push(handle.await.unwrap().unwrap().bytes.clone());
        }

        assert_eq!(backend.resize_count(), 1);
        assert!(outputs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(fs::read(cache.artifact_path(&k)).unwrap(), outputs[0]);
    }

    #[tokio::test]
    async fn in_flight_entry_is_removed_after_completion() {
        let fx = Fixture::new();
        let cache = fx.real_cache(false);
        let k = key("vacation/beach/shell.png@30");

        cache.get_or_create(&k).await.unwrap();
        assert!(cache.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failures_are_not_remembered() {
        let fx = Fixture::new();
        let cache = fx.real_cache(true);
        let k = key("vacation/late.png@30");

        assert!(cache.get_or_create(&k).await.is_err());
        fs::write(fx.photos.join("vacation/late.png"), png_bytes(90, 90)).unwrap();
        let artifact = cache.get_or_create(&k).await.unwrap();
        assert_eq!(decoded_dimensions(&artifact.bytes), (30, 30));
    }

    // =========================================================================
    // CacheStats display
    // =========================================================================

    #[test]
    fn cache_stats_display_no_hits() {
        let stats = CacheStats::default();
        stats.miss();
        stats.miss();
        assert_eq!(stats.to_string(), "2 generated");
    }
}
