//! Dedicated rayon pool for CPU-bound resize work.
//!
//! Decoding and Lanczos resampling would stall the async executor, so they
//! run here. Results come back to the awaiting task over a oneshot channel.

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("failed to start resize pool: {0}")]
    Build(String),
    #[error("resize job did not complete")]
    Abandoned,
}

pub struct ResizePool {
    pool: rayon::ThreadPool,
}

impl ResizePool {
    /// Build a pool with `threads` workers (see [`crate::config::effective_threads`]).
    pub fn new(threads: usize) -> Result<Self, WorkerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("resize-{i}"))
            .panic_handler(|_| error!("resize job panicked"))
            .build()
            .map_err(|e| WorkerError::Build(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `job` on the pool and await its result.
    ///
    /// A panicking job drops its sender, which surfaces as
    /// [`WorkerError::Abandoned`].
    pub async fn run<T, F>(&self, job: F) -> Result<T, WorkerError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool.spawn(move || {
            // Receiver may be gone; the result is then discarded
            let _ = tx.send(job());
        });
        rx.await.map_err(|_| WorkerError::Abandoned)
    }
}
