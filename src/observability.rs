//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured [`LogLevel`] applies to
//! this crate and `tower_http`, with everything else held at `warn`.

use crate::config::LogLevel;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter directives for a configured level.
pub fn filter_directives(level: LogLevel) -> String {
    let level = level.as_filter();
    format!("warn,simple_gallery={level},tower_http={level}")
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
