//! Tracing subscriber setup for checkgate binaries.
//!
//! [`init_tracing`] installs the global subscriber. The global default
//! can only be set once per process, so repeated calls are no-ops.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// * `json` — emit newline-delimited JSON log lines instead of
///   human-readable ones.
/// * `default_level` — verbosity used when `RUST_LOG` is unset;
///   `RUST_LOG` takes precedence when present.
pub fn init_tracing(json: bool, default_level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}
