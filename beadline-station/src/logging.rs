//! Logging setup

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global fmt subscriber
///
/// `RUST_LOG` overrides `default_directive`. A second call is a no-op.
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        debug!("Logging already initialised");
    }
}
