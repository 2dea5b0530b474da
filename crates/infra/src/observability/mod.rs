//! Logging setup
//!
//! Installs a global `tracing` subscriber. The filter comes from
//! `MAGICBOX_LOG`, then `RUST_LOG`, and defaults to `info`.

use magicbox_domain::{MagicBoxError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

pub const LOG_FILTER_VAR: &str = "MAGICBOX_LOG";

const DEFAULT_FILTER: &str = "info";

/// Output format of the global subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Filter built from the environment
pub fn env_filter() -> EnvFilter {
    [LOG_FILTER_VAR, EnvFilter::DEFAULT_ENV]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// # Errors
/// Returns `MagicBoxError::Internal` if a global subscriber is already set.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let registry = Registry::default().with(env_filter());

    let result = match format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => {
            registry.with(fmt::layer().json().with_current_span(true)).try_init()
        }
    };

    result.map_err(|err| MagicBoxError::Internal(format!("tracing already initialised: {err}")))
}
