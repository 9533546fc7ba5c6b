//! Process-wide tracing subscriber.
//!
//! Logs go to stderr so stdout carries only the response body. The filter
//! comes from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].

use tracing::Subscriber;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const DEFAULT_FILTER: &str = "pinned_fetch_lib=info,pinned_fetch=info,warn";

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("pinned_fetch_lib=debug,pinned_fetch=debug,info");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn subscriber(verbose: bool) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(env_filter(verbose))
}

/// Install the subscriber. Fails if one is already set (e.g. called twice).
pub fn init(verbose: bool) -> Result<(), TryInitError> {
    subscriber(verbose).try_init()
}
