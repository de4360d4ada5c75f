//! Diagnostic logging setup

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::RuntimeConfig;

/// Install the stderr subscriber described by `config`.
///
/// Returns `false` when a global subscriber was already installed, which is
/// the normal case when the runtime is linked into a host that logs itself.
pub fn init(config: &RuntimeConfig) -> bool {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|error| {
        eprintln!(
            "bminor runtime: invalid log filter {:?}: {error}",
            config.log_filter
        );
        EnvFilter::new("warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
