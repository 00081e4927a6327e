//! Logging setup using `tracing-subscriber`.
//!
//! Logs go to stderr so reports on stdout stay machine-readable. `RUST_LOG`
//! overrides the level picked from `-v`/`-q`.

use crate::config::Verbosity;
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` if set, otherwise the verbosity default
#[must_use]
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()))
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init(verbosity: Verbosity, json: bool) {
    let filter = env_filter(verbosity);
    let result = if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(verbosity == Verbosity::Debug)
            .try_init()
    };
    let _ = result;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init(Verbosity::Quiet, false);
        init(Verbosity::Debug, true);
    }
}
