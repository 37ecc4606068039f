#![forbid(unsafe_code)]

//! Global `tracing` subscriber setup.
//!
//! Library code only emits events; installing a subscriber is left to the
//! test binary or host that owns the process.

use tracing_subscriber::EnvFilter;

use crate::config::HarnessConfig;

/// Filter directives, in `EnvFilter` syntax (e.g. `locshot_core=debug`).
pub const ENV_LOG: &str = "LOCSHOT_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Install a `fmt` subscriber filtered by `LOCSHOT_LOG`, emitting JSON lines
/// when `json` is set.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init(json: bool) -> bool {
    let filter =
        EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}

/// [`init`] with the output format taken from `config`.
pub fn init_from_config(config: &HarnessConfig) -> bool {
    init(config.log_json)
}
