//! Log output for binaries.
//!
//! Libraries only emit through `tracing`; a binary calls [`init`] once to
//! print those events. `RUST_LOG` overrides the default directive.

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber filtered by `RUST_LOG`, or by
/// `default_directive` when the variable is unset or malformed.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
