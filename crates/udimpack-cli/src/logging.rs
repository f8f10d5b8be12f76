//! Log output setup.
//!
//! Library crates only emit `tracing` events; the binary decides where they
//! go. Events are written to stderr so stdout stays free for command output.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive (e.g. `udimpack_layout=debug`).
pub const LOG_ENV: &str = "UDIMPACK_LOG";

/// Default directive for the given verbosity flags.
///
/// `-v` wins over `-q` when both are given.
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    }
}

/// Installs the global subscriber.
///
/// `UDIMPACK_LOG` overrides the flags when set. Calling this twice is
/// harmless; the second call leaves the first subscriber in place.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
