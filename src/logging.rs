//! Diagnostic tracing for scrivener.
//!
//! Logs go to stderr so they never mix with assistant output on stdout.
//! `RUST_LOG` wins when set; otherwise the level is `warn`, or `debug` for
//! scrivener's own targets with `--verbose`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. Call once, before anything logs.
///
/// ```bash
/// RUST_LOG=scrivener=debug scrivener ask "list the files here"
/// ```
pub fn init(verbose: bool) {
    let fallback = if verbose { "warn,scrivener=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
