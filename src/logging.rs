//! Tracing setup.
//!
//! Log records go to stderr so stdout stays clean for run summaries. The level
//! comes from `RUST_LOG` when set, else from the CLI verbosity.

use std::io::{self, IsTerminal};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn make_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "info,supernet_curves=debug"
    } else {
        "info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(make_filter(verbose))
        .with(stderr_layer)
        .try_init();
}
