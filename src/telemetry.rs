//! Logging setup for the demo binary
//!
//! Library code only emits `tracing` events. Render-path events are `trace!`
//! so a presenter running at 60 fps stays quiet unless asked; scratch growth,
//! surface resizes and frame buffer allocations are `debug!`.

use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt};

static TELEMETRY_INIT: OnceLock<()> = OnceLock::new();

/// Filter for this crate when `RUST_LOG` is unset: info, or debug with `-v`
fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("{}={}", env!("CARGO_CRATE_NAME"), level)
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global tracing subscriber; later calls are no-ops
pub fn init(verbose: bool) {
    TELEMETRY_INIT.get_or_init(|| {
        let filter = env_filter(verbose);
        let installed = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();

        match installed {
            Ok(()) => tracing::debug!("logging to stderr, verbose={}", verbose),
            Err(err) => eprintln!("spectrum-bars: failed to initialise logging: {err}"),
        }
    });
}
