// src/logging.rs
// =============================================================================
// Sets up `tracing` output.
//
// - RUST_LOG, when set, decides what gets logged
// - otherwise our own crate logs at info (debug with --verbose) and
//   dependencies only at warn
// - everything goes to stderr, so `--json` on stdout stays parseable
// =============================================================================

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,site_mirror=debug"
    } else {
        "warn,site_mirror=info"
    }
}

pub fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) if !value.trim().is_empty() => EnvFilter::try_new(value)?,
        _ => EnvFilter::try_new(default_directives(verbose))?,
    };

    let fmt_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
