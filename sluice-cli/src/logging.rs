//! Logging setup for the `sluice` binary.
//!
//! Log records go to stderr so that plan output on stdout stays machine
//! readable.
//!
//! # Environment Variables
//!
//! - `SLUICE_LOG_LEVEL=trace|debug|info|warn|error` - Set the log level (default: warn)
//! - `SLUICE_LOG_FORMAT=pretty|compact|json` - Set output format (default: compact)
//!
//! `--verbose` raises the level to `debug` regardless of `SLUICE_LOG_LEVEL`.

use std::env;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Resolve the log level from the verbose flag and `SLUICE_LOG_LEVEL`.
pub fn log_level(verbose: bool) -> &'static str {
    if verbose {
        return "debug";
    }
    match env::var("SLUICE_LOG_LEVEL")
        .map(|l| l.to_lowercase())
        .as_deref()
    {
        Ok("trace") => "trace",
        Ok("debug") => "debug",
        Ok("info") => "info",
        Ok("error") => "error",
        _ => "warn",
    }
}

/// Resolve the log format from `SLUICE_LOG_FORMAT`.
pub fn log_format() -> &'static str {
    env::var("SLUICE_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "json" => "json",
            _ => "compact",
        })
        .unwrap_or("compact")
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let level = log_level(verbose);
        let filter = EnvFilter::try_new(format!("sluice={level},sluice_migrate={level},sluice_cli={level}"))
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        let layer = fmt::layer().with_writer(std::io::stderr);

        match log_format() {
            "json" => tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init(),
            "pretty" => tracing_subscriber::registry()
                .with(filter)
                .with(layer.pretty())
                .init(),
            _ => tracing_subscriber::registry()
                .with(filter)
                .with(layer.compact())
                .init(),
        }

        tracing::debug!(level, format = log_format(), "Logging initialized");
    });
}
