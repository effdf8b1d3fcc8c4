//! Tracing subscriber setup.
//!
//! Diagnostics go to stderr so stdout carries only command results.
//! `KYC_LOG` takes an `EnvFilter` directive and overrides the verbosity
//! chosen on the command line.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("KYC_LOG")
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(atty::is(atty::Stream::Stderr)),
        )
        .with(filter)
        .try_init();
}
