//! Tracing setup for the command-line tool.
//!
//! Logs go to stderr so that reports on stdout stay machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for a `-v` count: warnings, then info, then debug.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "testid=warn",
        1 => "testid=info",
        _ => "testid=debug",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbosity`.
pub fn init_tracing(verbosity: u8) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbosity)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 1)
                .with_thread_ids(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
