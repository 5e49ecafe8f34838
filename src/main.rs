//! dotsync - encrypted .env synchronization.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dotsync::cli::output;
use dotsync::cli::{execute, Cli};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("DOTSYNC_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("dotsync=debug")
        } else {
            EnvFilter::new("dotsync=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    if let Err(e) = execute(cli) {
        output::error(&e.to_string());
        if let Some(hint) = e.hint() {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
