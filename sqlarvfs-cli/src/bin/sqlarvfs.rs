//! A CLI tool for browsing SQLite archives as a read-only filesystem.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use sqlarvfs_cli::{Cli, UserError};
use tracing_subscriber::EnvFilter;

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // `RUST_LOG` takes precedence over `--verbose`.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(cli.options.verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = cli.dispatch(io::stdout().lock()) {
        // User-facing errors should not show a stack trace.
        if let Some(user_err) = err.downcast_ref::<UserError>() {
            eprintln!("{}", user_err);
            return Ok(ExitCode::FAILURE);
        }

        return Err(err);
    }

    Ok(ExitCode::SUCCESS)
}
