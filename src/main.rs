//! safe-env CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use safe_env::cli::{Cli, CommandDispatcher};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Logs go to stderr; stdout carries transformed output.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("safe_env=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("safe_env=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("safe-env starting with args: {:?}", cli);

    // Resolver executables are spawned by path from their own directory.
    let cwd = std::env::current_dir().unwrap_or_default();
    let context_root = match &cli.context {
        Some(dir) => cwd.join(dir),
        None => cwd,
    };

    let dispatcher = CommandDispatcher::new(context_root, cli.config.clone());
    let mut stdout = std::io::stdout();

    match dispatcher.dispatch(&cli, &mut stdout).await {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
