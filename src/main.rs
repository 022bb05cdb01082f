//! Pipewright CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use pipewright::cli::{Cli, CommandDispatcher, EXIT_FAILURE, EXIT_REJECTED};
use pipewright::config::load_settings;
use pipewright::ui::{create_ui, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. The settings' `runtime.log_level`
fn init_tracing(debug: bool, log_level: &str) {
    let filter = if debug {
        EnvFilter::new("pipewright=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("pipewright={}", log_level)))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let mut ui = create_ui(OutputMode::from_flags(cli.verbose, cli.quiet));
    let working_dir = std::env::current_dir().unwrap_or_default();

    let settings = match load_settings(&working_dir, cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(cli.debug, "info");
            ui.error(&format!("Error: {}", e));
            return ExitCode::from(EXIT_FAILURE as u8);
        }
    };
    init_tracing(cli.debug, &settings.runtime.log_level);

    tracing::debug!("Pipewright starting with args: {:?}", cli);

    let dispatcher = CommandDispatcher::new(working_dir, settings);
    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            let code = if e.is_rejection() {
                EXIT_REJECTED
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code as u8)
        }
    }
}
