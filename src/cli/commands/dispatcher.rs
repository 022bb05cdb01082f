//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::config::Settings;
use crate::error::Result;
use crate::ui::UserInterface;

/// Exit code for a run that completed with step errors, or an invalid document.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for a workflow rejected before any step ran.
pub const EXIT_REJECTED: i32 = 2;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command, reporting through `ui`.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    working_dir: PathBuf,
    settings: Settings,
}

impl CommandDispatcher {
    /// Create a dispatcher for a working directory and the loaded settings.
    pub fn new(working_dir: PathBuf, settings: Settings) -> Self {
        Self {
            working_dir,
            settings,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Route the CLI subcommand to its implementation and execute it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => {
                let cmd = super::run::RunCommand::new(&self.working_dir, &self.settings, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Info(args)) => {
                let cmd = super::info::InfoCommand::new(&self.working_dir, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Validate(args)) => {
                let cmd = super::validate::ValidateCommand::new(
                    &self.working_dir,
                    &self.settings,
                    args.clone(),
                );
                cmd.execute(ui)
            }
            Some(Commands::Schema) => super::schema::SchemaCommand.execute(ui),
            Some(Commands::Completions(args)) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
            None => {
                let cmd =
                    super::run::RunCommand::new(&self.working_dir, &self.settings, RunArgs::default());
                cmd.execute(ui)
            }
        }
    }
}
