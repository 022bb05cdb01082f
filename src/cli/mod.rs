//! Command-line interface for pipewright.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, CompletionsArgs, InfoArgs, RunArgs, ValidateArgs};
pub use commands::{Command, CommandDispatcher, CommandResult, EXIT_FAILURE, EXIT_REJECTED};
