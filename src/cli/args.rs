//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::workflow::DEFAULT_WORKFLOW_FILE;

/// Pipewright - run declarative agent workflows.
#[derive(Debug, Parser)]
#[command(name = "pipewright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to settings file (overrides ./pipewright.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Execute a workflow (default if no command specified)
    Run(RunArgs),

    /// Show workflow information and execution stages
    Info(InfoArgs),

    /// Validate a workflow without running it
    Validate(ValidateArgs),

    /// Print the JSON Schema of the workflow document format
    Schema,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Workflow document (JSON or YAML)
    #[arg(short, long, default_value = DEFAULT_WORKFLOW_FILE)]
    pub workflow: PathBuf,

    /// Maximum number of leads to process (overrides settings)
    #[arg(long)]
    pub max_leads: Option<usize>,

    /// Do not write the run output file
    #[arg(long)]
    pub no_save: bool,

    /// Directory for the run output file
    #[arg(long, default_value = crate::runner::DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Persist checkpoints in this directory (in-memory otherwise)
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Resume a checkpointed run by id (requires --checkpoint-dir)
    #[arg(long, requires = "checkpoint_dir")]
    pub resume: Option<String>,

    /// Treat unknown agents as validation errors
    #[arg(long)]
    pub strict: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            workflow: PathBuf::from(DEFAULT_WORKFLOW_FILE),
            max_leads: None,
            no_save: false,
            output_dir: PathBuf::from(crate::runner::DEFAULT_OUTPUT_DIR),
            checkpoint_dir: None,
            resume: None,
            strict: false,
        }
    }
}

/// Arguments for the `info` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InfoArgs {
    /// Workflow document (JSON or YAML)
    #[arg(short, long, default_value = DEFAULT_WORKFLOW_FILE)]
    pub workflow: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ValidateArgs {
    /// Workflow document (JSON or YAML)
    #[arg(short, long, default_value = DEFAULT_WORKFLOW_FILE)]
    pub workflow: PathBuf,

    /// Treat unknown agents as validation errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
