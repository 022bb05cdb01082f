//! Error types for pipewright operations.
//!
//! This module defines [`PipewrightError`], the error type for everything
//! that can stop a run *before* it starts (bad documents, bad references,
//! unreadable settings, missing checkpoints), and a [`Result`] alias.
//!
//! # Error Handling Strategy
//!
//! - Document-level and dependency-level problems are `PipewrightError`s and
//!   abort the run before any step executes
//! - Failures inside a step never surface here: they become
//!   [`AgentError`](crate::agents::AgentError)s and are recorded in the run state
//! - Use `anyhow::Error` (via `PipewrightError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pipewright operations.
#[derive(Debug, Error)]
pub enum PipewrightError {
    /// Workflow document not found at the given location.
    #[error("Workflow not found: {path}")]
    WorkflowNotFound { path: PathBuf },

    /// Workflow source is not well-formed structured data.
    #[error("Failed to parse workflow {source_name}: {message}")]
    ParseError {
        source_name: String,
        message: String,
    },

    /// Workflow document failed structural validation.
    #[error("Invalid workflow: {}", .violations.join("; "))]
    SchemaError { violations: Vec<String> },

    /// A step references something that cannot be resolved.
    #[error("Step '{step}' has unresolvable reference '{reference}': {reason}")]
    DependencyError {
        step: String,
        reference: String,
        reason: String,
    },

    /// Step dependency cycle detected.
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// Settings file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse settings.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// No checkpoint exists for the requested run.
    #[error("No checkpoint found for run {run_id}")]
    RunNotFound { run_id: String },

    /// Checkpoint could not be written or read back.
    #[error("Checkpoint error for run {run_id}: {message}")]
    CheckpointError { run_id: String, message: String },

    /// A checkpoint was taken against a different workflow definition.
    #[error("Run {run_id} was recorded against a different workflow definition")]
    WorkflowMismatch { run_id: String },

    /// A resume asked for overrides other than the ones the run started with.
    #[error("Run {run_id} cannot be resumed with different overrides: {message}")]
    OverrideConflict { run_id: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipewrightError {
    /// Whether this error was raised while checking the workflow document,
    /// before anything ran.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::WorkflowNotFound { .. }
                | Self::ParseError { .. }
                | Self::SchemaError { .. }
                | Self::DependencyError { .. }
                | Self::CircularDependency { .. }
        )
    }
}

/// Result type alias for pipewright operations.
pub type Result<T> = std::result::Result<T, PipewrightError>;
