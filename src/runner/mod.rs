//! Workflow execution.
//!
//! - Step ordering in [`dependency`]
//! - Per-run state in [`state`]
//! - Reference resolution in [`resolver`]
//! - Checkpoint stores in [`checkpoint`]
//! - Graph building and node execution in [`executor`]
//! - The top-level driver and summary in [`controller`]
//! - The run output file in [`artifact`]

pub mod artifact;
pub mod checkpoint;
pub mod controller;
pub mod dependency;
pub mod executor;
pub mod resolver;
pub mod state;

pub use artifact::{output_file_name, save_run_output, DEFAULT_OUTPUT_DIR};
pub use checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
pub use controller::{generate_run_id, ExecutionSummary, RunController, RunOptions};
pub use dependency::{DependencyGraph, DependencyGraphBuilder};
pub use executor::{ExecutionGraph, RunProgress, WorkflowExecutor};
pub use resolver::{resolve_inputs, ResolutionMiss, Resolver};
pub use state::{ErrorRecord, RunState, RunStatus, StepRecord};
