//! Pipewright - declarative multi-step agent pipelines.
//!
//! A workflow document names an ordered list of steps, each bound to a
//! capability provider (an *agent*) and an input mapping whose values may
//! reference earlier steps' results or static settings. Pipewright validates
//! the document, orders the steps by their references, runs each one through
//! a uniform agent contract and accumulates results and errors in a
//! checkpointable run state.
//!
//! # Modules
//!
//! - [`agents`] - Agent contract, registry and simulated providers
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings loading (file, `.env`, environment)
//! - [`error`] - Error types and result aliases
//! - [`runner`] - Dependency ordering, resolution, execution and checkpoints
//! - [`ui`] - Terminal output and spinners
//! - [`workflow`] - Workflow documents, validation and references
//!
//! # Example
//!
//! ```
//! use pipewright::agents::{register_simulated, AgentRegistry};
//! use pipewright::config::Settings;
//! use pipewright::runner::WorkflowExecutor;
//! use pipewright::workflow::{load_str, validate, DocumentFormat};
//!
//! let raw = load_str(
//!     r#"{
//!         "workflow_name": "demo",
//!         "steps": [
//!             {"id": "search", "agent": "ProspectSearchAgent", "inputs": {"icp": "{{config.icp}}"}},
//!             {"id": "enrich", "agent": "DataEnrichmentAgent", "inputs": {"leads": "{{search.leads}}"}}
//!         ]
//!     }"#,
//!     DocumentFormat::Json,
//! )
//! .unwrap();
//! let workflow = validate(&raw).unwrap();
//!
//! let settings = Settings::default();
//! let mut registry = AgentRegistry::new();
//! register_simulated(&mut registry, &settings);
//!
//! let mut executor = WorkflowExecutor::new(&workflow, &settings, &mut registry).unwrap();
//! let state = executor.run("exec_doc", Default::default());
//! assert_eq!(state.completed_steps, vec!["search", "enrich"]);
//! ```

pub mod agents;
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod ui;
pub mod workflow;

pub use error::{PipewrightError, Result};
