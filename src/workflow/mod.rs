//! Workflow documents: schema, loading, validation and references.
//!
//! - Schema definitions in [`schema`]
//! - Loading JSON/YAML sources in [`loader`]
//! - Structural and dependency validation in [`validator`]
//! - Reference expression parsing in [`reference`]
//!
//! # Example
//!
//! ```
//! use pipewright::workflow::{load_str, validate, validate_dependencies, DocumentFormat};
//!
//! let raw = load_str(
//!     r#"{
//!         "workflow_name": "demo",
//!         "steps": [
//!             {"id": "search", "agent": "ProspectSearchAgent", "inputs": {"icp": "{{config.icp}}"}},
//!             {"id": "score", "agent": "ScoringAgent", "inputs": {"leads": "{{search.leads}}"}}
//!         ]
//!     }"#,
//!     DocumentFormat::Json,
//! )
//! .unwrap();
//!
//! let workflow = validate(&raw).unwrap();
//! validate_dependencies(&workflow).unwrap();
//! assert_eq!(workflow.steps.len(), 2);
//! ```

pub mod loader;
pub mod reference;
pub mod schema;
pub mod validator;

pub use loader::{load, load_str, DocumentFormat, DEFAULT_WORKFLOW_FILE};
pub use reference::{
    has_reference, parse_template, references_in, step_dependencies, visit_strings, Reference,
    ReferenceError, ReferenceRoot, Segment, CONFIG_ROOT, TRANSPARENT_SEGMENT,
};
pub use schema::{workflow_json_schema, StepDefinition, ToolConfig, WorkflowDefinition};
pub use validator::{
    validate, validate_dependencies, validate_with, validate_workflow_file,
    validate_workflow_file_with, workflow_info, StepInfo, ValidationOptions, ValidationReport,
    WorkflowInfo,
};
