//! Workflow document validation.
//!
//! Validation runs in two passes, both before any step executes:
//! - [`validate`] checks the document's structure and collects every
//!   violation into one `SchemaError`
//! - [`validate_dependencies`] checks that every reference expression is
//!   well-formed and points at `config` or an earlier step

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::agents::BUILTIN_AGENTS;
use crate::error::{PipewrightError, Result};
use crate::workflow::loader::load;
use crate::workflow::reference::{
    references_in, step_dependencies, Reference, ReferenceRoot, CONFIG_ROOT,
};
use crate::workflow::schema::WorkflowDefinition;

static STEP_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// Maximum length of a step description in [`workflow_info`].
const DESCRIPTION_LIMIT: usize = 100;

/// How strictly the agent names of a document are checked.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Names of the capability providers that exist.
    pub known_agents: Vec<String>,

    /// Unknown agents are violations instead of warnings.
    pub strict: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            known_agents: BUILTIN_AGENTS.iter().map(|name| name.to_string()).collect(),
            strict: false,
        }
    }
}

impl ValidationOptions {
    /// Default known agents with the given strictness.
    pub fn strict(strict: bool) -> Self {
        Self {
            strict,
            ..Self::default()
        }
    }
}

/// A validated workflow plus the non-fatal notices found along the way.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub workflow: WorkflowDefinition,
    pub warnings: Vec<String>,
}

/// Validate a raw document with the default (lenient) options.
pub fn validate(raw: &Value) -> Result<WorkflowDefinition> {
    validate_with(raw, &ValidationOptions::default()).map(|report| report.workflow)
}

/// Validate a raw document, collecting every violation.
///
/// # Errors
///
/// Returns `SchemaError` listing every violation found.
pub fn validate_with(raw: &Value, options: &ValidationOptions) -> Result<ValidationReport> {
    let mut violations = Vec::new();
    let mut warnings = Vec::new();

    let Some(document) = raw.as_object() else {
        return Err(PipewrightError::SchemaError {
            violations: vec!["workflow document must be a mapping".to_string()],
        });
    };

    match document.get("workflow_name") {
        Some(Value::String(_)) => {}
        Some(_) => violations.push("workflow_name: must be a string".to_string()),
        None => violations.push("workflow_name: required".to_string()),
    }
    check_type(document, "description", "description", JsonKind::String, &mut violations);

    match document.get("steps") {
        Some(Value::Array(steps)) if steps.is_empty() => {
            violations.push("steps: workflow must declare at least one step".to_string());
        }
        Some(Value::Array(steps)) => {
            validate_steps(steps, options, &mut violations, &mut warnings);
        }
        Some(_) => violations.push("steps: must be a list".to_string()),
        None => violations.push("steps: required".to_string()),
    }

    if !violations.is_empty() {
        return Err(PipewrightError::SchemaError { violations });
    }

    let workflow: WorkflowDefinition =
        serde_json::from_value(raw.clone()).map_err(|e| PipewrightError::SchemaError {
            violations: vec![e.to_string()],
        })?;

    Ok(ValidationReport { workflow, warnings })
}

fn validate_steps(
    steps: &[Value],
    options: &ValidationOptions,
    violations: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<&str> = HashSet::new();

    for (index, step) in steps.iter().enumerate() {
        let Some(step) = step.as_object() else {
            violations.push(format!("steps[{}]: must be a mapping", index));
            continue;
        };

        match step.get("id") {
            Some(Value::String(id)) => {
                if !STEP_ID.is_match(id) {
                    violations.push(format!(
                        "steps[{}].id: '{}' is not a simple identifier (letters, digits, underscore)",
                        index, id
                    ));
                }
                if id == CONFIG_ROOT {
                    violations.push(format!(
                        "steps[{}].id: '{}' is reserved for settings references",
                        index, id
                    ));
                }
                if !seen.insert(id) && reported.insert(id) {
                    violations.push(format!("Duplicate step id: {}", id));
                }
            }
            Some(_) => violations.push(format!("steps[{}].id: must be a string", index)),
            None => violations.push(format!("steps[{}].id: required", index)),
        }

        match step.get("agent") {
            Some(Value::String(agent)) => {
                if !options.known_agents.iter().any(|known| known == agent) {
                    let notice = format!("steps[{}].agent: unknown agent '{}'", index, agent);
                    if options.strict {
                        violations.push(notice);
                    } else {
                        tracing::warn!(agent = %agent, "Unknown agent referenced by workflow");
                        warnings.push(notice);
                    }
                }
            }
            Some(_) => violations.push(format!("steps[{}].agent: must be a string", index)),
            None => violations.push(format!("steps[{}].agent: required", index)),
        }

        let at = |field: &str| format!("steps[{}].{}", index, field);
        check_type(step, "inputs", &at("inputs"), JsonKind::Mapping, violations);
        check_type(step, "instructions", &at("instructions"), JsonKind::String, violations);
        check_type(step, "output_schema", &at("output_schema"), JsonKind::Mapping, violations);
        check_type(step, "tools", &at("tools"), JsonKind::List, violations);
    }
}

#[derive(Clone, Copy)]
enum JsonKind {
    String,
    Mapping,
    List,
}

fn check_type(
    object: &Map<String, Value>,
    key: &str,
    location: &str,
    kind: JsonKind,
    violations: &mut Vec<String>,
) {
    let Some(value) = object.get(key) else {
        return;
    };
    let (ok, expected) = match kind {
        JsonKind::String => (value.is_string(), "a string"),
        JsonKind::Mapping => (value.is_object(), "a mapping"),
        JsonKind::List => (value.is_array(), "a list"),
    };
    if !ok {
        violations.push(format!("{}: must be {}", location, expected));
    }
}

/// Check every reference expression in every step's inputs.
///
/// A reference must be well-formed and rooted at `config` or at a step
/// declared earlier in the workflow. The first offending reference in
/// declaration order is reported.
///
/// # Errors
///
/// Returns `DependencyError` naming the step and the reference.
pub fn validate_dependencies(workflow: &WorkflowDefinition) -> Result<()> {
    let positions: HashMap<&str, usize> = workflow
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| (step.id.as_str(), index))
        .collect();

    for (index, step) in workflow.steps.iter().enumerate() {
        for expression in references_in(&step.inputs) {
            let dependency_error = |reason: String| PipewrightError::DependencyError {
                step: step.id.clone(),
                reference: format!("{{{{{}}}}}", expression),
                reason,
            };

            let reference = Reference::parse(&expression).map_err(|e| dependency_error(e.to_string()))?;
            let ReferenceRoot::Step(target) = &reference.root else {
                continue;
            };

            match positions.get(target.as_str()) {
                None => {
                    return Err(dependency_error(format!("no step with id '{}'", target)));
                }
                Some(&position) if position == index => {
                    return Err(dependency_error(
                        "a step cannot reference its own result".to_string(),
                    ));
                }
                Some(&position) if position > index => {
                    return Err(dependency_error(format!(
                        "step '{}' is declared later; steps may only reference earlier steps",
                        target
                    )));
                }
                Some(_) => {}
            }
        }
    }

    Ok(())
}

/// Load, validate and dependency-check a workflow file (lenient agents).
pub fn validate_workflow_file(path: &Path) -> Result<WorkflowDefinition> {
    validate_workflow_file_with(path, &ValidationOptions::default()).map(|report| report.workflow)
}

/// Load, validate and dependency-check a workflow file.
pub fn validate_workflow_file_with(
    path: &Path,
    options: &ValidationOptions,
) -> Result<ValidationReport> {
    let raw = load(path)?;
    let report = validate_with(&raw, options)?;
    validate_dependencies(&report.workflow)?;
    tracing::debug!(
        workflow = %report.workflow.workflow_name,
        steps = report.workflow.steps.len(),
        "Workflow validated"
    );
    Ok(report)
}

/// Summary of a workflow for display.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowInfo {
    pub workflow_name: String,
    pub description: String,
    pub total_steps: usize,
    pub steps: Vec<StepInfo>,
}

/// Summary of one step for display.
#[derive(Debug, Clone, Serialize)]
pub struct StepInfo {
    pub id: String,
    pub agent: String,
    pub depends_on: Vec<String>,
    pub description: String,
}

/// Build the display summary of a workflow.
pub fn workflow_info(workflow: &WorkflowDefinition) -> WorkflowInfo {
    WorkflowInfo {
        workflow_name: workflow.workflow_name.clone(),
        description: workflow.description.clone(),
        total_steps: workflow.steps.len(),
        steps: workflow
            .steps
            .iter()
            .map(|step| StepInfo {
                id: step.id.clone(),
                agent: step.agent.clone(),
                depends_on: step_dependencies(&step.inputs),
                description: truncate(&step.instructions, DESCRIPTION_LIMIT),
            })
            .collect(),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let head: String = text.chars().take(limit).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_step() -> Value {
        json!({
            "workflow_name": "demo",
            "description": "search then score",
            "steps": [
                {"id": "search", "agent": "ProspectSearchAgent", "inputs": {"icp": "{{config.icp}}"}},
                {"id": "score", "agent": "ScoringAgent", "inputs": {"leads": "{{search.leads}}"}}
            ]
        })
    }

    fn violations(raw: &Value) -> Vec<String> {
        match validate(raw) {
            Err(PipewrightError::SchemaError { violations }) => violations,
            other => panic!("expected SchemaError, got {:?}", other),
        }
    }

    #[test]
    fn valid_document_keeps_step_order() {
        let workflow = validate(&two_step()).unwrap();
        assert_eq!(workflow.step_ids(), vec!["search", "score"]);
        validate_dependencies(&workflow).unwrap();
    }

    #[test]
    fn empty_steps_is_violation() {
        let found = violations(&json!({"workflow_name": "demo", "steps": []}));
        assert!(found[0].contains("at least one step"));
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let found = violations(&json!({"steps": [{"inputs": {}}]}));
        assert!(found.iter().any(|v| v.starts_with("workflow_name")));
        assert!(found.iter().any(|v| v == "steps[0].id: required"));
        assert!(found.iter().any(|v| v == "steps[0].agent: required"));
    }

    #[test]
    fn duplicate_id_is_named_once() {
        let found = violations(&json!({
            "workflow_name": "demo",
            "steps": [
                {"id": "search", "agent": "ProspectSearchAgent"},
                {"id": "search", "agent": "ProspectSearchAgent"},
                {"id": "search", "agent": "ProspectSearchAgent"}
            ]
        }));
        let duplicates: Vec<_> = found.iter().filter(|v| v.contains("Duplicate")).collect();
        assert_eq!(duplicates.len(), 1);
        assert!(duplicates[0].contains("search"));
    }

    #[test]
    fn non_identifier_id_is_violation() {
        let found = violations(&json!({
            "workflow_name": "demo",
            "steps": [{"id": "lead-search", "agent": "ProspectSearchAgent"}]
        }));
        assert!(found[0].contains("steps[0].id"));
        assert!(found[0].contains("lead-search"));
    }

    #[test]
    fn config_step_id_is_reserved() {
        let found = violations(&json!({
            "workflow_name": "demo",
            "steps": [
                {"id": "config", "agent": "ProspectSearchAgent"},
                {"id": "score", "agent": "ScoringAgent", "inputs": {"leads": "{{config.leads}}"}}
            ]
        }));
        assert_eq!(
            found,
            vec!["steps[0].id: 'config' is reserved for settings references"]
        );
    }

    #[test]
    fn every_violation_is_collected() {
        let found = violations(&json!({
            "workflow_name": "demo",
            "steps": [
                {"id": "a b", "agent": "ProspectSearchAgent"},
                {"id": "ok", "agent": 7, "inputs": []},
                "not a step"
            ]
        }));
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn wrong_optional_field_types_are_violations() {
        let found = violations(&json!({
            "workflow_name": "demo",
            "description": 3,
            "steps": [{
                "id": "s",
                "agent": "ScoringAgent",
                "instructions": ["x"],
                "output_schema": "text",
                "tools": {}
            }]
        }));
        assert!(found.contains(&"description: must be a string".to_string()));
        assert!(found.contains(&"steps[0].instructions: must be a string".to_string()));
        assert!(found.contains(&"steps[0].output_schema: must be a mapping".to_string()));
        assert!(found.contains(&"steps[0].tools: must be a list".to_string()));
    }

    #[test]
    fn unknown_agent_is_warning_when_lenient() {
        let raw = json!({
            "workflow_name": "demo",
            "steps": [{"id": "s", "agent": "MysteryAgent"}]
        });
        let report = validate_with(&raw, &ValidationOptions::default()).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("MysteryAgent"));
    }

    #[test]
    fn unknown_agent_is_violation_when_strict() {
        let raw = json!({
            "workflow_name": "demo",
            "steps": [{"id": "s", "agent": "MysteryAgent"}]
        });
        let result = validate_with(&raw, &ValidationOptions::strict(true));
        assert!(matches!(result, Err(PipewrightError::SchemaError { .. })));
    }

    #[test]
    fn non_mapping_document_is_violation() {
        let found = violations(&json!([1, 2]));
        assert_eq!(found, vec!["workflow document must be a mapping"]);
    }

    fn dependency_error(raw: Value) -> (String, String, String) {
        let workflow = validate(&raw).unwrap();
        match validate_dependencies(&workflow) {
            Err(PipewrightError::DependencyError {
                step,
                reference,
                reason,
            }) => (step, reference, reason),
            other => panic!("expected DependencyError, got {:?}", other),
        }
    }

    #[test]
    fn dangling_reference_names_step_and_reference() {
        let (step, reference, _) = dependency_error(json!({
            "workflow_name": "demo",
            "steps": [
                {"id": "search", "agent": "ProspectSearchAgent"},
                {"id": "score", "agent": "ScoringAgent", "inputs": {"leads": "{{enrich.leads}}"}}
            ]
        }));
        assert_eq!(step, "score");
        assert_eq!(reference, "{{enrich.leads}}");
    }

    #[test]
    fn forward_reference_is_rejected() {
        let (step, _, reason) = dependency_error(json!({
            "workflow_name": "demo",
            "steps": [
                {"id": "score", "agent": "ScoringAgent", "inputs": {"leads": "{{search.leads}}"}},
                {"id": "search", "agent": "ProspectSearchAgent"}
            ]
        }));
        assert_eq!(step, "score");
        assert!(reason.contains("declared later"));
    }

    #[test]
    fn self_reference_is_rejected() {
        let (step, _, reason) = dependency_error(json!({
            "workflow_name": "demo",
            "steps": [{"id": "loop_step", "agent": "ScoringAgent", "inputs": {"x": "{{loop_step.y}}"}}]
        }));
        assert_eq!(step, "loop_step");
        assert!(reason.contains("own result"));
    }

    #[test]
    fn malformed_expression_is_rejected() {
        let (_, reference, _) = dependency_error(json!({
            "workflow_name": "demo",
            "steps": [{"id": "s", "agent": "ScoringAgent", "inputs": {"x": "{{ }}"}}]
        }));
        assert_eq!(reference, "{{}}");
    }

    #[test]
    fn unknown_config_namespace_passes_validation() {
        let workflow = validate(&json!({
            "workflow_name": "demo",
            "steps": [{"id": "s", "agent": "ScoringAgent", "inputs": {"x": "{{config.unknown}}"}}]
        }))
        .unwrap();
        assert!(validate_dependencies(&workflow).is_ok());
    }

    #[test]
    fn nested_references_are_checked() {
        let (step, reference, _) = dependency_error(json!({
            "workflow_name": "demo",
            "steps": [{
                "id": "s",
                "agent": "ScoringAgent",
                "inputs": {"batch": [{"leads": "{{ghost.leads}}"}]}
            }]
        }));
        assert_eq!(step, "s");
        assert_eq!(reference, "{{ghost.leads}}");
    }

    #[test]
    fn workflow_info_lists_dependencies_and_truncates() {
        let mut raw = two_step();
        raw["steps"][1]["instructions"] = json!("x".repeat(150));
        let workflow = validate(&raw).unwrap();
        let info = workflow_info(&workflow);

        assert_eq!(info.total_steps, 2);
        assert_eq!(info.steps[1].depends_on, vec!["search"]);
        assert_eq!(info.steps[1].description.chars().count(), 103);
        assert!(info.steps[0].depends_on.is_empty());
    }
}
