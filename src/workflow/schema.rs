//! Workflow document schema.
//!
//! These structs map to the workflow source document (JSON or YAML).
//! They are only constructed after [`validate`](crate::workflow::validate)
//! has checked the raw document, so their invariants (non-empty steps,
//! unique identifier ids) hold for every value handed to the runner.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A validated workflow: a name, a description and an ordered step list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowDefinition {
    /// Workflow name, shown in summaries and recorded in run state.
    pub workflow_name: String,

    /// Free-text description.
    #[serde(default)]
    pub description: String,

    /// Steps in declaration order.
    pub steps: Vec<StepDefinition>,
}

/// One named unit of work bound to a capability provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepDefinition {
    /// Unique identifier (letters, digits, underscore).
    pub id: String,

    /// Name of the capability provider that runs this step.
    pub agent: String,

    /// Input mapping. String values may contain `{{step.field}}` or
    /// `{{config.namespace.field}}` reference expressions.
    #[serde(default)]
    pub inputs: Map<String, Value>,

    /// Free-text instructions for the provider. Descriptive only.
    #[serde(default)]
    pub instructions: String,

    /// Expected output shape. Descriptive only, never enforced.
    #[serde(default)]
    pub output_schema: Map<String, Value>,

    /// Tools the provider is expected to use. Descriptive only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolConfig>,
}

/// A tool declared on a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolConfig {
    pub name: String,

    #[serde(default)]
    pub config: Map<String, Value>,
}

impl WorkflowDefinition {
    /// Look up a step by id.
    pub fn get_step(&self, id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// Step ids in declaration order.
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.id.as_str()).collect()
    }

    /// SHA-256 of the canonical JSON encoding, hex-encoded.
    ///
    /// Object keys serialize in sorted order, so two documents that differ
    /// only in key order or formatting share a digest.
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let hash = Sha256::digest(&canonical);
        hex::encode(&hash[..])
    }
}

/// JSON Schema describing the workflow document format.
pub fn workflow_json_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(WorkflowDefinition)).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> WorkflowDefinition {
        serde_json::from_value(json!({
            "workflow_name": "demo",
            "steps": [
                {"id": "search", "agent": "ProspectSearchAgent"},
                {"id": "score", "agent": "ScoringAgent", "inputs": {"leads": "{{search.leads}}"}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let workflow = sample();
        assert_eq!(workflow.description, "");
        let step = workflow.get_step("search").unwrap();
        assert!(step.inputs.is_empty());
        assert!(step.output_schema.is_empty());
        assert!(step.tools.is_empty());
    }

    #[test]
    fn get_step_finds_by_id() {
        let workflow = sample();
        assert_eq!(workflow.get_step("score").unwrap().agent, "ScoringAgent");
        assert!(workflow.get_step("missing").is_none());
    }

    #[test]
    fn step_ids_keep_declaration_order() {
        assert_eq!(sample().step_ids(), vec!["search", "score"]);
    }

    #[test]
    fn tools_parse_with_config() {
        let step: StepDefinition = serde_json::from_value(json!({
            "id": "send",
            "agent": "OutreachExecutorAgent",
            "tools": [{"name": "MailClient", "config": {"batch": 10}}]
        }))
        .unwrap();
        assert_eq!(step.tools[0].name, "MailClient");
        assert_eq!(step.tools[0].config["batch"], json!(10));
    }

    #[test]
    fn digest_ignores_formatting_and_key_order() {
        let a: WorkflowDefinition = serde_json::from_str(
            r#"{"workflow_name":"demo","steps":[{"id":"s","agent":"A","inputs":{"x":1,"y":2}}]}"#,
        )
        .unwrap();
        let b: WorkflowDefinition = serde_json::from_str(
            r#"{
                "steps": [{"agent": "A", "id": "s", "inputs": {"y": 2, "x": 1}}],
                "workflow_name": "demo"
            }"#,
        )
        .unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn digest_changes_with_content() {
        let mut other = sample();
        other.steps[1].agent = "OutreachContentAgent".to_string();
        assert_ne!(sample().digest(), other.digest());
    }

    #[test]
    fn json_schema_describes_steps() {
        let schema = workflow_json_schema();
        let text = schema.to_string();
        assert!(text.contains("workflow_name"));
        assert!(text.contains("StepDefinition"));
    }
}
