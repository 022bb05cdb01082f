//! Reference resolution.
//!
//! Turns a step's declared input mapping into concrete values just before
//! the step runs. Resolution is pure: it reads the run state and settings
//! and never mutates either. A reference that cannot be followed resolves
//! to `null` and is logged as a miss; it never fails.

use serde_json::{Map, Value};

use crate::config::Settings;
use crate::runner::state::RunState;
use crate::workflow::{parse_template, Reference, ReferenceRoot, Segment};

/// Where and why a reference resolved to no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionMiss {
    /// The expression as written between the delimiters.
    pub reference: String,
    /// The segment at which resolution stopped.
    pub stopped_at: String,
}

/// Read-only view used to resolve references.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    state: &'a RunState,
    settings: &'a Settings,
}

impl<'a> Resolver<'a> {
    pub fn new(state: &'a RunState, settings: &'a Settings) -> Self {
        Self { state, settings }
    }

    /// Resolve every reference in an input mapping.
    pub fn resolve_inputs(&self, inputs: &Map<String, Value>) -> Map<String, Value> {
        inputs
            .iter()
            .map(|(key, value)| (key.clone(), self.resolve_value(value)))
            .collect()
    }

    fn resolve_value(&self, value: &Value) -> Value {
        match value {
            Value::String(text) => self.resolve_string(text),
            Value::Object(map) => Value::Object(self.resolve_inputs(map)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(map) => Value::Object(self.resolve_inputs(map)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Resolve a string that may contain references.
    ///
    /// A string that is exactly one reference keeps the referenced value's
    /// type. Otherwise every reference is replaced by its text.
    pub fn resolve_string(&self, text: &str) -> Value {
        let segments = parse_template(text);
        match segments.as_slice() {
            [Segment::Reference(expression)] => self.resolve_reference(expression),
            _ if segments.iter().all(|s| matches!(s, Segment::Literal(_))) => {
                Value::String(text.to_string())
            }
            _ => {
                let mut out = String::new();
                for segment in &segments {
                    match segment {
                        Segment::Literal(literal) => out.push_str(literal),
                        Segment::Reference(expression) => {
                            out.push_str(&scalar_text(&self.resolve_reference(expression)));
                        }
                    }
                }
                Value::String(out)
            }
        }
    }

    /// Resolve one expression, logging and returning `null` on a miss.
    pub fn resolve_reference(&self, expression: &str) -> Value {
        match self.lookup(expression) {
            Ok(value) => value,
            Err(miss) => {
                tracing::warn!(
                    reference = %miss.reference,
                    stopped_at = %miss.stopped_at,
                    "Reference resolved to no value"
                );
                Value::Null
            }
        }
    }

    /// Follow one expression, reporting where it stopped on a miss.
    pub fn lookup(&self, expression: &str) -> Result<Value, ResolutionMiss> {
        let miss = |stopped_at: &str| ResolutionMiss {
            reference: expression.to_string(),
            stopped_at: stopped_at.to_string(),
        };

        let reference = Reference::parse(expression).map_err(|_| miss(expression))?;
        let path = reference.path();

        let (root, rest) = match &reference.root {
            ReferenceRoot::Config => {
                let Some((namespace, rest)) = path.split_first() else {
                    return Err(miss("config"));
                };
                let value = self.settings.namespace(namespace).ok_or_else(|| miss(namespace))?;
                (value, rest)
            }
            ReferenceRoot::Step(id) => {
                let result = self.state.result(id).ok_or_else(|| miss(id))?;
                (result.to_value(), path.as_slice())
            }
        };

        navigate(root, rest).map_err(|stopped_at| miss(stopped_at))
    }
}

fn navigate<'p>(mut current: Value, path: &[&'p str]) -> Result<Value, &'p str> {
    for segment in path {
        current = match current {
            Value::Object(mut map) => map.remove(*segment).ok_or(*segment)?,
            Value::Array(mut items) => {
                let index: usize = segment.parse().map_err(|_| *segment)?;
                if index >= items.len() {
                    return Err(*segment);
                }
                items.swap_remove(index)
            }
            _ => return Err(*segment),
        };
    }
    Ok(current)
}

/// Text of a value embedded in a larger string.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Resolve an input mapping against a run state and settings.
pub fn resolve_inputs(
    inputs: &Map<String, Value>,
    state: &RunState,
    settings: &Settings,
) -> Map<String, Value> {
    Resolver::new(state, settings).resolve_inputs(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentResult, ResultMetadata};
    use crate::runner::state::StepRecord;
    use crate::workflow::WorkflowDefinition;
    use chrono::Utc;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn state_with_search() -> RunState {
        let workflow: WorkflowDefinition = serde_json::from_value(json!({
            "workflow_name": "demo",
            "steps": [
                {"id": "search", "agent": "ProspectSearchAgent"},
                {"id": "enrich", "agent": "DataEnrichmentAgent"},
                {"id": "score", "agent": "ScoringAgent"}
            ]
        }))
        .unwrap();
        let mut state = RunState::new(&workflow, "exec_test", Map::new());
        state.write_slot(
            "search",
            StepRecord {
                input: Map::new(),
                result: AgentResult {
                    payload: map(json!({
                        "leads": [{"id": 1, "email": "a@x.com"}, {"id": 2}],
                        "total_found": 2
                    })),
                    metadata: ResultMetadata {
                        agent_name: "ProspectSearchAgent".to_string(),
                        agent_id: "prospect_search".to_string(),
                        execution_time: 0.0,
                        timestamp: Utc::now(),
                        success: true,
                        error_message: None,
                    },
                },
            },
        );
        state
    }

    #[test]
    fn exact_reference_keeps_type() {
        let state = state_with_search();
        let settings = Settings::default();
        let resolver = Resolver::new(&state, &settings);

        assert_eq!(
            resolver.resolve_string("{{search.leads}}"),
            json!([{"id": 1, "email": "a@x.com"}, {"id": 2}])
        );
        assert_eq!(resolver.resolve_string("{{search.total_found}}"), json!(2));
    }

    #[test]
    fn output_segment_is_transparent() {
        let state = state_with_search();
        let settings = Settings::default();
        let resolver = Resolver::new(&state, &settings);
        assert_eq!(
            resolver.resolve_string("{{search.output.total_found}}"),
            json!(2)
        );
    }

    #[test]
    fn numeric_segments_index_arrays() {
        let state = state_with_search();
        let settings = Settings::default();
        let resolver = Resolver::new(&state, &settings);
        assert_eq!(
            resolver.resolve_string("{{search.leads.0.email}}"),
            json!("a@x.com")
        );
        assert_eq!(resolver.resolve_string("{{search.leads.5}}"), Value::Null);
    }

    #[test]
    fn mixed_text_is_interpolated() {
        let state = state_with_search();
        let settings = Settings::default();
        let resolver = Resolver::new(&state, &settings);
        assert_eq!(
            resolver.resolve_string("Found {{search.total_found}} leads{{search.nothing}}"),
            json!("Found 2 leads")
        );
    }

    #[test]
    fn config_namespaces_resolve() {
        let state = state_with_search();
        let settings = Settings::default();
        let resolver = Resolver::new(&state, &settings);

        assert_eq!(
            resolver.resolve_string("{{config.scoring}}"),
            Value::Object(settings.scoring.clone())
        );
        assert_eq!(
            resolver.resolve_string("{{config.scoring.weights.industry_match}}"),
            json!(0.3)
        );
        assert_eq!(resolver.resolve_string("{{config.unknown}}"), Value::Null);
    }

    #[test]
    fn absent_step_and_absent_field_stop_at_different_segments() {
        let state = state_with_search();
        let settings = Settings::default();
        let resolver = Resolver::new(&state, &settings);

        let never_ran = resolver.lookup("enrich.enriched_leads").unwrap_err();
        assert_eq!(never_ran.stopped_at, "enrich");

        let missing_field = resolver.lookup("search.enriched_leads").unwrap_err();
        assert_eq!(missing_field.stopped_at, "enriched_leads");

        assert_eq!(resolver.resolve_reference("enrich.enriched_leads"), Value::Null);
        assert_eq!(resolver.resolve_reference("search.enriched_leads"), Value::Null);
    }

    #[test]
    fn traversal_recurses_into_mappings_and_list_mappings() {
        let state = state_with_search();
        let settings = Settings::default();
        let inputs = map(json!({
            "nested": {"count": "{{search.total_found}}"},
            "batch": [{"leads": "{{search.leads.1}}"}, "{{search.total_found}}", 7],
            "flag": true,
            "plain": "text"
        }));

        let resolved = resolve_inputs(&inputs, &state, &settings);
        assert_eq!(resolved["nested"]["count"], json!(2));
        assert_eq!(resolved["batch"][0]["leads"], json!({"id": 2}));
        assert_eq!(resolved["batch"][1], json!("{{search.total_found}}"));
        assert_eq!(resolved["batch"][2], json!(7));
        assert_eq!(resolved["flag"], json!(true));
        assert_eq!(resolved["plain"], json!("text"));
    }

    #[test]
    fn resolution_is_idempotent_and_pure() {
        let state = state_with_search();
        let before = state.clone();
        let settings = Settings::default();
        let inputs = map(json!({
            "leads": "{{search.leads}}",
            "icp": "{{config.icp}}",
            "missing": "{{score.ranked_leads}}"
        }));

        let first = resolve_inputs(&inputs, &state, &settings);
        let second = resolve_inputs(&inputs, &state, &settings);
        assert_eq!(first, second);
        assert_eq!(state, before);
        assert_eq!(first["missing"], Value::Null);
    }
}
