//! Graph builder and executor.
//!
//! [`ExecutionGraph::build`] turns a validated workflow into a dependency
//! ordered plan. [`WorkflowExecutor`] walks that plan one node at a time,
//! writing each step's result into the run state and checkpointing after
//! every node. A failing node never aborts the run: its failure becomes an
//! [`ErrorRecord`](crate::runner::state::ErrorRecord) and traversal moves on.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::agents::contract::panic_message;
use crate::agents::{AgentRegistry, AgentResult};
use crate::config::Settings;
use crate::error::{PipewrightError, Result};
use crate::runner::checkpoint::{CheckpointStore, MemoryCheckpointStore};
use crate::runner::dependency::DependencyGraph;
use crate::runner::resolver::resolve_inputs;
use crate::runner::state::{RunState, StepRecord};
use crate::workflow::{step_dependencies, validate_dependencies, StepDefinition, WorkflowDefinition};

/// Progress events emitted while a run executes.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A step is about to start.
    StepStarting {
        id: &'a str,
        agent: &'a str,
        index: usize,
        total: usize,
    },
    /// A step's agent succeeded.
    StepFinished { id: &'a str, result: &'a AgentResult },
    /// A step recorded an error.
    StepFailed { id: &'a str, error: &'a str },
    /// A step was already completed by an earlier attempt.
    StepSkipped { id: &'a str },
}

/// Dependency-ordered execution plan for one workflow.
#[derive(Debug, Clone)]
pub struct ExecutionGraph {
    graph: DependencyGraph,
    order: Vec<String>,
}

impl ExecutionGraph {
    /// Wire one node per step, with edges from every step a step references.
    ///
    /// # Errors
    ///
    /// Returns `DependencyError` for unresolvable references and
    /// `CircularDependency` if the references form a cycle.
    pub fn build(workflow: &WorkflowDefinition) -> Result<Self> {
        validate_dependencies(workflow)?;

        let mut builder = DependencyGraph::builder();
        for step in &workflow.steps {
            builder = builder.add_step(step.id.clone(), step_dependencies(&step.inputs));
        }
        let graph = builder.build()?;
        let order = graph.topological_order()?;

        Ok(Self { graph, order })
    }

    /// Step ids in execution order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Steps grouped so each group only depends on earlier groups.
    pub fn stages(&self) -> Result<Vec<Vec<String>>> {
        self.graph.stages()
    }

    /// Direct dependencies of a step, sorted.
    pub fn dependencies_of(&self, step: &str) -> Vec<String> {
        let mut deps: Vec<String> = self
            .graph
            .dependencies_of(step)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    /// Steps that consume `step`'s output, directly or indirectly, in
    /// execution order.
    pub fn downstream_of(&self, step: &str) -> Vec<String> {
        let downstream = self.graph.transitive_dependents(step);
        self.order
            .iter()
            .filter(|id| downstream.contains(*id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

enum NodeOutcome {
    Completed,
    Failed(String),
}

/// Runs a workflow's steps against an agent registry.
pub struct WorkflowExecutor<'a> {
    workflow: &'a WorkflowDefinition,
    graph: ExecutionGraph,
    settings: &'a Settings,
    registry: &'a mut AgentRegistry,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl<'a> WorkflowExecutor<'a> {
    /// Build the execution graph and bind the collaborators.
    ///
    /// Checkpoints go to an in-process store unless
    /// [`with_checkpoints`](Self::with_checkpoints) supplies another.
    pub fn new(
        workflow: &'a WorkflowDefinition,
        settings: &'a Settings,
        registry: &'a mut AgentRegistry,
    ) -> Result<Self> {
        let graph = ExecutionGraph::build(workflow)?;
        Ok(Self {
            workflow,
            graph,
            settings,
            registry,
            checkpoints: Arc::new(MemoryCheckpointStore::new()),
        })
    }

    pub fn with_checkpoints(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.checkpoints = store;
        self
    }

    pub fn graph(&self) -> &ExecutionGraph {
        &self.graph
    }

    pub fn checkpoints(&self) -> &Arc<dyn CheckpointStore> {
        &self.checkpoints
    }

    /// Run every step from a fresh state.
    pub fn run(&mut self, run_id: &str, overrides: Map<String, Value>) -> RunState {
        self.run_with_progress(run_id, overrides, |_| {})
    }

    /// Run every step from a fresh state, reporting progress.
    pub fn run_with_progress(
        &mut self,
        run_id: &str,
        overrides: Map<String, Value>,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> RunState {
        let mut state = RunState::new(self.workflow, run_id, overrides);
        tracing::info!(
            run_id = %run_id,
            workflow = %self.workflow.workflow_name,
            steps = self.graph.len(),
            "Starting workflow execution"
        );
        self.traverse(&mut state, &mut on_progress);
        state
    }

    /// Continue a checkpointed run, skipping steps it already completed.
    pub fn resume(&mut self, run_id: &str) -> Result<RunState> {
        self.resume_with_progress(run_id, |_| {})
    }

    /// Continue a checkpointed run, reporting progress.
    ///
    /// # Errors
    ///
    /// Returns `RunNotFound` when no checkpoint exists for `run_id` and
    /// `WorkflowMismatch` when the checkpoint belongs to a different
    /// workflow definition.
    pub fn resume_with_progress(
        &mut self,
        run_id: &str,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> Result<RunState> {
        let mut state = self
            .checkpoints
            .get(run_id)?
            .ok_or_else(|| PipewrightError::RunNotFound {
                run_id: run_id.to_string(),
            })?;

        if state.workflow_digest != self.workflow.digest() {
            return Err(PipewrightError::WorkflowMismatch {
                run_id: run_id.to_string(),
            });
        }

        self.reopen_downstream_of_failures(&mut state);

        tracing::info!(
            run_id = %run_id,
            completed = state.completed_steps.len(),
            steps = self.graph.len(),
            "Resuming workflow execution"
        );
        self.traverse(&mut state, &mut on_progress);
        Ok(state)
    }

    /// A step that completed on top of a failed step saw an empty slot.
    /// Once the failed step re-runs, its consumers have to run again too.
    fn reopen_downstream_of_failures(&self, state: &mut RunState) {
        let failed: Vec<&String> = self
            .graph
            .order()
            .iter()
            .filter(|id| !state.is_completed(id))
            .collect();

        for id in failed {
            for dependent in self.graph.downstream_of(id) {
                if state.reopen(&dependent) {
                    tracing::info!(
                        step = %dependent,
                        upstream = %id,
                        "Re-running step whose upstream did not complete"
                    );
                }
            }
        }
    }

    fn traverse(&mut self, state: &mut RunState, on_progress: &mut impl FnMut(RunProgress<'_>)) {
        let workflow = self.workflow;
        let order = self.graph.order().to_vec();
        let total = order.len();

        state.begin();
        self.checkpoint(state);

        for (index, id) in order.iter().enumerate() {
            let Some(step) = workflow.get_step(id) else {
                continue;
            };

            if state.is_completed(id) {
                tracing::info!(step = %id, "Step already completed, skipping");
                on_progress(RunProgress::StepSkipped { id });
                continue;
            }

            on_progress(RunProgress::StepStarting {
                id,
                agent: &step.agent,
                index,
                total,
            });

            match self.run_node(state, step) {
                NodeOutcome::Completed => {
                    if let Some(result) = state.result(id) {
                        on_progress(RunProgress::StepFinished { id, result });
                    }
                }
                NodeOutcome::Failed(error) => {
                    on_progress(RunProgress::StepFailed { id, error: &error });
                }
            }

            self.checkpoint(state);
        }

        state.finish();
        self.checkpoint(state);

        tracing::info!(
            run_id = %state.run_id,
            completed = state.completed_steps.len(),
            total,
            errors = state.errors.len(),
            "Workflow execution finished"
        );
    }

    /// Execute one node. Faults outside the agent contract are caught here.
    fn run_node(&mut self, state: &mut RunState, step: &StepDefinition) -> NodeOutcome {
        state.current_step = Some(step.id.clone());

        let outcome = catch_unwind(AssertUnwindSafe(|| self.execute_node(state, step)));
        match outcome {
            Ok(outcome) => outcome,
            Err(panic) => {
                let error = format!(
                    "Exception during execution: {}",
                    panic_message(panic.as_ref())
                );
                tracing::error!(step = %step.id, error = %error, "Step raised a fault");
                state.push_error(&step.id, error.clone());
                NodeOutcome::Failed(error)
            }
        }
    }

    fn execute_node(&mut self, state: &mut RunState, step: &StepDefinition) -> NodeOutcome {
        let settings = self.settings;

        let Some(handle) = self.registry.get_mut(&step.agent) else {
            let error = format!("Agent {} not found", step.agent);
            tracing::error!(step = %step.id, agent = %step.agent, "Agent not found");
            state.push_error(&step.id, error.clone());
            return NodeOutcome::Failed(error);
        };

        let input = resolve_inputs(&step.inputs, state, settings);
        tracing::debug!(
            step = %step.id,
            inputs = ?input.keys().collect::<Vec<_>>(),
            "Resolved step inputs"
        );

        let result = handle.execute(&input);

        if let Some(budget) = settings.runtime.step_time_budget_secs {
            if result.metadata.execution_time > budget as f64 {
                tracing::warn!(
                    step = %step.id,
                    seconds = result.metadata.execution_time,
                    budget,
                    "Step exceeded its time budget"
                );
            }
        }

        let outcome = if result.is_success() {
            NodeOutcome::Completed
        } else {
            NodeOutcome::Failed(
                result
                    .error_message()
                    .unwrap_or("agent reported failure")
                    .to_string(),
            )
        };

        state.write_slot(&step.id, StepRecord { input, result });
        match &outcome {
            NodeOutcome::Completed => state.mark_completed(&step.id),
            NodeOutcome::Failed(error) => state.push_error(&step.id, error.clone()),
        }
        outcome
    }

    fn checkpoint(&self, state: &RunState) {
        if let Err(e) = self.checkpoints.put(&state.run_id, state) {
            tracing::warn!(run_id = %state.run_id, error = %e, "Failed to write checkpoint");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Agent, AgentError, Payload};
    use crate::runner::state::RunStatus;
    use serde_json::json;

    struct Emit {
        name: &'static str,
        output: Value,
    }

    impl Agent for Emit {
        fn name(&self) -> &str {
            self.name
        }

        fn validate(&self, _input: &Payload) -> bool {
            true
        }

        fn run(&mut self, input: &Payload) -> std::result::Result<Payload, AgentError> {
            let mut out = self.output.as_object().cloned().unwrap_or_default();
            out.insert("received".to_string(), Value::Object(input.clone()));
            Ok(out)
        }
    }

    struct RequireLeads;

    impl Agent for RequireLeads {
        fn name(&self) -> &str {
            "ScoringAgent"
        }

        fn validate(&self, input: &Payload) -> bool {
            input.get("leads").is_some_and(Value::is_array)
        }

        fn run(&mut self, input: &Payload) -> std::result::Result<Payload, AgentError> {
            let count = input["leads"].as_array().map_or(0, Vec::len);
            let mut out = Payload::new();
            out.insert("scored".to_string(), json!(count));
            Ok(out)
        }
    }

    fn workflow(value: Value) -> WorkflowDefinition {
        serde_json::from_value(value).unwrap()
    }

    fn chain() -> WorkflowDefinition {
        workflow(json!({
            "workflow_name": "chain",
            "steps": [
                {"id": "search", "agent": "ProspectSearchAgent", "inputs": {"icp": "{{config.icp}}"}},
                {"id": "score", "agent": "ScoringAgent", "inputs": {"leads": "{{search.leads}}"}},
                {"id": "report", "agent": "ReportAgent", "inputs": {"scored": "{{score.scored}}"}}
            ]
        }))
    }

    fn registry() -> AgentRegistry {
        let mut registry = AgentRegistry::new();
        registry.register(
            "search_1",
            Box::new(Emit {
                name: "ProspectSearchAgent",
                output: json!({"leads": [{"id": 1}, {"id": 2}]}),
            }),
        );
        registry.register("score_1", Box::new(RequireLeads));
        registry.register(
            "report_1",
            Box::new(Emit {
                name: "ReportAgent",
                output: json!({}),
            }),
        );
        registry
    }

    #[test]
    fn graph_orders_by_references() {
        let wf = workflow(json!({
            "workflow_name": "fan",
            "steps": [
                {"id": "search", "agent": "A"},
                {"id": "enrich", "agent": "B", "inputs": {"leads": "{{search.leads}}"}},
                {"id": "score", "agent": "C", "inputs": {"leads": "{{search.leads}}"}},
                {"id": "send", "agent": "D", "inputs": {"a": "{{enrich.x}}", "b": "{{score.y}}"}}
            ]
        }));
        let graph = ExecutionGraph::build(&wf).unwrap();
        assert_eq!(graph.order(), ["search", "enrich", "score", "send"]);
        assert_eq!(graph.stages().unwrap().len(), 3);
        assert_eq!(graph.dependencies_of("send"), vec!["enrich", "score"]);
        assert!(graph.dependencies_of("search").is_empty());
    }

    #[test]
    fn graph_rejects_forward_reference() {
        let wf = workflow(json!({
            "workflow_name": "bad",
            "steps": [
                {"id": "score", "agent": "C", "inputs": {"leads": "{{search.leads}}"}},
                {"id": "search", "agent": "A"}
            ]
        }));
        assert!(matches!(
            ExecutionGraph::build(&wf),
            Err(PipewrightError::DependencyError { .. })
        ));
    }

    #[test]
    fn successful_chain_completes_every_step() {
        let wf = chain();
        let settings = Settings::default();
        let mut registry = registry();
        let mut executor = WorkflowExecutor::new(&wf, &settings, &mut registry).unwrap();

        let state = executor.run("exec_test", Map::new());

        assert_eq!(state.status, RunStatus::Completed);
        assert_eq!(state.completed_steps, vec!["search", "score", "report"]);
        assert!(state.errors.is_empty());
        assert_eq!(state.result("score").unwrap().get("scored"), Some(&json!(2)));
        assert_eq!(
            state.record("search").unwrap().input["icp"],
            settings.namespace("icp").unwrap()
        );
        assert!(state.ended_at.is_some());
    }

    #[test]
    fn missing_agent_leaves_slot_empty_and_continues() {
        let wf = chain();
        let settings = Settings::default();
        let mut registry = AgentRegistry::new();
        registry.register(
            "search_1",
            Box::new(Emit {
                name: "ProspectSearchAgent",
                output: json!({"leads": []}),
            }),
        );
        registry.register(
            "report_1",
            Box::new(Emit {
                name: "ReportAgent",
                output: json!({}),
            }),
        );
        let mut executor = WorkflowExecutor::new(&wf, &settings, &mut registry).unwrap();

        let state = executor.run("exec_test", Map::new());

        assert_eq!(state.status, RunStatus::Completed);
        assert!(state.steps["score"].is_none());
        assert_eq!(state.errors.len(), 1);
        assert_eq!(state.errors[0].step, "score");
        assert_eq!(state.errors[0].error, "Agent ScoringAgent not found");
        assert_eq!(state.completed_steps, vec!["search", "report"]);
        let report_input = &state.record("report").unwrap().input;
        assert_eq!(report_input["scored"], Value::Null);
    }

    #[test]
    fn validation_failure_is_recorded_and_run_continues() {
        let wf = workflow(json!({
            "workflow_name": "miss",
            "steps": [
                {"id": "search", "agent": "ProspectSearchAgent"},
                {"id": "score", "agent": "ScoringAgent", "inputs": {"leads": "{{search.nothing}}"}},
                {"id": "report", "agent": "ReportAgent"}
            ]
        }));
        let settings = Settings::default();
        let mut registry = registry();
        let mut executor = WorkflowExecutor::new(&wf, &settings, &mut registry).unwrap();

        let state = executor.run("exec_test", Map::new());

        assert_eq!(state.errors.len(), 1);
        assert_eq!(state.errors[0].error, "Input validation failed for ScoringAgent");
        let score = state.result("score").unwrap();
        assert!(!score.is_success());
        assert_eq!(score.get("error_type"), Some(&json!("ValidationFailure")));
        assert!(state.is_completed("report"));
        assert!(!state.is_completed("score"));
    }

    #[test]
    fn progress_events_follow_execution() {
        let wf = chain();
        let settings = Settings::default();
        let mut registry = registry();
        let mut executor = WorkflowExecutor::new(&wf, &settings, &mut registry).unwrap();

        let mut events = Vec::new();
        executor.run_with_progress("exec_test", Map::new(), |event| {
            events.push(match event {
                RunProgress::StepStarting { id, index, total, .. } => {
                    format!("start {} {}/{}", id, index + 1, total)
                }
                RunProgress::StepFinished { id, .. } => format!("done {}", id),
                RunProgress::StepFailed { id, .. } => format!("fail {}", id),
                RunProgress::StepSkipped { id } => format!("skip {}", id),
            });
        });

        assert_eq!(
            events,
            vec![
                "start search 1/3",
                "done search",
                "start score 2/3",
                "done score",
                "start report 3/3",
                "done report",
            ]
        );
    }

    #[test]
    fn every_node_transition_is_checkpointed() {
        let wf = chain();
        let settings = Settings::default();
        let mut registry = registry();
        let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
        let mut executor = WorkflowExecutor::new(&wf, &settings, &mut registry)
            .unwrap()
            .with_checkpoints(Arc::clone(&store));

        let state = executor.run("exec_ckpt", Map::new());
        let saved = store.get("exec_ckpt").unwrap().unwrap();
        assert_eq!(saved, state);
    }

    #[test]
    fn resume_skips_completed_steps() {
        let wf = chain();
        let settings = Settings::default();
        let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());

        let mut partial = RunState::new(&wf, "exec_resume", Map::new());
        {
            let mut registry = registry();
            let mut executor = WorkflowExecutor::new(&wf, &settings, &mut registry).unwrap();
            let full = executor.run("exec_resume", Map::new());
            partial.write_slot("search", full.record("search").unwrap().clone());
            partial.mark_completed("search");
        }
        store.put("exec_resume", &partial).unwrap();

        let mut registry = registry();
        let mut executor = WorkflowExecutor::new(&wf, &settings, &mut registry)
            .unwrap()
            .with_checkpoints(Arc::clone(&store));

        let mut skipped = Vec::new();
        let state = executor
            .resume_with_progress("exec_resume", |event| {
                if let RunProgress::StepSkipped { id } = event {
                    skipped.push(id.to_string());
                }
            })
            .unwrap();

        drop(executor);

        assert_eq!(skipped, vec!["search"]);
        assert_eq!(state.completed_steps, vec!["search", "score", "report"]);
        assert_eq!(state.status, RunStatus::Completed);
        assert_eq!(registry.get("ProspectSearchAgent").unwrap().stats().execution_count, 0);
    }

    #[test]
    fn resume_unknown_run_is_error() {
        let wf = chain();
        let settings = Settings::default();
        let mut registry = registry();
        let mut executor = WorkflowExecutor::new(&wf, &settings, &mut registry).unwrap();
        assert!(matches!(
            executor.resume("exec_missing"),
            Err(PipewrightError::RunNotFound { .. })
        ));
    }

    #[test]
    fn resume_against_other_workflow_is_rejected() {
        let wf = chain();
        let other = workflow(json!({
            "workflow_name": "other",
            "steps": [{"id": "search", "agent": "ProspectSearchAgent"}]
        }));
        let settings = Settings::default();
        let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
        store
            .put("exec_other", &RunState::new(&other, "exec_other", Map::new()))
            .unwrap();

        let mut registry = registry();
        let mut executor = WorkflowExecutor::new(&wf, &settings, &mut registry)
            .unwrap()
            .with_checkpoints(store);
        assert!(matches!(
            executor.resume("exec_other"),
            Err(PipewrightError::WorkflowMismatch { .. })
        ));
    }
}
