//! Run state accumulated while a workflow executes.
//!
//! [`RunState`] is created fresh per run, mutated only by the executor and
//! frozen once its status is [`RunStatus::Completed`]. Readers (resolver,
//! summaries, artifacts) only ever see shared references.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::agents::{AgentResult, Payload};
use crate::workflow::WorkflowDefinition;

/// Lifecycle of a run. A run with step errors still ends `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Initialized,
    Running,
    Completed,
}

/// What a step received and what its agent returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Inputs after reference resolution.
    pub input: Payload,
    pub result: AgentResult,
}

/// A non-fatal failure of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub step: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Shared record of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub workflow_name: String,
    pub run_id: String,
    pub status: RunStatus,

    /// Step currently (or most recently) executing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,

    /// One slot per declared step. `None` until the step writes its record;
    /// stays `None` when the step's agent could not be found.
    pub steps: BTreeMap<String, Option<StepRecord>>,

    /// In completion order. Only a resume removes entries, for steps that
    /// consumed the output of a step that failed.
    pub completed_steps: Vec<String>,

    /// Append-only, in the order failures happened.
    pub errors: Vec<ErrorRecord>,

    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    /// Caller-supplied overrides, e.g. `config_overrides.max_leads`.
    #[serde(default)]
    pub overrides: Map<String, Value>,

    /// Digest of the workflow definition this run executes.
    pub workflow_digest: String,
}

impl RunState {
    /// Fresh state with one empty slot per declared step.
    pub fn new(
        workflow: &WorkflowDefinition,
        run_id: impl Into<String>,
        overrides: Map<String, Value>,
    ) -> Self {
        Self {
            workflow_name: workflow.workflow_name.clone(),
            run_id: run_id.into(),
            status: RunStatus::Initialized,
            current_step: None,
            steps: workflow
                .steps
                .iter()
                .map(|step| (step.id.clone(), None))
                .collect(),
            completed_steps: Vec::new(),
            errors: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
            overrides,
            workflow_digest: workflow.digest(),
        }
    }

    /// Record written by a step, if any.
    pub fn record(&self, step: &str) -> Option<&StepRecord> {
        self.steps.get(step).and_then(Option::as_ref)
    }

    /// Agent result of a step, if it ran.
    pub fn result(&self, step: &str) -> Option<&AgentResult> {
        self.record(step).map(|record| &record.result)
    }

    pub fn is_completed(&self, step: &str) -> bool {
        self.completed_steps.iter().any(|done| done == step)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors recorded for one step.
    pub fn errors_for<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a ErrorRecord> + 'a {
        self.errors.iter().filter(move |record| record.step == step)
    }

    /// Wall-clock duration, up to now if the run hasn't ended.
    pub fn duration(&self) -> chrono::Duration {
        self.ended_at.unwrap_or_else(Utc::now) - self.started_at
    }

    pub(crate) fn begin(&mut self) {
        self.status = RunStatus::Running;
        self.ended_at = None;
    }

    pub(crate) fn finish(&mut self) {
        self.status = RunStatus::Completed;
        self.current_step = None;
        self.ended_at = Some(Utc::now());
    }

    pub(crate) fn write_slot(&mut self, step: &str, record: StepRecord) {
        self.steps.insert(step.to_string(), Some(record));
    }

    pub(crate) fn mark_completed(&mut self, step: &str) {
        if !self.is_completed(step) {
            self.completed_steps.push(step.to_string());
        }
    }

    /// Forget that `step` completed so the next traversal runs it again.
    pub(crate) fn reopen(&mut self, step: &str) -> bool {
        let before = self.completed_steps.len();
        self.completed_steps.retain(|done| done != step);
        self.completed_steps.len() != before
    }

    pub(crate) fn push_error(&mut self, step: &str, error: impl Into<String>) {
        self.errors.push(ErrorRecord {
            step: step.to_string(),
            error: error.into(),
            timestamp: Utc::now(),
        });
    }
}
