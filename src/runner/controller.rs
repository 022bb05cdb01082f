//! Top-level run driver.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::agents::AgentRegistry;
use crate::config::Settings;
use crate::error::{PipewrightError, Result};
use crate::runner::checkpoint::{CheckpointStore, MemoryCheckpointStore};
use crate::runner::executor::{RunProgress, WorkflowExecutor};
use crate::runner::state::RunState;
use crate::workflow::WorkflowDefinition;

/// Caller choices for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Explicit run id. Generated when absent.
    pub run_id: Option<String>,
    /// Overrides `runtime.max_leads_per_run` for this run.
    pub max_leads: Option<usize>,
    /// Resume this checkpointed run instead of starting fresh.
    pub resume: Option<String>,
}

/// A new run id: `exec_` plus the UTC timestamp down to microseconds.
pub fn generate_run_id() -> String {
    Utc::now().format("exec_%Y%m%d_%H%M%S_%6f").to_string()
}

/// Owns the run id and effective settings, invokes the executor and
/// summarizes the result.
pub struct RunController {
    base: Settings,
    settings: Settings,
    options: RunOptions,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl RunController {
    /// Apply the run's overrides to `settings`.
    pub fn new(base_settings: &Settings, options: RunOptions) -> Self {
        let settings = match options.max_leads {
            Some(max_leads) => {
                tracing::info!(max_leads, "Limiting leads for this run");
                base_settings.with_max_leads(max_leads)
            }
            None => base_settings.clone(),
        };
        Self {
            base: base_settings.clone(),
            settings,
            options,
            checkpoints: Arc::new(MemoryCheckpointStore::new()),
        }
    }

    pub fn with_checkpoints(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.checkpoints = store;
        self
    }

    /// Settings with the caller's overrides applied.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Settings the steps of this run see. Providers should be built from these.
    ///
    /// A resumed run keeps the overrides it was started with, so its
    /// remaining steps run under the same limits as the completed ones.
    ///
    /// # Errors
    ///
    /// Returns `RunNotFound` when resuming a run with no checkpoint and
    /// `OverrideConflict` when the caller's overrides differ from the
    /// recorded ones.
    pub fn effective_settings(&self) -> Result<Settings> {
        let Some(run_id) = &self.options.resume else {
            return Ok(self.settings.clone());
        };

        let state = self
            .checkpoints
            .get(run_id)?
            .ok_or_else(|| PipewrightError::RunNotFound {
                run_id: run_id.clone(),
            })?;
        let recorded = recorded_max_leads(&state.overrides);

        match (recorded, self.options.max_leads) {
            (Some(recorded), Some(requested)) if recorded != requested => {
                Err(PipewrightError::OverrideConflict {
                    run_id: run_id.clone(),
                    message: format!("max_leads was {}, not {}", recorded, requested),
                })
            }
            (None, Some(requested)) => Err(PipewrightError::OverrideConflict {
                run_id: run_id.clone(),
                message: format!("max_leads was not set, not {}", requested),
            }),
            (Some(recorded), _) => {
                tracing::info!(
                    run_id = %run_id,
                    max_leads = recorded,
                    "Restoring recorded overrides"
                );
                Ok(self.base.with_max_leads(recorded))
            }
            (None, None) => Ok(self.base.clone()),
        }
    }

    /// Overrides recorded in the run state.
    pub fn overrides(&self) -> Map<String, Value> {
        let mut overrides = Map::new();
        if let Some(max_leads) = self.options.max_leads {
            overrides.insert(
                "config_overrides".to_string(),
                json!({ "max_leads": max_leads }),
            );
        }
        overrides
    }

    /// Execute (or resume) the workflow.
    pub fn execute(
        &self,
        workflow: &WorkflowDefinition,
        registry: &mut AgentRegistry,
        on_progress: impl FnMut(RunProgress<'_>),
    ) -> Result<RunState> {
        let settings = self.effective_settings()?;
        let mut executor = WorkflowExecutor::new(workflow, &settings, registry)?
            .with_checkpoints(Arc::clone(&self.checkpoints));

        match &self.options.resume {
            Some(run_id) => executor.resume_with_progress(run_id, on_progress),
            None => {
                let run_id = self.options.run_id.clone().unwrap_or_else(generate_run_id);
                Ok(executor.run_with_progress(&run_id, self.overrides(), on_progress))
            }
        }
    }
}

fn recorded_max_leads(overrides: &Map<String, Value>) -> Option<usize> {
    overrides
        .get("config_overrides")?
        .get("max_leads")?
        .as_u64()
        .map(|n| n as usize)
}

/// Human-readable outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    pub workflow_name: String,
    pub run_id: String,
    pub total_steps: usize,
    pub completed_steps: Vec<String>,
    /// `(step, message)` per recorded error.
    pub errors: Vec<(String, String)>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
}

impl ExecutionSummary {
    pub fn from_state(state: &RunState) -> Self {
        Self {
            workflow_name: state.workflow_name.clone(),
            run_id: state.run_id.clone(),
            total_steps: state.steps.len(),
            completed_steps: state.completed_steps.clone(),
            errors: state
                .errors
                .iter()
                .map(|record| (record.step.clone(), record.error.clone()))
                .collect(),
            started_at: state.started_at,
            ended_at: state.ended_at,
            duration_secs: state.duration().num_milliseconds() as f64 / 1000.0,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed_steps.len()
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ExecutionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Workflow: {}", self.workflow_name)?;
        writeln!(f, "Run ID: {}", self.run_id)?;
        writeln!(
            f,
            "Completed Steps: {}/{}",
            self.completed(),
            self.total_steps
        )?;
        for step in &self.completed_steps {
            writeln!(f, "  ✓ {}", step)?;
        }
        if !self.errors.is_empty() {
            writeln!(f, "Errors Encountered: {}", self.errors.len())?;
            for (step, error) in &self.errors {
                writeln!(f, "  ✗ {}: {}", step, error)?;
            }
        }
        writeln!(f, "Total Duration: {:.2} seconds", self.duration_secs)?;
        writeln!(f, "Start: {}", self.started_at.to_rfc3339())?;
        if let Some(ended_at) = self.ended_at {
            writeln!(f, "End: {}", ended_at.to_rfc3339())?;
        }
        if self.success() {
            write!(f, "Workflow completed successfully")
        } else {
            write!(f, "Workflow completed with errors")
        }
    }
}
