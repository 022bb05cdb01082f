//! Run command implementation.
//!
//! The `pipewright run` command validates a workflow, executes it through
//! the run controller with per-step progress, prints the summary and saves
//! the run output file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::agents::{register_simulated, AgentRegistry};
use crate::cli::args::RunArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::runner::{
    save_run_output, ExecutionSummary, FileCheckpointStore, RunController, RunOptions,
    RunProgress, RunState,
};
use crate::ui::{SpinnerHandle, UserInterface};
use crate::workflow::{validate_workflow_file_with, ValidationOptions, WorkflowDefinition};

use super::dispatcher::{Command, CommandResult, EXIT_FAILURE, EXIT_REJECTED};
use super::validate::report_rejection;

/// The run command implementation.
pub struct RunCommand {
    working_dir: PathBuf,
    settings: Settings,
    args: RunArgs,
}

impl RunCommand {
    pub fn new(working_dir: &Path, settings: &Settings, args: RunArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            settings: settings.clone(),
            args,
        }
    }

    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    fn controller(&self) -> RunController {
        let controller = RunController::new(
            &self.settings,
            RunOptions {
                run_id: None,
                max_leads: self.args.max_leads,
                resume: self.args.resume.clone(),
            },
        );
        match &self.args.checkpoint_dir {
            Some(dir) => controller
                .with_checkpoints(Arc::new(FileCheckpointStore::new(self.working_dir.join(dir)))),
            None => controller,
        }
    }

    fn registry(&self, settings: &Settings, ui: &mut dyn UserInterface) -> AgentRegistry {
        let mut registry = AgentRegistry::new();
        if settings.runtime.simulation {
            register_simulated(&mut registry, settings);
        } else {
            ui.warning("Simulation is disabled and no live providers are registered");
        }
        registry
    }

    fn execute_workflow(
        &self,
        workflow: &WorkflowDefinition,
        controller: &RunController,
        registry: &mut AgentRegistry,
        ui: &mut dyn UserInterface,
    ) -> Result<RunState> {
        let verbose = ui.output_mode().is_verbose();
        let mut spinner: Option<Box<dyn SpinnerHandle>> = None;

        controller.execute(workflow, registry, |event| match event {
            RunProgress::StepStarting {
                id,
                agent,
                index,
                total,
            } => {
                ui.show_progress(index + 1, total);
                spinner = Some(ui.start_spinner(&format!("{} ({})", id, agent)));
            }
            RunProgress::StepFinished { id, result } => {
                let line = format!("{} ({:.2}s)", id, result.metadata.execution_time);
                match spinner.take() {
                    Some(mut s) => s.finish_success(&line),
                    None => ui.success(&line),
                }
                if verbose {
                    let keys: Vec<&str> = result.payload.keys().map(String::as_str).collect();
                    ui.message(&format!("    outputs: {}", keys.join(", ")));
                }
            }
            RunProgress::StepFailed { id, error } => {
                let line = format!("{}: {}", id, error);
                match spinner.take() {
                    Some(mut s) => s.finish_error(&line),
                    None => ui.error(&line),
                }
            }
            RunProgress::StepSkipped { id } => {
                ui.start_spinner(id)
                    .finish_skipped(&format!("{} (already completed)", id));
            }
        })
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = self.working_dir.join(&self.args.workflow);
        let strict = self.args.strict || self.settings.runtime.strict_agents;

        let report = match validate_workflow_file_with(&path, &ValidationOptions::strict(strict)) {
            Ok(report) => report,
            Err(e) if e.is_rejection() => {
                report_rejection(ui, &path, &e);
                return Ok(CommandResult::failure(EXIT_REJECTED));
            }
            Err(e) => return Err(e),
        };
        for warning in &report.warnings {
            ui.warning(warning);
        }
        let workflow = report.workflow;

        let controller = self.controller();
        if let Some(max_leads) = self.args.max_leads {
            ui.message(&format!("Limiting to {} leads", max_leads));
        }
        let settings = controller.effective_settings()?;
        let mut registry = self.registry(&settings, ui);

        ui.show_header(&format!("Running {}", workflow.workflow_name));

        let state = match self.execute_workflow(&workflow, &controller, &mut registry, ui) {
            Ok(state) => state,
            Err(e) if e.is_rejection() => {
                report_rejection(ui, &path, &e);
                return Ok(CommandResult::failure(EXIT_REJECTED));
            }
            Err(e) => return Err(e),
        };

        let summary = ExecutionSummary::from_state(&state);
        ui.show_summary(&summary);

        if !self.args.no_save {
            let output = save_run_output(&state, &self.working_dir.join(&self.args.output_dir))?;
            ui.message(&format!("Results saved to {}", output.display()));
        }

        if summary.success() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(EXIT_FAILURE))
        }
    }
}
