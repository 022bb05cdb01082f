//! Validate command implementation.
//!
//! The `pipewright validate` command loads a workflow, checks its structure
//! and references, and lists every problem found.

use std::path::{Path, PathBuf};

use crate::cli::args::ValidateArgs;
use crate::config::Settings;
use crate::error::{PipewrightError, Result};
use crate::runner::ExecutionGraph;
use crate::ui::UserInterface;
use crate::workflow::{validate_workflow_file_with, ValidationOptions};

use super::dispatcher::{Command, CommandResult, EXIT_FAILURE};

/// The validate command implementation.
pub struct ValidateCommand {
    working_dir: PathBuf,
    strict: bool,
    args: ValidateArgs,
}

impl ValidateCommand {
    pub fn new(working_dir: &Path, settings: &Settings, args: ValidateArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            strict: args.strict || settings.runtime.strict_agents,
            args,
        }
    }

    fn workflow_path(&self) -> PathBuf {
        self.working_dir.join(&self.args.workflow)
    }
}

/// Report a rejected workflow through the UI, one line per violation.
pub(crate) fn report_rejection(ui: &mut dyn UserInterface, path: &Path, error: &PipewrightError) {
    match error {
        PipewrightError::SchemaError { violations } => {
            ui.error(&format!(
                "{} has {} problem(s):",
                path.display(),
                violations.len()
            ));
            for violation in violations {
                ui.error(&format!("  {}", violation));
            }
        }
        other => ui.error(&other.to_string()),
    }
}

impl Command for ValidateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = self.workflow_path();
        let options = ValidationOptions::strict(self.strict);

        let checked = validate_workflow_file_with(&path, &options).and_then(|report| {
            let graph = ExecutionGraph::build(&report.workflow)?;
            Ok((report, graph))
        });

        let (report, graph) = match checked {
            Ok(checked) => checked,
            Err(e) if e.is_rejection() => {
                report_rejection(ui, &path, &e);
                return Ok(CommandResult::failure(EXIT_FAILURE));
            }
            Err(e) => return Err(e),
        };

        for warning in &report.warnings {
            ui.warning(warning);
        }
        ui.success(&format!(
            "Workflow '{}' is valid ({} steps, {} stages)",
            report.workflow.workflow_name,
            graph.len(),
            graph.stages()?.len()
        ));
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn command(temp: &TempDir, content: &str, strict: bool) -> ValidateCommand {
        fs::write(temp.path().join("workflow.json"), content).unwrap();
        ValidateCommand::new(
            temp.path(),
            &Settings::default(),
            ValidateArgs {
                workflow: PathBuf::from("workflow.json"),
                strict,
            },
        )
    }

    #[test]
    fn valid_workflow_succeeds() {
        let temp = TempDir::new().unwrap();
        let cmd = command(
            &temp,
            r#"{"workflow_name": "demo", "steps": [
                {"id": "search", "agent": "ProspectSearchAgent"},
                {"id": "score", "agent": "ScoringAgent", "inputs": {"leads": "{{search.leads}}"}}
            ]}"#,
            false,
        );
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();
        assert!(result.success);
        assert!(ui.has_success("'demo' is valid (2 steps, 2 stages)"));
    }

    #[test]
    fn lists_every_violation() {
        let temp = TempDir::new().unwrap();
        let cmd = command(
            &temp,
            r#"{"workflow_name": "demo", "steps": [
                {"id": "a", "agent": "ScoringAgent"},
                {"id": "a", "agent": "ScoringAgent"},
                {"agent": "ScoringAgent"}
            ]}"#,
            false,
        );
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();
        assert_eq!(result.exit_code, EXIT_FAILURE);
        assert!(ui.has_error("Duplicate step id: a"));
        assert!(ui.has_error("steps[2].id"));
    }

    #[test]
    fn unknown_agent_warns_unless_strict() {
        let temp = TempDir::new().unwrap();
        let doc = r#"{"workflow_name": "demo", "steps": [{"id": "a", "agent": "MadeUpAgent"}]}"#;

        let mut ui = MockUI::new();
        assert!(command(&temp, doc, false).execute(&mut ui).unwrap().success);
        assert!(ui.has_warning("MadeUpAgent"));

        let mut ui = MockUI::new();
        assert!(!command(&temp, doc, true).execute(&mut ui).unwrap().success);
        assert!(ui.has_error("MadeUpAgent"));
    }

    #[test]
    fn dangling_reference_is_reported() {
        let temp = TempDir::new().unwrap();
        let cmd = command(
            &temp,
            r#"{"workflow_name": "demo", "steps": [
                {"id": "score", "agent": "ScoringAgent", "inputs": {"leads": "{{search.leads}}"}}
            ]}"#,
            false,
        );
        let mut ui = MockUI::new();

        assert!(!cmd.execute(&mut ui).unwrap().success);
        assert!(ui.has_error("no step with id 'search'"));
    }
}
