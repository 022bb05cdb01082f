//! Info command implementation.
//!
//! The `pipewright info` command shows a workflow's steps, their
//! dependencies and the stages they would execute in.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::cli::args::InfoArgs;
use crate::error::{PipewrightError, Result};
use crate::runner::ExecutionGraph;
use crate::ui::UserInterface;
use crate::workflow::{validate_workflow_file, workflow_info};

use super::dispatcher::{Command, CommandResult, EXIT_REJECTED};
use super::validate::report_rejection;

/// The info command implementation.
pub struct InfoCommand {
    working_dir: PathBuf,
    args: InfoArgs,
}

impl InfoCommand {
    pub fn new(working_dir: &Path, args: InfoArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            args,
        }
    }
}

impl Command for InfoCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = self.working_dir.join(&self.args.workflow);

        let loaded = validate_workflow_file(&path).and_then(|workflow| {
            let graph = ExecutionGraph::build(&workflow)?;
            let stages = graph.stages()?;
            Ok((workflow, stages))
        });
        let (workflow, stages) = match loaded {
            Ok(loaded) => loaded,
            Err(e) if e.is_rejection() => {
                report_rejection(ui, &path, &e);
                return Ok(CommandResult::failure(EXIT_REJECTED));
            }
            Err(e) => return Err(e),
        };

        let info = workflow_info(&workflow);

        if self.args.json {
            let mut value =
                serde_json::to_value(&info).map_err(|e| PipewrightError::Other(e.into()))?;
            if let Value::Object(map) = &mut value {
                map.insert("stages".to_string(), serde_json::json!(stages));
            }
            let text =
                serde_json::to_string_pretty(&value).map_err(|e| PipewrightError::Other(e.into()))?;
            ui.message(&text);
            return Ok(CommandResult::success());
        }

        ui.show_header(&info.workflow_name);
        if !info.description.is_empty() {
            ui.message(&info.description);
            ui.message("");
        }

        ui.message(&format!("Steps ({}):", info.total_steps));
        for (index, step) in info.steps.iter().enumerate() {
            let deps = if step.depends_on.is_empty() {
                String::new()
            } else {
                format!(" <- {}", step.depends_on.join(", "))
            };
            ui.message(&format!("  {}. {} ({}){}", index + 1, step.id, step.agent, deps));
            if !step.description.is_empty() {
                ui.message(&format!("     {}", step.description));
            }
        }

        ui.message("");
        ui.message("Execution stages:");
        for (index, stage) in stages.iter().enumerate() {
            ui.message(&format!("  {}. {}", index + 1, stage.join(", ")));
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    const WORKFLOW: &str = r#"
workflow_name: outbound
description: Find and score leads
steps:
  - id: search
    agent: ProspectSearchAgent
    instructions: Search for companies matching the ICP
    inputs:
      icp: "{{config.icp}}"
  - id: score
    agent: ScoringAgent
    inputs:
      enriched_leads: "{{search.leads}}"
"#;

    fn command(temp: &TempDir, json: bool) -> InfoCommand {
        fs::write(temp.path().join("flow.yml"), WORKFLOW).unwrap();
        InfoCommand::new(
            temp.path(),
            InfoArgs {
                workflow: PathBuf::from("flow.yml"),
                json,
            },
        )
    }

    #[test]
    fn shows_steps_and_stages() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let result = command(&temp, false).execute(&mut ui).unwrap();
        assert!(result.success);
        assert_eq!(ui.headers(), ["outbound"]);
        assert!(ui.has_message("Steps (2):"));
        assert!(ui.has_message("2. score (ScoringAgent) <- search"));
        assert!(ui.has_message("Search for companies matching the ICP"));
        assert!(ui.has_message("Execution stages:"));
    }

    #[test]
    fn json_output_includes_stages() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        command(&temp, true).execute(&mut ui).unwrap();
        let value: Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        assert_eq!(value["workflow_name"], "outbound");
        assert_eq!(value["total_steps"], 2);
        assert_eq!(value["steps"][1]["depends_on"][0], "search");
        assert_eq!(value["stages"], serde_json::json!([["search"], ["score"]]));
    }

    #[test]
    fn missing_workflow_is_rejected() {
        let temp = TempDir::new().unwrap();
        let cmd = InfoCommand::new(
            temp.path(),
            InfoArgs {
                workflow: PathBuf::from("nope.json"),
                json: false,
            },
        );
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();
        assert_eq!(result.exit_code, EXIT_REJECTED);
        assert!(ui.has_error("Workflow not found"));
    }
}
