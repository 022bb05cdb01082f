//! The `pipewright schema` command prints the workflow document JSON Schema.

use crate::error::{PipewrightError, Result};
use crate::ui::UserInterface;
use crate::workflow::workflow_json_schema;

use super::dispatcher::{Command, CommandResult};

pub struct SchemaCommand;

impl Command for SchemaCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let text = serde_json::to_string_pretty(&workflow_json_schema())
            .map_err(|e| PipewrightError::Other(e.into()))?;
        ui.message(&text);
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use serde_json::Value;

    #[test]
    fn prints_parseable_schema() {
        let mut ui = MockUI::new();
        SchemaCommand.execute(&mut ui).unwrap();

        let schema: Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&Value::from("workflow_name")));
        assert!(required.contains(&Value::from("steps")));
    }
}
