//! Workflow document loading.
//!
//! Loading only checks that the source is well-formed structured data; the
//! shape of the document is checked by the validator.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{PipewrightError, Result};

/// Default workflow document name, looked up in the working directory.
pub const DEFAULT_WORKFLOW_FILE: &str = "workflow.json";

/// Source format of a workflow document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick a format from a file extension. Anything but `.yml`/`.yaml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// Load a workflow document from disk as a raw value.
///
/// # Errors
///
/// Returns `WorkflowNotFound` if the file doesn't exist.
/// Returns `ParseError` if the content is not well-formed.
pub fn load(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipewrightError::WorkflowNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PipewrightError::Io(e)
        }
    })?;

    parse(&content, DocumentFormat::from_path(path), &path.display().to_string())
}

/// Parse an in-memory workflow document.
pub fn load_str(content: &str, format: DocumentFormat) -> Result<Value> {
    parse(content, format, "<inline>")
}

fn parse(content: &str, format: DocumentFormat, source_name: &str) -> Result<Value> {
    let parse_error = |message: String| PipewrightError::ParseError {
        source_name: source_name.to_string(),
        message,
    };

    match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        DocumentFormat::Yaml => {
            let value: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
            serde_json::to_value(value).map_err(|e| parse_error(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn loads_json_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("workflow.json");
        fs::write(&path, r#"{"workflow_name": "demo", "steps": []}"#).unwrap();

        let raw = load(&path).unwrap();
        assert_eq!(raw["workflow_name"], json!("demo"));
    }

    #[test]
    fn loads_yaml_by_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("flow.yaml");
        fs::write(
            &path,
            "workflow_name: demo\nsteps:\n  - id: search\n    agent: ProspectSearchAgent\n",
        )
        .unwrap();

        let raw = load(&path).unwrap();
        assert_eq!(raw["steps"][0]["id"], json!("search"));
    }

    #[test]
    fn missing_file_is_workflow_not_found() {
        let temp = TempDir::new().unwrap();
        let result = load(&temp.path().join("workflow.json"));
        assert!(matches!(result, Err(PipewrightError::WorkflowNotFound { .. })));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let result = load_str("{\"workflow_name\": ", DocumentFormat::Json);
        assert!(matches!(result, Err(PipewrightError::ParseError { .. })));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let result = load_str("steps: [unclosed", DocumentFormat::Yaml);
        assert!(matches!(result, Err(PipewrightError::ParseError { .. })));
    }

    #[test]
    fn format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.YAML")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("workflow")), DocumentFormat::Json);
    }
}
