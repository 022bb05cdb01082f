//! .env file parsing.
//!
//! Settings can be overridden from a dotenv-style file in the working
//! directory, using the standard `KEY=value` format.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// Parses .env files into a map of environment variables.
///
/// # Supported Formats
///
/// - Simple: `KEY=value`
/// - Quoted: `KEY="value with spaces"` or `KEY='single quoted'`
/// - Empty: `KEY=`
/// - Comments: `# This is a comment`
/// - Optional `export ` prefix
///
/// Lines without `=` are ignored.
///
/// # Example
///
/// ```
/// use pipewright::config::EnvFileParser;
///
/// let content = r#"
/// # Run limits
/// PIPEWRIGHT_MAX_LEADS_PER_RUN=25
/// PIPEWRIGHT_DRY_RUN="true"
/// "#;
///
/// let vars = EnvFileParser::parse(content);
/// assert_eq!(vars.get("PIPEWRIGHT_MAX_LEADS_PER_RUN"), Some(&"25".to_string()));
/// assert_eq!(vars.get("PIPEWRIGHT_DRY_RUN"), Some(&"true".to_string()));
/// ```
pub struct EnvFileParser;

impl EnvFileParser {
    /// Parse an env file content string into a map of variables.
    pub fn parse(content: &str) -> HashMap<String, String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(Self::parse_line)
            .collect()
    }

    fn parse_line(line: &str) -> Option<(String, String)> {
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key.to_string(), Self::unquote(value.trim())))
    }

    fn unquote(value: &str) -> String {
        let quoted = value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')));
        if quoted {
            value[1..value.len() - 1].to_string()
        } else {
            value.to_string()
        }
    }

    /// Load and parse an env file, returning an empty map if it doesn't exist.
    pub fn load_optional(path: &Path) -> Result<HashMap<String, String>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(Self::parse(&content))
        } else {
            Ok(HashMap::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_env_file() {
        let vars = EnvFileParser::parse("KEY1=value1\nKEY2=value2\n");
        assert_eq!(vars.get("KEY1"), Some(&"value1".to_string()));
        assert_eq!(vars.get("KEY2"), Some(&"value2".to_string()));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let content = r#"
# This is a comment
KEY=value

# Another comment
"#;
        let vars = EnvFileParser::parse(content);
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn handles_quoted_values() {
        let content = "DOUBLE=\"double quoted\"\nSINGLE='single quoted'\nUNQUOTED=no quotes";
        let vars = EnvFileParser::parse(content);
        assert_eq!(vars.get("DOUBLE"), Some(&"double quoted".to_string()));
        assert_eq!(vars.get("SINGLE"), Some(&"single quoted".to_string()));
        assert_eq!(vars.get("UNQUOTED"), Some(&"no quotes".to_string()));
    }

    #[test]
    fn handles_values_with_equals() {
        let vars = EnvFileParser::parse("URL=https://example.com?foo=bar");
        assert_eq!(
            vars.get("URL"),
            Some(&"https://example.com?foo=bar".to_string())
        );
    }

    #[test]
    fn strips_export_prefix() {
        let vars = EnvFileParser::parse("export PIPEWRIGHT_DRY_RUN=true");
        assert_eq!(vars.get("PIPEWRIGHT_DRY_RUN"), Some(&"true".to_string()));
    }

    #[test]
    fn ignores_lines_without_equals() {
        let vars = EnvFileParser::parse("KEY1=value1\ninvalid line\nKEY2=value2");
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn load_optional_returns_empty_for_missing_file() {
        let vars = EnvFileParser::load_optional(Path::new("/nonexistent/path/.env")).unwrap();
        assert!(vars.is_empty());
    }
}
