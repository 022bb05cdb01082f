//! Settings discovery and loading.
//!
//! Settings are layered in this order, later sources winning:
//! 1. Built-in defaults ([`Settings::default`])
//! 2. `pipewright.yml` in the working directory, or the `--config` file
//! 3. `PIPEWRIGHT_*` keys from `.env` in the working directory
//! 4. `PIPEWRIGHT_*` keys from the process environment

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::env_file::EnvFileParser;
use crate::config::merger::deep_merge;
use crate::config::settings::Settings;
use crate::error::{PipewrightError, Result};

/// Default settings file name, looked up in the working directory.
pub const SETTINGS_FILE: &str = "pipewright.yml";

/// Dotenv file name, looked up in the working directory.
pub const ENV_FILE: &str = ".env";

/// Environment keys understood by [`apply_env_overrides`].
pub const ENV_KEYS: &[&str] = &[
    "PIPEWRIGHT_MAX_LEADS_PER_RUN",
    "PIPEWRIGHT_SIMULATION",
    "PIPEWRIGHT_DRY_RUN",
    "PIPEWRIGHT_LOG_LEVEL",
    "PIPEWRIGHT_STEP_TIME_BUDGET",
    "PIPEWRIGHT_STRICT_AGENTS",
];

/// Load settings for a working directory using the real process environment.
///
/// An explicit `config_override` that does not exist is an error; a missing
/// default `pipewright.yml` is not.
pub fn load_settings(working_dir: &Path, config_override: Option<&Path>) -> Result<Settings> {
    let process_env: HashMap<String, String> = std::env::vars()
        .filter(|(key, _)| key.starts_with("PIPEWRIGHT_"))
        .collect();
    load_settings_with_env(working_dir, config_override, &process_env)
}

/// Load settings with an explicit process environment.
pub fn load_settings_with_env(
    working_dir: &Path,
    config_override: Option<&Path>,
    process_env: &HashMap<String, String>,
) -> Result<Settings> {
    let mut settings = match config_override {
        Some(path) => load_settings_file(path)?,
        None => {
            let default_path = working_dir.join(SETTINGS_FILE);
            if default_path.exists() {
                load_settings_file(&default_path)?
            } else {
                Settings::default()
            }
        }
    };

    let env_path = working_dir.join(ENV_FILE);
    let dotenv = EnvFileParser::load_optional(&env_path)?;
    apply_env_overrides(&mut settings, &dotenv, &env_path)?;
    apply_env_overrides(&mut settings, process_env, Path::new("environment"))?;

    tracing::debug!(
        max_leads = settings.runtime.max_leads_per_run,
        simulation = settings.runtime.simulation,
        "Loaded settings"
    );
    Ok(settings)
}

/// Load a single settings file layered over the defaults.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_settings_file(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipewrightError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PipewrightError::Io(e)
        }
    })?;

    parse_settings(&content, path)
}

/// Parse YAML content into [`Settings`], layered over the defaults.
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_settings(content: &str, source_path: &Path) -> Result<Settings> {
    let parse_error = |message: String| PipewrightError::ConfigParseError {
        path: source_path.to_path_buf(),
        message,
    };

    let overlay: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
    if overlay.is_null() {
        return Ok(Settings::default());
    }

    let base = serde_yaml::to_value(Settings::default()).map_err(|e| parse_error(e.to_string()))?;
    let merged = deep_merge(&base, &overlay);
    serde_yaml::from_value(merged).map_err(|e| parse_error(e.to_string()))
}

/// Apply `PIPEWRIGHT_*` overrides from a variable map.
///
/// `source` is only used for error reporting.
pub fn apply_env_overrides(
    settings: &mut Settings,
    vars: &HashMap<String, String>,
    source: &Path,
) -> Result<()> {
    let invalid = |key: &str, value: &str, expected: &str| PipewrightError::ConfigParseError {
        path: PathBuf::from(source),
        message: format!("{} must be {}, got '{}'", key, expected, value),
    };

    for key in ENV_KEYS {
        let Some(value) = vars.get(*key).map(|v| v.trim()) else {
            continue;
        };

        let runtime = &mut settings.runtime;
        match *key {
            "PIPEWRIGHT_MAX_LEADS_PER_RUN" => {
                runtime.max_leads_per_run = value
                    .parse()
                    .map_err(|_| invalid(key, value, "a non-negative integer"))?;
            }
            "PIPEWRIGHT_SIMULATION" => {
                runtime.simulation = parse_bool(value).ok_or_else(|| invalid(key, value, "a boolean"))?;
            }
            "PIPEWRIGHT_DRY_RUN" => {
                runtime.dry_run = parse_bool(value).ok_or_else(|| invalid(key, value, "a boolean"))?;
            }
            "PIPEWRIGHT_LOG_LEVEL" => {
                runtime.log_level = value.to_string();
            }
            "PIPEWRIGHT_STEP_TIME_BUDGET" => {
                runtime.step_time_budget_secs = if value.is_empty() {
                    None
                } else {
                    Some(
                        value
                            .parse()
                            .map_err(|_| invalid(key, value, "a number of seconds"))?,
                    )
                };
            }
            "PIPEWRIGHT_STRICT_AGENTS" => {
                runtime.strict_agents =
                    parse_bool(value).ok_or_else(|| invalid(key, value, "a boolean"))?;
            }
            _ => {}
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
