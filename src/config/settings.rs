//! Settings schema.
//!
//! [`Settings`] is the explicit configuration object for a pipewright
//! process. It is built once at startup (see [`load_settings`]) and passed by
//! reference to every component that needs it.
//!
//! [`load_settings`]: crate::config::load_settings

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Names of the static namespaces reachable through `{{config.<name>...}}`.
pub const CONFIG_NAMESPACES: &[&str] = &["scoring", "icp", "runtime"];

/// Root settings structure for `pipewright.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Lead scoring configuration (`config.scoring`).
    pub scoring: Map<String, Value>,

    /// Ideal customer profile (`config.icp`).
    pub icp: Map<String, Value>,

    /// Runtime flags (`config.runtime`).
    pub runtime: RuntimeSettings,
}

/// Runtime behavior flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Upper bound on leads a single run should process.
    pub max_leads_per_run: usize,

    /// Register the built-in simulated providers instead of live clients.
    pub simulation: bool,

    /// Providers that send things should only pretend to.
    pub dry_run: bool,

    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Per-step wall-clock budget; overruns are logged, not enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_time_budget_secs: Option<u64>,

    /// Treat agents outside the known registry as schema errors.
    pub strict_agents: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            max_leads_per_run: 100,
            simulation: true,
            dry_run: false,
            log_level: "info".to_string(),
            step_time_budget_secs: None,
            strict_agents: false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scoring: default_scoring(),
            icp: default_icp(),
            runtime: RuntimeSettings::default(),
        }
    }
}

fn default_scoring() -> Map<String, Value> {
    as_map(json!({
        "weights": {
            "industry_match": 0.3,
            "company_size": 0.2,
            "revenue_range": 0.2,
            "growth_signals": 0.3
        },
        "min_score_threshold": 0.6
    }))
}

fn default_icp() -> Map<String, Value> {
    as_map(json!({
        "industry": ["SaaS", "Technology"],
        "location": ["USA"],
        "employee_count": {"min": 100, "max": 1000},
        "revenue": {"min": 20_000_000, "max": 200_000_000}
    }))
}

fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl Settings {
    /// Look up a static namespace by name.
    ///
    /// Returns `None` for names outside [`CONFIG_NAMESPACES`].
    pub fn namespace(&self, name: &str) -> Option<Value> {
        match name {
            "scoring" => Some(Value::Object(self.scoring.clone())),
            "icp" => Some(Value::Object(self.icp.clone())),
            "runtime" => serde_json::to_value(&self.runtime).ok(),
            _ => None,
        }
    }

    /// Copy of these settings with a different lead cap.
    pub fn with_max_leads(&self, max_leads: usize) -> Self {
        let mut settings = self.clone();
        settings.runtime.max_leads_per_run = max_leads;
        settings
    }

    /// Minimum score a lead must reach to qualify.
    pub fn min_score_threshold(&self) -> f64 {
        self.scoring
            .get("min_score_threshold")
            .and_then(Value::as_f64)
            .unwrap_or(0.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_scoring_weights() {
        let settings = Settings::default();
        let weights = settings.scoring.get("weights").unwrap();
        assert_eq!(weights["industry_match"], json!(0.3));
        assert_eq!(settings.min_score_threshold(), 0.6);
    }

    #[test]
    fn namespace_returns_known_namespaces() {
        let settings = Settings::default();
        for name in CONFIG_NAMESPACES {
            assert!(settings.namespace(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn namespace_unknown_is_none() {
        assert!(Settings::default().namespace("unknown").is_none());
    }

    #[test]
    fn runtime_namespace_exposes_flags() {
        let runtime = Settings::default().namespace("runtime").unwrap();
        assert_eq!(runtime["max_leads_per_run"], json!(100));
        assert_eq!(runtime["simulation"], json!(true));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let settings: Settings = serde_yaml::from_str("runtime:\n  dry_run: true\n").unwrap();
        assert!(settings.runtime.dry_run);
        assert_eq!(settings.runtime.max_leads_per_run, 100);
        assert!(settings.icp.contains_key("industry"));
    }

    #[test]
    fn with_max_leads_leaves_original_untouched() {
        let settings = Settings::default();
        let capped = settings.with_max_leads(5);
        assert_eq!(capped.runtime.max_leads_per_run, 5);
        assert_eq!(settings.runtime.max_leads_per_run, 100);
    }
}
