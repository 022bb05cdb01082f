//! The uniform agent contract.
//!
//! Every capability provider implements [`Agent`]. The orchestrator never
//! calls an agent directly; it goes through [`AgentHandle::execute`], which
//! validates the input, runs the provider, converts every failure (including
//! panics) into a structured [`AgentResult`] and keeps execution statistics.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Loosely-typed structured data passed into and out of agents.
pub type Payload = Map<String, Value>;

/// A capability provider.
///
/// Implementations check their own required input shape in [`validate`] and
/// do their work in [`run`]. `run` is only called after `validate` returned
/// `true`.
///
/// [`validate`]: Agent::validate
/// [`run`]: Agent::run
pub trait Agent: Send {
    /// Registry name of this provider (e.g. `ScoringAgent`).
    fn name(&self) -> &str;

    /// Whether `input` has the keys and types this provider needs.
    fn validate(&self, input: &Payload) -> bool;

    /// Do the work and return the domain payload.
    fn run(&mut self, input: &Payload) -> Result<Payload, AgentError>;
}

/// Failure inside an agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent's own input checks rejected the input.
    #[error("Input validation failed for {agent}")]
    ValidationFailed { agent: String },

    /// An external collaborator reported an error.
    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },

    /// Input passed validation but could not be used.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider panicked.
    #[error("Agent panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AgentError {
    /// Stable kind name, recorded as `error_type` in failure results.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationFailed { .. } => "ValidationFailure",
            Self::Provider { .. } => "ProviderError",
            Self::InvalidInput(_) => "InvalidInput",
            Self::Panicked(_) => "Panic",
            Self::Other(_) => "ExecutionFault",
        }
    }
}

/// Metadata attached to every agent result, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub agent_name: String,
    pub agent_id: String,
    /// Wall-clock seconds spent in `execute`.
    pub execution_time: f64,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Domain payload plus metadata envelope.
///
/// Serializes as the payload's keys with the metadata under `_metadata`.
/// On failure the payload is `{"error": <message>, "error_type": <kind>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    #[serde(flatten)]
    pub payload: Payload,

    #[serde(rename = "_metadata")]
    pub metadata: ResultMetadata,
}

impl AgentResult {
    pub fn is_success(&self) -> bool {
        self.metadata.success
    }

    /// Failure message, if this result is a failure.
    pub fn error_message(&self) -> Option<&str> {
        self.metadata.error_message.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Whole result as one JSON value, the shape references navigate.
    pub fn to_value(&self) -> Value {
        let mut map = self.payload.clone();
        if let Ok(metadata) = serde_json::to_value(&self.metadata) {
            map.insert("_metadata".to_string(), metadata);
        }
        Value::Object(map)
    }
}

/// Execution statistics for one agent instance.
///
/// Only successful executions are counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub agent_name: String,
    pub execution_count: u64,
    pub total_execution_time: f64,
    pub last_execution_time: Option<f64>,
}

impl AgentStats {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            ..Self::default()
        }
    }

    pub fn average_execution_time(&self) -> f64 {
        if self.execution_count == 0 {
            0.0
        } else {
            self.total_execution_time / self.execution_count as f64
        }
    }

    fn record(&mut self, seconds: f64) {
        self.execution_count += 1;
        self.total_execution_time += seconds;
        self.last_execution_time = Some(seconds);
    }
}

/// One registered agent instance with its id and statistics.
///
/// `execute` takes `&mut self`: a handle is used by one caller at a time.
pub struct AgentHandle {
    id: String,
    agent: Box<dyn Agent>,
    stats: AgentStats,
}

impl AgentHandle {
    pub fn new(id: impl Into<String>, agent: Box<dyn Agent>) -> Self {
        let stats = AgentStats::new(agent.name());
        Self {
            id: id.into(),
            agent,
            stats,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.agent.name()
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Validate, run and wrap. Never panics and never returns an error:
    /// every failure becomes a failed [`AgentResult`].
    pub fn execute(&mut self, input: &Payload) -> AgentResult {
        let started = Instant::now();
        let agent_name = self.agent.name().to_string();
        tracing::info!(agent = %agent_name, id = %self.id, "Agent starting");

        let agent = &mut self.agent;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            if !agent.validate(input) {
                return Err(AgentError::ValidationFailed {
                    agent: agent.name().to_string(),
                });
            }
            agent.run(input)
        }))
        .unwrap_or_else(|panic| Err(AgentError::Panicked(panic_message(panic.as_ref()))));

        let execution_time = started.elapsed().as_secs_f64();
        let metadata = |success: bool, error_message: Option<String>| ResultMetadata {
            agent_name: agent_name.clone(),
            agent_id: self.id.clone(),
            execution_time,
            timestamp: Utc::now(),
            success,
            error_message,
        };

        match outcome {
            Ok(mut payload) => {
                tracing::info!(agent = %agent_name, seconds = execution_time, "Agent completed");
                // `_metadata` belongs to the envelope.
                if payload.remove("_metadata").is_some() {
                    tracing::warn!(agent = %agent_name, "Dropping _metadata key from agent output");
                }
                let result = AgentResult {
                    payload,
                    metadata: metadata(true, None),
                };
                self.stats.record(execution_time);
                result
            }
            Err(err) => {
                tracing::error!(agent = %agent_name, kind = err.kind(), error = %err, "Agent failed");
                let message = err.to_string();
                let mut payload = Payload::new();
                payload.insert("error".to_string(), Value::String(message.clone()));
                payload.insert("error_type".to_string(), Value::String(err.kind().to_string()));
                AgentResult {
                    payload,
                    metadata: metadata(false, Some(message)),
                }
            }
        }
    }
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle")
            .field("id", &self.id)
            .field("name", &self.agent.name())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
