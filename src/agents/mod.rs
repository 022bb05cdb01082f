//! Capability providers and the contract the orchestrator runs them through.
//!
//! - The [`Agent`] trait, [`AgentHandle::execute`] and [`AgentResult`] in [`contract`]
//! - The name-keyed [`AgentRegistry`] in [`registry`]
//! - Deterministic offline providers in [`simulated`]

pub mod contract;
pub mod registry;
pub mod simulated;

pub use contract::{
    Agent, AgentError, AgentHandle, AgentResult, AgentStats, Payload, ResultMetadata,
};
pub use registry::{AgentRegistry, BUILTIN_AGENTS};
pub use simulated::register_simulated;
