//! The collaborator boundary.
//!
//! A collaborator judges one gate: given a role, its settings and a prompt,
//! it yields a finite stream of [`AgentEvent`]s that ends in exactly one
//! terminal event (`Result` or `Failure`). The sequencer only relies on
//! iterating that stream and telling the two terminal variants apart.

mod process;

pub use process::ProcessCollaborator;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::gate_config::RoleSettings;
use crate::gates::{AgentRole, Gate};

/// One item of collaborator output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// Incremental output text
    Chunk(String),
    /// Terminal success carrying the final result text
    Result(String),
    /// Terminal failure carrying a description
    Failure(String),
}

pub type AgentEventStream = Pin<Box<dyn Stream<Item = AgentEvent> + Send>>;

/// Everything a collaborator needs to judge one gate.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub gate: Gate,
    pub role: AgentRole,
    pub settings: RoleSettings,
    pub prompt: String,
}

/// External executor that performs gate verification.
///
/// Real implementation: [`ProcessCollaborator`]. An `Err` from `invoke`
/// means the collaborator could not be started at all.
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentEventStream>;
}
