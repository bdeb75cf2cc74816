use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::agent::{AgentEvent, AgentRequest, Collaborator};
use crate::errors::ExecutorError;
use crate::gate_config::RoleSettings;
use crate::gates::{AgentRole, Gate, resolve_role};
use crate::prompt::build_prompt;
use crate::signals::{Outcome, SignalStore};
use crate::story::Story;

/// Output reported for a gate that short-circuits on an existing signal.
pub const ALREADY_PASSED: &str = "already passed";

/// Result of executing one gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub success: bool,
    pub output: String,
}

impl GateOutcome {
    fn passed(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Executes a single gate: checkpoint check, collaborator call, outcome record.
pub struct GateExecutor {
    signals: SignalStore,
    collaborator: Arc<dyn Collaborator>,
    role_settings: HashMap<AgentRole, RoleSettings>,
}

impl GateExecutor {
    pub fn new(signals: SignalStore, collaborator: Arc<dyn Collaborator>) -> Self {
        Self {
            signals,
            collaborator,
            role_settings: HashMap::new(),
        }
    }

    pub fn with_role_settings(mut self, settings: HashMap<AgentRole, RoleSettings>) -> Self {
        self.role_settings = settings;
        self
    }

    pub fn signals(&self) -> &SignalStore {
        &self.signals
    }

    /// Execute `gate` for `story`.
    ///
    /// A gate with a passed signal returns immediately without invoking the
    /// collaborator. Otherwise exactly one signal is written for the attempt.
    /// Only signal store failures are returned as `Err`; collaborator
    /// failures become a failed [`GateOutcome`].
    pub async fn execute(&self, story: &Story, gate: Gate) -> Result<GateOutcome, ExecutorError> {
        if self.signals.has_passed(&story.id, gate)? {
            info!(gate = %gate, "Gate already passed; skipping agent");
            return Ok(GateOutcome::passed(ALREADY_PASSED));
        }

        let role = resolve_role(gate, story.domain);
        let request = AgentRequest {
            gate,
            role,
            settings: self.role_settings.get(&role).cloned().unwrap_or_default(),
            prompt: build_prompt(story, gate.id()),
        };

        info!(gate = %gate, role = %role, "Executing gate");
        let outcome = self.invoke(request).await;

        let recorded = if outcome.success {
            Outcome::Passed
        } else {
            Outcome::Failed
        };
        self.signals.record(&story.id, gate, recorded, role)?;

        if outcome.success {
            info!(gate = %gate, "Gate passed");
        } else {
            warn!(gate = %gate, reason = %outcome.output, "Gate failed");
        }
        Ok(outcome)
    }

    /// Drive the collaborator to a terminal event.
    async fn invoke(&self, request: AgentRequest) -> GateOutcome {
        let mut stream = match self.collaborator.invoke(request).await {
            Ok(stream) => stream,
            Err(e) => return GateOutcome::failed(format!("{:#}", e)),
        };

        let mut accumulated = String::new();
        while let Some(event) = stream.next().await {
            match event {
                AgentEvent::Chunk(text) => {
                    debug!(chars = text.len(), "Agent output chunk");
                    accumulated.push_str(&text);
                }
                AgentEvent::Result(text) => {
                    let output = if text.trim().is_empty() {
                        accumulated
                    } else {
                        text
                    };
                    return GateOutcome::passed(output);
                }
                AgentEvent::Failure(reason) => return GateOutcome::failed(reason),
            }
        }

        GateOutcome::failed("agent output ended without a terminal result")
    }
}
