//! Test doubles shared by the executor and sequencer tests.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::agent::{AgentEvent, AgentEventStream, AgentRequest, Collaborator};
use crate::gates::Gate;
use crate::story::{AcceptanceCriterion, Criticality, Domain, Story};

/// Collaborator that replays canned events instead of running an agent.
pub struct ScriptedCollaborator {
    events: Vec<AgentEvent>,
    overrides: HashMap<Gate, Vec<AgentEvent>>,
    unreachable: bool,
    requests: Mutex<Vec<AgentRequest>>,
}

impl ScriptedCollaborator {
    pub fn with_events(events: Vec<AgentEvent>) -> Self {
        Self {
            events,
            overrides: HashMap::new(),
            unreachable: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every gate passes.
    pub fn passing() -> Self {
        Self::with_events(vec![
            AgentEvent::Chunk("checking criteria\n".into()),
            AgentEvent::Result("VERDICT: PASS".into()),
        ])
    }

    /// Every gate passes except `gate`, which fails with `reason`.
    pub fn failing_on(gate: Gate, reason: &str) -> Self {
        let mut script = Self::passing();
        script.overrides.insert(
            gate,
            vec![
                AgentEvent::Chunk("checking criteria\n".into()),
                AgentEvent::Failure(reason.to_string()),
            ],
        );
        script
    }

    /// Output stops before any terminal event.
    pub fn truncated() -> Self {
        Self::with_events(vec![AgentEvent::Chunk("partial".into())])
    }

    /// `invoke` itself fails.
    pub fn unreachable() -> Self {
        let mut script = Self::with_events(Vec::new());
        script.unreachable = true;
        script
    }

    pub fn invocations(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<AgentRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn invoked_gates(&self) -> Vec<Gate> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.gate)
            .collect()
    }
}

#[async_trait]
impl Collaborator for ScriptedCollaborator {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentEventStream> {
        let gate = request.gate;
        self.requests.lock().unwrap().push(request);
        if self.unreachable {
            bail!("agent unavailable");
        }
        let events = self
            .overrides
            .get(&gate)
            .cloned()
            .unwrap_or_else(|| self.events.clone());
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

pub fn sample_story() -> Story {
    Story {
        id: "AUTH-001".to_string(),
        title: "Login form".to_string(),
        epic: "AUTH".to_string(),
        domain: Domain::Frontend,
        wave: 1,
        criticality: Criticality::C,
        status: "ready".to_string(),
        acceptance_criteria: vec![AcceptanceCriterion {
            id: "AC-1".to_string(),
            kind: "functional".to_string(),
            trigger: Some("user submits form".to_string()),
            condition: None,
            behavior: "show success toast".to_string(),
        }],
    }
}

/// Write the JSON form of [`sample_story`] under `root/<epic>/`.
pub fn write_sample_story(root: &Path) {
    let dir = root.join("AUTH");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("AUTH-001.json"),
        r#"{
  "id": "AUTH-001",
  "title": "Login form",
  "epic": "AUTH",
  "domain": "frontend",
  "wave": 1,
  "criticality": "C",
  "status": "ready",
  "acceptance_criteria": [
    {"id": "AC-1", "type": "functional", "trigger": "user submits form", "behavior": "show success toast"}
  ]
}"#,
    )
    .unwrap();
}
