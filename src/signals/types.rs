//! Checkpoint record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gates::{AgentRole, Gate};

/// Terminal outcome of one gate attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A durable pass/fail checkpoint for a (story, gate) pair.
///
/// A `Passed` signal is definitive: later runs skip the gate without
/// invoking the collaborator again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub story_id: String,
    pub gate: Gate,
    pub outcome: Outcome,
    /// When the outcome was recorded
    pub timestamp: DateTime<Utc>,
    /// Role of the agent that judged the gate
    pub agent: AgentRole,
}

impl Signal {
    pub fn new(story_id: impl Into<String>, gate: Gate, outcome: Outcome, agent: AgentRole) -> Self {
        Self {
            story_id: story_id.into(),
            gate,
            outcome,
            timestamp: Utc::now(),
            agent,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_json_shape() {
        let signal = Signal::new("AUTH-001", Gate::Gate1, Outcome::Passed, AgentRole::Research);
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["story_id"], "AUTH-001");
        assert_eq!(json["gate"], "gate1");
        assert_eq!(json["outcome"], "passed");
        assert_eq!(json["agent"], "research");
        // RFC 3339 timestamp
        let ts = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Passed.to_string(), "passed");
        assert_eq!(Outcome::Failed.to_string(), "failed");
        assert!(Signal::new("X-1", Gate::Gate0, Outcome::Passed, AgentRole::Qa).is_passed());
    }
}
