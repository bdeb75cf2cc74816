//! The fixed gate sequence every story passes through.
//!
//! Gates are totally ordered (`gate0` .. `gate7`). Each gate carries a
//! description and a checklist used by the prompt builder, and is judged by
//! an agent role resolved from the gate and the story's domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::errors::ConfigurationError;
use crate::story::Domain;

/// One stage of the verification sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gate {
    #[serde(rename = "gate0")]
    Gate0,
    #[serde(rename = "gate1")]
    Gate1,
    #[serde(rename = "gate2")]
    Gate2,
    #[serde(rename = "gate3")]
    Gate3,
    #[serde(rename = "gate4")]
    Gate4,
    #[serde(rename = "gate5")]
    Gate5,
    #[serde(rename = "gate6")]
    Gate6,
    #[serde(rename = "gate7")]
    Gate7,
}

impl Gate {
    /// All gates in execution order.
    pub const ALL: [Gate; 8] = [
        Gate::Gate0,
        Gate::Gate1,
        Gate::Gate2,
        Gate::Gate3,
        Gate::Gate4,
        Gate::Gate5,
        Gate::Gate6,
        Gate::Gate7,
    ];

    pub fn first() -> Gate {
        Gate::ALL[0]
    }

    pub fn last() -> Gate {
        Gate::ALL[Gate::ALL.len() - 1]
    }

    /// Zero-based position in the sequence.
    pub fn position(self) -> usize {
        self as usize
    }

    pub fn from_position(position: usize) -> Option<Gate> {
        Gate::ALL.get(position).copied()
    }

    /// Stable identifier used in signal addresses and CLI arguments.
    pub fn id(self) -> &'static str {
        match self {
            Gate::Gate0 => "gate0",
            Gate::Gate1 => "gate1",
            Gate::Gate2 => "gate2",
            Gate::Gate3 => "gate3",
            Gate::Gate4 => "gate4",
            Gate::Gate5 => "gate5",
            Gate::Gate6 => "gate6",
            Gate::Gate7 => "gate7",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Gate {
    type Err = ConfigurationError;

    /// Accepts `gate<N>` (any case) or a bare position `N`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let digits = lower.strip_prefix("gate").unwrap_or(&lower);
        // Canonical decimal only: no sign, no zero padding.
        let canonical = !digits.is_empty()
            && digits.chars().all(|c| c.is_ascii_digit())
            && (digits == "0" || !digits.starts_with('0'));
        canonical
            .then(|| digits.parse::<usize>().ok())
            .flatten()
            .and_then(Gate::from_position)
            .ok_or_else(|| ConfigurationError::UnknownGate {
                name: s.to_string(),
                last: Gate::ALL.len() - 1,
            })
    }
}

/// The closed set of collaborator roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentRole {
    Research,
    BackendDev,
    FrontendDev,
    Qa,
    ReleaseOps,
}

impl AgentRole {
    pub const ALL: [AgentRole; 5] = [
        AgentRole::Research,
        AgentRole::BackendDev,
        AgentRole::FrontendDev,
        AgentRole::Qa,
        AgentRole::ReleaseOps,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentRole::Research => "research",
            AgentRole::BackendDev => "backend-dev",
            AgentRole::FrontendDev => "frontend-dev",
            AgentRole::Qa => "qa",
            AgentRole::ReleaseOps => "release-ops",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s.to_lowercase())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid agent role '{}'. Valid values: research, backend-dev, frontend-dev, qa, release-ops",
                    s
                )
            })
    }
}

/// Resolve the role responsible for `gate` on a story in `domain`.
///
/// Implementation is the only gate whose owner depends on the story:
/// frontend stories go to the frontend developer, everything else to the
/// backend developer.
pub fn resolve_role(gate: Gate, domain: Domain) -> AgentRole {
    match gate {
        Gate::Gate0 | Gate::Gate1 => AgentRole::Research,
        Gate::Gate2 => match domain {
            Domain::Frontend => AgentRole::FrontendDev,
            Domain::Backend | Domain::Fullstack | Domain::Infra | Domain::Unspecified => {
                AgentRole::BackendDev
            }
        },
        Gate::Gate3 | Gate::Gate4 | Gate::Gate5 => AgentRole::Qa,
        Gate::Gate6 | Gate::Gate7 => AgentRole::ReleaseOps,
    }
}

/// Static description of a single gate.
#[derive(Debug, Clone)]
pub struct GateSpec {
    pub gate: Gate,
    pub name: &'static str,
    pub description: &'static str,
    pub checklist: &'static [&'static str],
}

/// Ordered gate table, built once per process and never mutated.
#[derive(Debug)]
pub struct GateCatalog {
    specs: Vec<GateSpec>,
}

static CATALOG: LazyLock<GateCatalog> = LazyLock::new(GateCatalog::build);

/// The process-wide gate catalog.
pub fn catalog() -> &'static GateCatalog {
    &CATALOG
}

impl GateCatalog {
    fn build() -> Self {
        let specs = vec![
            GateSpec {
                gate: Gate::Gate0,
                name: "Research",
                description: "Validate the story is feasible and its requirements are understood",
                checklist: &[
                    "Confirm every acceptance criterion is unambiguous and testable",
                    "Identify affected components, data flows and external dependencies",
                    "List open questions or risks that would block implementation",
                ],
            },
            GateSpec {
                gate: Gate::Gate1,
                name: "Planning",
                description: "Produce an implementation plan covering every acceptance criterion",
                checklist: &[
                    "Map each acceptance criterion to concrete code changes",
                    "Define the test cases that will prove each criterion",
                    "Confirm the plan fits the story's wave and epic boundaries",
                ],
            },
            GateSpec {
                gate: Gate::Gate2,
                name: "Implementation",
                description: "Implement the story according to the approved plan",
                checklist: &[
                    "Implement the behavior required by every acceptance criterion",
                    "Keep changes scoped to this story",
                    "Ensure the project builds without new warnings",
                ],
            },
            GateSpec {
                gate: Gate::Gate3,
                name: "Unit tests",
                description: "Verify unit test coverage for the implementation",
                checklist: &[
                    "Every acceptance criterion has at least one passing unit test",
                    "Trigger and condition clauses are exercised on both branches",
                    "The full unit test suite passes",
                ],
            },
            GateSpec {
                gate: Gate::Gate4,
                name: "Integration",
                description: "Verify the story works end to end with its collaborators",
                checklist: &[
                    "Integration or end-to-end tests cover the primary user flow",
                    "No regressions in neighbouring features",
                    "Error paths surface meaningful messages",
                ],
            },
            GateSpec {
                gate: Gate::Gate5,
                name: "Acceptance",
                description: "Confirm each acceptance criterion is met as written",
                checklist: &[
                    "Walk through every acceptance criterion and record evidence",
                    "Confirm observable behavior matches the THEN clause exactly",
                    "Reject if any criterion is only partially satisfied",
                ],
            },
            GateSpec {
                gate: Gate::Gate6,
                name: "Release prep",
                description: "Prepare the change for release",
                checklist: &[
                    "Changelog and documentation reflect the change",
                    "Configuration and migrations are reviewed",
                    "Rollback steps are documented",
                ],
            },
            GateSpec {
                gate: Gate::Gate7,
                name: "Deploy readiness",
                description: "Confirm the story is safe to deploy",
                checklist: &[
                    "CI is green on the release candidate",
                    "Monitoring and alerting cover the new behavior",
                    "Deployment has an explicit go/no-go owner",
                ],
            },
        ];
        debug_assert!(specs.iter().map(|s| s.gate).eq(Gate::ALL));
        Self { specs }
    }

    pub fn get(&self, gate: Gate) -> &GateSpec {
        &self.specs[gate.position()]
    }

    /// Look up a gate by identifier; `None` for unknown identifiers.
    pub fn lookup(&self, id: &str) -> Option<&GateSpec> {
        id.parse::<Gate>().ok().map(|gate| self.get(gate))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GateSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
