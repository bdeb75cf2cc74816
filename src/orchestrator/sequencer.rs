//! Fail-fast gate sequencing for one story.
//!
//! ```text
//! INIT -> LOADING -> LOAD_FAILED
//!                 -> RUNNING -> per gate: SKIPPED -> next
//!                                         EXECUTING -> PASSED -> next
//!                                                   -> FAILED -> COMPLETE
//! ```
//!
//! Gate-level failures never escape as `Err`: every run produces an
//! [`ExecutionResult`].

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::executor::GateExecutor;
use crate::agent::Collaborator;
use crate::config::Config;
use crate::errors::ConfigurationError;
use crate::gates::{AgentRole, Gate};
use crate::story::StoryRepository;

/// Caller-supplied gate selection. Names are resolved by [`RunOptions::plan`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub start_gate: Option<String>,
    pub stop_gate: Option<String>,
    pub skip_gates: Vec<String>,
}

impl RunOptions {
    /// Split a comma-separated `--skip-gates` value, ignoring blanks.
    pub fn parse_skip_list(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Resolve names into an inclusive range and a skip set.
    pub fn plan(&self) -> Result<GatePlan, ConfigurationError> {
        let start = match &self.start_gate {
            Some(name) => name.parse::<Gate>()?,
            None => Gate::first(),
        };
        let stop = match &self.stop_gate {
            Some(name) => name.parse::<Gate>()?,
            None => Gate::last(),
        };
        if start > stop {
            return Err(ConfigurationError::InvertedRange {
                start: start.to_string(),
                stop: stop.to_string(),
            });
        }
        let skip = self
            .skip_gates
            .iter()
            .map(|name| name.parse::<Gate>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(GatePlan { start, stop, skip })
    }
}

/// A resolved, validated gate selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePlan {
    pub start: Gate,
    pub stop: Gate,
    pub skip: BTreeSet<Gate>,
}

impl GatePlan {
    /// Gates in `[start, stop]`, ascending, with skipped gates removed.
    pub fn gates(&self) -> Vec<Gate> {
        Gate::ALL[self.start.position()..=self.stop.position()]
            .iter()
            .copied()
            .filter(|g| !self.skip.contains(g))
            .collect()
    }
}

/// Outcome of one run. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub story_id: String,
    pub success: bool,
    pub gates_passed: Vec<Gate>,
    pub gates_failed: Vec<Gate>,
    pub errors: Vec<String>,
}

impl ExecutionResult {
    fn new(story_id: &str) -> Self {
        Self {
            story_id: story_id.to_string(),
            success: true,
            gates_passed: Vec::new(),
            gates_failed: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn aborted(story_id: &str, error: String) -> Self {
        Self {
            success: false,
            errors: vec![error],
            ..Self::new(story_id)
        }
    }
}

/// Drives one story through its gate range, stopping at the first failure.
pub struct Sequencer {
    stories: StoryRepository,
    executor: GateExecutor,
}

impl Sequencer {
    pub fn new(stories: StoryRepository, executor: GateExecutor) -> Self {
        Self { stories, executor }
    }

    /// Wire a sequencer from project configuration.
    pub fn from_config(config: &Config, collaborator: Arc<dyn Collaborator>) -> Self {
        let role_settings: HashMap<_, _> = AgentRole::ALL
            .iter()
            .map(|role| (*role, config.role_settings(*role)))
            .collect();
        let executor = GateExecutor::new(config.signal_store(), collaborator)
            .with_role_settings(role_settings);
        Self::new(config.story_repository(), executor)
    }

    pub fn executor(&self) -> &GateExecutor {
        &self.executor
    }

    pub async fn run(&self, story_id: &str, options: &RunOptions) -> ExecutionResult {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id, story_id);
        self.run_inner(story_id, options).instrument(span).await
    }

    async fn run_inner(&self, story_id: &str, options: &RunOptions) -> ExecutionResult {
        let plan = match options.plan() {
            Ok(plan) => plan,
            Err(e) => {
                error!(error = %e, "Invalid gate selection");
                return ExecutionResult::aborted(story_id, e.to_string());
            }
        };

        let story = match self.stories.load(story_id) {
            Ok(story) => story,
            Err(e) => {
                error!(error = %e, "Failed to load story");
                return ExecutionResult::aborted(story_id, e.to_string());
            }
        };

        info!(
            start = %plan.start,
            stop = %plan.stop,
            skipped = ?plan.skip,
            "Starting gate sequence"
        );

        let mut result = ExecutionResult::new(story_id);
        for gate in plan.gates() {
            match self.executor.execute(&story, gate).await {
                Ok(outcome) if outcome.success => result.gates_passed.push(gate),
                Ok(outcome) => {
                    result.gates_failed.push(gate);
                    result.errors.push(format!("{}: {}", gate, outcome.output));
                    result.success = false;
                    break;
                }
                Err(e) => {
                    error!(gate = %gate, error = %e, "Signal store failure; aborting run");
                    result.errors.push(format!("{}: {}", gate, e));
                    result.success = false;
                    break;
                }
            }
        }

        if result.success {
            info!(passed = result.gates_passed.len(), "All gates passed");
        } else {
            warn!(
                passed = result.gates_passed.len(),
                failed = ?result.gates_failed,
                "Run stopped"
            );
        }
        result
    }
}
