use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::gate_config::{GateToml, RoleSettings};
use crate::gates::AgentRole;
use crate::signals::SignalStore;
use crate::story::StoryRepository;

/// Name of the per-project state directory.
pub const GATEKEEPER_DIR: &str = ".gatekeeper";

/// Runtime configuration.
///
/// Bridges `gatekeeper.toml` with CLI overrides and resolves every path
/// the sequencer needs against the project directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub gatekeeper_dir: PathBuf,
    pub story_root: PathBuf,
    pub signal_dir: PathBuf,
    pub strict_lookup: bool,
    pub agent_cmd: String,
    pub skip_permissions: bool,
    pub agent_timeout: Option<Duration>,
    pub verbose: bool,
    toml: GateToml,
}

impl Config {
    /// Load configuration for `project_dir`.
    ///
    /// `story_root` overrides the configured story root; relative paths are
    /// resolved against the project directory.
    pub fn new(project_dir: PathBuf, verbose: bool, story_root: Option<PathBuf>) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let gatekeeper_dir = project_dir.join(GATEKEEPER_DIR);
        let toml = GateToml::load_or_default(&gatekeeper_dir)?;

        let story_root = story_root.unwrap_or_else(|| PathBuf::from(toml.story_root()));
        let story_root = resolve(&project_dir, &story_root);

        Ok(Self {
            signal_dir: gatekeeper_dir.join("signals"),
            strict_lookup: toml.project.strict_lookup,
            agent_cmd: toml.agent_cmd(),
            skip_permissions: toml.skip_permissions(),
            agent_timeout: toml.agent.timeout_secs.map(Duration::from_secs),
            project_dir,
            gatekeeper_dir,
            story_root,
            verbose,
            toml,
        })
    }

    pub fn toml(&self) -> &GateToml {
        &self.toml
    }

    pub fn role_settings(&self, role: AgentRole) -> RoleSettings {
        self.toml.role_settings(role)
    }

    pub fn story_repository(&self) -> StoryRepository {
        StoryRepository::new(self.story_root.clone()).with_strict_lookup(self.strict_lookup)
    }

    pub fn signal_store(&self) -> SignalStore {
        SignalStore::new(self.signal_dir.clone())
    }

    /// Command-line flags for invoking the agent CLI with `settings`.
    pub fn agent_flags(&self, settings: &RoleSettings) -> Vec<String> {
        let mut flags = Vec::new();
        if self.skip_permissions {
            flags.push("--dangerously-skip-permissions".to_string());
        }
        flags.push("--print".to_string());
        flags.push("--output-format".to_string());
        flags.push("stream-json".to_string());
        flags.push("--verbose".to_string());
        if let Some(model) = &settings.model {
            flags.push("--model".to_string());
            flags.push(model.clone());
        }
        if !settings.allowed_tools.is_empty() {
            flags.push("--allowedTools".to_string());
            flags.push(settings.allowed_tools.join(","));
        }
        if let Some(system_prompt) = &settings.system_prompt {
            flags.push("--append-system-prompt".to_string());
            flags.push(system_prompt.clone());
        }
        flags
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
