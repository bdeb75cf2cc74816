//! Project configuration file for gatekeeper.
//!
//! Settings are read from `.gatekeeper/gatekeeper.toml` and layered
//! (file → environment → CLI):
//!
//! ```toml
//! [project]
//! story_root = "stories"
//! strict_lookup = false
//!
//! [agent]
//! cmd = "claude"
//! skip_permissions = true
//! timeout_secs = 1800
//!
//! [agents.qa]
//! model = "sonnet"
//! allowed_tools = ["Read", "Grep", "Bash"]
//!
//! [agents.release-ops]
//! system_prompt = "You own the release checklist."
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::gates::AgentRole;

/// Name of the configuration file inside the `.gatekeeper` directory.
pub const CONFIG_FILE: &str = "gatekeeper.toml";

/// Story lookup settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Story root, relative to the project directory (default: "stories")
    #[serde(default)]
    pub story_root: Option<String>,
    /// Fail when more than one document matches a story id
    #[serde(default)]
    pub strict_lookup: bool,
}

/// How the agent CLI is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Agent command (default: "claude")
    #[serde(default)]
    pub cmd: Option<String>,
    #[serde(default = "default_skip_permissions")]
    pub skip_permissions: bool,
    /// Wall-clock limit for one gate invocation; unset means no limit
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_skip_permissions() -> bool {
    true
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            cmd: None,
            skip_permissions: default_skip_permissions(),
            timeout_secs: None,
        }
    }
}

/// Per-role agent configuration passed to the collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSettings {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// The complete gatekeeper.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateToml {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub agent: AgentSection,
    /// Role settings keyed by role name (e.g. "qa", "backend-dev")
    #[serde(default)]
    pub agents: BTreeMap<String, RoleSettings>,
}

impl GateToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse gatekeeper.toml")
    }

    /// Load from `<dir>/gatekeeper.toml`, or defaults when the file is absent.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize gatekeeper.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Agent command (file → `GATEKEEPER_AGENT_CMD` → "claude").
    pub fn agent_cmd(&self) -> String {
        self.agent
            .cmd
            .clone()
            .or_else(|| std::env::var("GATEKEEPER_AGENT_CMD").ok())
            .unwrap_or_else(|| "claude".to_string())
    }

    /// Story root (file → `GATEKEEPER_STORY_ROOT` → "stories").
    pub fn story_root(&self) -> String {
        self.project
            .story_root
            .clone()
            .or_else(|| std::env::var("GATEKEEPER_STORY_ROOT").ok())
            .unwrap_or_else(|| "stories".to_string())
    }

    /// `SKIP_PERMISSIONS` overrides the file setting.
    pub fn skip_permissions(&self) -> bool {
        if let Ok(env_val) = std::env::var("SKIP_PERMISSIONS") {
            return env_val != "false";
        }
        self.agent.skip_permissions
    }

    /// Settings for `role`, or defaults when the role has no section.
    pub fn role_settings(&self, role: AgentRole) -> RoleSettings {
        self.agents.get(role.as_str()).cloned().unwrap_or_default()
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for key in self.agents.keys() {
            if key.parse::<AgentRole>().is_err() {
                warnings.push(format!(
                    "Unknown agent role '{}' in [agents]; valid roles: research, backend-dev, frontend-dev, qa, release-ops",
                    key
                ));
            }
        }

        if self.agent.timeout_secs == Some(0) {
            warnings.push("agent.timeout_secs = 0 fails every gate immediately".to_string());
        }

        if let Some(cmd) = &self.agent.cmd
            && cmd.trim().is_empty()
        {
            warnings.push("agent.cmd is empty".to_string());
        }

        warnings
    }
}
