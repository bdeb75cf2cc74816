//! Configuration view and validation commands: `gatekeeper config`.

use anyhow::Result;
use std::path::Path;
use std::process::ExitCode;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &Path, command: Option<ConfigCommands>) -> Result<ExitCode> {
    use gatekeeper::config::{Config, GATEKEEPER_DIR};
    use gatekeeper::gate_config::{CONFIG_FILE, GateToml};

    let gatekeeper_dir = project_dir.join(GATEKEEPER_DIR);
    let config_path = gatekeeper_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found at {}; using defaults.", CONFIG_FILE, config_path.display());
            }
            println!();

            let config = Config::new(project_dir.to_path_buf(), false, None)?;
            println!("Effective values (with env overrides):");
            println!("  story_root = \"{}\"", config.story_root.display());
            println!("  signal_dir = \"{}\"", config.signal_dir.display());
            println!("  strict_lookup = {}", config.strict_lookup);
            println!("  agent.cmd = \"{}\"", config.agent_cmd);
            println!("  agent.skip_permissions = {}", config.skip_permissions);
            match config.agent_timeout {
                Some(t) => println!("  agent.timeout_secs = {}", t.as_secs()),
                None => println!("  agent.timeout_secs = (none)"),
            }

            let agents = &config.toml().agents;
            if !agents.is_empty() {
                println!();
                for (role, settings) in agents {
                    println!("[agents.{}]", role);
                    if let Some(model) = &settings.model {
                        println!("  model = \"{}\"", model);
                    }
                    if !settings.allowed_tools.is_empty() {
                        println!("  allowed_tools = {:?}", settings.allowed_tools);
                    }
                    if settings.system_prompt.is_some() {
                        println!("  system_prompt = (set)");
                    }
                }
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            if !config_path.exists() {
                println!("No {} found. Using defaults (valid).", CONFIG_FILE);
                return Ok(ExitCode::SUCCESS);
            }

            let toml = GateToml::load(&config_path)?;
            let warnings = toml.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(ExitCode::SUCCESS);
            }

            std::fs::create_dir_all(&gatekeeper_dir)?;
            GateToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [project] story_root, strict_lookup");
            println!("  - [agent] cmd, skip_permissions, timeout_secs");
            println!("  - [agents.<role>] model, allowed_tools, system_prompt");
            println!();
        }
    }

    Ok(ExitCode::SUCCESS)
}
