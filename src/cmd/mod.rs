//! CLI command implementations.
//!
//! | Module   | Commands handled                 |
//! |----------|----------------------------------|
//! | `run`    | `Run`                            |
//! | `story`  | `Status`, `Validate`, `Prompt`   |
//! | `gates`  | `Gates`                          |
//! | `config` | `Config`                         |

pub mod config;
pub mod gates;
pub mod run;
pub mod story;

pub use config::cmd_config;
pub use gates::cmd_gates;
pub use run::cmd_run;
pub use story::{cmd_prompt, cmd_status, cmd_validate};

use anyhow::Result;
use std::path::PathBuf;

use super::Cli;

/// Resolve runtime configuration with the global CLI overrides applied.
pub fn load_config(cli: &Cli, project_dir: PathBuf) -> Result<gatekeeper::config::Config> {
    gatekeeper::config::Config::new(project_dir, cli.verbose, cli.story_root.clone())
}
