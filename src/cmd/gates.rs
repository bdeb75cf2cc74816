//! Gate catalog listing: `gatekeeper gates`.

use anyhow::Result;
use std::path::PathBuf;
use std::process::ExitCode;

use super::super::Cli;
use super::load_config;

pub fn cmd_gates(cli: &Cli, project_dir: PathBuf, story_id: Option<&str>) -> Result<ExitCode> {
    use gatekeeper::gates::{catalog, resolve_role};
    use gatekeeper::story::Domain;

    let domain = match story_id {
        Some(id) => {
            let config = load_config(cli, project_dir)?;
            config.story_repository().load(id)?.domain
        }
        None => Domain::Unspecified,
    };

    println!();
    println!("{:<8} {:<18} {:<14} Description", "Gate", "Name", "Role");
    println!(
        "{:<8} {:<18} {:<14} -----------",
        "----", "----", "----"
    );
    for spec in catalog().iter() {
        println!(
            "{:<8} {:<18} {:<14} {}",
            spec.gate,
            spec.name,
            resolve_role(spec.gate, domain).as_str(),
            spec.description
        );
        if cli.verbose {
            for item in spec.checklist {
                println!("{:<42} - {}", "", console::style(item).dim());
            }
        }
    }
    println!();
    if story_id.is_some() {
        println!("Roles resolved for domain {}", domain);
        println!();
    }
    Ok(ExitCode::SUCCESS)
}
