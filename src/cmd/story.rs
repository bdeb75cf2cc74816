//! Per-story inspection commands: `status`, `validate` and `prompt`.

use anyhow::Result;
use std::path::PathBuf;
use std::process::ExitCode;

use super::super::Cli;
use super::load_config;

pub fn cmd_status(cli: &Cli, project_dir: PathBuf, story_id: &str) -> Result<ExitCode> {
    use gatekeeper::gates::{Gate, catalog};
    use gatekeeper::signals::Outcome;

    let config = load_config(cli, project_dir)?;
    let history = config.signal_store().history(story_id)?;

    println!();
    match config.story_repository().load(story_id) {
        Ok(story) => println!(
            "Story {}: {} (criticality {})",
            console::style(&story.id).bold(),
            story.title,
            story.criticality
        ),
        Err(e) => {
            println!("Story {}", console::style(story_id).bold());
            println!("  {}", console::style(e).dim());
        }
    }
    println!();
    println!("{:<8} {:<18} {:<8} Recorded", "Gate", "Name", "State");
    println!("{:<8} {:<18} {:<8} --------", "----", "----", "-----");

    for gate in Gate::ALL {
        let signals: Vec<_> = history.iter().filter(|s| s.gate == gate).collect();
        let passed = signals.iter().find(|s| s.outcome == Outcome::Passed);
        let failed = signals.iter().find(|s| s.outcome == Outcome::Failed);
        let (state, when) = match (passed, failed) {
            (Some(s), _) => (console::style("passed").green(), Some(s.timestamp)),
            (None, Some(s)) => (console::style("failed").red(), Some(s.timestamp)),
            (None, None) => (console::style("pending").dim(), None),
        };
        println!(
            "{:<8} {:<18} {:<8} {}",
            gate,
            catalog().get(gate).name,
            state,
            when.map(|t| t.to_rfc3339()).unwrap_or_default()
        );
    }
    println!();
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_validate(cli: &Cli, project_dir: PathBuf, story_id: &str) -> Result<ExitCode> {
    use gatekeeper::errors::StoryError;

    let config = load_config(cli, project_dir)?;
    match config.story_repository().load(story_id) {
        Ok(story) => {
            println!(
                "{} {} ({} acceptance criteria, domain {})",
                console::style("valid").green().bold(),
                story.id,
                story.acceptance_criteria.len(),
                story.domain
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(StoryError::Validation { path, violations }) => {
            println!(
                "{} {}",
                console::style("invalid").red().bold(),
                path.display()
            );
            for violation in violations {
                println!("  - {}", violation);
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            println!("{} {}", console::style("error").red().bold(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

pub fn cmd_prompt(cli: &Cli, project_dir: PathBuf, story_id: &str, gate: &str) -> Result<ExitCode> {
    use gatekeeper::prompt::build_prompt;

    let config = load_config(cli, project_dir)?;
    let story = config.story_repository().load(story_id)?;
    print!("{}", build_prompt(&story, gate));
    Ok(ExitCode::SUCCESS)
}
