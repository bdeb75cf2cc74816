//! Gate sequencing for one story: `gatekeeper run <STORY_ID>`.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use super::super::Cli;
use super::load_config;

pub async fn cmd_run(
    cli: &Cli,
    project_dir: PathBuf,
    story_id: &str,
    options: &gatekeeper::orchestrator::RunOptions,
    json: bool,
) -> Result<ExitCode> {
    use gatekeeper::agent::ProcessCollaborator;
    use gatekeeper::orchestrator::Sequencer;

    let config = load_config(cli, project_dir)?;
    for warning in config.toml().validate() {
        tracing::warn!("{}", warning);
    }

    let collaborator = Arc::new(ProcessCollaborator::new(config.clone()));
    let sequencer = Sequencer::from_config(&config, collaborator);
    let result = sequencer.run(story_id, options).await;

    if json {
        let out =
            serde_json::to_string_pretty(&result).context("Failed to serialize execution result")?;
        println!("{}", out);
    } else {
        print_summary(&result);
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(result: &gatekeeper::orchestrator::ExecutionResult) {
    println!();
    println!("Story {}", console::style(&result.story_id).bold());
    for gate in &result.gates_passed {
        println!("  {} {}", console::style("✓").green(), gate);
    }
    for gate in &result.gates_failed {
        println!("  {} {}", console::style("✗").red(), gate);
    }
    if !result.errors.is_empty() {
        println!();
        for error in &result.errors {
            println!("  {}", console::style(error).red());
        }
    }
    println!();
    if result.success {
        println!(
            "{} {} gate(s) passed",
            console::style("PASSED").green().bold(),
            result.gates_passed.len()
        );
    } else {
        println!("{}", console::style("FAILED").red().bold());
    }
}
