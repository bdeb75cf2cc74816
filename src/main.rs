use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod cmd;

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(version, about = "Drive stories through ordered quality gates")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Story root. Overrides gatekeeper.toml and GATEKEEPER_STORY_ROOT.
    #[arg(long, global = true)]
    pub story_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a story through its gates, resuming past passed gates
    Run {
        story_id: String,

        /// First gate to execute (e.g. gate2 or 2)
        #[arg(long)]
        start_gate: Option<String>,

        /// Last gate to execute, inclusive
        #[arg(long)]
        stop_gate: Option<String>,

        /// Gates to skip (comma-separated)
        #[arg(long)]
        skip_gates: Option<String>,

        /// Print the execution result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the gate catalog
    Gates {
        /// Resolve roles for this story's domain
        #[arg(long)]
        story: Option<String>,
    },
    /// Show recorded signals for a story
    Status { story_id: String },
    /// Load and schema-validate a story
    Validate { story_id: String },
    /// Print the prompt a gate would send for a story
    Prompt { story_id: String, gate: String },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default gatekeeper.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    };

    gatekeeper::telemetry::init_tracing(cli.log_json, gatekeeper::telemetry::level_for(cli.verbose));

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match command {
        Commands::Run {
            story_id,
            start_gate,
            stop_gate,
            skip_gates,
            json,
        } => {
            let options = gatekeeper::orchestrator::RunOptions {
                start_gate: start_gate.clone(),
                stop_gate: stop_gate.clone(),
                skip_gates: skip_gates
                    .as_deref()
                    .map(gatekeeper::orchestrator::RunOptions::parse_skip_list)
                    .unwrap_or_default(),
            };
            cmd::cmd_run(&cli, project_dir, story_id, &options, *json).await
        }
        Commands::Gates { story } => cmd::cmd_gates(&cli, project_dir, story.as_deref()),
        Commands::Status { story_id } => cmd::cmd_status(&cli, project_dir, story_id),
        Commands::Validate { story_id } => cmd::cmd_validate(&cli, project_dir, story_id),
        Commands::Prompt { story_id, gate } => cmd::cmd_prompt(&cli, project_dir, story_id, gate),
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone()),
    }
}
