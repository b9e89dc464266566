use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{init_structured_logging, ConfigLoader, CoreConfig, LoggingConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;
mod tenants;

use commands::{AnalyzeCommand, ExecCommand, RouteCommand, SkillsCommand};

#[derive(Parser)]
#[command(name = "skillmesh")]
#[command(about = "Route requests to skills and run them")]
#[command(version)]
struct Cli {
    /// Config file checked before the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Overrides the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route free text (or an explicit skill) and execute the result
    Route(RouteCommand),
    /// Execute one skill by id
    Exec(ExecCommand),
    /// List registered skills
    Skills(SkillsCommand),
    /// Show complexity metrics without executing
    Analyze(AnalyzeCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{} {:#}", console::style("error:").red().bold(), e);
            ExitCode::from(2)
        }
    }
}

/// `Ok(false)` means the command ran but the skill reported failure
async fn run() -> Result<bool> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(cli.config.clone()).await?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_structured_logging(LoggingConfig::from_settings(&level, config.logging.json))?;

    let out = output::Output::new(cli.json);
    match cli.command {
        Commands::Route(cmd) => cmd.execute(config, &out).await,
        Commands::Exec(cmd) => cmd.execute(config, &out).await,
        Commands::Skills(cmd) => cmd.execute(config, &out).map(|_| true),
        Commands::Analyze(cmd) => cmd.execute(config, &out).await.map(|_| true),
    }
}

async fn load_config(path: Option<PathBuf>) -> Result<CoreConfig> {
    let loader = ConfigLoader::new();
    let Some(path) = path else {
        return loader.load().await.context("Failed to load configuration");
    };

    let config = loader.load_file(&path).await?;
    let config = loader.apply_env_overrides(config)?;
    config.validate()?;
    Ok(config)
}
