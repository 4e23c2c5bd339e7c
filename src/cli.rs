//! CLI interface for idea-engine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::generator::ChatClient;
use crate::memory::SystemMemory;
use crate::metrics::MetricsReport;
use crate::orchestrator::GenerationOrchestrator;
use crate::table::IdeaTable;
use crate::tracker::IdeaTracker;

const METRICS_REFRESH_SECS: u64 = 60;

#[derive(Parser)]
#[command(name = "idea-engine")]
#[command(
    about = "Continuous business-idea generator with duplicate detection and learning memory",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate ideas continuously (Ctrl-C to stop)
    Run {
        /// Run a single cycle and exit (implied by GITHUB_ACTIONS=true)
        #[arg(long)]
        once: bool,
    },
    /// Show metrics for the idea table
    Metrics {
        /// Refresh every minute until interrupted
        #[arg(short, long)]
        watch: bool,
    },
    /// Show what the system has learned so far
    Insights,
    /// Check whether an idea would be rejected as a duplicate
    Check {
        /// Candidate name
        name: String,
        /// Candidate description
        description: String,
    },
    /// Configure the generator
    Config {
        /// Store the LLM API key in the keyring
        #[arg(long)]
        set_api_key: Option<String>,
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { once } => {
            let config = Config::load()?;
            let in_ci = std::env::var("GITHUB_ACTIONS").map(|v| v == "true").unwrap_or(false);
            let once = once || in_ci;
            run_generator(&config, once).await?;
        }
        Commands::Metrics { watch } => {
            let config = Config::load()?;
            let table_path = config.data_paths()?.table;
            if watch {
                watch_metrics(&table_path).await?;
            } else {
                print_metrics(&table_path)?;
            }
        }
        Commands::Insights => {
            let config = Config::load()?;
            let memory = SystemMemory::open(config.data_paths()?.memory)
                .context("Failed to open system memory")?;
            print_insights(&memory);
        }
        Commands::Check { name, description } => {
            let config = Config::load()?;
            let tracker = IdeaTracker::open(config.data_paths()?.history, config.tracker.clone())
                .context("Failed to open idea history")?;
            match tracker.is_duplicate(&name, &description) {
                Some(reason) => println!("Duplicate: {}", reason),
                None => println!("New idea (checked against {} tracked ideas)", tracker.len()),
            }
        }
        Commands::Config { set_api_key, show, reset } => {
            if let Some(key) = set_api_key {
                crate::security::set_api_key(&key)?;
                println!("API key stored securely in keyring.");
            } else if reset {
                crate::config::reset_config()?;
            } else if show {
                crate::config::show_config(&Config::load()?)?;
            } else {
                println!("Configuration options:");
                println!("  --set-api-key <key>   Store the LLM API key");
                println!("  --show                Display current configuration");
                println!("  --reset               Restore default settings");
                println!();
                println!("Environment overrides: MIN_SCORE, GENERATION_INTERVAL,");
                println!("                       IDEA_ENGINE_DATA_DIR, OPENAI_API_KEY");
                println!();
                println!("Defaults:");
                print!("{}", crate::config::default_config_toml());
            }
        }
    }

    Ok(())
}

async fn run_generator(config: &Config, once: bool) -> Result<()> {
    let client = ChatClient::from_keyring(config.llm.clone())?;
    let model = client.model().to_string();
    let mut orchestrator = GenerationOrchestrator::open(config, Box::new(client))?;

    println!("idea-engine");
    println!("  Model:     {}", model);
    println!("  Min score: {}", config.generator.min_score);
    println!(
        "  Interval:  {}s ({} min)",
        config.generator.interval_secs,
        config.generator.interval_secs / 60
    );
    println!("  Data:      {}", config.data_dir()?.display());
    if once {
        println!("  Mode:      single cycle");
    } else {
        println!("  Press Ctrl-C to stop");
    }
    println!();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    orchestrator.run(once, shutdown_rx).await?;

    println!();
    print_insights(orchestrator.memory());
    Ok(())
}

fn print_insights(memory: &SystemMemory) {
    let insights = memory.get_insights();
    if insights.is_empty() {
        println!("No insights yet.");
        return;
    }
    println!("Insights:");
    for insight in insights {
        println!("  - {}", insight);
    }
}

fn print_metrics(table_path: &std::path::Path) -> Result<()> {
    if !table_path.exists() {
        println!("Idea table not found at {}. Waiting for ideas...", table_path.display());
        return Ok(());
    }

    let ideas = IdeaTable::open(table_path.to_path_buf())?
        .load()
        .context("Failed to read idea table")?;
    println!("{}", MetricsReport::from_ideas(&ideas));
    Ok(())
}

async fn watch_metrics(table_path: &std::path::Path) -> Result<()> {
    println!("Metrics refresh every {} seconds. Press Ctrl-C to stop.", METRICS_REFRESH_SECS);

    loop {
        if let Err(e) = print_metrics(table_path) {
            eprintln!("Error updating metrics: {:#}", e);
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(METRICS_REFRESH_SECS)) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("Metrics watch stopped.");
                break;
            }
        }
    }

    Ok(())
}
