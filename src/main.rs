//! modelscout - Dynamic LLM model selection over a live model catalog
//!
//! Picks a primary and a fallback model for a configured role, either from
//! the live catalog or from a JSON snapshot of candidate records.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modelscout::config::{Config, KeySource};
use modelscout::selection::{Candidate, CandidateRecord, ScoredCandidate};
use modelscout::{CandidateSelector, ModelScout, Selection};

#[derive(Parser)]
#[command(name = "modelscout")]
#[command(about = "Dynamic LLM model selection over a live model catalog")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select a primary and fallback model for a role
    Select {
        /// Path to configuration file
        #[arg(short, long, default_value = "modelscout.toml")]
        config: PathBuf,

        /// Role to select for
        #[arg(short, long)]
        role: String,

        /// Read candidates from a JSON file instead of fetching the catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Validate configuration file
    Check {
        /// Path to configuration file
        #[arg(short, long, default_value = "modelscout.toml")]
        config: PathBuf,
    },

    /// Show configured roles and their weights
    Roles {
        /// Path to configuration file
        #[arg(short, long, default_value = "modelscout.toml")]
        config: PathBuf,
    },
}

impl Commands {
    fn config_path(&self) -> &Path {
        match self {
            Commands::Select { config, .. }
            | Commands::Check { config }
            | Commands::Roles { config } => config,
        }
    }
}

/// Install the subscriber. `RUST_LOG` wins over `[logging] level`.
fn init_tracing(config: &Config) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.command.config_path().to_path_buf();
    let (config, key_source) = Config::from_file_with_env(&config_path)?;
    init_tracing(&config);

    match cli.command {
        Commands::Select { role, catalog, .. } => {
            tracing::info!(config = %config_path.display(), role = %role, "Configuration loaded");
            let selection = match catalog {
                Some(path) => select_from_snapshot(&config, &role, &path)?,
                None => ModelScout::new(config)?.select_for_role(&role).await?,
            };
            print_selection(&selection);
            Ok(())
        }

        Commands::Check { .. } => {
            tracing::info!(config = %config_path.display(), "Checking configuration");
            if key_source == KeySource::None {
                tracing::warn!("No catalog API key configured");
            }
            println!("Configuration OK");
            println!("  catalog:  {}", config.catalog.url);
            println!("  api key:  {}", key_source);
            println!("  roles:    {}", config.roles.len());
            println!(
                "  freshness filter: {}",
                if config.freshness.is_some() { "on" } else { "off" }
            );
            Ok(())
        }

        Commands::Roles { .. } => {
            for role in &config.roles {
                let w = role.weights;
                println!(
                    "{:<16} quality={:.2} speed={:.2} cost={:.2} min_context={} max_avg_cost={}",
                    role.name,
                    w.quality,
                    w.speed,
                    w.cost,
                    role.min_context_capacity
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    role.max_average_cost
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            Ok(())
        }
    }
}

/// Run the selector against a JSON array of candidate records.
fn select_from_snapshot(
    config: &Config,
    role: &str,
    path: &Path,
) -> anyhow::Result<Selection> {
    let requirements = config
        .role(role)
        .map(|r| r.requirements())
        .ok_or_else(|| modelscout::Error::UnknownRole(role.to_string()))?;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog snapshot '{}'", path.display()))?;
    let records: Vec<CandidateRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid catalog snapshot '{}'", path.display()))?;
    let candidates = records
        .into_iter()
        .map(Candidate::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let selector = CandidateSelector::from_config(&config.scoring, config.freshness.as_ref());
    Ok(selector.select(&candidates, &requirements)?)
}

fn print_selection(selection: &Selection) {
    print_line("primary", &selection.primary);
    print_line("fallback", &selection.fallback);
    if let Some(warning) = selection.warning {
        println!("warning:  {}", warning.as_str());
    }
    println!(
        "eligible: {}/{}",
        selection.eligible, selection.total
    );
}

fn print_line(label: &str, scored: &ScoredCandidate) {
    let s = scored.scores;
    println!(
        "{:<9} {}  (total {:.3}, quality {:.3}, speed {:.3}, cost {:.3})",
        format!("{}:", label),
        scored.identifier(),
        s.total,
        s.quality,
        s.speed,
        s.cost
    );
}
