//! Agora CLI - Command-line interface for Agora
//!
//! This is the main entry point for users interacting with Agora.
//! It loads question/answer logs, builds the interaction graph and ranks
//! the participants who hold the community together.

use agora_graph::Metric;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "agora")]
#[command(author = "Agora Contributors")]
#[command(version)]
#[command(about = "Find community leaders in question/answer logs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to .agora/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Agora in the current directory
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show graph statistics for an interaction log
    Stats {
        /// Interaction log (CSV)
        csv: PathBuf,
    },

    /// Rank participants by centrality
    Rank {
        /// Interaction log (CSV)
        csv: PathBuf,

        /// Metric to rank by (all metrics if omitted)
        #[arg(short, long, value_parser = parse_metric)]
        metric: Option<Metric>,

        /// Number of participants per ranking
        #[arg(short, long)]
        top: Option<usize>,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Export the graph to JSON
    Export {
        /// Interaction log (CSV)
        csv: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "agora-graph.json")]
        output: PathBuf,
    },

    /// Show who a participant asks and who asks them
    Neighbors {
        /// Interaction log (CSV)
        csv: PathBuf,

        /// Participant id
        node: String,
    },

    /// Export the graph restricted to some participants
    Subgraph {
        /// Interaction log (CSV)
        csv: PathBuf,

        /// Participant to keep (repeatable)
        #[arg(short, long = "node", required = true)]
        nodes: Vec<String>,

        /// Output file
        #[arg(short, long, default_value = "agora-subgraph.json")]
        output: PathBuf,
    },
}

fn parse_metric(s: &str) -> Result<Metric, String> {
    s.parse().map_err(|e: agora_graph::RankingError| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(config::CONFIG_DIR).join(config::CONFIG_FILE));
    let config = match config::AgoraConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Stats { csv } => commands::stats(&csv, &config),
        Commands::Rank {
            csv,
            metric,
            top,
            json,
        } => commands::rank(&csv, metric, top, json, &config),
        Commands::Export { csv, output } => commands::export(&csv, &output, &config),
        Commands::Neighbors { csv, node } => commands::neighbors(&csv, &node, &config),
        Commands::Subgraph { csv, nodes, output } => {
            commands::subgraph(&csv, &nodes, &output, &config)
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
