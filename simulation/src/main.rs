//! Meshnet - mesh network simulation runner
//!
//! Drives the meshnet stack through scripted topologies and traffic:
//! node lifecycle, multi-hop routing with retries, and discovery search.

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod scenarios;

#[derive(Parser)]
#[command(
    name = "meshnet-sim",
    about = "Mesh network simulation with hop-by-hop routing and discovery",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay messages across a line topology
    Relay {
        /// Number of nodes in the line
        #[arg(short, long, default_value = "4")]
        nodes: usize,
    },

    /// Hub-and-spoke traffic with connectivity analysis
    Star {
        /// Number of nodes including the hub
        #[arg(short, long, default_value = "6")]
        nodes: usize,
    },

    /// Route around a failing relay, exercising retries and the archive
    Failures,

    /// Build a topology and print its connectivity analysis
    Topology {
        /// Type of topology: ring, full, random, line, star
        #[arg(short, long, default_value = "ring")]
        topology: String,

        /// Number of nodes
        #[arg(short, long, default_value = "6")]
        nodes: usize,

        /// Connection probability for random topology
        #[arg(short, long, default_value = "0.4")]
        connection_prob: f64,
    },

    /// Populate a mesh and run discovery searches against it
    Discovery {
        /// Number of nodes
        #[arg(short, long, default_value = "8")]
        nodes: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Relay { nodes } => scenarios::run_relay_scenario(nodes).await,
        Commands::Star { nodes } => scenarios::run_star_scenario(nodes).await,
        Commands::Failures => scenarios::run_failure_scenario().await,
        Commands::Topology {
            topology,
            nodes,
            connection_prob,
        } => scenarios::run_topology_report(&topology, nodes, connection_prob),
        Commands::Discovery { nodes } => scenarios::run_discovery_scenario(nodes).await,
    }
}
