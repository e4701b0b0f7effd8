use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{ConfigCommand, ItemCommand};
use tfs_site::config::Config;

#[derive(Parser)]
#[command(name = "tfs")]
#[command(version)]
#[command(about = "Operator CLI for the TFS site data store", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Items(ItemCommand),

    /// Show upcoming events with countdowns, then past events by series
    Upcoming,

    /// Show leadership and faculty
    Roster,

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Items(cmd)) => cmd.run(&config).await?,
        Some(Commands::Upcoming) => commands::upcoming(&config).await?,
        Some(Commands::Roster) => commands::roster(&config).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config).await?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
