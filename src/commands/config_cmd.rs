use clap::{Args, Subcommand};
use tfs_core::check_server;
use tfs_site::config::Config;

use super::OutputFormat;

#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Check that the configured server is reachable
    Check,
}

impl ConfigCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("server_url: {}", config.server_url.value);
                        println!("  source: {}", config.server_url.source);
                        println!();

                        println!("poll_interval_secs: {}", config.poll_interval_secs.value);
                        println!("  source: {}", config.poll_interval_secs.source);
                    }
                }
                Ok(())
            }
            ConfigSubcommand::Check => {
                print!("Server {}: ", config.server_url.value);
                if check_server(&config.server_url.value).await {
                    println!("✓ reachable");
                } else {
                    println!("✗ unreachable");
                }
                Ok(())
            }
        }
    }
}
