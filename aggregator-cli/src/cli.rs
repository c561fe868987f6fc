use std::path::Path;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::Password;
use weather_aggregator_core::{AggregateResult, Config, ProviderId, WeatherAggregator};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-aggregator",
    version,
    about = "Multi-source weather aggregator"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API.
    Serve {
        /// Overrides `server.host` from the config.
        #[arg(long)]
        host: Option<String>,

        /// Overrides `server.port` from the config.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Aggregate the current weather for a city once and print it.
    Show {
        /// City or place name.
        city: String,
    },

    /// Store the API key for a provider, e.g. "openweather" or "weatherapi".
    Configure {
        provider: String,
    },

    /// List providers and whether they will be queried.
    Providers,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { host, port } => {
                let mut config = Config::load()?;
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                crate::server::run(config).await
            }
            Command::Show { city } => {
                let config = Config::load()?;
                let aggregator = WeatherAggregator::from_config(&config)?;
                let result = aggregator.aggregate(&city).await?;
                print!("{}", render(&result));
                Ok(())
            }
            Command::Configure { provider } => configure(&provider),
            Command::Providers => {
                let config = Config::load()?;
                for id in ProviderId::all() {
                    let configured = config.is_provider_configured(*id);
                    let state = match (id.requires_api_key(), configured) {
                        (false, _) => "enabled (no key required)",
                        (true, true) => "enabled",
                        (true, false) => "skipped (no API key)",
                    };
                    println!("{:<12} {:<16} {state}", id.as_str(), id.display_name());
                }
                Ok(())
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    if !id.requires_api_key() {
        bail!("Provider '{id}' does not need an API key.");
    }

    let api_key = Password::new(&format!("API key for {}:", id.display_name()))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        return Err(anyhow!("API key must not be empty."));
    }

    let path = Config::config_file_path()?;
    store_api_key(&path, id, api_key.trim())?;

    println!(
        "Saved API key for {} to {}",
        id.display_name(),
        path.display()
    );
    Ok(())
}

/// Rewrites only what is on disk, so environment overrides never end up in the file.
fn store_api_key(path: &Path, id: ProviderId, api_key: &str) -> anyhow::Result<()> {
    let mut config = Config::load_from(path)?;
    config.upsert_provider_api_key(id, api_key.to_string());
    config.save_to(path)
}

fn render(result: &AggregateResult) -> String {
    let mut out = format!("{}: {:.2}°C on average\n", result.city, result.average_temp);
    for source in &result.sources {
        out.push_str(&format!(
            "  {:<16} {:>6.1}°C  {}\n",
            source.name, source.temp, source.description
        ));
    }
    out
}
