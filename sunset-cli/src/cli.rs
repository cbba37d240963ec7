use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode};
use sunset_core::{
    Config, Coordinates, FavoritesStore, Geocoder, NominatimGeocoder, PhotoStore, Predictor,
    ProviderId,
};

use crate::{output, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "sunset", version, about = "Sunset quality predictor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific weather provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Predict sunset quality for a place.
    Predict {
        /// Address or location name.
        location: String,

        /// Number of days to forecast, 1 meaning tonight only.
        #[arg(long, default_value_t = 1)]
        days: u8,

        /// Print the raw JSON report instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Look up the place name for a pair of coordinates.
    Reverse {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },

    /// List the built-in favorite sunset spots.
    Favorites,

    /// Run the HTTP server.
    Serve {
        /// Listen address; defaults to the configured one.
        #[arg(long, env = "SUNSET_ADDRESS")]
        address: Option<SocketAddr>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Predict {
                location,
                days,
                json,
            } => {
                let predictor = Predictor::from_config(&load_config()?)?;
                let report = predictor.predict(&location, days).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", output::format_report(&report));
                }
                Ok(())
            }
            Command::Reverse { lat, lon } => {
                let at = Coordinates::new(lat, lon)?;
                let place = reverse_geocoder(&load_config()?)?.reverse(at).await?;
                println!("{}", place.address);
                Ok(())
            }
            Command::Favorites => {
                let favorites = FavoritesStore::default().list().await;
                print!("{}", output::format_favorites(&favorites));
                Ok(())
            }
            Command::Serve { address } => {
                let config = load_config()?;
                let address = address.unwrap_or(config.server.address);
                let state = Arc::new(server::AppState {
                    predictor: Predictor::from_config(&config)?,
                    favorites: FavoritesStore::default(),
                    photos: PhotoStore::new(config.server.uploads_dir.clone()),
                    max_upload_bytes: config.server.max_upload_bytes,
                });
                server::run(address, state).await;
                Ok(())
            }
        }
    }
}

/// File configuration with environment API keys layered on top.
fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

/// Reverse lookups only talk to Nominatim, so no weather key is needed.
fn reverse_geocoder(config: &Config) -> anyhow::Result<NominatimGeocoder> {
    let http = sunset_core::http::client(&config.http).context("Failed to build HTTP client")?;
    Ok(NominatimGeocoder::new(http))
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim().to_string();
    anyhow::ensure!(!api_key.is_empty(), "API key must not be empty");

    config.upsert_provider_api_key(id, api_key);

    let current_default = config.default_provider_id().ok();
    if current_default != Some(id) {
        let make_default = Confirm::new(&format!("Use {id} as the default provider?"))
            .with_default(true)
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save()?;
    println!(
        "Saved {id} credentials to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}
