use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use cityboard_core::{
    City, CityId, CitySynchronizer, Config, FileStore, ForecastPoint, WeatherError,
    WeatherProvider, is_searchable, points_on_day, provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityboard", version, about = "Current weather for the cities you track")]
pub struct Cli {
    /// Store file holding the tracked city names (defaults to the platform data dir).
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the OpenWeatherMap API key and endpoint.
    Configure,

    /// Show current conditions for every tracked city.
    List {
        /// Only show cities whose name contains this text.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Start tracking a city.
    Add {
        /// City name as understood by the provider.
        name: String,
    },

    /// Stop tracking a city.
    Remove { id: CityId },

    /// Fetch fresh conditions for one tracked city.
    Refresh { id: CityId },

    /// Suggest city names matching a query.
    Search { query: String },

    /// Show the hourly forecast for a city.
    Forecast {
        name: String,

        /// Only show entries for today (local time).
        #[arg(long)]
        today: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let store = self.store;

        match self.command {
            Command::Configure => configure(),
            Command::List { filter } => {
                let sync = open_dashboard(store).await?;
                let cities = match filter.as_deref() {
                    Some(query) => sync.filter_cities(query),
                    None => sync.cities(),
                };

                if cities.is_empty() {
                    println!("Cities not found");
                }
                for city in &cities {
                    println!("{}", format_city(city));
                }
                Ok(())
            }
            Command::Add { name } => {
                let sync = open_dashboard(store).await?;
                let city = sync.add_by_name(&name).await.map_err(user_error)?;
                println!("Tracking {}", format_city(&city));
                Ok(())
            }
            Command::Remove { id } => {
                let sync = open_dashboard(store).await?;
                match sync.delete_city(id) {
                    Some(city) => println!("Removed {} (#{})", city.name, city.id),
                    None => println!("No tracked city with id {id}"),
                }
                Ok(())
            }
            Command::Refresh { id } => {
                let sync = open_dashboard(store).await?;
                match sync.refresh_city(id).await.map_err(user_error)? {
                    Some(city) => println!("{}", format_city(&city)),
                    None => println!("No tracked city with id {id}"),
                }
                Ok(())
            }
            Command::Search { query } => search(load_provider()?.as_ref(), &query).await,
            Command::Forecast { name, today } => {
                forecast(load_provider()?.as_ref(), &name, today).await
            }
        }
    }
}

fn load_provider() -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let config = Config::load()?.with_env_overrides();
    Ok(Arc::from(provider_from_config(&config)?))
}

/// Open the store and resolve every tracked city, so mutations start from the full list.
async fn open_dashboard(store: Option<PathBuf>) -> anyhow::Result<CitySynchronizer<FileStore>> {
    let path = match store {
        Some(path) => path,
        None => Config::store_file_path()?,
    };

    let sync = CitySynchronizer::new(load_provider()?, FileStore::open(path)?);
    sync.initialize().await;
    Ok(sync)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_url = inquire::Text::new("API base URL:")
        .with_default(config.api_url())
        .prompt()
        .context("Failed to read API base URL")?;

    config.api_key = Some(api_key.trim().to_string());
    config.api_url = Some(api_url.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn search(provider: &dyn WeatherProvider, query: &str) -> anyhow::Result<()> {
    if !is_searchable(query) {
        bail!("Type at least two characters to search");
    }

    let suggestions = provider.search_cities(query.trim()).await.map_err(user_error)?;
    if suggestions.is_empty() {
        println!("No matching cities");
    }
    for suggestion in suggestions {
        println!("{suggestion}");
    }

    Ok(())
}

async fn forecast(provider: &dyn WeatherProvider, name: &str, today: bool) -> anyhow::Result<()> {
    let mut points = provider.hourly_forecast(name).await.map_err(user_error)?;
    if today {
        points = points_on_day(&points, Local::now().date_naive(), &Local);
    }

    if points.is_empty() {
        println!("No forecast entries");
    }
    for point in &points {
        println!("{}", format_point(point));
    }

    Ok(())
}

fn user_error(err: WeatherError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

fn format_city(city: &City) -> String {
    format!(
        "#{} {}: {}°C, {}, humidity {}%, wind {:.1} m/s, pressure {} hPa",
        city.id, city.name, city.temp, city.condition, city.humidity, city.wind_speed, city.pressure
    )
}

fn format_point(point: &ForecastPoint) -> String {
    let local = point.time.with_timezone(&Local);
    format!(
        "{}  {:>5.1}°C  {}",
        local.format("%Y-%m-%d %H:00"),
        point.temp,
        point.description
    )
}
