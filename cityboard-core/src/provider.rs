use crate::{
    Config,
    error::WeatherError,
    model::{City, CitySuggestion, ForecastPoint},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{collections::HashSet, fmt::Debug};

pub mod openweather;

/// Remote source of weather data. Implementations normalize provider payloads
/// into the crate's model types before returning.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city name. Fails with [`WeatherError::NotFound`]
    /// when the provider has no match.
    async fn city_weather(&self, name: &str) -> Result<City, WeatherError>;

    /// Autocomplete suggestions, de-duplicated by `(name, region)`.
    async fn search_cities(&self, query: &str) -> Result<Vec<CitySuggestion>, WeatherError>;

    /// Hourly forecast in the provider's chronological order.
    async fn hourly_forecast(&self, name: &str) -> Result<Vec<ForecastPoint>, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;

    let provider = OpenWeatherProvider::new(api_key.to_owned())
        .with_base_url(config.api_url())
        .with_search_limit(config.search_limit());

    Ok(Box::new(provider))
}

/// Drop repeated `(name, region)` pairs, keeping the first occurrence.
pub fn dedup_suggestions(suggestions: Vec<CitySuggestion>) -> Vec<CitySuggestion> {
    let mut seen = HashSet::new();
    suggestions
        .into_iter()
        .filter(|s| seen.insert((s.name.clone(), s.region.clone())))
        .collect()
}

/// Round half-up toward positive infinity, so 20.5 becomes 21 and -2.5 becomes -2.
pub(crate) fn round_temp(celsius: f64) -> i32 {
    (celsius + 0.5).floor() as i32
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let head: String = body.chars().take(MAX).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}
