use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::{DEFAULT_API_URL, DEFAULT_SEARCH_LIMIT},
    error::WeatherError,
    model::{City, CitySuggestion, ForecastPoint},
};

use super::{WeatherProvider, dedup_suggestions, round_temp, truncate_body};

const CURRENT_PATH: &str = "data/2.5/weather";
const FORECAST_PATH: &str = "data/2.5/forecast";
const GEO_PATH: &str = "geo/1.0/direct";

/// Client for the OpenWeatherMap current, forecast and geocoding APIs.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    search_limit: u8,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_API_URL.to_string(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_search_limit(mut self, limit: u8) -> Self {
        self.search_limit = limit;
        self
    }

    /// GET `{base_url}/{path}` and decode the JSON body.
    ///
    /// `subject` names the looked-up city so a 404 can be reported as not found.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        subject: &str,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(%url, subject, "requesting OpenWeather");

        let res = self.http.get(&url).query(query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound { name: subject.to_string() });
        }
        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    id: u64,
    name: String,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    state: Option<String>,
}

impl From<OwCurrentResponse> for City {
    fn from(res: OwCurrentResponse) -> Self {
        let (condition, icon) = match res.weather.into_iter().next() {
            Some(w) => (w.description, w.icon),
            None => ("Unknown".to_string(), String::new()),
        };

        City {
            id: res.id,
            name: res.name,
            temp: round_temp(res.main.temp),
            condition,
            icon,
            humidity: res.main.humidity,
            wind_speed: res.wind.speed,
            pressure: res.main.pressure,
        }
    }
}

fn forecast_point(entry: OwForecastEntry) -> Option<ForecastPoint> {
    let Some(time) = DateTime::<Utc>::from_timestamp(entry.dt, 0) else {
        tracing::warn!(dt = entry.dt, "skipping forecast entry with out-of-range timestamp");
        return None;
    };

    let description = entry
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .unwrap_or_else(|| "Unknown".to_string());

    Some(ForecastPoint { time, temp: entry.main.temp, description })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn city_weather(&self, name: &str) -> Result<City, WeatherError> {
        let parsed: OwCurrentResponse = self
            .get_json(
                CURRENT_PATH,
                &[("q", name), ("appid", self.api_key.as_str()), ("units", "metric")],
                name,
            )
            .await?;

        Ok(parsed.into())
    }

    async fn search_cities(&self, query: &str) -> Result<Vec<CitySuggestion>, WeatherError> {
        let limit = self.search_limit.to_string();
        let parsed: Vec<OwGeoEntry> = self
            .get_json(
                GEO_PATH,
                &[("q", query), ("limit", limit.as_str()), ("appid", self.api_key.as_str())],
                query,
            )
            .await?;

        let suggestions = parsed
            .into_iter()
            .map(|e| CitySuggestion { name: e.name, region: e.state })
            .collect();

        Ok(dedup_suggestions(suggestions))
    }

    async fn hourly_forecast(&self, name: &str) -> Result<Vec<ForecastPoint>, WeatherError> {
        let parsed: OwForecastResponse = self
            .get_json(
                FORECAST_PATH,
                &[("q", name), ("appid", self.api_key.as_str()), ("units", "metric")],
                name,
            )
            .await?;

        Ok(parsed.list.into_iter().filter_map(forecast_point).collect())
    }
}
