//! Core library for the `cityboard` weather dashboard.
//!
//! This crate defines:
//! - The tracked-city synchronizer and its persisted name list
//! - Abstraction over the weather provider, with an OpenWeatherMap client
//! - Shared domain models and the error taxonomy
//! - Configuration handling
//!
//! It is used by `cityboard-cli`, but can also back other front ends.

pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod provider;
pub mod storage;
pub mod sync;

pub use config::Config;
pub use error::WeatherError;
pub use input::{is_searchable, validate_city_name};
pub use model::{City, CityId, CitySuggestion, ForecastPoint, points_on_day};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use sync::{CitySynchronizer, DashboardState};
