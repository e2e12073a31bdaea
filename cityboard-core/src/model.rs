use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Provider-assigned city identifier.
pub type CityId = u64;

/// Current conditions for a tracked city, as normalized by a provider.
///
/// A `City` is a point-in-time snapshot: refreshing replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    /// Display name; also the lookup key sent back to the provider.
    pub name: String,
    /// Degrees Celsius, rounded.
    pub temp: i32,
    pub condition: String,
    pub icon: String,
    pub humidity: u8,
    /// Metres per second.
    pub wind_speed: f64,
    /// hPa.
    pub pressure: u32,
}

/// Autocomplete entry returned by a city search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    pub region: Option<String>,
}

impl fmt::Display for CitySuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.region.as_deref() {
            Some(region) if !region.is_empty() => write!(f, "{}, {}", self.name, region),
            _ => f.write_str(&self.name),
        }
    }
}

/// One step of an hourly forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub temp: f64,
    pub description: String,
}

/// Keep the points that fall on `day` as seen from `tz`, in their original order.
pub fn points_on_day<Tz: TimeZone>(
    points: &[ForecastPoint],
    day: NaiveDate,
    tz: &Tz,
) -> Vec<ForecastPoint> {
    points
        .iter()
        .filter(|p| p.time.with_timezone(tz).date_naive() == day)
        .cloned()
        .collect()
}
