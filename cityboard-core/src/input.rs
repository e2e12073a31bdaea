//! Checks applied to user input before it reaches the provider.

use crate::error::WeatherError;

/// Shortest query worth sending to the city search endpoint.
pub const MIN_SEARCH_LEN: usize = 2;

/// Trim a submitted city name, rejecting blank input.
pub fn validate_city_name(input: &str) -> Result<&str, WeatherError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(WeatherError::EmptyName);
    }
    Ok(name)
}

pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_SEARCH_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_trims_and_rejects_blank() {
        assert_eq!(validate_city_name("  Kyiv ").unwrap(), "Kyiv");
        assert!(matches!(validate_city_name("   "), Err(WeatherError::EmptyName)));
        assert!(matches!(validate_city_name(""), Err(WeatherError::EmptyName)));
    }

    #[test]
    fn search_gate_counts_characters_not_bytes() {
        assert!(!is_searchable("K"));
        assert!(!is_searchable(" K "));
        assert!(is_searchable("Ky"));
        assert!(!is_searchable("Ł"));
        assert!(is_searchable("Łó"));
    }
}
