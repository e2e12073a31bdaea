//! Integration tests for `OpenWeatherProvider` against a mock HTTP server.

use cityboard_core::{CitySuggestion, OpenWeatherProvider, WeatherError, WeatherProvider};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::new("TEST_KEY".to_string()).with_base_url(server.uri())
}

fn current_body(id: u64, name: &str, temp: f64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "dt": 1_760_000_000,
        "main": { "temp": temp, "feels_like": temp - 1.0, "humidity": 64, "pressure": 1013 },
        "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
        "wind": { "speed": 3.6, "deg": 120 }
    })
}

#[tokio::test]
async fn current_weather_is_normalized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Kyiv"))
        .and(query_param("appid", "TEST_KEY"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(703448, "Kyiv", 20.5)))
        .expect(1)
        .mount(&server)
        .await;

    let city = provider(&server).city_weather("Kyiv").await.unwrap();

    assert_eq!(city.id, 703448);
    assert_eq!(city.name, "Kyiv");
    assert_eq!(city.temp, 21);
    assert_eq!(city.condition, "clear sky");
    assert_eq!(city.icon, "01d");
    assert_eq!(city.humidity, 64);
    assert_eq!(city.wind_speed, 3.6);
    assert_eq!(city.pressure, 1013);
}

#[tokio::test]
async fn negative_half_degrees_round_up() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(3143244, "Oslo", -2.5)))
        .mount(&server)
        .await;

    let city = provider(&server).city_weather("Oslo").await.unwrap();

    assert_eq!(city.temp, -2);
}

#[tokio::test]
async fn unknown_city_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&server)
        .await;

    let err = provider(&server).city_weather("Atlantis").await.unwrap_err();

    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
    assert!(matches!(err, WeatherError::NotFound { ref name } if name == "Atlantis"));
}

#[tokio::test]
async fn server_error_is_reported_with_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = provider(&server).city_weather("Kyiv").await.unwrap_err();

    match &err {
        WeatherError::Status { status, body } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
    assert_eq!(err.user_message(), "An error occurred. Please try again.");
}

#[tokio::test]
async fn malformed_payload_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\": 1}"))
        .mount(&server)
        .await;

    let err = provider(&server).city_weather("Kyiv").await.unwrap_err();

    assert!(matches!(err, WeatherError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_provider_is_request_error() {
    let provider =
        OpenWeatherProvider::new("TEST_KEY".to_string()).with_base_url("http://127.0.0.1:1");
    let err = provider.city_weather("Kyiv").await.unwrap_err();

    assert!(matches!(err, WeatherError::Request(_)), "got {err:?}");
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn search_dedups_by_name_and_region() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Kyiv"))
        .and(query_param("limit", "5"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Kyiv", "lat": 50.45, "lon": 30.52, "country": "UA", "state": "UA" },
            { "name": "Kyiv", "lat": 50.45, "lon": 30.52, "country": "UA", "state": "UA" },
            { "name": "Kyiv", "lat": 41.1, "lon": -77.2, "country": "US", "state": "US" }
        ])))
        .mount(&server)
        .await;

    let suggestions = provider(&server).search_cities("Kyiv").await.unwrap();

    assert_eq!(
        suggestions,
        vec![
            CitySuggestion { name: "Kyiv".into(), region: Some("UA".into()) },
            CitySuggestion { name: "Kyiv".into(), region: Some("US".into()) },
        ]
    );
}

#[tokio::test]
async fn search_honours_configured_limit_and_missing_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Oslo", "lat": 59.9, "lon": 10.7, "country": "NO" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server).with_search_limit(2);
    let suggestions = provider.search_cities("Os").await.unwrap();

    assert_eq!(suggestions, vec![CitySuggestion { name: "Oslo".into(), region: None }]);
    assert_eq!(suggestions[0].to_string(), "Oslo");
}

#[tokio::test]
async fn hourly_forecast_keeps_provider_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("q", "Kyiv"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cod": "200",
            "list": [
                { "dt": 1_760_007_200, "main": { "temp": 14.2 }, "weather": [{ "description": "light rain" }] },
                { "dt": 1_760_000_000, "main": { "temp": 12.9 }, "weather": [{ "description": "overcast clouds" }] },
                { "dt": 1_760_018_000, "main": { "temp": 15.1 }, "weather": [] }
            ],
            "city": { "name": "Kyiv", "country": "UA" }
        })))
        .mount(&server)
        .await;

    let points = provider(&server).hourly_forecast("Kyiv").await.unwrap();

    let stamps: Vec<i64> = points.iter().map(|p| p.time.timestamp()).collect();
    assert_eq!(stamps, vec![1_760_007_200, 1_760_000_000, 1_760_018_000]);
    assert_eq!(points[0].temp, 14.2);
    assert_eq!(points[0].description, "light rain");
    assert_eq!(points[2].description, "Unknown");
}

#[tokio::test]
async fn forecast_for_unknown_city_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = provider(&server).hourly_forecast("Atlantis").await.unwrap_err();

    assert!(err.is_not_found());
}
