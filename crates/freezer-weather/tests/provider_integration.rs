//! Integration tests for OpenWeatherProvider using wiremock.

use std::time::Duration;

use freezer_core::{NetworkError, WeatherError};
use freezer_weather::{Coordinates, ForecastSource, OpenWeatherProvider, Units};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forecast_item(dt: i64, temp: f64, pop: f64) -> serde_json::Value {
    serde_json::json!({
        "dt": dt,
        "main": {"temp": temp, "feels_like": temp - 3.0, "humidity": 70},
        "weather": [{"main": "Clouds", "description": "broken clouds"}],
        "pop": pop
    })
}

fn provider(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::new(
        &server.uri(),
        Some("test-key".to_string()),
        Duration::from_secs(2),
    )
    .unwrap()
}

fn duluth() -> Coordinates {
    Coordinates::new(46.7867, -92.1005).unwrap()
}

#[tokio::test]
async fn test_fetch_forecast_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "imperial"))
        .and(query_param("lat", "46.7867"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cod": "200",
            "list": [
                forecast_item(1_700_000_000, 36.0, 0.1),
                forecast_item(1_700_010_800, 29.5, 0.4),
            ],
            "city": {"name": "Duluth", "country": "US"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let series = provider(&mock_server)
        .fetch_forecast(duluth(), Units::Imperial)
        .await
        .unwrap();

    assert_eq!(series.location_label(), "Duluth, US");
    assert_eq!(series.samples.len(), 2);
    assert_eq!(series.samples[1].temperature, 29.5);
    assert_eq!(series.units, Units::Imperial);
}

#[tokio::test]
async fn test_fetch_forecast_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key."
        })))
        .mount(&mock_server)
        .await;

    let err = provider(&mock_server)
        .fetch_forecast(duluth(), Units::Imperial)
        .await
        .unwrap_err();

    match err {
        WeatherError::Network(NetworkError::ServerError { status, message }) => {
            assert_eq!(status, 401);
            assert!(message.contains("Invalid API key"));
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_forecast_invalid_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"list\": 12}"))
        .mount(&mock_server)
        .await;

    let err = provider(&mock_server)
        .fetch_forecast(duluth(), Units::Imperial)
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::InvalidResponse(_)));
    assert!(!err.is_network());
}

#[tokio::test]
async fn test_fetch_forecast_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"list": [], "city": {"name": "Slow"}}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new(
        &mock_server.uri(),
        Some("test-key".to_string()),
        Duration::from_millis(200),
    )
    .unwrap();

    let err = provider
        .fetch_forecast(duluth(), Units::Imperial)
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Network(NetworkError::Timeout)));
}

#[tokio::test]
async fn test_base_url_trailing_slash_is_tolerated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [],
            "city": {"name": "Nowhere", "country": ""}
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new(
        &format!("{}/", mock_server.uri()),
        Some("k".to_string()),
        Duration::from_secs(2),
    )
    .unwrap();

    let series = provider
        .fetch_forecast(duluth(), Units::Metric)
        .await
        .unwrap();
    assert!(series.samples.is_empty());
    assert_eq!(series.location_label(), "Nowhere");
}
