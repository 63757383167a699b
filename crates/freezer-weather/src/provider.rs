//! OpenWeatherMap 5 day / 3 hour forecast client.

use crate::location::Coordinates;
use crate::types::{ForecastSample, ForecastSeries, Units};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use freezer_core::{NetworkError, ReqwestErrorExt, WeatherConfig, WeatherError};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = concat!("freezer/", env!("CARGO_PKG_VERSION"));

/// Anything that can produce a forecast for a pair of coordinates.
///
/// Both background checks and the foreground refresh go through this, so
/// tests can swap in a canned series.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_forecast(
        &self,
        coords: Coordinates,
        units: Units,
    ) -> Result<ForecastSeries, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
    city: OwmCity,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmWeather>,
    #[serde(default)]
    pop: f64,
    rain: Option<OwmVolume>,
    snow: Option<OwmVolume>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmVolume {
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmCity {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Self::new(
            &config.api_base_url,
            config.effective_api_key(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn forecast_url(&self) -> String {
        format!("{}/forecast", self.base_url)
    }
}

#[async_trait]
impl ForecastSource for OpenWeatherProvider {
    async fn fetch_forecast(
        &self,
        coords: Coordinates,
        units: Units,
    ) -> Result<ForecastSeries, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;

        tracing::debug!(lat = coords.lat, lon = coords.lon, units = units.as_query(), "Fetching forecast");

        let response = self
            .client
            .get(self.forecast_url())
            .query(&[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", units.as_query().to_string()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NetworkError::ServerError {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let series = parse_forecast(&body, units)?;
        tracing::info!(
            city = %series.city_name,
            samples = series.samples.len(),
            "Fetched forecast"
        );
        Ok(series)
    }
}

/// Decode an OpenWeatherMap forecast body into the normalized model.
pub fn parse_forecast(body: &str, units: Units) -> Result<ForecastSeries, WeatherError> {
    let raw: OwmForecastResponse = serde_json::from_str(body)
        .map_err(|e| WeatherError::invalid(format!("undecodable forecast: {}", e)))?;

    let samples = raw
        .list
        .into_iter()
        .map(to_sample)
        .collect::<Result<Vec<_>, _>>()?;

    let series = ForecastSeries {
        samples,
        city_name: raw.city.name,
        country_code: raw.city.country,
        units,
    };

    if !series.is_strictly_ordered() {
        return Err(WeatherError::invalid(
            "forecast timestamps are not strictly increasing",
        ));
    }

    Ok(series)
}

fn to_sample(item: OwmForecastItem) -> Result<ForecastSample, WeatherError> {
    let timestamp = Utc
        .timestamp_opt(item.dt, 0)
        .single()
        .ok_or_else(|| WeatherError::invalid(format!("timestamp out of range: {}", item.dt)))?;

    let (condition_summary, description) = item
        .weather
        .into_iter()
        .next()
        .map(|w| (w.main, w.description))
        .unwrap_or_default();

    Ok(ForecastSample {
        timestamp,
        temperature: item.main.temp,
        feels_like: item.main.feels_like.unwrap_or(item.main.temp),
        humidity: item.main.humidity,
        precipitation_probability: item.pop.clamp(0.0, 1.0),
        rain_volume_3h: item.rain.and_then(|v| v.three_hour),
        snow_volume_3h: item.snow.and_then(|v| v.three_hour),
        condition_summary,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "cod": "200",
        "list": [
            {
                "dt": 1700000000,
                "main": {"temp": 35.6, "feels_like": 30.1, "humidity": 80},
                "weather": [{"main": "Clouds", "description": "overcast clouds"}],
                "pop": 0.25,
                "dt_txt": "2023-11-14 22:13:20"
            },
            {
                "dt": 1700010800,
                "main": {"temp": 31.2, "humidity": 85},
                "weather": [{"main": "Snow", "description": "light snow"}],
                "pop": 0.6,
                "rain": {"3h": 0.2},
                "snow": {"3h": 1.4}
            }
        ],
        "city": {"name": "Duluth", "country": "US"}
    }"#;

    #[test]
    fn test_parse_forecast_maps_fields() {
        let series = parse_forecast(BODY, Units::Imperial).unwrap();
        assert_eq!(series.city_name, "Duluth");
        assert_eq!(series.country_code, "US");
        assert_eq!(series.samples.len(), 2);

        let first = &series.samples[0];
        assert_eq!(first.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(first.condition_summary, "Clouds");
        assert_eq!(first.rain_volume_3h, None);
        assert_eq!(first.precipitation_probability, 0.25);

        let second = &series.samples[1];
        assert_eq!(second.feels_like, 31.2);
        assert_eq!(second.rain_volume_3h, Some(0.2));
        assert_eq!(second.snow_volume_3h, Some(1.4));
    }

    #[test]
    fn test_parse_forecast_rejects_garbage() {
        let err = parse_forecast("<html>", Units::Imperial).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_forecast_rejects_unordered_series() {
        let body = r#"{
            "list": [
                {"dt": 2000, "main": {"temp": 1.0}},
                {"dt": 1000, "main": {"temp": 2.0}}
            ],
            "city": {"name": "X"}
        }"#;
        let err = parse_forecast(body, Units::Imperial).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn test_missing_weather_entry_gives_empty_summary() {
        let body = r#"{"list": [{"dt": 1000, "main": {"temp": 1.0}}], "city": {"name": "X"}}"#;
        let series = parse_forecast(body, Units::Metric).unwrap();
        assert_eq!(series.samples[0].condition_summary, "");
        assert_eq!(series.units, Units::Metric);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let provider =
            OpenWeatherProvider::new("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap();
        let coords = Coordinates::new(46.78, -92.1).unwrap();
        let err = provider.fetch_forecast(coords, Units::Imperial).await.unwrap_err();
        assert!(matches!(err, WeatherError::MissingApiKey));
    }
}
