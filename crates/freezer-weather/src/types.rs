use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Samples in the display horizon: 24 hours of 3-hour buckets, inclusive of both ends.
pub const DISPLAY_SAMPLE_COUNT: usize = 9;

/// Measurement system requested from the provider.
///
/// The alert thresholds are calibrated for `Imperial`; `Metric` exists for
/// the foreground display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

impl Units {
    /// Value of the `units` query parameter
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Imperial => "imperial",
            Self::Metric => "metric",
        }
    }

    /// Freezing point of water in this unit system
    pub fn freezing_point(&self) -> f64 {
        match self {
            Self::Imperial => 32.0,
            Self::Metric => 0.0,
        }
    }

    /// Temperature suffix for display
    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Self::Imperial => "°F",
            Self::Metric => "°C",
        }
    }
}

/// One forecast data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    /// Probability of precipitation in `[0, 1]`
    pub precipitation_probability: f64,
    /// Rain accumulated over the 3h bucket ending at `timestamp`, in mm
    pub rain_volume_3h: Option<f64>,
    /// Snow accumulated over the 3h bucket ending at `timestamp`, in mm
    pub snow_volume_3h: Option<f64>,
    /// Short label such as "Clouds"
    pub condition_summary: String,
    /// Longer label such as "scattered clouds"
    pub description: String,
}

impl ForecastSample {
    /// Rain volume with an absent bucket read as zero
    pub fn rain_mm(&self) -> f64 {
        self.rain_volume_3h.unwrap_or(0.0)
    }

    /// Snow volume with an absent bucket read as zero
    pub fn snow_mm(&self) -> f64 {
        self.snow_volume_3h.unwrap_or(0.0)
    }
}

/// Time-ordered forecast for one place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub samples: Vec<ForecastSample>,
    pub city_name: String,
    pub country_code: String,
    pub units: Units,
}

impl ForecastSeries {
    /// "City, CC", or just the city when the provider omits the country
    pub fn location_label(&self) -> String {
        if self.country_code.is_empty() {
            self.city_name.clone()
        } else {
            format!("{}, {}", self.city_name, self.country_code)
        }
    }

    /// Earliest sample, used as "current" conditions
    pub fn current(&self) -> Option<&ForecastSample> {
        self.samples.first()
    }

    /// The next 24 hours of samples for display
    pub fn next_24_hours(&self) -> &[ForecastSample] {
        &self.samples[..self.samples.len().min(DISPLAY_SAMPLE_COUNT)]
    }

    /// Samples strictly after `start` and strictly before `end`, in order
    pub fn samples_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = &ForecastSample> + '_ {
        self.samples
            .iter()
            .filter(move |s| s.timestamp > start && s.timestamp < end)
    }

    /// True when timestamps are strictly increasing
    pub fn is_strictly_ordered(&self) -> bool {
        self.samples
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp)
    }
}
