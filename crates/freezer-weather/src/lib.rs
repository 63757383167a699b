//! Forecast data for Freezer
//!
//! Normalized forecast model plus the OpenWeatherMap client that fills it.

pub mod location;
pub mod provider;
pub mod types;

pub use location::Coordinates;
pub use provider::{parse_forecast, ForecastSource, OpenWeatherProvider};
pub use types::*;
