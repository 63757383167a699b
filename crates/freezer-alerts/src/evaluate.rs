//! Freeze and rain decisions over a forecast window.
//!
//! Both evaluators are pure: they never fail and never log. An empty window
//! is simply "no alert".

use chrono::{DateTime, TimeZone, Utc};
use freezer_weather::{ForecastSample, ForecastSeries};
use serde::Serialize;

use crate::format::format_time_label;
use crate::window::Window;

/// Rain accumulation over a 3h bucket that counts as rain, mm (exclusive).
pub const RAIN_THRESHOLD_MM: f64 = 0.1;

/// Probability of precipitation that counts as rain, percent (exclusive).
pub const POP_THRESHOLD_PERCENT: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreezeAlert {
    pub lowest_temp: f64,
    pub city_name: String,
    /// When the low occurs
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainAlert {
    /// Local hour of the first wet sample, e.g. "7AM"
    pub time_label: String,
    pub city_name: String,
    pub at: DateTime<Utc>,
}

/// Coldest sample strictly inside `window`; the earliest one on ties.
pub fn coldest_in_window<'a, Tz: TimeZone>(
    series: &'a ForecastSeries,
    window: &Window<Tz>,
) -> Option<&'a ForecastSample> {
    series
        .samples_between(window.start_utc(), window.end_utc())
        .fold(None, |coldest: Option<&ForecastSample>, sample| match coldest {
            Some(current) if current.temperature <= sample.temperature => Some(current),
            _ => Some(sample),
        })
}

/// Alert when the coldest in-window temperature is at or below freezing.
///
/// The threshold is the freezing point of `series.units`: 32°F for the
/// imperial forecasts the checks fetch, 0°C for metric. A low exactly at the
/// threshold alerts.
pub fn evaluate_freeze<Tz: TimeZone>(
    series: &ForecastSeries,
    window: &Window<Tz>,
) -> Option<FreezeAlert> {
    let coldest = coldest_in_window(series, window)?;

    if coldest.temperature <= series.units.freezing_point() {
        Some(FreezeAlert {
            lowest_temp: coldest.temperature,
            city_name: series.city_name.clone(),
            at: coldest.timestamp,
        })
    } else {
        None
    }
}

/// True when a sample has measurable rain or a high enough chance of it.
pub fn is_wet(sample: &ForecastSample) -> bool {
    sample.rain_mm() > RAIN_THRESHOLD_MM
        || sample.precipitation_probability * 100.0 > POP_THRESHOLD_PERCENT
}

/// Alert on the first in-window sample that looks wet.
///
/// The earliest qualifying sample wins even if a later one is heavier.
pub fn evaluate_rain<Tz: TimeZone>(
    series: &ForecastSeries,
    window: &Window<Tz>,
) -> Option<RainAlert> {
    let tz = window.timezone();
    series
        .samples_between(window.start_utc(), window.end_utc())
        .find(|sample| is_wet(sample))
        .map(|sample| RainAlert {
            time_label: format_time_label(&sample.timestamp.with_timezone(&tz)),
            city_name: series.city_name.clone(),
            at: sample.timestamp,
        })
}
