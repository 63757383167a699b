//! User-initiated forecast refresh.
//!
//! Unlike the background checks, failures here are returned so the caller
//! can show a retry prompt.

use chrono::TimeZone;
use serde::Serialize;

use freezer_core::{AppError, LocationError};
use freezer_weather::{Coordinates, ForecastSample, Units};

use crate::kind::AlertKind;
use crate::prefs;
use crate::scheduler::AlertScheduler;

#[derive(Debug, Clone, Serialize)]
pub struct ForecastSummary {
    /// "City, CC"
    pub location_label: String,
    pub current_temperature: Option<f64>,
    pub description: Option<String>,
    pub units: Units,
    pub next_24_hours: Vec<ForecastSample>,
}

/// Pick coordinates: explicit request, then configured fallback, then last saved.
pub fn resolve_coordinates(
    store: &dyn prefs::PreferenceStore,
    requested: Option<Coordinates>,
    configured: Option<Coordinates>,
) -> Result<Coordinates, AppError> {
    if let Some(coords) = requested.or(configured) {
        return Ok(coords);
    }
    prefs::last_location(store)?.ok_or_else(|| LocationError::Unavailable.into())
}

/// Fetch the forecast for display, remember the location and refresh the
/// freeze schedule.
pub async fn refresh_forecast<Tz>(
    scheduler: &AlertScheduler<Tz>,
    requested: Option<Coordinates>,
    configured: Option<Coordinates>,
) -> Result<ForecastSummary, AppError>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    let ctx = scheduler.context();
    let coords = resolve_coordinates(ctx.prefs.as_ref(), requested, configured)?;

    tracing::info!(%coords, "Refreshing forecast");
    let series = ctx.source.fetch_forecast(coords, Units::Imperial).await?;

    prefs::save_location(ctx.prefs.as_ref(), coords)?;

    if prefs::is_enabled(ctx.prefs.as_ref(), AlertKind::Freeze)? {
        scheduler.arm(AlertKind::Freeze);
    }

    let current = series.current();
    Ok(ForecastSummary {
        location_label: series.location_label(),
        current_temperature: current.map(|s| s.temperature),
        description: current.map(|s| s.description.clone()),
        units: series.units,
        next_24_hours: series.next_24_hours().to_vec(),
    })
}
