//! One background evaluation cycle.
//!
//! A cycle never fails: every problem ends up as a [`CheckOutcome`] and a log
//! line, so the periodic schedule keeps going regardless.

use chrono::TimeZone;
use std::sync::Arc;

use freezer_weather::{ForecastSource, Units};

use crate::evaluate::{coldest_in_window, evaluate_freeze, evaluate_rain};
use crate::kind::AlertKind;
use crate::notify::{Notification, NotificationSink};
use crate::prefs::{self, PreferenceStore};
use crate::scheduler::Clock;

/// Collaborators shared by every check.
pub struct AlertContext<Tz: TimeZone> {
    pub source: Arc<dyn ForecastSource>,
    pub sink: Arc<dyn NotificationSink>,
    pub prefs: Arc<dyn PreferenceStore>,
    pub clock: Arc<dyn Clock>,
    /// Zone used for fire hours and windows
    pub tz: Tz,
    /// Re-read the enabled flag right before notifying
    pub recheck_before_dispatch: bool,
}

impl<Tz: TimeZone> Clone for AlertContext<Tz> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            sink: self.sink.clone(),
            prefs: self.prefs.clone(),
            clock: self.clock.clone(),
            tz: self.tz.clone(),
            recheck_before_dispatch: self.recheck_before_dispatch,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// The kind is switched off; nothing fetched
    Disabled,
    /// No coordinates stored yet; nothing fetched
    NoLocation,
    FetchFailed(String),
    /// Evaluated, condition not met
    NoAlert,
    Alerted(Notification),
    /// Condition met but the kind was disabled during the cycle
    Suppressed,
    DispatchFailed(String),
}

impl CheckOutcome {
    pub fn notified(&self) -> bool {
        matches!(self, CheckOutcome::Alerted(_))
    }
}

pub struct AlertCheck<Tz: TimeZone> {
    kind: AlertKind,
    ctx: AlertContext<Tz>,
}

impl<Tz: TimeZone> AlertCheck<Tz> {
    pub fn new(kind: AlertKind, ctx: AlertContext<Tz>) -> Self {
        Self { kind, ctx }
    }

    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    fn enabled(&self) -> bool {
        prefs::is_enabled(self.ctx.prefs.as_ref(), self.kind).unwrap_or_else(|e| {
            tracing::warn!(kind = %self.kind, "Could not read enabled flag, treating as off: {}", e);
            false
        })
    }

    /// Run one cycle: read preferences, fetch, evaluate, maybe notify.
    pub async fn run(&self) -> CheckOutcome {
        let kind = self.kind;

        if !self.enabled() {
            tracing::debug!(%kind, "Check skipped, alerts disabled");
            return CheckOutcome::Disabled;
        }

        let coords = match prefs::last_location(self.ctx.prefs.as_ref()) {
            Ok(Some(coords)) => coords,
            Ok(None) => {
                tracing::info!(%kind, "No saved location, skipping check");
                return CheckOutcome::NoLocation;
            }
            Err(e) => {
                tracing::warn!(%kind, "Could not read saved location: {}", e);
                return CheckOutcome::NoLocation;
            }
        };

        let series = match self.ctx.source.fetch_forecast(coords, Units::Imperial).await {
            Ok(series) => series,
            Err(e) => {
                if e.is_network() {
                    tracing::warn!(%kind, "Forecast fetch failed: {}", e);
                } else {
                    tracing::error!(%kind, "Forecast fetch failed: {}", e);
                }
                return CheckOutcome::FetchFailed(e.to_string());
            }
        };

        let now = self.ctx.clock.now().with_timezone(&self.ctx.tz);
        let window = kind.window().resolve(&now);

        let notification = match kind {
            AlertKind::Freeze => match evaluate_freeze(&series, &window) {
                Some(alert) => Notification::freeze(&alert),
                None => {
                    match coldest_in_window(&series, &window) {
                        Some(coldest) => tracing::debug!(
                            city = %series.city_name,
                            lowest = coldest.temperature,
                            "No freeze expected overnight"
                        ),
                        None => tracing::debug!(
                            city = %series.city_name,
                            "No forecast samples in tonight's window"
                        ),
                    }
                    return CheckOutcome::NoAlert;
                }
            },
            AlertKind::Umbrella => match evaluate_rain(&series, &window) {
                Some(alert) => Notification::umbrella(&alert),
                None => {
                    tracing::debug!(city = %series.city_name, "No rain expected this morning");
                    return CheckOutcome::NoAlert;
                }
            },
        };

        if self.ctx.recheck_before_dispatch && !self.enabled() {
            tracing::info!(%kind, "Alerts disabled during check, not notifying");
            return CheckOutcome::Suppressed;
        }

        match self.ctx.sink.notify(&notification) {
            Ok(()) => {
                tracing::info!(%kind, id = %notification.id, "Alert sent");
                CheckOutcome::Alerted(notification)
            }
            Err(e) => {
                tracing::error!(%kind, "Failed to send alert: {}", e);
                CheckOutcome::DispatchFailed(e.to_string())
            }
        }
    }
}
