//! Notification sink.
//!
//! Notifications are never deduplicated: every send carries a fresh id and
//! does not replace an earlier one.

use serde::Serialize;
use uuid::Uuid;

use crate::evaluate::{FreezeAlert, RainAlert};
use crate::kind::AlertKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Default,
    High,
}

/// Fixed display properties for one alert kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub importance: Importance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: AlertKind,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(kind: AlertKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn freeze(alert: &FreezeAlert) -> Self {
        Self::new(
            AlertKind::Freeze,
            "❄️ Freezing Alert Overnight!",
            format!(
                "Low of {:.1}°F in {}. Protect plants/pipes!",
                alert.lowest_temp, alert.city_name
            ),
        )
    }

    pub fn umbrella(alert: &RainAlert) -> Self {
        Self::new(
            AlertKind::Umbrella,
            "☔ Don't Forget Your Umbrella!",
            format!("Rain expected around {} in {}", alert.time_label, alert.city_name),
        )
    }

    pub fn channel(&self) -> Channel {
        self.kind.channel()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to deliver notification: {0}")]
    Delivery(String),
}

/// Where notifications end up.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log and to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let channel = notification.channel();
        match channel.importance {
            Importance::High => tracing::warn!(
                channel = channel.id,
                id = %notification.id,
                "{}: {}",
                notification.title,
                notification.body
            ),
            Importance::Default => tracing::info!(
                channel = channel.id,
                id = %notification.id,
                "{}: {}",
                notification.title,
                notification.body
            ),
        }
        println!("[{}] {}\n    {}", channel.name, notification.title, notification.body);
        Ok(())
    }
}
