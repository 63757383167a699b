use serde::{Deserialize, Serialize};

use crate::notify::{Channel, Importance};
use crate::window::{WindowSpec, MORNING_COMMUTE, OVERNIGHT};

/// The two independent alert checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Freeze,
    Umbrella,
}

impl AlertKind {
    pub const ALL: [AlertKind; 2] = [AlertKind::Freeze, AlertKind::Umbrella];

    /// Identifier of the periodic task that runs this check
    pub fn task_id(&self) -> &'static str {
        match self {
            Self::Freeze => "dailyEveningFreezeCheck",
            Self::Umbrella => "morningUmbrellaCheck",
        }
    }

    /// Local hour of day at which the check fires
    pub fn fire_hour(&self) -> u32 {
        match self {
            Self::Freeze => 18,
            Self::Umbrella => 7,
        }
    }

    /// Preference key holding the enabled flag
    pub fn enabled_key(&self) -> &'static str {
        match self {
            Self::Freeze => "freeze_alerts_enabled",
            Self::Umbrella => "umbrella_alerts_enabled",
        }
    }

    /// Period the check evaluates
    pub fn window(&self) -> WindowSpec {
        match self {
            Self::Freeze => OVERNIGHT,
            Self::Umbrella => MORNING_COMMUTE,
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Self::Freeze => Channel {
                id: "freeze_alerts",
                name: "Freeze Alerts",
                description: "Alerts for freezing temperatures overnight",
                importance: Importance::High,
            },
            Self::Umbrella => Channel {
                id: "umbrella_alerts",
                name: "Umbrella Alerts",
                description: "Alerts for rainy weather",
                importance: Importance::Default,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Freeze => "freeze",
            Self::Umbrella => "umbrella",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown alert kind '{0}' (expected 'freeze' or 'umbrella')")]
pub struct UnknownAlertKind(pub String);

impl std::str::FromStr for AlertKind {
    type Err = UnknownAlertKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "freeze" => Ok(Self::Freeze),
            "umbrella" | "rain" => Ok(Self::Umbrella),
            _ => Err(UnknownAlertKind(s.to_string())),
        }
    }
}
