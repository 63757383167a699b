//! Freeze and umbrella alerts for Freezer
//!
//! Window selection, the two condition evaluators, and the daily scheduler
//! that drives them against a forecast source and a notification sink.

pub mod check;
pub mod evaluate;
pub mod foreground;
pub mod format;
pub mod kind;
pub mod notify;
pub mod prefs;
pub mod scheduler;
pub mod tasks;
pub mod window;

pub use check::{AlertCheck, AlertContext, CheckOutcome};
pub use evaluate::{evaluate_freeze, evaluate_rain, FreezeAlert, RainAlert};
pub use foreground::{refresh_forecast, ForecastSummary};
pub use format::format_hour_12;
pub use kind::AlertKind;
pub use notify::{Channel, Importance, Notification, NotificationSink, NotifyError, TracingSink};
pub use prefs::{MemoryPreferences, PreferenceStore, SqlitePreferences};
pub use scheduler::{next_fire_time, AlertScheduler, CheckState, Clock, SystemClock};
pub use tasks::PeriodicTasks;
pub use window::{compute_window, Window, WindowSpec};
