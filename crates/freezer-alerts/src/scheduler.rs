//! Daily alert scheduling.
//!
//! Each [`AlertKind`] is either disabled or has exactly one periodic task
//! that first fires at the kind's local hour and then every 24 hours. The
//! stored preference decides what each fire does; the scheduler only keeps
//! timers in line with it.

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use freezer_core::StorageError;

use crate::check::{AlertCheck, AlertContext, CheckOutcome};
use crate::kind::AlertKind;
use crate::prefs;
use crate::tasks::PeriodicTasks;
use crate::window::at_local_time;

/// Time between two fires of the same check.
pub const CHECK_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckState {
    #[default]
    Disabled,
    Armed { next_fire: DateTime<Utc> },
    Firing { next_fire: DateTime<Utc> },
}

impl CheckState {
    pub fn next_fire(&self) -> Option<DateTime<Utc>> {
        match self {
            CheckState::Disabled => None,
            CheckState::Armed { next_fire } | CheckState::Firing { next_fire } => Some(*next_fire),
        }
    }
}

/// Next occurrence of `hour`:00 local time at or after `now`.
pub fn next_fire_time<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> DateTime<Tz> {
    let tz = now.timezone();
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive();

    let candidate = at_local_time(&tz, today, time);
    if *now > candidate {
        at_local_time(&tz, today + Days::new(1), time)
    } else {
        candidate
    }
}

#[derive(Debug, Default)]
struct Slot {
    state: CheckState,
    /// Bumped on every arm/disarm so stale tasks cannot overwrite state
    generation: u64,
}

type Slots = Arc<Mutex<HashMap<AlertKind, Slot>>>;

fn update_slot(slots: &Slots, kind: AlertKind, generation: u64, f: impl FnOnce(CheckState) -> CheckState) {
    let mut slots = slots.lock();
    if let Some(slot) = slots.get_mut(&kind) {
        if slot.generation == generation {
            slot.state = f(slot.state);
        }
    }
}

pub struct AlertScheduler<Tz: TimeZone> {
    tasks: PeriodicTasks,
    ctx: AlertContext<Tz>,
    slots: Slots,
}

impl<Tz> AlertScheduler<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    pub fn new(ctx: AlertContext<Tz>) -> Self {
        Self {
            tasks: PeriodicTasks::new(),
            ctx,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn context(&self) -> &AlertContext<Tz> {
        &self.ctx
    }

    pub fn state(&self, kind: AlertKind) -> CheckState {
        self.slots
            .lock()
            .get(&kind)
            .map(|slot| slot.state)
            .unwrap_or_default()
    }

    /// Schedule the daily check for `kind`, replacing any existing schedule.
    ///
    /// Returns the first fire time.
    pub fn arm(&self, kind: AlertKind) -> DateTime<Utc> {
        let now = self.ctx.clock.now();
        let next_fire =
            next_fire_time(&now.with_timezone(&self.ctx.tz), kind.fire_hour()).with_timezone(&Utc);
        let delay = (next_fire - now).to_std().unwrap_or(Duration::ZERO);

        let generation = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(kind).or_default();
            slot.generation += 1;
            slot.state = CheckState::Armed { next_fire };
            slot.generation
        };

        let slots = self.slots.clone();
        let check = Arc::new(AlertCheck::new(kind, self.ctx.clone()));

        self.tasks
            .schedule_periodic(kind.task_id(), CHECK_PERIOD, delay, move || {
                let slots = slots.clone();
                let check = check.clone();
                async move {
                    update_slot(&slots, kind, generation, |state| match state {
                        CheckState::Armed { next_fire } => CheckState::Firing { next_fire },
                        other => other,
                    });

                    let outcome = check.run().await;
                    log_outcome(kind, &outcome);

                    update_slot(&slots, kind, generation, |state| match state {
                        CheckState::Firing { next_fire } | CheckState::Armed { next_fire } => {
                            CheckState::Armed {
                                next_fire: next_fire + chrono::Duration::hours(24),
                            }
                        }
                        CheckState::Disabled => CheckState::Disabled,
                    });
                }
            });

        tracing::info!(%kind, %next_fire, "Check armed");
        next_fire
    }

    /// Cancel the schedule for `kind`. Returns whether one was pending.
    ///
    /// A cycle already in flight is allowed to finish.
    pub fn disarm(&self, kind: AlertKind) -> bool {
        let cancelled = self.tasks.cancel(kind.task_id());
        {
            let mut slots = self.slots.lock();
            let slot = slots.entry(kind).or_default();
            slot.generation += 1;
            slot.state = CheckState::Disabled;
        }
        if cancelled {
            tracing::info!(%kind, "Check disarmed");
        }
        cancelled
    }

    /// Persist the enabled flag for `kind`, then arm or disarm to match.
    pub fn set_enabled(&self, kind: AlertKind, enabled: bool) -> Result<CheckState, StorageError> {
        prefs::set_enabled(self.ctx.prefs.as_ref(), kind, enabled)?;
        if enabled {
            self.arm(kind);
        } else {
            self.disarm(kind);
        }
        Ok(self.state(kind))
    }

    /// Arm enabled kinds that have no schedule and disarm disabled ones that do.
    pub fn sync_with_preferences(&self) -> Result<(), StorageError> {
        for kind in AlertKind::ALL {
            let enabled = prefs::is_enabled(self.ctx.prefs.as_ref(), kind)?;
            let scheduled = self.tasks.is_scheduled(kind.task_id());

            if enabled && !scheduled {
                self.arm(kind);
            } else if !enabled && scheduled {
                self.disarm(kind);
            }
        }
        Ok(())
    }

    /// Run one cycle for `kind` right away, serialized with its scheduled runs.
    pub async fn run_now(&self, kind: AlertKind) -> CheckOutcome {
        let check = AlertCheck::new(kind, self.ctx.clone());
        let outcome = self.tasks.run_exclusive(kind.task_id(), check.run()).await;
        log_outcome(kind, &outcome);
        outcome
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.pending_count()
    }

    /// Stop every schedule and wait for in-flight cycles.
    pub async fn shutdown(&self) {
        self.tasks.shutdown().await;
        let mut slots = self.slots.lock();
        for slot in slots.values_mut() {
            slot.generation += 1;
            slot.state = CheckState::Disabled;
        }
    }
}

fn log_outcome(kind: AlertKind, outcome: &CheckOutcome) {
    match outcome {
        CheckOutcome::Alerted(_) => {}
        CheckOutcome::FetchFailed(_) | CheckOutcome::DispatchFailed(_) => {
            tracing::warn!(%kind, ?outcome, "Check cycle finished without evaluating");
        }
        _ => tracing::debug!(%kind, ?outcome, "Check cycle finished"),
    }
}
