//! Evaluation windows.
//!
//! A window is a named local-time period ("tonight 22:00 to tomorrow 08:00")
//! resolved against "now" into an absolute interval. Once the period's end
//! has passed, the next occurrence is used instead.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};

/// A local-time period, independent of any particular day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    /// Days between the start's calendar day and the end's
    pub end_day_offset: u64,
}

/// Tonight 22:00 until tomorrow 08:00.
pub const OVERNIGHT: WindowSpec = WindowSpec {
    start_hour: 22,
    start_minute: 0,
    end_hour: 8,
    end_minute: 0,
    end_day_offset: 1,
};

/// 07:00 until 10:00 the same morning.
pub const MORNING_COMMUTE: WindowSpec = WindowSpec {
    start_hour: 7,
    start_minute: 0,
    end_hour: 10,
    end_minute: 0,
    end_day_offset: 0,
};

impl WindowSpec {
    /// Resolve against `now`.
    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Window<Tz> {
        compute_window(
            now,
            self.start_hour,
            self.start_minute,
            self.end_hour,
            self.end_minute,
            self.end_day_offset,
        )
    }
}

/// A concrete interval. Membership is exclusive at both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Window<Tz: TimeZone> {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> Window<Tz> {
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    /// Strictly after `start` and strictly before `end`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant > self.start_utc() && instant < self.end_utc()
    }

    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }
}

/// Build the window for the given local start/end times.
///
/// The start lands on `now`'s calendar day, the end `day_offset_for_end`
/// days later. If `now` is already past the end, both move one day forward.
/// An end at or before the start is pushed a day later so the interval is
/// never empty.
pub fn compute_window<Tz: TimeZone>(
    now: &DateTime<Tz>,
    start_hour: u32,
    start_minute: u32,
    end_hour: u32,
    end_minute: u32,
    day_offset_for_end: u64,
) -> Window<Tz> {
    let tz = now.timezone();
    let start_time = clock_time(start_hour, start_minute);
    let end_time = clock_time(end_hour, end_minute);

    let build = |day: NaiveDate| {
        let start = at_local_time(&tz, day, start_time);
        let mut end_day = day + Days::new(day_offset_for_end);
        let mut end = at_local_time(&tz, end_day, end_time);
        while end <= start {
            end_day = end_day + Days::new(1);
            end = at_local_time(&tz, end_day, end_time);
        }
        Window { start, end }
    };

    let today = now.date_naive();
    let window = build(today);
    if *now > window.end {
        build(today + Days::new(1))
    } else {
        window
    }
}

fn clock_time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0).unwrap_or(NaiveTime::MIN)
}

/// `day` at `time` in `tz`.
///
/// Ambiguous local times (clocks falling back) take the earlier instant;
/// times skipped by a spring-forward take the first valid instant after the gap.
pub(crate) fn at_local_time<Tz: TimeZone>(tz: &Tz, day: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = day.and_time(time);
    if let Some(resolved) = tz.from_local_datetime(&naive).earliest() {
        return resolved;
    }
    let shifted = naive + chrono::Duration::hours(1);
    tz.from_local_datetime(&shifted)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}
