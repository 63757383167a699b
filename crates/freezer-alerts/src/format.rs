use chrono::{DateTime, TimeZone, Timelike};

/// Hour of day on a 12-hour clock with an AM/PM suffix and no leading zero.
///
/// `0` is "12AM" and `12` is "12PM".
pub fn format_hour_12(hour: u32) -> String {
    let hour = hour % 24;
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    let suffix = if hour < 12 { "AM" } else { "PM" };
    format!("{}{}", display, suffix)
}

/// `instant`'s local hour, formatted with [`format_hour_12`].
pub fn format_time_label<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    format_hour_12(instant.hour())
}
