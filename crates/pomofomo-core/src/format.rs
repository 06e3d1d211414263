//! Display formatting for timers and history rows.

use chrono::{DateTime, Local, TimeZone, Utc};

/// `MM:SS`, or `H:MM:SS` once an hour has passed.
pub fn format_clock(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// `25m 0s` style, used for recorded session lengths.
pub fn format_duration(secs: u64) -> String {
    format!("{}m {}s", secs / 60, secs % 60)
}

/// `3/14 9:05` in the local time zone.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    format_timestamp_in(at, &Local)
}

pub fn format_timestamp_in<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format("%-m/%-d %-H:%M").to_string()
}

/// Label of a countdown preset: seconds below one minute, minutes otherwise.
pub fn preset_label(minutes: f64) -> String {
    if minutes < 1.0 {
        format!("{}s", (minutes * 60.0).round() as u64)
    } else if minutes.fract() == 0.0 {
        format!("{} min", minutes as u64)
    } else {
        format!("{minutes} min")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(6), "00:06");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(3599), "59:59");
        assert_eq!(format_clock(3600), "1:00:00");
        assert_eq!(format_clock(3725), "1:02:05");
    }

    #[test]
    fn duration_format() {
        assert_eq!(format_duration(45), "0m 45s");
        assert_eq!(format_duration(1500), "25m 0s");
        assert_eq!(format_duration(3661), "61m 1s");
    }

    #[test]
    fn timestamp_format() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 5, 0).unwrap();
        assert_eq!(format_timestamp_in(at, &Utc), "3/14 9:05");
    }

    #[test]
    fn preset_labels() {
        assert_eq!(preset_label(0.1), "6s");
        assert_eq!(preset_label(25.0), "25 min");
        assert_eq!(preset_label(5.0), "5 min");
        assert_eq!(preset_label(1.5), "1.5 min");
    }
}
