//! Time-of-day normalization.
//!
//! Shift windows and clock punches are bare wall-clock values in the business
//! timezone (see `UTC_OFFSET_MINUTES`). Every comparison or subtraction
//! between them goes through [`anchor`], which pins both operands to the same
//! reference date so the calendar date never takes part.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use derive_more::Display;

/// Pay rounds punches down to this increment.
pub const ROUNDING_INCREMENT_MINUTES: u32 = 15;

const STORAGE_FORMAT: &str = "%H:%M:%S";
const ACCEPTED_FORMATS: [&str; 3] = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TimeParseError {
    #[display(fmt = "time of day is empty")]
    Empty,
    #[display(fmt = "invalid time of day: {:?}", input)]
    Invalid { input: String },
}

impl std::error::Error for TimeParseError {}

/// 1970-01-01, the date every time of day is pinned to.
pub fn reference_date() -> NaiveDate {
    NaiveDate::default()
}

pub fn anchor(time: NaiveTime) -> NaiveDateTime {
    reference_date().and_time(time)
}

/// Parses `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`.
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::Empty);
    }

    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| TimeParseError::Invalid {
            input: trimmed.to_string(),
        })
}

/// Reads a stored column. Unparsable values are logged and treated as
/// missing so one bad row never aborts evaluation of the others.
pub fn parse_stored(column: &'static str, value: Option<&str>) -> Option<NaiveTime> {
    let raw = value?;
    match parse_time_of_day(raw) {
        Ok(t) => Some(t),
        Err(TimeParseError::Empty) => None,
        Err(e) => {
            tracing::warn!(column, error = %e, "Ignoring unparsable stored time");
            None
        }
    }
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(STORAGE_FORMAT).to_string()
}

/// Whole minutes from `start` to `end`, truncated toward zero.
pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    (anchor(end) - anchor(start)).num_minutes()
}

/// Floors to the previous quarter-hour boundary and drops seconds.
pub fn floor_to_increment(time: NaiveTime) -> NaiveTime {
    let excess_secs = time.num_seconds_from_midnight() % (ROUNDING_INCREMENT_MINUTES * 60);
    let excess = Duration::seconds(i64::from(excess_secs))
        + Duration::nanoseconds(i64::from(time.nanosecond()));
    let (floored, _) = time.overflowing_sub_signed(excess);
    floored
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[rstest]
    #[case("09:00", t(9, 0, 0))]
    #[case("09:00:01", t(9, 0, 1))]
    #[case(" 18:10:59 ", t(18, 10, 59))]
    #[case("07:30:15.250", NaiveTime::from_hms_milli_opt(7, 30, 15, 250).unwrap())]
    fn parses_accepted_formats(#[case] input: &str, #[case] expected: NaiveTime) {
        assert_eq!(parse_time_of_day(input), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn empty_input_is_reported_as_empty(#[case] input: &str) {
        assert_eq!(parse_time_of_day(input), Err(TimeParseError::Empty));
    }

    #[rstest]
    #[case("9am")]
    #[case("25:00")]
    #[case("2026-10-19T09:00:00")]
    fn rejects_malformed_input(#[case] input: &str) {
        assert!(matches!(
            parse_time_of_day(input),
            Err(TimeParseError::Invalid { .. })
        ));
    }

    #[test]
    fn stored_garbage_degrades_to_none() {
        assert_eq!(parse_stored("clock_in", Some("not a time")), None);
        assert_eq!(parse_stored("clock_in", Some("")), None);
        assert_eq!(parse_stored("clock_in", None), None);
        assert_eq!(parse_stored("clock_in", Some("08:55:00")), Some(t(8, 55, 0)));
    }

    #[test]
    fn anchor_pins_to_epoch_date() {
        assert_eq!(anchor(t(9, 0, 0)).date().to_string(), "1970-01-01");
    }

    #[rstest]
    #[case(t(9, 0, 0), t(10, 35, 0), 95)]
    #[case(t(9, 0, 0), t(9, 0, 59), 0)]
    #[case(t(9, 0, 0), t(9, 1, 59), 1)]
    #[case(t(10, 0, 0), t(9, 0, 0), -60)]
    fn minutes_between_truncates(#[case] a: NaiveTime, #[case] b: NaiveTime, #[case] expected: i64) {
        assert_eq!(minutes_between(a, b), expected);
    }

    #[rstest]
    #[case(t(8, 55, 0), t(8, 45, 0))]
    #[case(t(18, 10, 0), t(18, 0, 0))]
    #[case(t(9, 14, 59), t(9, 0, 0))]
    #[case(t(9, 15, 0), t(9, 15, 0))]
    #[case(t(0, 7, 30), t(0, 0, 0))]
    #[case(t(23, 59, 59), t(23, 45, 0))]
    fn floors_to_quarter_hour(#[case] input: NaiveTime, #[case] expected: NaiveTime) {
        assert_eq!(floor_to_increment(input), expected);
    }

    #[test]
    fn floor_drops_sub_second_part() {
        let input = NaiveTime::from_hms_milli_opt(12, 30, 0, 999).unwrap();
        assert_eq!(floor_to_increment(input), t(12, 30, 0));
    }

    #[test]
    fn formats_for_storage() {
        assert_eq!(format_time(t(7, 5, 0)), "07:05:00");
    }
}
