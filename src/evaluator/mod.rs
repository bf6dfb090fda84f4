//! Attendance evaluation: status, lateness and daily pay for one staff member
//! on one date, plus the per-date late roster.
//!
//! Everything here is a pure function of the shift and attendance record
//! passed in. Nothing reads the clock or the database.

pub mod pay;
pub mod roster;
pub mod status;
pub mod summary;
pub mod time;

use crate::model::{attendance::AttendanceRecord, shift::Shift};

pub use pay::compute_daily_pay;
pub use roster::{
    LateRoster, Resolution, ResolutionRefused, check_resolvable, count_unresolved,
    filter_late_arrivals,
};
pub use status::{AttendanceStatus, Lateness, StatusOutcome, derive_status};
pub use summary::MonthlySummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub status: AttendanceStatus,
    pub late: Option<Lateness>,
    pub daily_pay: Option<u64>,
}

pub fn evaluate(shift: Option<&Shift>, record: Option<&AttendanceRecord>) -> Evaluation {
    let StatusOutcome { status, late } = derive_status(shift, record);
    Evaluation {
        status,
        late,
        daily_pay: compute_daily_pay(shift, record),
    }
}

/// Renders an optional value the way the attendance tables do, with "—"
/// standing in for anything undefined.
pub fn display_or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "—".to_string(), |v| v.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use super::time::parse_time_of_day;
    use crate::model::{
        attendance::{AttendanceRecord, ManualStatus},
        shift::Shift,
    };

    pub fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    pub fn shift(start: &str, end: &str, hourly_rate: Option<f64>) -> Shift {
        Shift {
            id: 1,
            staff_id: 1,
            date: test_date(),
            start_time: Some(parse_time_of_day(start).unwrap()),
            end_time: Some(parse_time_of_day(end).unwrap()),
            hourly_rate,
            location_id: None,
        }
    }

    pub fn record(clock_in: Option<&str>, clock_out: Option<&str>) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            staff_id: 1,
            date: test_date(),
            clock_in: clock_in.map(|t| parse_time_of_day(t).unwrap()),
            clock_out: clock_out.map(|t| parse_time_of_day(t).unwrap()),
            manual_status: ManualStatus::Unset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{record, shift};
    use super::*;
    use crate::model::attendance::ManualStatus;

    #[test]
    fn evaluates_status_lateness_and_pay_together() {
        let s = shift("09:00", "18:00", Some(1000.0));
        let r = record(Some("09:20"), Some("18:10"));
        let evaluation = evaluate(Some(&s), Some(&r));
        assert_eq!(evaluation.status, AttendanceStatus::Late);
        assert_eq!(evaluation.late.map(Lateness::minutes), Some(20));
        assert_eq!(evaluation.daily_pay, Some(8750));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let s = shift("09:00", "18:00", Some(1000.0));
        let mut r = record(Some("10:35"), Some("17:05"));
        r.manual_status = ManualStatus::Unresolved;
        assert_eq!(evaluate(Some(&s), Some(&r)), evaluate(Some(&s), Some(&r)));
    }

    #[test]
    fn undefined_values_render_as_dash() {
        assert_eq!(display_or_dash::<u64>(None), "—");
        assert_eq!(display_or_dash(Some(9000)), "9000");
        assert_eq!(display_or_dash(Some(Lateness::from_minutes(95))), "1時間35分");
    }
}
