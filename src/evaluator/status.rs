use std::fmt;

use serde::{Serialize, Serializer};
use strum_macros::Display;
use utoipa::ToSchema;

use super::time::{anchor, minutes_between};
use crate::model::{
    attendance::{AttendanceRecord, ManualStatus},
    shift::Shift,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    NoShift,
    NotArrived,
    Late,
    OnTime,
    Absent,
}

impl AttendanceStatus {
    /// Label shown in the attendance tables.
    pub fn label(self) -> &'static str {
        match self {
            AttendanceStatus::NoShift => "—",
            AttendanceStatus::NotArrived => "未出勤",
            AttendanceStatus::Late => "遅刻",
            AttendanceStatus::OnTime => "出勤",
            AttendanceStatus::Absent => "欠勤",
        }
    }
}

/// Whole minutes between scheduled start and clock-in.
///
/// Displays as `1時間35分`, or `35分` under an hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Lateness(u32);

impl Lateness {
    pub fn from_minutes(minutes: u32) -> Self {
        Lateness(minutes)
    }

    pub fn minutes(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Lateness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 60;
        let minutes = self.0 % 60;
        if hours > 0 {
            write!(f, "{}時間{}分", hours, minutes)
        } else {
            write!(f, "{}分", minutes)
        }
    }
}

impl Serialize for Lateness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOutcome {
    pub status: AttendanceStatus,
    pub late: Option<Lateness>,
}

impl StatusOutcome {
    fn plain(status: AttendanceStatus) -> Self {
        Self { status, late: None }
    }
}

/// Lateness of a clock-in against a shift, if both sides are known and the
/// clock-in is strictly after the start.
pub fn lateness(shift: &Shift, record: &AttendanceRecord) -> Option<Lateness> {
    let start = shift.start_time?;
    let clock_in = record.clock_in?;
    if anchor(clock_in) <= anchor(start) {
        return None;
    }
    let minutes = u32::try_from(minutes_between(start, clock_in)).unwrap_or(u32::MAX);
    Some(Lateness::from_minutes(minutes))
}

pub fn derive_status(shift: Option<&Shift>, record: Option<&AttendanceRecord>) -> StatusOutcome {
    if record.is_some_and(|r| r.manual_status == ManualStatus::Absent) {
        return StatusOutcome::plain(AttendanceStatus::Absent);
    }

    let Some(shift) = shift else {
        return StatusOutcome::plain(AttendanceStatus::NoShift);
    };

    let Some(record) = record.filter(|r| r.clock_in.is_some()) else {
        return StatusOutcome::plain(AttendanceStatus::NotArrived);
    };

    match lateness(shift, record) {
        Some(late) => StatusOutcome {
            status: AttendanceStatus::Late,
            late: Some(late),
        },
        None => StatusOutcome::plain(AttendanceStatus::OnTime),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::test_support::{record, shift};
    use rstest::rstest;

    #[test]
    fn no_shift_ignores_punches() {
        let r = record(Some("09:05"), None);
        let outcome = derive_status(None, Some(&r));
        assert_eq!(outcome.status, AttendanceStatus::NoShift);
        assert_eq!(outcome.late, None);
    }

    #[test]
    fn missing_record_without_shift_is_no_shift() {
        assert_eq!(derive_status(None, None).status, AttendanceStatus::NoShift);
    }

    #[test]
    fn shift_without_clock_in_is_not_arrived() {
        let s = shift("09:00", "18:00", Some(1000.0));
        assert_eq!(derive_status(Some(&s), None).status, AttendanceStatus::NotArrived);

        let r = record(None, Some("18:00"));
        assert_eq!(
            derive_status(Some(&s), Some(&r)).status,
            AttendanceStatus::NotArrived
        );
    }

    #[rstest]
    #[case("08:59:59", AttendanceStatus::OnTime, None)]
    #[case("09:00:00", AttendanceStatus::OnTime, None)]
    #[case("09:00:01", AttendanceStatus::Late, Some(0))]
    #[case("09:01:59", AttendanceStatus::Late, Some(1))]
    #[case("10:35", AttendanceStatus::Late, Some(95))]
    fn late_boundary(
        #[case] clock_in: &str,
        #[case] expected: AttendanceStatus,
        #[case] minutes: Option<u32>,
    ) {
        let s = shift("09:00", "18:00", None);
        let r = record(Some(clock_in), None);
        let outcome = derive_status(Some(&s), Some(&r));
        assert_eq!(outcome.status, expected);
        assert_eq!(outcome.late.map(Lateness::minutes), minutes);
    }

    #[test]
    fn lateness_formats_hours_and_minutes() {
        let s = shift("09:00", "18:00", None);
        let r = record(Some("10:35"), None);
        let late = derive_status(Some(&s), Some(&r)).late.unwrap();
        assert_eq!(late.to_string(), "1時間35分");
    }

    #[rstest]
    #[case(0, "0分")]
    #[case(7, "7分")]
    #[case(59, "59分")]
    #[case(60, "1時間0分")]
    #[case(125, "2時間5分")]
    fn lateness_display(#[case] minutes: u32, #[case] expected: &str) {
        assert_eq!(Lateness::from_minutes(minutes).to_string(), expected);
    }

    #[test]
    fn manual_absence_overrides_lateness() {
        let s = shift("09:00", "18:00", None);
        let mut r = record(Some("10:35"), None);
        r.manual_status = ManualStatus::Absent;
        let outcome = derive_status(Some(&s), Some(&r));
        assert_eq!(outcome.status, AttendanceStatus::Absent);
        assert_eq!(outcome.late, None);
    }

    #[test]
    fn manual_absence_applies_without_shift() {
        let mut r = record(None, None);
        r.manual_status = ManualStatus::Absent;
        assert_eq!(derive_status(None, Some(&r)).status, AttendanceStatus::Absent);
    }

    #[test]
    fn resolution_flags_do_not_change_status() {
        let s = shift("09:00", "18:00", None);
        let mut r = record(Some("09:30"), None);
        r.manual_status = ManualStatus::Resolved;
        assert_eq!(derive_status(Some(&s), Some(&r)).status, AttendanceStatus::Late);
    }

    #[test]
    fn shift_without_start_time_is_on_time() {
        let mut s = shift("09:00", "18:00", None);
        s.start_time = None;
        let r = record(Some("11:00"), None);
        let outcome = derive_status(Some(&s), Some(&r));
        assert_eq!(outcome.status, AttendanceStatus::OnTime);
        assert_eq!(outcome.late, None);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(AttendanceStatus::NotArrived.to_string(), "not_arrived");
        assert_eq!(
            serde_json::to_value(AttendanceStatus::OnTime).unwrap(),
            serde_json::json!("on_time")
        );
    }
}
