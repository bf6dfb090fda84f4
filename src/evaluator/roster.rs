use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::status::{Lateness, lateness};
use crate::model::{
    attendance::{AttendanceRecord, ManualStatus},
    shift::Shift,
};

/// Whether an administrator has handled a late arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Unresolved,
    Resolved,
}

impl Resolution {
    /// Anything other than an explicit "resolved" counts as unresolved.
    pub fn of(status: ManualStatus) -> Self {
        match status {
            ManualStatus::Resolved => Resolution::Resolved,
            _ => Resolution::Unresolved,
        }
    }

    pub fn as_manual_status(self) -> ManualStatus {
        match self {
            Resolution::Resolved => ManualStatus::Resolved,
            Resolution::Unresolved => ManualStatus::Unresolved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LateArrival<'a> {
    pub shift: &'a Shift,
    pub record: &'a AttendanceRecord,
    pub late: Lateness,
    pub resolution: Resolution,
}

/// Late arrivals among one date's `(shift, record)` pairs, ordered by
/// clock-in. Pairs with equal clock-in keep their input order.
pub fn filter_late_arrivals<'a, I>(pairs: I) -> Vec<LateArrival<'a>>
where
    I: IntoIterator<Item = (Option<&'a Shift>, &'a AttendanceRecord)>,
{
    let mut late: Vec<LateArrival<'a>> = pairs
        .into_iter()
        .filter_map(|(shift, record)| {
            let shift = shift?;
            Some(LateArrival {
                shift,
                record,
                late: lateness(shift, record)?,
                resolution: Resolution::of(record.manual_status),
            })
        })
        .collect();

    late.sort_by_key(|entry| entry.record.clock_in);
    late
}

pub fn count_unresolved<'a, I>(pairs: I) -> usize
where
    I: IntoIterator<Item = (Option<&'a Shift>, &'a AttendanceRecord)>,
{
    LateRoster::build(pairs).unresolved_count()
}

/// The late arrivals of a date together with how many still need handling.
#[derive(Debug, Clone)]
pub struct LateRoster<'a> {
    entries: Vec<LateArrival<'a>>,
    unresolved: usize,
}

impl<'a> LateRoster<'a> {
    pub fn build<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'a Shift>, &'a AttendanceRecord)>,
    {
        let entries = filter_late_arrivals(pairs);
        let unresolved = entries
            .iter()
            .filter(|e| e.resolution == Resolution::Unresolved)
            .count();
        Self {
            entries,
            unresolved,
        }
    }

    pub fn entries(&self) -> &[LateArrival<'a>] {
        &self.entries
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved
    }
}

/// Why a resolution flag may not be written for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ResolutionRefused {
    #[display(fmt = "Day is marked absent")]
    MarkedAbsent,
    #[display(fmt = "Not a late arrival")]
    NotLate,
}

/// Only a late arrival that is not marked absent carries a resolution flag;
/// writing one anywhere else would overwrite the absence or tag a day that
/// never shows up in the roster.
pub fn check_resolvable(
    shift: Option<&Shift>,
    record: &AttendanceRecord,
) -> Result<Lateness, ResolutionRefused> {
    if record.manual_status == ManualStatus::Absent {
        return Err(ResolutionRefused::MarkedAbsent);
    }
    shift
        .and_then(|shift| lateness(shift, record))
        .ok_or(ResolutionRefused::NotLate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::test_support::{record, shift};
    use rstest::{fixture, rstest};

    struct Day {
        shifts: Vec<Option<Shift>>,
        records: Vec<AttendanceRecord>,
    }

    impl Day {
        fn pairs(&self) -> impl Iterator<Item = (Option<&Shift>, &AttendanceRecord)> {
            self.shifts.iter().map(Option::as_ref).zip(self.records.iter())
        }
    }

    fn staffed(staff_id: u64, clock_in: Option<&str>, status: ManualStatus) -> AttendanceRecord {
        let mut r = record(clock_in, None);
        r.staff_id = staff_id;
        r.manual_status = status;
        r
    }

    #[fixture]
    fn day() -> Day {
        let nine = || Some(shift("09:00", "18:00", Some(1000.0)));
        Day {
            shifts: vec![nine(), nine(), nine(), None, nine(), nine()],
            records: vec![
                staffed(1, Some("09:40"), ManualStatus::Unset),
                staffed(2, Some("08:50"), ManualStatus::Unset),
                staffed(3, Some("09:05"), ManualStatus::Resolved),
                staffed(4, Some("11:00"), ManualStatus::Unset),
                staffed(5, None, ManualStatus::Unset),
                staffed(6, Some("09:00:30"), ManualStatus::Unresolved),
            ],
        }
    }

    #[rstest]
    fn keeps_only_late_pairs_in_clock_in_order(day: Day) {
        let late = filter_late_arrivals(day.pairs());
        let ids: Vec<u64> = late.iter().map(|e| e.record.staff_id).collect();
        assert_eq!(ids, vec![6, 3, 1]);
        assert_eq!(late[0].late.minutes(), 0);
        assert_eq!(late[2].late.minutes(), 40);
    }

    #[rstest]
    fn resolution_defaults_to_unresolved(day: Day) {
        let late = filter_late_arrivals(day.pairs());
        let flags: Vec<Resolution> = late.iter().map(|e| e.resolution).collect();
        assert_eq!(
            flags,
            vec![
                Resolution::Unresolved,
                Resolution::Resolved,
                Resolution::Unresolved
            ]
        );
    }

    #[rstest]
    fn roster_carries_its_unresolved_count(day: Day) {
        let roster = LateRoster::build(day.pairs());
        assert_eq!(roster.entries().len(), 3);
        assert_eq!(roster.unresolved_count(), 2);
        assert_eq!(count_unresolved(day.pairs()), 2);
    }

    #[test]
    fn counts_unresolved_among_five_late_arrivals() {
        let s = shift("09:00", "18:00", None);
        let statuses = [
            ManualStatus::Resolved,
            ManualStatus::Unset,
            ManualStatus::Resolved,
            ManualStatus::Unresolved,
            ManualStatus::Resolved,
        ];
        let records: Vec<AttendanceRecord> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| staffed(i as u64, Some("09:30"), *status))
            .collect();

        let pairs = records.iter().map(|r| (Some(&s), r));
        assert_eq!(count_unresolved(pairs), 2);
    }

    #[test]
    fn ties_keep_input_order() {
        let s = shift("09:00", "18:00", None);
        let records = vec![
            staffed(10, Some("09:10"), ManualStatus::Unset),
            staffed(11, Some("09:10"), ManualStatus::Unset),
        ];
        let late = filter_late_arrivals(records.iter().map(|r| (Some(&s), r)));
        let ids: Vec<u64> = late.iter().map(|e| e.record.staff_id).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn empty_roster() {
        let roster = LateRoster::build(std::iter::empty());
        assert!(roster.entries().is_empty());
        assert_eq!(roster.unresolved_count(), 0);
    }

    #[rstest]
    #[case(ManualStatus::Unset, Resolution::Unresolved)]
    #[case(ManualStatus::Unresolved, Resolution::Unresolved)]
    #[case(ManualStatus::Absent, Resolution::Unresolved)]
    #[case(ManualStatus::Resolved, Resolution::Resolved)]
    fn resolution_from_manual_status(#[case] status: ManualStatus, #[case] expected: Resolution) {
        assert_eq!(Resolution::of(status), expected);
    }

    #[test]
    fn resolution_toggles_through_manual_status() {
        for resolution in [Resolution::Resolved, Resolution::Unresolved] {
            assert_eq!(Resolution::of(resolution.as_manual_status()), resolution);
        }
    }

    #[test]
    fn absent_day_cannot_be_resolved() {
        let s = shift("09:00", "18:00", None);
        let r = staffed(7, Some("10:35"), ManualStatus::Absent);
        assert_eq!(
            check_resolvable(Some(&s), &r),
            Err(ResolutionRefused::MarkedAbsent)
        );
    }

    #[rstest]
    #[case(Some("08:55"))]
    #[case(Some("09:00"))]
    #[case(None)]
    fn non_late_day_cannot_be_resolved(#[case] clock_in: Option<&str>) {
        let s = shift("09:00", "18:00", None);
        let r = staffed(7, clock_in, ManualStatus::Unset);
        assert_eq!(check_resolvable(Some(&s), &r), Err(ResolutionRefused::NotLate));
        assert_eq!(check_resolvable(None, &r), Err(ResolutionRefused::NotLate));
    }

    #[rstest]
    #[case(ManualStatus::Unset)]
    #[case(ManualStatus::Resolved)]
    #[case(ManualStatus::Unresolved)]
    fn late_day_toggles_between_flags(#[case] status: ManualStatus) {
        let s = shift("09:00", "18:00", None);
        let r = staffed(7, Some("10:35"), status);
        assert_eq!(check_resolvable(Some(&s), &r).map(Lateness::minutes), Ok(95));
    }
}
