use super::time::{anchor, floor_to_increment, minutes_between};
use crate::model::{attendance::AttendanceRecord, shift::Shift};

/// Daily pay in whole currency units.
///
/// Punches are floored to the quarter hour and clamped to the shift window,
/// so early arrival and late departure are not paid and partial increments
/// are dropped. The amount itself is truncated. Any missing input (shift,
/// window bounds, positive rate, either punch) or an empty effective window
/// yields `None`.
pub fn compute_daily_pay(shift: Option<&Shift>, record: Option<&AttendanceRecord>) -> Option<u64> {
    let shift = shift?;
    let record = record?;

    let rate = shift.hourly_rate.filter(|r| r.is_finite() && *r > 0.0)?;
    let (shift_start, shift_end) = (shift.start_time?, shift.end_time?);
    let (clock_in, clock_out) = (record.clock_in?, record.clock_out?);

    let start = floor_to_increment(clock_in).max(shift_start);
    let end = floor_to_increment(clock_out).min(shift_end);
    if anchor(end) <= anchor(start) {
        return None;
    }

    let worked_minutes = minutes_between(start, end) as f64;
    // Multiply before dividing so whole hours stay exact in binary floats.
    Some((worked_minutes * rate / 60.0).floor() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::test_support::{record, shift};
    use crate::model::attendance::ManualStatus;
    use rstest::rstest;

    #[test]
    fn rounds_and_clamps_to_the_shift_window() {
        let s = shift("09:00", "18:00", Some(1000.0));
        let r = record(Some("08:55"), Some("18:10"));
        assert_eq!(compute_daily_pay(Some(&s), Some(&r)), Some(9000));
    }

    #[rstest]
    // late arrival: 09:20 floors to 09:15
    #[case("09:20", "18:00", Some(8750))]
    // early leave: 17:44 floors to 17:30
    #[case("09:00", "17:44", Some(8500))]
    // partial hour: 09:00..09:20 floors to 15 minutes
    #[case("09:00", "09:20", Some(250))]
    #[case("09:00", "09:14", None)]
    #[case("07:00", "08:30", None)]
    #[case("18:30", "19:00", None)]
    #[case("12:00", "11:00", None)]
    fn pay_cases(#[case] clock_in: &str, #[case] clock_out: &str, #[case] expected: Option<u64>) {
        let s = shift("09:00", "18:00", Some(1000.0));
        let r = record(Some(clock_in), Some(clock_out));
        assert_eq!(compute_daily_pay(Some(&s), Some(&r)), expected);
    }

    #[test]
    fn fractional_amounts_are_truncated() {
        // 45 minutes at 1111/h = 833.25
        let s = shift("09:00", "18:00", Some(1111.0));
        let r = record(Some("09:00"), Some("09:45"));
        assert_eq!(compute_daily_pay(Some(&s), Some(&r)), Some(833));
    }

    #[test]
    fn third_of_an_hour_is_exact() {
        // 20 minutes only happen when the shift bound is off the grid
        let s = shift("09:10", "18:00", Some(1200.0));
        let r = record(Some("09:00"), Some("09:30"));
        assert_eq!(compute_daily_pay(Some(&s), Some(&r)), Some(400));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(0.0))]
    #[case(Some(-500.0))]
    #[case(Some(f64::NAN))]
    fn needs_a_positive_rate(#[case] rate: Option<f64>) {
        let s = shift("09:00", "18:00", rate);
        let r = record(Some("09:00"), Some("18:00"));
        assert_eq!(compute_daily_pay(Some(&s), Some(&r)), None);
    }

    #[test]
    fn needs_both_punches() {
        let s = shift("09:00", "18:00", Some(1000.0));
        assert_eq!(compute_daily_pay(Some(&s), Some(&record(Some("09:00"), None))), None);
        assert_eq!(compute_daily_pay(Some(&s), Some(&record(None, Some("18:00")))), None);
        assert_eq!(compute_daily_pay(Some(&s), None), None);
    }

    #[test]
    fn needs_a_shift() {
        let r = record(Some("09:00"), Some("18:00"));
        assert_eq!(compute_daily_pay(None, Some(&r)), None);
    }

    #[test]
    fn needs_both_shift_bounds() {
        let mut s = shift("09:00", "18:00", Some(1000.0));
        s.end_time = None;
        let r = record(Some("09:00"), Some("18:00"));
        assert_eq!(compute_daily_pay(Some(&s), Some(&r)), None);
    }

    #[test]
    fn manual_status_does_not_affect_pay() {
        let s = shift("09:00", "18:00", Some(1000.0));
        let mut r = record(Some("09:00"), Some("10:00"));
        r.manual_status = ManualStatus::Resolved;
        assert_eq!(compute_daily_pay(Some(&s), Some(&r)), Some(1000));
    }
}
