use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};

/// Wall clock of the business timezone. Clock-in/out stamps and "today" are
/// resolved here rather than by the database server.
#[derive(Debug, Clone, Copy)]
pub struct BusinessClock {
    offset: FixedOffset,
}

impl BusinessClock {
    pub fn from_offset_minutes(minutes: i32) -> Result<Self> {
        FixedOffset::east_opt(minutes * 60)
            .map(|offset| Self { offset })
            .ok_or_else(|| anyhow!("UTC offset out of range: {minutes} minutes"))
    }

    pub fn today(&self) -> NaiveDate {
        self.local(Utc::now()).0
    }

    /// Current date and time of day, to whole seconds.
    pub fn now(&self) -> (NaiveDate, NaiveTime) {
        self.local(Utc::now())
    }

    fn local(&self, instant: DateTime<Utc>) -> (NaiveDate, NaiveTime) {
        let local = instant.with_timezone(&self.offset).naive_local();
        let time = local.time().with_nanosecond(0).unwrap_or(local.time());
        (local.date(), time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn converts_to_japan_time() {
        let clock = BusinessClock::from_offset_minutes(540).unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 10, 18, 23, 30, 15).unwrap();
        let (date, time) = clock.local(instant);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(time, NaiveTime::from_hms_opt(8, 30, 15).unwrap());
    }

    #[test]
    fn drops_sub_second_precision() {
        let clock = BusinessClock::from_offset_minutes(0).unwrap();
        let instant = Utc.timestamp_millis_opt(1_000_999).unwrap();
        assert_eq!(clock.local(instant).1.nanosecond(), 0);
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        assert!(BusinessClock::from_offset_minutes(24 * 60).is_err());
    }
}
