use serde::Serialize;
use utoipa::ToSchema;

use super::{AttendanceStatus, Evaluation};

/// Totals over a run of evaluated days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlySummary {
    /// Days evaluated late or on time.
    pub worked_days: u32,
    pub late_days: u32,
    pub absent_days: u32,
    pub total_late_minutes: u32,
    /// Sum over days whose pay is defined.
    pub total_pay: u64,
}

impl MonthlySummary {
    pub fn from_days<'a, I>(days: I) -> Self
    where
        I: IntoIterator<Item = &'a Evaluation>,
    {
        days.into_iter().fold(Self::default(), |mut acc, day| {
            match day.status {
                AttendanceStatus::Late => {
                    acc.worked_days += 1;
                    acc.late_days += 1;
                }
                AttendanceStatus::OnTime => acc.worked_days += 1,
                AttendanceStatus::Absent => acc.absent_days += 1,
                AttendanceStatus::NoShift | AttendanceStatus::NotArrived => {}
            }
            if let Some(late) = day.late {
                acc.total_late_minutes = acc.total_late_minutes.saturating_add(late.minutes());
            }
            if let Some(pay) = day.daily_pay {
                acc.total_pay = acc.total_pay.saturating_add(pay);
            }
            acc
        })
    }
}
