use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::evaluator::time::parse_stored;

/// `shifts` row as stored: times are bare `HH:MM:SS` strings.
#[derive(Debug, sqlx::FromRow)]
pub struct ShiftRow {
    pub id: u64,
    pub staff_id: u64,
    pub work_date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub hourly_rate: Option<f64>,
    pub location_id: Option<u64>,
}

/// A staff member's scheduled window and pay rate for one date.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Shift {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = 1)]
    pub staff_id: u64,
    #[schema(example = "2026-10-19", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = String, nullable = true)]
    pub start_time: Option<NaiveTime>,
    #[schema(example = "18:00:00", value_type = String, nullable = true)]
    pub end_time: Option<NaiveTime>,
    #[schema(example = 1000.0, nullable = true)]
    pub hourly_rate: Option<f64>,
    #[schema(example = 3, nullable = true)]
    pub location_id: Option<u64>,
}

impl From<ShiftRow> for Shift {
    fn from(row: ShiftRow) -> Self {
        Self {
            id: row.id,
            staff_id: row.staff_id,
            date: row.work_date,
            start_time: parse_stored("start_time", row.start_time.as_deref()),
            end_time: parse_stored("end_time", row.end_time.as_deref()),
            hourly_rate: row.hourly_rate,
            location_id: row.location_id,
        }
    }
}
