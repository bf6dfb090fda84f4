use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::evaluator::time::parse_stored;

/// Administrator override kept beside the raw punches. Older rows carry the
/// Japanese labels, which still parse.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum ManualStatus {
    #[default]
    #[strum(to_string = "unset")]
    Unset,
    #[strum(to_string = "absent", serialize = "欠勤")]
    Absent,
    #[strum(to_string = "resolved", serialize = "対応済み")]
    Resolved,
    #[strum(to_string = "unresolved", serialize = "未対応")]
    Unresolved,
}

impl ManualStatus {
    pub fn from_column(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => ManualStatus::Unset,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = raw, "Unknown manual status, treating as unset");
                ManualStatus::Unset
            }),
        }
    }

    pub fn to_column(self) -> Option<String> {
        match self {
            ManualStatus::Unset => None,
            other => Some(other.to_string()),
        }
    }
}

/// `attendance` row as stored.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: u64,
    pub staff_id: u64,
    pub work_date: NaiveDate,
    pub clock_in: Option<String>,
    pub clock_out: Option<String>,
    pub manual_status: Option<String>,
}

/// Observed punches for one staff member on one date.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub staff_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "08:55:00", value_type = String, nullable = true)]
    pub clock_in: Option<NaiveTime>,
    #[schema(example = "18:10:00", value_type = String, nullable = true)]
    pub clock_out: Option<NaiveTime>,
    pub manual_status: ManualStatus,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        Self {
            id: row.id,
            staff_id: row.staff_id,
            date: row.work_date,
            clock_in: parse_stored("clock_in", row.clock_in.as_deref()),
            clock_out: parse_stored("clock_out", row.clock_out.as_deref()),
            manual_status: ManualStatus::from_column(row.manual_status.as_deref()),
        }
    }
}
