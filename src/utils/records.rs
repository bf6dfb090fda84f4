//! Record store: shift and attendance rows keyed by staff and date.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::model::{
    attendance::{AttendanceRecord, AttendanceRow, ManualStatus},
    shift::{Shift, ShiftRow},
};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct StaffName {
    pub id: u64,
    pub name: String,
}

/// One staff member's shift and record for a date.
#[derive(Debug, Clone, PartialEq)]
pub struct StaffDay {
    pub staff: StaffName,
    pub shift: Option<Shift>,
    pub record: Option<AttendanceRecord>,
}

/// One date of a staff member's month.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub shift: Option<Shift>,
    pub record: Option<AttendanceRecord>,
}

const SHIFT_COLUMNS: &str =
    "id, staff_id, work_date, start_time, end_time, hourly_rate, location_id";
const ATTENDANCE_COLUMNS: &str =
    "id, staff_id, work_date, clock_in, clock_out, manual_status";

pub async fn get_shift(
    pool: &MySqlPool,
    staff_id: u64,
    date: NaiveDate,
) -> Result<Option<Shift>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM shifts WHERE staff_id = ? AND work_date = ?",
        SHIFT_COLUMNS
    );
    let row = sqlx::query_as::<_, ShiftRow>(&sql)
        .bind(staff_id)
        .bind(date)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Shift::from))
}

pub async fn get_record(
    pool: &MySqlPool,
    staff_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM attendance WHERE staff_id = ? AND work_date = ?",
        ATTENDANCE_COLUMNS
    );
    let row = sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(staff_id)
        .bind(date)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(AttendanceRecord::from))
}

pub async fn shifts_between(
    pool: &MySqlPool,
    staff_id: u64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Shift>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM shifts WHERE staff_id = ? AND work_date BETWEEN ? AND ? ORDER BY work_date",
        SHIFT_COLUMNS
    );
    let rows = sqlx::query_as::<_, ShiftRow>(&sql)
        .bind(staff_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Shift::from).collect())
}

pub async fn records_between(
    pool: &MySqlPool,
    staff_id: u64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM attendance WHERE staff_id = ? AND work_date BETWEEN ? AND ? ORDER BY work_date",
        ATTENDANCE_COLUMNS
    );
    let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(staff_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(AttendanceRecord::from).collect())
}

/// Shifts and records of every active staff member for one date.
pub async fn day_for_all_staff(
    pool: &MySqlPool,
    date: NaiveDate,
) -> Result<Vec<StaffDay>, sqlx::Error> {
    let staff = sqlx::query_as::<_, StaffName>(
        "SELECT id, name FROM staff WHERE is_active = TRUE ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let shift_sql = format!("SELECT {} FROM shifts WHERE work_date = ?", SHIFT_COLUMNS);
    let shifts = sqlx::query_as::<_, ShiftRow>(&shift_sql)
        .bind(date)
        .fetch_all(pool)
        .await?;

    let record_sql = format!(
        "SELECT {} FROM attendance WHERE work_date = ?",
        ATTENDANCE_COLUMNS
    );
    let records = sqlx::query_as::<_, AttendanceRow>(&record_sql)
        .bind(date)
        .fetch_all(pool)
        .await?;

    Ok(assemble_day(
        staff,
        shifts.into_iter().map(Shift::from).collect(),
        records.into_iter().map(AttendanceRecord::from).collect(),
    ))
}

/// Joins a date's shifts and records onto the staff list. Rows for staff not
/// in the list are dropped.
pub fn assemble_day(
    staff: Vec<StaffName>,
    shifts: Vec<Shift>,
    records: Vec<AttendanceRecord>,
) -> Vec<StaffDay> {
    let mut shifts: HashMap<u64, Shift> = shifts.into_iter().map(|s| (s.staff_id, s)).collect();
    let mut records: HashMap<u64, AttendanceRecord> =
        records.into_iter().map(|r| (r.staff_id, r)).collect();

    staff
        .into_iter()
        .map(|staff| StaffDay {
            shift: shifts.remove(&staff.id),
            record: records.remove(&staff.id),
            staff,
        })
        .collect()
}

/// Lays a staff member's shifts and records over the given dates.
pub fn assemble_calendar<I>(
    dates: I,
    shifts: Vec<Shift>,
    records: Vec<AttendanceRecord>,
) -> Vec<CalendarDay>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut shifts: HashMap<NaiveDate, Shift> = shifts.into_iter().map(|s| (s.date, s)).collect();
    let mut records: HashMap<NaiveDate, AttendanceRecord> =
        records.into_iter().map(|r| (r.date, r)).collect();

    dates
        .into_iter()
        .map(|date| CalendarDay {
            date,
            shift: shifts.remove(&date),
            record: records.remove(&date),
        })
        .collect()
}

/// Sets the administrator override, creating an empty record for the date
/// when none exists yet.
pub async fn set_manual_status(
    pool: &MySqlPool,
    staff_id: u64,
    date: NaiveDate,
    status: ManualStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO attendance (staff_id, work_date, manual_status)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE manual_status = VALUES(manual_status)
        "#,
    )
    .bind(staff_id)
    .bind(date)
    .bind(status.to_column())
    .execute(pool)
    .await?;
    Ok(())
}

/// Writes a resolution flag onto an existing record. Rows carrying any other
/// override (an absence) are left alone.
pub async fn set_resolution(
    pool: &MySqlPool,
    staff_id: u64,
    date: NaiveDate,
    status: ManualStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE attendance
        SET manual_status = ?
        WHERE staff_id = ?
        AND work_date = ?
        AND (manual_status IS NULL
            OR manual_status IN ('', 'resolved', 'unresolved', '対応済み', '未対応'))
        "#,
    )
    .bind(status.to_column())
    .bind(staff_id)
    .bind(date)
    .execute(pool)
    .await?;
    Ok(())
}
