use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    evaluator::{
        AttendanceStatus, Evaluation, MonthlySummary, count_unresolved, display_or_dash, evaluate,
        time::format_time,
    },
    model::{
        attendance::{AttendanceRecord, ManualStatus},
        shift::Shift,
    },
    utils::{
        calendar::Month,
        clock::BusinessClock,
        records::{self, CalendarDay, StaffName},
    },
};

/// One evaluated `(staff, date)` cell of the attendance tables.
#[derive(Debug, Serialize, ToSchema)]
pub struct EvaluatedDay {
    pub status: AttendanceStatus,
    #[schema(example = "遅刻", value_type = String)]
    pub status_label: &'static str,
    #[schema(example = "09:00:00", nullable = true)]
    pub shift_start: Option<String>,
    #[schema(example = "18:00:00", nullable = true)]
    pub shift_end: Option<String>,
    #[schema(example = "10:35:00", nullable = true)]
    pub clock_in: Option<String>,
    #[schema(example = "18:10:00", nullable = true)]
    pub clock_out: Option<String>,
    pub manual_status: ManualStatus,
    #[schema(example = 95, nullable = true)]
    pub late_minutes: Option<u32>,
    #[schema(example = "1時間35分")]
    pub late_display: String,
    #[schema(example = 7500, nullable = true)]
    pub daily_pay: Option<u64>,
    #[schema(example = "7500")]
    pub daily_pay_display: String,
}

impl EvaluatedDay {
    pub fn new(shift: Option<&Shift>, record: Option<&AttendanceRecord>) -> Self {
        Self::from_evaluation(evaluate(shift, record), shift, record)
    }

    /// Renders an evaluation already computed for `shift` and `record`.
    pub fn from_evaluation(
        evaluation: Evaluation,
        shift: Option<&Shift>,
        record: Option<&AttendanceRecord>,
    ) -> Self {
        Self {
            status: evaluation.status,
            status_label: evaluation.status.label(),
            shift_start: shift.and_then(|s| s.start_time).map(format_time),
            shift_end: shift.and_then(|s| s.end_time).map(format_time),
            clock_in: record.and_then(|r| r.clock_in).map(format_time),
            clock_out: record.and_then(|r| r.clock_out).map(format_time),
            manual_status: record.map(|r| r.manual_status).unwrap_or_default(),
            late_minutes: evaluation.late.map(|l| l.minutes()),
            late_display: display_or_dash(evaluation.late),
            daily_pay: evaluation.daily_pay,
            daily_pay_display: display_or_dash(evaluation.daily_pay),
        }
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DateQuery {
    /// Defaults to today in the business timezone
    #[schema(example = "2026-10-19", value_type = String, format = "date")]
    pub date: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct DailyRow {
    pub staff: StaffName,
    #[serde(flatten)]
    pub day: EvaluatedDay,
}

#[derive(Serialize, ToSchema)]
pub struct DailyReportResponse {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub rows: Vec<DailyRow>,
    #[schema(example = 2)]
    pub unresolved_count: usize,
}

/// Attendance of every active staff member on one date
#[utoipa::path(
    get,
    path = "/api/attendance/daily",
    params(DateQuery),
    responses(
        (status = 200, body = DailyReportResponse),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn daily_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<BusinessClock>,
    query: web::Query<DateQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let date = query.date.unwrap_or_else(|| clock.today());

    let days = records::day_for_all_staff(pool.get_ref(), date)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, %date, "Failed to load daily attendance");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let unresolved_count = count_unresolved(
        days.iter()
            .filter_map(|d| d.record.as_ref().map(|r| (d.shift.as_ref(), r))),
    );

    let rows = days
        .iter()
        .map(|d| DailyRow {
            staff: d.staff.clone(),
            day: EvaluatedDay::new(d.shift.as_ref(), d.record.as_ref()),
        })
        .collect();

    Ok(HttpResponse::Ok().json(DailyReportResponse {
        date,
        rows,
        unresolved_count,
    }))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthlyQuery {
    /// Defaults to the caller
    #[schema(example = 1)]
    pub staff_id: Option<u64>,
    /// `YYYY-MM`, defaults to the current month
    #[schema(example = "2026-10")]
    pub month: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MonthlyRow {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub day: EvaluatedDay,
}

#[derive(Serialize, ToSchema)]
pub struct MonthlyReportResponse {
    pub staff_id: u64,
    #[schema(example = "2026-10")]
    pub month: String,
    pub days: Vec<MonthlyRow>,
    pub summary: MonthlySummary,
}

/// Resolves the month a query asks for, falling back to the one holding `today`.
pub fn requested_month(raw: Option<&str>, today: NaiveDate) -> actix_web::Result<Month> {
    match raw {
        Some(raw) => {
            Month::parse(raw).map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))
        }
        None => Ok(Month::containing(today)),
    }
}

/// Evaluates each calendar day once and totals the results.
pub fn month_rows(calendar: &[CalendarDay]) -> (Vec<MonthlyRow>, MonthlySummary) {
    let evaluations: Vec<Evaluation> = calendar
        .iter()
        .map(|d| evaluate(d.shift.as_ref(), d.record.as_ref()))
        .collect();
    let summary = MonthlySummary::from_days(&evaluations);

    let rows = calendar
        .iter()
        .zip(evaluations)
        .map(|(d, evaluation)| MonthlyRow {
            date: d.date,
            day: EvaluatedDay::from_evaluation(evaluation, d.shift.as_ref(), d.record.as_ref()),
        })
        .collect();

    (rows, summary)
}

/// Every day of a month for one staff member, with totals
#[utoipa::path(
    get,
    path = "/api/attendance/monthly",
    params(MonthlyQuery),
    responses(
        (status = 200, body = MonthlyReportResponse),
        (status = 400, description = "Malformed month"),
        (status = 401),
        (status = 403, description = "Staff asking for someone else's month")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn monthly_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<BusinessClock>,
    query: web::Query<MonthlyQuery>,
) -> actix_web::Result<impl Responder> {
    let staff_id = query.staff_id.unwrap_or(auth.staff_id);
    auth.require_self_or_admin(staff_id)?;

    let month = requested_month(query.month.as_deref(), clock.today())?;
    let (from, to) = (month.first_day(), month.last_day());

    let db_error = |e: sqlx::Error| {
        tracing::error!(error = %e, staff_id, %month, "Failed to load monthly attendance");
        ErrorInternalServerError("Internal Server Error")
    };

    let shifts = records::shifts_between(pool.get_ref(), staff_id, from, to)
        .await
        .map_err(db_error)?;
    let attendance = records::records_between(pool.get_ref(), staff_id, from, to)
        .await
        .map_err(db_error)?;

    let calendar = records::assemble_calendar(month.days(), shifts, attendance);

    let (days, summary) = month_rows(&calendar);

    Ok(HttpResponse::Ok().json(MonthlyReportResponse {
        staff_id,
        month: month.to_string(),
        days,
        summary,
    }))
}
