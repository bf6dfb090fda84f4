use crate::{
    api::report::EvaluatedDay,
    auth::auth::AuthUser,
    evaluator::time::{format_time, parse_time_of_day},
    model::attendance::ManualStatus,
    utils::{clock::BusinessClock, db_utils::is_constraint_violation, records},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

fn internal_error(e: sqlx::Error, staff_id: u64, what: &'static str) -> actix_web::Error {
    tracing::error!(error = %e, staff_id, "{}", what);
    ErrorInternalServerError("Internal Server Error")
}

/// Evaluates `(staff_id, date)` as currently stored.
async fn evaluated(
    pool: &MySqlPool,
    staff_id: u64,
    date: NaiveDate,
) -> actix_web::Result<EvaluatedDay> {
    let shift = records::get_shift(pool, staff_id, date)
        .await
        .map_err(|e| internal_error(e, staff_id, "Failed to load shift"))?;
    let record = records::get_record(pool, staff_id, date)
        .await
        .map_err(|e| internal_error(e, staff_id, "Failed to load attendance"))?;

    Ok(EvaluatedDay::new(shift.as_ref(), record.as_ref()))
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    responses(
        (status = 200, description = "Clocked in successfully", body = Object, example = json!({
            "message": "Clocked in successfully", "date": "2026-10-19", "clock_in": "08:55:12"
        })),
        (status = 400, description = "Already clocked in today", body = Object, example = json!({
            "message": "Already clocked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<BusinessClock>,
) -> actix_web::Result<impl Responder> {
    let staff_id = auth.staff_id;
    let (today, now) = clock.now();
    let stamp = format_time(now);

    // An administrator may already have created the day's row (e.g. by
    // marking an absence); fill it instead of inserting.
    let filled = sqlx::query(
        r#"
        UPDATE attendance
        SET clock_in = ?
        WHERE staff_id = ?
        AND work_date = ?
        AND clock_in IS NULL
        "#,
    )
    .bind(&stamp)
    .bind(staff_id)
    .bind(today)
    .execute(pool.get_ref())
    .await
    .map_err(|e| internal_error(e, staff_id, "Clock-in failed"))?;

    if filled.rows_affected() == 0 {
        let inserted = sqlx::query(
            r#"
            INSERT INTO attendance (staff_id, work_date, clock_in)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(staff_id)
        .bind(today)
        .bind(&stamp)
        .execute(pool.get_ref())
        .await;

        match inserted {
            Ok(_) => {}
            // Duplicate clock-in for same day
            Err(e) if is_constraint_violation(&e) => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "Already clocked in today"
                })));
            }
            Err(e) => return Err(internal_error(e, staff_id, "Clock-in failed")),
        }
    }

    tracing::info!(staff_id, date = %today, clock_in = %stamp, "Clocked in");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Clocked in successfully",
        "date": today,
        "clock_in": stamp
    })))
}

/// Clock-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    responses(
        (status = 200, description = "Clocked out successfully", body = Object, example = json!({
            "message": "Clocked out successfully", "date": "2026-10-19", "clock_out": "18:10:40"
        })),
        (status = 400, description = "No active clock-in found for today", body = Object, example = json!({
            "message": "No active clock-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<BusinessClock>,
) -> actix_web::Result<impl Responder> {
    let staff_id = auth.staff_id;
    let (today, now) = clock.now();
    let stamp = format_time(now);

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET clock_out = ?
        WHERE staff_id = ?
        AND work_date = ?
        AND clock_in IS NOT NULL
        AND clock_out IS NULL
        "#,
    )
    .bind(&stamp)
    .bind(staff_id)
    .bind(today)
    .execute(pool.get_ref())
    .await
    .map_err(|e| internal_error(e, staff_id, "Clock-out failed"))?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No active clock-in found for today"
        })));
    }

    tracing::info!(staff_id, date = %today, clock_out = %stamp, "Clocked out");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Clocked out successfully",
        "date": today,
        "clock_out": stamp
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CorrectAttendance {
    /// `HH:MM` or `HH:MM:SS`; null clears the punch
    #[schema(example = "08:55", nullable = true)]
    pub clock_in: Option<String>,
    #[schema(example = "18:10", nullable = true)]
    pub clock_out: Option<String>,
}

impl CorrectAttendance {
    /// Strictly parses both punches; a malformed value is the caller's error.
    pub fn parse(&self) -> actix_web::Result<(Option<NaiveTime>, Option<NaiveTime>)> {
        let parse = |value: &Option<String>| {
            value
                .as_deref()
                .map(parse_time_of_day)
                .transpose()
                .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))
        };
        Ok((parse(&self.clock_in)?, parse(&self.clock_out)?))
    }
}

/// Backfill or correct a day's punches
#[utoipa::path(
    put,
    path = "/api/attendance/{staff_id}/{date}",
    params(
        ("staff_id", Path, description = "Staff ID"),
        ("date", Path, description = "Work date, YYYY-MM-DD")
    ),
    request_body = CorrectAttendance,
    responses(
        (status = 200, description = "Corrected day, re-evaluated", body = EvaluatedDay),
        (status = 400, description = "Malformed time"),
        (status = 404, description = "Staff not found"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn correct_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, NaiveDate)>,
    body: web::Json<CorrectAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (staff_id, date) = path.into_inner();
    let (clock_in, clock_out) = body.parse()?;

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (staff_id, work_date, clock_in, clock_out)
        VALUES (?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            clock_in = VALUES(clock_in),
            clock_out = VALUES(clock_out)
        "#,
    )
    .bind(staff_id)
    .bind(date)
    .bind(clock_in.map(format_time))
    .bind(clock_out.map(format_time))
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_constraint_violation(&e) => {
            return Ok(HttpResponse::NotFound().json(json!({ "message": "Staff not found" })));
        }
        Err(e) => return Err(internal_error(e, staff_id, "Attendance correction failed")),
    }

    tracing::info!(staff_id, %date, corrected_by = auth.staff_id, "Attendance corrected");

    Ok(HttpResponse::Ok().json(evaluated(pool.get_ref(), staff_id, date).await?))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetManualStatus {
    pub status: ManualStatus,
}

/// Set the administrator override for a day
#[utoipa::path(
    put,
    path = "/api/attendance/{staff_id}/{date}/status",
    params(
        ("staff_id", Path, description = "Staff ID"),
        ("date", Path, description = "Work date, YYYY-MM-DD")
    ),
    request_body = SetManualStatus,
    responses(
        (status = 200, description = "Day re-evaluated with the new status", body = EvaluatedDay),
        (status = 404, description = "Staff not found"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn set_manual_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, NaiveDate)>,
    body: web::Json<SetManualStatus>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (staff_id, date) = path.into_inner();

    match records::set_manual_status(pool.get_ref(), staff_id, date, body.status).await {
        Ok(()) => {}
        Err(e) if is_constraint_violation(&e) => {
            return Ok(HttpResponse::NotFound().json(json!({ "message": "Staff not found" })));
        }
        Err(e) => return Err(internal_error(e, staff_id, "Failed to set manual status")),
    }

    tracing::info!(staff_id, %date, status = %body.status, set_by = auth.staff_id, "Manual status set");

    Ok(HttpResponse::Ok().json(evaluated(pool.get_ref(), staff_id, date).await?))
}
