use std::collections::HashMap;

use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    api::report::DateQuery,
    auth::auth::AuthUser,
    evaluator::{LateRoster, Resolution, check_resolvable, count_unresolved, time::format_time},
    utils::{
        clock::BusinessClock,
        records::{self, StaffDay, StaffName},
    },
};

#[derive(Debug, Serialize, ToSchema)]
pub struct LateEntry {
    pub staff: StaffName,
    #[schema(example = "09:00:00")]
    pub shift_start: String,
    #[schema(example = "10:35:00")]
    pub clock_in: String,
    #[schema(example = 95)]
    pub late_minutes: u32,
    #[schema(example = "1時間35分")]
    pub late_display: String,
    pub resolution: Resolution,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LateRosterResponse {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub entries: Vec<LateEntry>,
    #[schema(example = 2)]
    pub unresolved_count: usize,
}

/// Builds the roster response for one date's rows.
pub fn roster_response(date: NaiveDate, days: &[StaffDay]) -> LateRosterResponse {
    let names: HashMap<u64, &StaffName> = days.iter().map(|d| (d.staff.id, &d.staff)).collect();
    let roster = LateRoster::build(
        days.iter()
            .filter_map(|d| d.record.as_ref().map(|r| (d.shift.as_ref(), r))),
    );

    let entries = roster
        .entries()
        .iter()
        .filter_map(|entry| {
            let staff = names.get(&entry.record.staff_id)?;
            Some(LateEntry {
                staff: (*staff).clone(),
                shift_start: entry.shift.start_time.map(format_time)?,
                clock_in: entry.record.clock_in.map(format_time)?,
                late_minutes: entry.late.minutes(),
                late_display: entry.late.to_string(),
                resolution: entry.resolution,
            })
        })
        .collect();

    LateRosterResponse {
        date,
        entries,
        unresolved_count: roster.unresolved_count(),
    }
}

async fn load_day(pool: &MySqlPool, date: NaiveDate) -> actix_web::Result<Vec<StaffDay>> {
    records::day_for_all_staff(pool, date).await.map_err(|e| {
        tracing::error!(error = %e, %date, "Failed to load late arrivals");
        ErrorInternalServerError("Internal Server Error")
    })
}

/// Late arrivals of a date, earliest clock-in first
#[utoipa::path(
    get,
    path = "/api/lateness",
    params(DateQuery),
    responses(
        (status = 200, body = LateRosterResponse),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Lateness"
)]
pub async fn late_roster(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<BusinessClock>,
    query: web::Query<DateQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let date = query.date.unwrap_or_else(|| clock.today());
    let days = load_day(pool.get_ref(), date).await?;

    Ok(HttpResponse::Ok().json(roster_response(date, &days)))
}

/// Number of late arrivals not yet handled
#[utoipa::path(
    get,
    path = "/api/lateness/unresolved-count",
    params(DateQuery),
    responses(
        (status = 200, body = Object, example = json!({ "date": "2026-10-19", "unresolved_count": 2 })),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Lateness"
)]
pub async fn unresolved_count(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<BusinessClock>,
    query: web::Query<DateQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let date = query.date.unwrap_or_else(|| clock.today());
    let days = load_day(pool.get_ref(), date).await?;
    let count = count_unresolved(
        days.iter()
            .filter_map(|d| d.record.as_ref().map(|r| (d.shift.as_ref(), r))),
    );

    Ok(HttpResponse::Ok().json(json!({ "date": date, "unresolved_count": count })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetResolution {
    pub resolution: Resolution,
}

/// Mark a late arrival resolved or unresolved
#[utoipa::path(
    put,
    path = "/api/lateness/{staff_id}/{date}",
    params(
        ("staff_id", Path, description = "Staff ID"),
        ("date", Path, description = "Work date, YYYY-MM-DD")
    ),
    request_body = SetResolution,
    responses(
        (status = 200, description = "Updated roster for the date", body = LateRosterResponse),
        (status = 404, description = "No attendance record for that day"),
        (status = 409, description = "Day is marked absent or is not a late arrival"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Lateness"
)]
pub async fn set_resolution(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, NaiveDate)>,
    body: web::Json<SetResolution>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (staff_id, date) = path.into_inner();

    let db_error = |e: sqlx::Error| {
        tracing::error!(error = %e, staff_id, %date, "Failed to set resolution");
        ErrorInternalServerError("Internal Server Error")
    };

    let Some(record) = records::get_record(pool.get_ref(), staff_id, date)
        .await
        .map_err(db_error)?
    else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No attendance record for that day"
        })));
    };
    let shift = records::get_shift(pool.get_ref(), staff_id, date)
        .await
        .map_err(db_error)?;

    if let Err(refused) = check_resolvable(shift.as_ref(), &record) {
        return Ok(HttpResponse::Conflict().json(json!({ "message": refused.to_string() })));
    }

    records::set_resolution(
        pool.get_ref(),
        staff_id,
        date,
        body.resolution.as_manual_status(),
    )
    .await
    .map_err(db_error)?;

    tracing::info!(staff_id, %date, resolution = ?body.resolution, set_by = auth.staff_id, "Lateness resolution set");

    let days = load_day(pool.get_ref(), date).await?;
    Ok(HttpResponse::Ok().json(roster_response(date, &days)))
}
