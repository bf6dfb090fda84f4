use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::report::requested_month,
    auth::auth::AuthUser,
    evaluator::time::{anchor, format_time, parse_time_of_day},
    model::shift::Shift,
    utils::{clock::BusinessClock, db_utils::is_constraint_violation, records},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertShift {
    #[schema(example = 1)]
    pub staff_id: u64,
    #[schema(example = "2026-10-19", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "18:00")]
    pub end_time: String,
    #[schema(example = 1000.0, nullable = true)]
    pub hourly_rate: Option<f64>,
    #[schema(example = 3, nullable = true)]
    pub location_id: Option<u64>,
}

impl UpsertShift {
    /// Checks the window and rate; returns the parsed start and end.
    pub fn validate(&self) -> Result<(NaiveTime, NaiveTime), String> {
        let start = parse_time_of_day(&self.start_time).map_err(|e| e.to_string())?;
        let end = parse_time_of_day(&self.end_time).map_err(|e| e.to_string())?;

        if anchor(end) <= anchor(start) {
            return Err("Shift must end after it starts".to_string());
        }
        if let Some(rate) = self.hourly_rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err("Hourly rate must be a non-negative number".to_string());
            }
        }
        Ok((start, end))
    }
}

/// Create or replace a staff member's shift for a date
#[utoipa::path(
    put,
    path = "/api/shifts",
    request_body = UpsertShift,
    responses(
        (status = 200, description = "Shift saved", body = Shift),
        (status = 400, description = "Invalid window, rate, staff or location"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn upsert_shift(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpsertShift>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (start, end) = match payload.validate() {
        Ok(window) => window,
        Err(message) => return Ok(HttpResponse::BadRequest().json(json!({ "message": message }))),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO shifts (staff_id, work_date, start_time, end_time, hourly_rate, location_id)
        VALUES (?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            start_time = VALUES(start_time),
            end_time = VALUES(end_time),
            hourly_rate = VALUES(hourly_rate),
            location_id = VALUES(location_id)
        "#,
    )
    .bind(payload.staff_id)
    .bind(payload.date)
    .bind(format_time(start))
    .bind(format_time(end))
    .bind(payload.hourly_rate)
    .bind(payload.location_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_constraint_violation(&e) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Unknown staff or location"
            })));
        }
        Err(e) => {
            tracing::error!(error = %e, staff_id = payload.staff_id, "Failed to save shift");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    }

    let saved = records::get_shift(pool.get_ref(), payload.staff_id, payload.date)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, staff_id = payload.staff_id, "Failed to reload shift");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match saved {
        Some(shift) => Ok(HttpResponse::Ok().json(shift)),
        None => Err(ErrorInternalServerError("Internal Server Error")),
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ShiftQuery {
    /// Defaults to the caller
    #[schema(example = 1)]
    pub staff_id: Option<u64>,
    /// `YYYY-MM`, defaults to the current month
    #[schema(example = "2026-10")]
    pub month: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ShiftListResponse {
    pub staff_id: u64,
    #[schema(example = "2026-10")]
    pub month: String,
    pub data: Vec<Shift>,
}

/// A staff member's shifts for a month
#[utoipa::path(
    get,
    path = "/api/shifts",
    params(ShiftQuery),
    responses(
        (status = 200, body = ShiftListResponse),
        (status = 400, description = "Malformed month"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn list_shifts(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<BusinessClock>,
    query: web::Query<ShiftQuery>,
) -> actix_web::Result<impl Responder> {
    let staff_id = query.staff_id.unwrap_or(auth.staff_id);
    auth.require_self_or_admin(staff_id)?;

    let month = requested_month(query.month.as_deref(), clock.today())?;

    let data = records::shifts_between(pool.get_ref(), staff_id, month.first_day(), month.last_day())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, staff_id, "Failed to list shifts");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(ShiftListResponse {
        staff_id,
        month: month.to_string(),
        data,
    }))
}

/// Delete a shift
#[utoipa::path(
    delete,
    path = "/api/shifts/{shift_id}",
    params(("shift_id", Path, description = "Shift ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Shift not found"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn delete_shift(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let shift_id = path.into_inner();

    let result = sqlx::query("DELETE FROM shifts WHERE id = ?")
        .bind(shift_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, shift_id, "Failed to delete shift");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Shift not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn upsert(start: &str, end: &str, rate: Option<f64>) -> UpsertShift {
        UpsertShift {
            staff_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            hourly_rate: rate,
            location_id: None,
        }
    }

    #[test]
    fn accepts_a_day_shift() {
        let (start, end) = upsert("09:00", "18:00", Some(1000.0)).validate().unwrap();
        assert_eq!(format_time(start), "09:00:00");
        assert_eq!(format_time(end), "18:00:00");
    }

    #[rstest]
    #[case("18:00", "09:00", None)]
    #[case("09:00", "09:00", None)]
    #[case("9時", "18:00", None)]
    #[case("09:00", "18:00", Some(-1.0))]
    #[case("09:00", "18:00", Some(f64::INFINITY))]
    fn rejects_invalid_shifts(#[case] start: &str, #[case] end: &str, #[case] rate: Option<f64>) {
        assert!(upsert(start, end, rate).validate().is_err());
    }

    #[test]
    fn rate_may_be_absent_or_zero() {
        assert!(upsert("09:00", "18:00", None).validate().is_ok());
        assert!(upsert("09:00", "18:00", Some(0.0)).validate().is_ok());
    }
}
