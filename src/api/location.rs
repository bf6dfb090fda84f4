use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    model::location::Location,
    utils::db_utils::{build_update_sql, execute_update, is_constraint_violation},
};

const UPDATABLE_COLUMNS: &[&str] = &["name", "address"];

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLocation {
    #[schema(example = "渋谷店")]
    pub name: String,
    #[schema(example = "東京都渋谷区1-2-3", nullable = true)]
    pub address: Option<String>,
}

/// Register a work location
#[utoipa::path(
    post,
    path = "/api/locations",
    request_body = CreateLocation,
    responses(
        (status = 201, description = "Location created", body = Location),
        (status = 400, description = "Empty name"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn create_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLocation>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": "Name must not be empty" })));
    }
    let address = payload
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    let result = sqlx::query("INSERT INTO locations (name, address) VALUES (?, ?)")
        .bind(name)
        .bind(address)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create location");
            ErrorInternalServerError("Internal Server Error")
        })?;

    info!(location_id = result.last_insert_id(), created_by = auth.staff_id, "Location created");

    Ok(HttpResponse::Created().json(Location {
        id: result.last_insert_id(),
        name: name.to_string(),
        address: address.map(str::to_string),
    }))
}

/// List work locations
#[utoipa::path(
    get,
    path = "/api/locations",
    responses(
        (status = 200, body = [Location]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn list_locations(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let locations =
        sqlx::query_as::<_, Location>("SELECT id, name, address FROM locations ORDER BY id")
            .fetch_all(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list locations");
                ErrorInternalServerError("Internal Server Error")
            })?;

    Ok(HttpResponse::Ok().json(locations))
}

/// Update a work location
#[utoipa::path(
    put,
    path = "/api/locations/{location_id}",
    params(("location_id", Path, description = "Location ID")),
    request_body(content = Object, example = json!({ "address": "東京都渋谷区4-5-6" })),
    responses(
        (status = 200, description = "Location updated"),
        (status = 400, description = "Unknown or non-updatable field"),
        (status = 404, description = "Location not found"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn update_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let location_id = path.into_inner();
    let update = build_update_sql("locations", &body, UPDATABLE_COLUMNS, "id", location_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, location_id, "Failed to update location");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Location not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Location updated successfully" })))
}

/// Delete a work location
#[utoipa::path(
    delete,
    path = "/api/locations/{location_id}",
    params(("location_id", Path, description = "Location ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Location not found"),
        (status = 409, description = "Location still referenced by staff or shifts"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn delete_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let location_id = path.into_inner();

    let result = sqlx::query("DELETE FROM locations WHERE id = ?")
        .bind(location_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) if res.rows_affected() == 0 => {
            Ok(HttpResponse::NotFound().json(json!({ "message": "Location not found" })))
        }
        Ok(_) => Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" }))),
        Err(e) if is_constraint_violation(&e) => Ok(HttpResponse::Conflict().json(json!({
            "message": "Location still referenced by staff or shifts"
        }))),
        Err(e) => {
            error!(error = %e, location_id, "Failed to delete location");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_name_and_address_are_updatable() {
        let body = json!({ "name": "新宿店" });
        let update = build_update_sql("locations", &body, UPDATABLE_COLUMNS, "id", 3).unwrap();
        assert_eq!(update.sql, "UPDATE locations SET name = ? WHERE id = ?");

        let body = json!({ "id": 9 });
        assert!(build_update_sql("locations", &body, UPDATABLE_COLUMNS, "id", 3).is_err());
    }

    #[test]
    fn address_is_optional_in_the_body() {
        let payload: CreateLocation = serde_json::from_str(r#"{"name":"渋谷店"}"#).unwrap();
        assert_eq!(payload.name, "渋谷店");
        assert!(payload.address.is_none());
    }
}
