use crate::{
    auth::{auth::AuthUser, password::hash_password},
    model::{role::Role, staff::Staff},
    utils::{
        db_utils::{build_update_sql, execute_update, is_constraint_violation},
        login_id_cache, login_id_filter,
    },
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

/// Columns an administrator may change through `PUT /staff/{id}`.
const UPDATABLE_COLUMNS: &[&str] = &["name", "role_id", "location_id", "is_active"];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateStaff {
    #[schema(example = "tanaka")]
    pub login_id: String,
    #[schema(example = "田中 太郎")]
    pub name: String,
    #[schema(example = "initial-password")]
    pub password: String,
    #[schema(example = 2)]
    pub role_id: u8,
    #[schema(example = 3, nullable = true)]
    pub location_id: Option<u64>,
}

impl CreateStaff {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.login_id.trim().is_empty() || self.name.trim().is_empty() {
            return Err("Login id and name must not be empty");
        }
        if self.password.len() < 8 {
            return Err("Password must be at least 8 characters");
        }
        if Role::from_id(self.role_id).is_none() {
            return Err("Unknown role");
        }
        Ok(())
    }
}

/// true  => login id AVAILABLE
/// false => login id TAKEN
pub async fn is_login_id_available(login_id: &str, pool: &MySqlPool) -> bool {
    // Cuckoo filter: a miss is definitive
    if !login_id_filter::might_exist(login_id) {
        return true;
    }

    // Moka cache: a hit is definitive
    if login_id_cache::is_taken(login_id).await {
        return false;
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM staff WHERE login_id = ? LIMIT 1)",
    )
    .bind(login_id.trim())
    .fetch_one(pool)
    .await;

    match exists {
        Ok(exists) => !exists,
        Err(e) => {
            // fail-safe: treat as taken
            error!(error = %e, "Login id availability check failed");
            false
        }
    }
}

/// Register a staff member
#[utoipa::path(
    post,
    path = "/api/staff",
    request_body = CreateStaff,
    responses(
        (status = 201, description = "Staff created", body = Object, example = json!({
            "message": "Staff created successfully", "id": 12
        })),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Login id already taken"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn create_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateStaff>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let Err(message) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let login_id = payload.login_id.trim();

    if !is_login_id_available(login_id, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({ "message": "Login id already taken" })));
    }

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO staff (login_id, name, password, role_id, location_id, is_active)
        VALUES (?, ?, ?, ?, ?, TRUE)
        "#,
    )
    .bind(login_id)
    .bind(payload.name.trim())
    .bind(hashed)
    .bind(payload.role_id)
    .bind(payload.location_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            login_id_filter::insert(login_id);
            login_id_cache::mark_taken(login_id).await;
            info!(staff_id = res.last_insert_id(), created_by = auth.staff_id, "Staff created");

            Ok(HttpResponse::Created().json(json!({
                "message": "Staff created successfully",
                "id": res.last_insert_id()
            })))
        }
        Err(e) if is_constraint_violation(&e) => {
            Ok(HttpResponse::Conflict().json(json!({
                "message": "Login id already taken or unknown location"
            })))
        }
        Err(e) => {
            error!(error = %e, "Failed to create staff");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct StaffQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub location_id: Option<u64>,
    pub is_active: Option<bool>,
    /// Matches name or login id
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StaffListResponse {
    pub data: Vec<Staff>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
#[derive(Debug)]
enum FilterValue {
    U64(u64),
    Bool(bool),
    Str(String),
}

fn staff_filters(query: &StaffQuery) -> (String, Vec<FilterValue>) {
    let mut conditions = Vec::new();
    let mut bindings = Vec::new();

    if let Some(location_id) = query.location_id {
        conditions.push("location_id = ?");
        bindings.push(FilterValue::U64(location_id));
    }

    if let Some(is_active) = query.is_active {
        conditions.push("is_active = ?");
        bindings.push(FilterValue::Bool(is_active));
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("(name LIKE ? OR login_id LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(FilterValue::Str(like.clone()));
        bindings.push(FilterValue::Str(like));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bindings)
}

/// List staff
#[utoipa::path(
    get,
    path = "/api/staff",
    params(StaffQuery),
    responses(
        (status = 200, body = StaffListResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StaffQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let (where_clause, bindings) = staff_filters(&query);

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM staff {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting staff");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            FilterValue::U64(v) => count_query.bind(*v),
            FilterValue::Bool(v) => count_query.bind(*v),
            FilterValue::Str(v) => count_query.bind(v.as_str()),
        };
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count staff");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT id, login_id, name, role_id, location_id, is_active FROM staff {} ORDER BY id LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching staff");

    let mut data_query = sqlx::query_as::<_, Staff>(&data_sql);
    for b in &bindings {
        data_query = match b {
            FilterValue::U64(v) => data_query.bind(*v),
            FilterValue::Bool(v) => data_query.bind(*v),
            FilterValue::Str(v) => data_query.bind(v.as_str()),
        };
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let data = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch staff");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(StaffListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Get a staff member
#[utoipa::path(
    get,
    path = "/api/staff/{staff_id}",
    params(("staff_id", Path, description = "Staff ID")),
    responses(
        (status = 200, description = "Staff found", body = Staff),
        (status = 404, description = "Staff not found"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn get_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let staff_id = path.into_inner();
    auth.require_self_or_admin(staff_id)?;

    let staff = sqlx::query_as::<_, Staff>(
        "SELECT id, login_id, name, role_id, location_id, is_active FROM staff WHERE id = ?",
    )
    .bind(staff_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, staff_id, "Failed to fetch staff");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match staff {
        Some(s) => Ok(HttpResponse::Ok().json(s)),
        None => Ok(HttpResponse::NotFound().json(json!({ "message": "Staff not found" }))),
    }
}

/// Update a staff member
#[utoipa::path(
    put,
    path = "/api/staff/{staff_id}",
    params(("staff_id", Path, description = "Staff ID")),
    request_body(content = Object, example = json!({ "name": "田中 一郎", "location_id": 4 })),
    responses(
        (status = 200, description = "Staff updated"),
        (status = 400, description = "Unknown or non-updatable field"),
        (status = 404, description = "Staff not found"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn update_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let staff_id = path.into_inner();

    if let Some(role_id) = body.get("role_id") {
        let valid = role_id
            .as_u64()
            .and_then(|id| u8::try_from(id).ok())
            .and_then(Role::from_id)
            .is_some();
        if !valid {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": "Unknown role" })));
        }
    }

    let update = build_update_sql("staff", &body, UPDATABLE_COLUMNS, "id", staff_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, staff_id, "Failed to update staff");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Staff not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Staff updated successfully" })))
}

/// Delete a staff member
#[utoipa::path(
    delete,
    path = "/api/staff/{staff_id}",
    params(("staff_id", Path, description = "Staff ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Staff not found"),
        (status = 409, description = "Staff still has shifts or attendance"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn delete_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let staff_id = path.into_inner();

    let login_id = sqlx::query_scalar::<_, String>("SELECT login_id FROM staff WHERE id = ?")
        .bind(staff_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, staff_id, "Failed to fetch staff");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(login_id) = login_id else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Staff not found" })));
    };

    let result = sqlx::query("DELETE FROM staff WHERE id = ?")
        .bind(staff_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) if res.rows_affected() == 0 => {
            Ok(HttpResponse::NotFound().json(json!({ "message": "Staff not found" })))
        }
        Ok(_) => {
            login_id_filter::remove(&login_id);
            login_id_cache::forget(&login_id).await;
            info!(staff_id, deleted_by = auth.staff_id, "Staff deleted");
            Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
        }
        Err(e) if is_constraint_violation(&e) => Ok(HttpResponse::Conflict().json(json!({
            "message": "Staff still has shifts or attendance; deactivate instead"
        }))),
        Err(e) => {
            error!(error = %e, staff_id, "Failed to delete staff");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}
