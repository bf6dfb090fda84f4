use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    model::role::Role,
    models::{Claims, LoginReqDto, StaffCredentials, TokenType},
};
use actix_web::{HttpRequest, HttpResponse, Responder, get, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

async fn store_refresh_token(pool: &MySqlPool, claims: &Claims) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (staff_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(claims.staff_id)
    .bind(&claims.jti)
    .bind(claims.exp as i64)
    .execute(pool)
    .await
    .map(|_| ())
}

/// Issues a fresh access/refresh pair and persists the refresh token.
async fn issue_tokens(
    pool: &MySqlPool,
    config: &Config,
    staff_id: u64,
    login_id: &str,
    role: u8,
) -> Result<LoginResponse, HttpResponse> {
    let access_token = generate_access_token(
        staff_id,
        login_id.to_string(),
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    );
    let refresh = generate_refresh_token(
        staff_id,
        login_id.to_string(),
        role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    let (access_token, (refresh_token, refresh_claims)) = match (access_token, refresh) {
        (Ok(a), Ok(r)) => (a, r),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, staff_id, "Failed to sign tokens");
            return Err(HttpResponse::InternalServerError().finish());
        }
    };

    debug!(staff_id, jti = %refresh_claims.jti, "Storing refresh token");

    if let Err(e) = store_refresh_token(pool, &refresh_claims).await {
        error!(error = %e, staff_id, "Failed to store refresh token");
        return Err(HttpResponse::InternalServerError().finish());
    }

    Ok(LoginResponse {
        access_token,
        refresh_token,
    })
}

/// Role to carry into rotated tokens, read from the staff row at refresh
/// time. `None` once the staff member is gone, deactivated or holds an
/// unknown role.
fn role_for_rotation(standing: Option<(u8, bool)>) -> Option<u8> {
    match standing {
        Some((role_id, true)) => Role::from_id(role_id).map(Role::id),
        _ => None,
    }
}

/// Login with a staff login id and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair issued", body = LoginResponse),
        (status = 400, description = "Login id or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(login_id = %user.login_id)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.login_id.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty login id or password");
        return HttpResponse::BadRequest().body("Login id or password required");
    }

    debug!("Fetching staff credentials");

    let staff = match sqlx::query_as::<_, StaffCredentials>(
        r#"
        SELECT id, login_id, password, role_id, is_active
        FROM staff
        WHERE login_id = ?
        "#,
    )
    .bind(user.login_id.trim())
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(staff)) if staff.is_active => {
            debug!(staff_id = staff.id, "Staff found");
            staff
        }
        Ok(_) => {
            info!("Invalid credentials: unknown or inactive login id");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching staff");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &staff.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    let tokens =
        match issue_tokens(pool.get_ref(), &config, staff.id, &staff.login_id, staff.role_id).await
        {
            Ok(tokens) => tokens,
            Err(resp) => return resp,
        };

    // not fatal for the login itself
    if let Err(e) = sqlx::query("UPDATE staff SET last_login_at = NOW() WHERE id = ?")
        .bind(staff.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(staff_id = staff.id, "Login successful");

    HttpResponse::Ok().json(tokens)
}

/// Current session
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Authenticated staff member", body = Object, example = json!({
            "staff_id": 1, "login_id": "tanaka", "role_id": 2
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
#[get("/me")]
pub async fn me(auth: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "staff_id": auth.staff_id,
        "login_id": auth.login_id,
        "role_id": auth.role.id(),
    }))
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = LoginResponse),
        (status = 401, description = "Refresh token invalid, revoked or expired")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::Unauthorized().finish(),
    };

    let standing = sqlx::query_as::<_, (u8, bool)>(
        "SELECT role_id, is_active FROM staff WHERE id = ?",
    )
    .bind(claims.staff_id)
    .fetch_optional(pool.get_ref())
    .await;

    let role = match standing.map(role_for_rotation) {
        Ok(Some(role)) => role,
        Ok(None) => {
            info!(staff_id = claims.staff_id, "Refresh refused: staff missing or inactive");
            return HttpResponse::Unauthorized().finish();
        }
        Err(e) => {
            error!(error = %e, staff_id = claims.staff_id, "Failed to load staff for refresh");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // Revoke and check in one statement so a token is only ever rotated once.
    let revoked = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = TRUE
        WHERE jti = ? AND revoked = FALSE
        "#,
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await;

    match revoked {
        Ok(result) if result.rows_affected() == 1 => {}
        Ok(_) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, staff_id = claims.staff_id, "Failed to revoke refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    }

    match issue_tokens(
        pool.get_ref(),
        &config,
        claims.staff_id,
        &claims.sub,
        role,
    )
    .await
    {
        Ok(tokens) => HttpResponse::Ok().json(tokens),
        Err(resp) => resp,
    }
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out (idempotent)")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let claims = match bearer_token(&req).map(|t| verify_token(t, &config.jwt_secret)) {
        Some(Ok(c)) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, staff_id = claims.staff_id, "Failed to revoke refresh token on logout");
    }

    // success even if the token didn't exist
    HttpResponse::NoContent().finish()
}
