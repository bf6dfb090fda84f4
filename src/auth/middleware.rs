use crate::auth::auth::AuthUser;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

fn reject(req: ServiceRequest, message: &'static str) -> ServiceResponse<BoxBody> {
    tracing::debug!(path = %req.path(), reason = message, "Rejected unauthenticated request");
    let resp = HttpResponse::Unauthorized().json(json!({ "message": message }));
    req.into_response(resp.map_into_boxed_body())
}

/// Guards the protected scope: a valid access token is required, and the
/// resulting `AuthUser` is stored in the request extensions for handlers.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?
        .clone();

    let token = match req.headers().get("Authorization").map(|h| h.to_str()) {
        None => return Ok(reject(req, "Missing Authorization header")),
        Some(Err(_)) => return Ok(reject(req, "Invalid Authorization header encoding")),
        Some(Ok(value)) => match value.strip_prefix("Bearer ") {
            Some(t) => t.to_string(),
            None => return Ok(reject(req, "Authorization header must start with Bearer")),
        },
    };

    let staff = match AuthUser::from_access_token(&token, &config.jwt_secret) {
        Ok(staff) => staff,
        Err(_) => return Ok(reject(req, "Invalid or expired token")),
    };

    tracing::debug!(staff_id = staff.staff_id, role = ?staff.role, "Authenticated");
    req.extensions_mut().insert(staff);

    next.call(req).await
}
