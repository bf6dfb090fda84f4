use crate::config::Config;
use crate::{auth::jwt::verify_token, model::role::Role, models::TokenType};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub staff_id: u64,
    pub login_id: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by auth_middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        ready(AuthUser::from_access_token(token, &config.jwt_secret))
    }
}

impl AuthUser {
    pub fn from_access_token(token: &str, secret: &str) -> actix_web::Result<Self> {
        let claims = verify_token(token, secret).map_err(|_| ErrorUnauthorized("Invalid token"))?;

        if claims.token_type != TokenType::Access {
            return Err(ErrorUnauthorized("Access token required"));
        }

        let role = Role::from_id(claims.role).ok_or_else(|| ErrorUnauthorized("Invalid role"))?;

        Ok(AuthUser {
            staff_id: claims.staff_id,
            login_id: claims.sub,
            role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    /// Staff may read their own data; administrators anyone's.
    pub fn require_self_or_admin(&self, staff_id: u64) -> actix_web::Result<()> {
        if self.is_admin() || self.staff_id == staff_id {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Not your record"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_refresh_token};

    fn user(staff_id: u64, role: Role) -> AuthUser {
        AuthUser {
            staff_id,
            login_id: "x".to_string(),
            role,
        }
    }

    #[test]
    fn admin_passes_every_check() {
        let admin = user(1, Role::Admin);
        assert!(admin.require_admin().is_ok());
        assert!(admin.require_self_or_admin(42).is_ok());
    }

    #[test]
    fn staff_only_reaches_own_records() {
        let staff = user(5, Role::Staff);
        assert!(staff.require_admin().is_err());
        assert!(staff.require_self_or_admin(5).is_ok());
        assert!(staff.require_self_or_admin(6).is_err());
    }

    #[test]
    fn decodes_access_tokens_only() {
        let access = generate_access_token(3, "sato".to_string(), 2, "k", 60).unwrap();
        let decoded = AuthUser::from_access_token(&access, "k").unwrap();
        assert_eq!(decoded.staff_id, 3);
        assert_eq!(decoded.role, Role::Staff);

        let (refresh, _) = generate_refresh_token(3, "sato".to_string(), 2, "k", 60).unwrap();
        assert!(AuthUser::from_access_token(&refresh, "k").is_err());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let token = generate_access_token(3, "sato".to_string(), 9, "k", 60).unwrap();
        assert!(AuthUser::from_access_token(&token, "k").is_err());
    }
}
