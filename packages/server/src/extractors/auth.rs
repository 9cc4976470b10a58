use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Name of the HTTP-only cookie carrying the session token.
pub const AUTH_COOKIE: &str = "auth_token";

/// Authenticated user decoded from the `auth_token` cookie, or from an
/// `Authorization: Bearer <token>` header when no cookie is present.
///
/// Add this as a handler parameter to require authentication.
/// Role checks happen via the `require_*` methods in the handler body.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_student: bool,
    pub is_super: bool,
}

impl AuthUser {
    pub fn require_student(&self) -> Result<(), AppError> {
        if self.is_student {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Super-admins pass every admin gate.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin || self.is_super {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub fn require_super(&self) -> Result<(), AppError> {
        if self.is_super {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub fn is_staff(&self) -> bool {
        self.is_admin || self.is_super
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;

        let claims = jwt::verify(&token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            name: claims.name,
            email: claims.sub,
            is_admin: claims.is_admin,
            is_student: claims.is_student,
            is_super: claims.is_super,
        })
    }
}

fn extract_token(parts: &Parts) -> Result<String, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(AUTH_COOKIE)
        && !cookie.value().is_empty()
    {
        return Ok(cookie.value().to_string());
    }

    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::TokenMissing)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or(AppError::TokenInvalid)
}
