//! Authentication gate.
//!
//! One verification contract for every protected route: verify the
//! bearer token against the store's identity service, resolve the
//! caller's role from the profiles table, and hand the handler an
//! [`AuthPrincipal`] by value. No token refresh, no session state;
//! each request is independently verified.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Deserialize;

use keepsake_core::{AuthPrincipal, Role};

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor for any authenticated caller.
pub struct Authed(pub AuthPrincipal);

/// Extractor for admin-only routes; rejects non-admin callers with 403
/// before the handler body runs, so no data mutation can occur.
pub struct AdminAuthed(pub AuthPrincipal);

#[derive(Deserialize)]
struct RoleRow {
    role: Role,
}

/// Pull the bearer token out of the Authorization header.
fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("No token provided".into()))
}

#[async_trait]
impl FromRequestParts<AppState> for Authed {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = bearer_token(parts)?;

        let user = state
            .anon
            .get_user(token)
            .await
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

        // Role lives in the profiles table, read with the elevated tier
        // because the caller's own RLS context is not established here.
        let profile = state
            .service
            .from("profiles")
            .select("role")
            .eq("id", user.id)
            .fetch_one::<RoleRow>()
            .await
            .map_err(|_| ApiError::Forbidden("Profile not found".into()))?;

        Ok(Authed(AuthPrincipal {
            id: user.id,
            email: user.email.unwrap_or_default(),
            role: profile.role,
        }))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminAuthed {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let Authed(principal) = Authed::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            return Err(ApiError::Forbidden("Admin access only".into()));
        }
        Ok(AdminAuthed(principal))
    }
}
