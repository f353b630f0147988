//! Registration and login handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use keepsake_core::Role;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
struct ProfileRow {
    name: Option<String>,
    role: Option<Role>,
}

/// `POST /api/auth/register` — create a pre-confirmed identity and its
/// profile row in one shot. Identity creation failures (duplicate
/// email, weak password) come back as 400 with the upstream message.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    }

    let auth_user = state
        .service
        .admin_create_user(&request.email, &request.password)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .service
        .from("profiles")
        .insert(json!({
            "id": auth_user.id,
            "user_id": auth_user.id,
            "name": request.name,
            "email": auth_user.email,
            "role": Role::User,
        }))
        .execute()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    info!(user_id = %auth_user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// `POST /api/auth/login` — password grant against the identity
/// service, enriched with profile name and role. Bad credentials are
/// 401; a missing profile degrades to defaults rather than failing
/// the login.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.anon.sign_in(&request.email, &request.password).await?;

    let profile: Option<ProfileRow> = state
        .service
        .from("profiles")
        .select("name, role")
        .eq("id", session.user.id)
        .fetch_optional()
        .await?;

    info!(user_id = %session.user.id, "login succeeded");
    Ok(Json(json!({
        "message": "Login successful",
        "access_token": session.access_token,
        "user": {
            "id": session.user.id,
            "email": session.user.email,
            "name": profile
                .as_ref()
                .and_then(|p| p.name.clone())
                .unwrap_or_else(|| "User".to_string()),
            "role": profile
                .as_ref()
                .and_then(|p| p.role)
                .unwrap_or_default(),
        },
    })))
}
