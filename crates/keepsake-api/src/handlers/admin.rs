//! Admin dashboard handlers. Every route here sits behind the
//! [`AdminAuthed`] gate and reads with the elevated store tier.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use keepsake_core::{Memory, Profile};
use keepsake_store::Order;

use crate::auth::AdminAuthed;
use crate::error::ApiError;
use crate::state::AppState;

/// How many rows the recent-memories feed returns.
const RECENT_FEED_LIMIT: usize = 20;

/// `GET /api/admin/users` — every profile, for the user picker.
pub async fn list_users(
    State(state): State<AppState>,
    AdminAuthed(_admin): AdminAuthed,
) -> Result<Json<Value>, ApiError> {
    let users: Vec<Profile> = state
        .service
        .from("profiles")
        .select("id, name, email, role")
        .order("name", Order::Asc)
        .fetch()
        .await?;

    Ok(Json(json!({ "data": users })))
}

/// `GET /api/admin/memories` — the 20 newest memories across all
/// users, with owner names for the moderation feed.
pub async fn recent_memories(
    State(state): State<AppState>,
    AdminAuthed(_admin): AdminAuthed,
) -> Result<Json<Value>, ApiError> {
    let memories: Vec<Memory> = state
        .service
        .from("memories")
        .select("*, profiles (name)")
        .order("created_at", Order::Desc)
        .limit(RECENT_FEED_LIMIT)
        .fetch()
        .await?;

    Ok(Json(json!({ "data": memories })))
}

/// `DELETE /api/admin/memories/:id` — force-delete any user's memory
/// row. Media rows cascade in the store.
pub async fn force_delete_memory(
    State(state): State<AppState>,
    AdminAuthed(admin): AdminAuthed,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .from("memories")
        .delete()
        .eq("id", id)
        .execute()
        .await?;

    info!(memory_id = %id, admin_id = %admin.id, "memory force-deleted");
    Ok(Json(json!({ "message": "Memory deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct AdminStatsQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// `GET /api/admin/stats` — platform totals, optionally narrowed to
/// one user (`userId=all` means global). The storage figure is a
/// placeholder until bucket usage is surfaced by the store.
pub async fn platform_stats(
    State(state): State<AppState>,
    AdminAuthed(_admin): AdminAuthed,
    Query(query): Query<AdminStatsQuery>,
) -> Result<Json<Value>, ApiError> {
    let scoped_user = query.user_id.as_deref().filter(|u| *u != "all");

    let memory_query = || {
        let mut builder = state.service.from("memories").select("id");
        if let Some(user_id) = scoped_user {
            builder = builder.eq("user_id", user_id);
        }
        builder
    };

    let (memories, milestones, users) = tokio::join!(
        memory_query().count(),
        memory_query().eq("is_milestone", true).count(),
        state.service.from("profiles").select("id").count(),
    );

    Ok(Json(json!({
        "totalUsers": users?,
        "totalMemories": memories?,
        "totalMilestones": milestones?,
        "storageUsed": "0.4 GB",
        "message": "Stats fetched successfully",
    })))
}
