//! Memory HTTP handlers: CRUD, search, tags, stats, milestones,
//! random pick, and bulk upload.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use keepsake_core::{Memory, Tag};
use keepsake_store::{derive_storage_path, Order, MEMORIES_BUCKET};

use crate::auth::{AdminAuthed, Authed};
use crate::error::ApiError;
use crate::services::{parse_tag_identifiers, resolve_and_link_tags};
use crate::shape::flatten_memory;
use crate::state::AppState;
use crate::upload::{collect_multipart, UploadedFile};

/// Page size for the owner-scoped list endpoint.
const USER_PAGE_SIZE: u64 = 12;

/// Default page size for the admin list endpoint.
const ADMIN_PAGE_SIZE: u64 = 20;

/// Embedded-join select used everywhere a memory is flattened.
const MEMORY_JOINS: &str = "*, media (file_url, file_type), memory_tags (tags (id, name))";

#[derive(Deserialize)]
struct IdRow {
    id: Uuid,
}

#[derive(Deserialize)]
struct FileUrlRow {
    file_url: Option<String>,
}

/// Query parameters shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Strip characters that act as structure inside the disjunction
/// filter expression, so a search term cannot terminate or reshape the
/// expression. `%` stays; it only widens the match.
pub(crate) fn sanitize_search_term(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '"' | '\\'))
        .collect()
}

/// Convert `page`/page-size into the inclusive row range the store
/// expects. Pages are 1-based; page 2 of size 12 covers rows 12..=23.
pub(crate) fn page_bounds(page: u64, page_size: u64) -> (usize, usize) {
    let page = page.max(1);
    let from = (page - 1).saturating_mul(page_size);
    let to = from.saturating_add(page_size.saturating_sub(1));
    (from as usize, to as usize)
}

/// Upload one buffered file to the memory's storage prefix, returning
/// the bucket-relative path stored on the media row.
async fn upload_media_blob(
    state: &AppState,
    user_id: Uuid,
    memory_id: Uuid,
    kind: &str,
    file: &UploadedFile,
) -> Result<String, ApiError> {
    let path = format!(
        "{}/{}/{}-{}.{}",
        user_id,
        memory_id,
        kind,
        Uuid::new_v4(),
        file.extension()
    );
    state
        .service
        .bucket(MEMORIES_BUCKET)
        .upload(&path, file.data.clone(), &file.content_type)
        .await?;
    Ok(path)
}

/// Create one memory row from an uploaded file plus shared metadata,
/// upload the blob, and insert its media row. Shared by the bulk
/// endpoint and album file-linking.
pub(crate) async fn create_memory_from_file(
    state: &AppState,
    user_id: Uuid,
    title: &str,
    location: &str,
    album_id: Option<Uuid>,
    file: &UploadedFile,
) -> Result<Memory, ApiError> {
    let memory: Memory = state
        .service
        .from("memories")
        .insert(json!({
            "user_id": user_id,
            "title": title,
            "location": location,
            "memory_date": Utc::now().date_naive(),
            "album_id": album_id,
        }))
        .select("*")
        .fetch_one()
        .await?;

    let kind = if file.content_type.starts_with("audio") {
        "audio"
    } else {
        "display"
    };
    let path = upload_media_blob(state, user_id, memory.id, kind, file).await?;

    state
        .service
        .from("media")
        .insert(json!({
            "memory_id": memory.id,
            "file_url": path,
            "file_type": file.media_kind(),
        }))
        .execute()
        .await?;

    Ok(memory)
}

/// `POST /api/memories` — create a memory with optional display and
/// voice-note files, metadata, and tag identifiers.
pub async fn create_memory(
    State(state): State<AppState>,
    Authed(user): Authed,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let body = collect_multipart(multipart).await?;

    // Date arrives as YYYY-MM-DD or a full ISO timestamp; keep the date part.
    let memory_date = body
        .field("memory_date")
        .map(|d| d.split('T').next().unwrap_or(d).to_string())
        .unwrap_or_else(|| Utc::now().date_naive().to_string());
    let is_milestone = body.field("is_milestone") == Some("true");
    let album_id = body.field("album_id").and_then(|v| Uuid::parse_str(v).ok());

    let memory: Memory = state
        .service
        .from("memories")
        .insert(json!({
            "user_id": user.id,
            "title": body.field("title").unwrap_or("Untitled Memory"),
            "description": body.field("description").unwrap_or(""),
            "memory_date": memory_date,
            "location": body.field("location").unwrap_or(""),
            "is_milestone": is_milestone,
            "album_id": album_id,
        }))
        .select("*")
        .fetch_one()
        .await?;

    let mut media_rows: Vec<Value> = Vec::new();
    if let Some(file) = body.file("file") {
        let path = upload_media_blob(&state, user.id, memory.id, "display", file).await?;
        let file_type = if file.content_type.starts_with("video") {
            "video"
        } else {
            "image"
        };
        media_rows.push(json!({
            "memory_id": memory.id,
            "file_url": path,
            "file_type": file_type,
        }));
    }
    if let Some(file) = body.file("audio") {
        let path = upload_media_blob(&state, user.id, memory.id, "audio", file).await?;
        media_rows.push(json!({
            "memory_id": memory.id,
            "file_url": path,
            "file_type": "audio",
        }));
    }
    if !media_rows.is_empty() {
        state
            .service
            .from("media")
            .insert(Value::Array(media_rows))
            .execute()
            .await?;
    }

    // Tag failures never roll back the memory itself.
    if let Some(raw) = body.field("tags") {
        let identifiers = parse_tag_identifiers(raw);
        if let Err(err) = resolve_and_link_tags(&state.service, memory.id, &identifiers).await {
            warn!(memory_id = %memory.id, error = %err, "tag processing failed but memory saved");
        }
    }

    let full: Memory = state
        .service
        .from("memories")
        .select(MEMORY_JOINS)
        .eq("id", memory.id)
        .fetch_one()
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Memory created successfully!",
            "memory": flatten_memory(&full, &state.config.store_url),
        })),
    ))
}

/// `POST /api/memories/bulk` — one memory per uploaded file with
/// shared metadata; per-item failures are logged and skipped.
pub async fn bulk_upload_memories(
    State(state): State<AppState>,
    Authed(user): Authed,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let body = collect_multipart(multipart).await?;
    if body.files.is_empty() {
        return Err(ApiError::BadRequest("No files received".into()));
    }

    let album_id = body.field("album_id").and_then(|v| Uuid::parse_str(v).ok());
    let location = body.field("location").unwrap_or("").to_string();

    let mut uploaded: Vec<Memory> = Vec::new();
    for file in &body.files {
        let title = body
            .field("title")
            .unwrap_or(file.file_name.as_str())
            .to_string();
        match create_memory_from_file(&state, user.id, &title, &location, album_id, file).await {
            Ok(memory) => uploaded.push(memory),
            Err(err) => {
                warn!(file = %file.file_name, error = ?err, "bulk item failed, skipping");
            }
        }
    }

    info!(count = uploaded.len(), user_id = %user.id, "bulk upload processed");
    Ok(Json(json!({
        "message": "Bulk upload processed",
        "memories": uploaded,
    })))
}

/// `GET /api/memories` — the caller's memories, paginated at 12 per
/// page with search and tag filters.
pub async fn list_memories(
    State(state): State<AppState>,
    Authed(user): Authed,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let (from, to) = page_bounds(page, USER_PAGE_SIZE);

    let mut builder = state
        .service
        .from("memories")
        .select(MEMORY_JOINS)
        .eq("user_id", user.id);

    if let Some(tag) = query.tag.as_deref().filter(|t| *t != "all") {
        builder = builder.eq("memory_tags.tags.name", tag);
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let term = sanitize_search_term(search);
        if !term.is_empty() {
            builder = builder.or(&format!(
                "title.ilike.%{0}%,description.ilike.%{0}%",
                term
            ));
        }
    }

    let (rows, total): (Vec<Memory>, u64) = builder
        .order("created_at", Order::Desc)
        .range(from, to)
        .fetch_with_count()
        .await?;

    let data: Vec<Value> = rows
        .iter()
        .map(|m| flatten_memory(m, &state.config.store_url))
        .collect();

    Ok(Json(json!({
        "data": data,
        "memories": data,
        "pagination": { "total": total, "currentPage": page },
    })))
}

/// `GET /api/memories/all` — admin view across all users, joined with
/// owner profiles.
pub async fn list_all_memories(
    State(state): State<AppState>,
    AdminAuthed(_admin): AdminAuthed,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(ADMIN_PAGE_SIZE).max(1);
    let (from, to) = page_bounds(page, limit);

    let mut builder = state.service.from("memories").select(
        "*, profiles (id, name, role), media (id, file_url, file_type), memory_tags (tags (id, name))",
    );

    if let Some(tag) = query.tag.as_deref().filter(|t| *t != "all") {
        builder = builder.eq("memory_tags.tags.name", tag);
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let term = sanitize_search_term(search);
        if !term.is_empty() {
            builder = builder.or(&format!(
                "title.ilike.%{0}%,description.ilike.%{0}%",
                term
            ));
        }
    }

    let (rows, total): (Vec<Memory>, u64) = builder
        .order("created_at", Order::Desc)
        .range(from, to)
        .fetch_with_count()
        .await?;

    let data: Vec<Value> = rows
        .iter()
        .map(|m| flatten_memory(m, &state.config.store_url))
        .collect();

    Ok(Json(json!({
        "data": data,
        "pagination": {
            "total": total,
            "totalPages": total.div_ceil(limit),
            "currentPage": page,
        },
    })))
}

/// `GET /api/memories/milestones` — milestone memories, newest first.
pub async fn list_milestones(
    State(state): State<AppState>,
    Authed(_user): Authed,
) -> Result<Json<Value>, ApiError> {
    let rows: Vec<Memory> = state
        .service
        .from("memories")
        .select(MEMORY_JOINS)
        .eq("is_milestone", true)
        .order("memory_date", Order::Desc)
        .fetch()
        .await?;

    let data: Vec<Value> = rows
        .iter()
        .map(|m| flatten_memory(m, &state.config.store_url))
        .collect();

    Ok(Json(json!({ "data": data, "message": "Milestones fetched" })))
}

/// `GET /api/memories/random` — one random memory owned by the caller.
pub async fn random_memory(
    State(state): State<AppState>,
    Authed(user): Authed,
) -> Result<Json<Value>, ApiError> {
    let ids: Vec<IdRow> = state
        .service
        .from("memories")
        .select("id")
        .eq("user_id", user.id)
        .fetch()
        .await?;

    if ids.is_empty() {
        return Err(ApiError::NotFound("No memories found!".into()));
    }

    let pick = ids[rand::thread_rng().gen_range(0..ids.len())].id;
    let memory: Memory = state
        .service
        .from("memories")
        .select(MEMORY_JOINS)
        .eq("id", pick)
        .fetch_one()
        .await?;

    Ok(Json(flatten_memory(&memory, &state.config.store_url)))
}

#[derive(Deserialize)]
struct TagJoinRow {
    #[serde(default)]
    memories: Option<Memory>,
}

/// `GET /api/memories/tag/:tag_id` — the caller's memories carrying
/// one tag, via the join table.
pub async fn list_memories_by_tag(
    State(state): State<AppState>,
    Authed(user): Authed,
    Path(tag_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let rows: Vec<TagJoinRow> = state
        .service
        .from("memory_tags")
        .select("memory_id, memories!inner (*, media (file_url, file_type), memory_tags (tags (id, name)))")
        .eq("tag_id", tag_id)
        .eq("memories.user_id", user.id)
        .fetch()
        .await?;

    let data: Vec<Value> = rows
        .iter()
        .filter_map(|r| r.memories.as_ref())
        .map(|m| flatten_memory(m, &state.config.store_url))
        .collect();

    Ok(Json(json!({ "data": data, "message": "Success" })))
}

/// Query parameters for the stats endpoint.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub search: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// `GET /api/memories/stats` — memory/milestone/album counts, scoped
/// to the caller, to an admin-selected user, or globally for admins.
/// The three counts are independent and awaited jointly.
pub async fn memory_stats(
    State(state): State<AppState>,
    Authed(user): Authed,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Value>, ApiError> {
    let target = query.user_id.as_deref();
    let is_global = user.is_admin() && matches!(target, None | Some("all"));
    let effective_user = match target {
        Some(t) if t != "all" => t.to_string(),
        _ => user.id.to_string(),
    };
    let search = query.search.as_deref().filter(|s| !s.is_empty());

    let memory_query = || {
        let mut builder = state.service.from("memories").select("id");
        if !is_global {
            builder = builder.eq("user_id", &effective_user);
        }
        if let Some(s) = search {
            builder = builder.ilike("title", &format!("%{}%", s));
        }
        builder
    };
    let album_query = || {
        let mut builder = state.service.from("albums").select("id");
        if !is_global {
            builder = builder.eq("user_id", &effective_user);
        }
        builder
    };

    let (total, milestones, albums) = tokio::join!(
        memory_query().count(),
        memory_query().eq("is_milestone", true).count(),
        album_query().count(),
    );

    Ok(Json(json!({
        "total": total?,
        "milestones": milestones?,
        "albums": albums?,
    })))
}

/// `GET /api/memories/tags` — all tags, alphabetical.
pub async fn list_tags(
    State(state): State<AppState>,
    Authed(_user): Authed,
) -> Result<Json<Value>, ApiError> {
    let tags = fetch_tags(&state).await?;
    Ok(Json(json!({ "data": tags })))
}

/// `GET /api/memories/tags/admin` — same list behind the admin gate,
/// kept as a distinct path for the dashboard.
pub async fn list_tags_admin(
    State(state): State<AppState>,
    AdminAuthed(_admin): AdminAuthed,
) -> Result<Json<Value>, ApiError> {
    let tags = fetch_tags(&state).await?;
    Ok(Json(json!({ "data": tags })))
}

async fn fetch_tags(state: &AppState) -> Result<Vec<Tag>, ApiError> {
    Ok(state
        .service
        .from("tags")
        .select("id, name")
        .order("name", Order::Asc)
        .fetch()
        .await?)
}

/// `PUT /api/memories/:id` — update text/metadata fields; an optional
/// new display file replaces the existing image media row's URL rather
/// than creating a new row.
pub async fn update_memory(
    State(state): State<AppState>,
    Authed(user): Authed,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let body = collect_multipart(multipart).await?;

    let mut patch = serde_json::Map::new();
    for field in ["title", "description", "location", "memory_date"] {
        if let Some(value) = body.field(field) {
            patch.insert(field.to_string(), Value::String(value.to_string()));
        }
    }
    if let Some(value) = body.field("is_milestone") {
        patch.insert("is_milestone".to_string(), Value::Bool(value == "true"));
    }

    if !patch.is_empty() {
        state
            .service
            .from("memories")
            .update(Value::Object(patch))
            .eq("id", id)
            .eq("user_id", user.id)
            .execute()
            .await?;
    }

    if let Some(file) = body.file("file") {
        let path = format!(
            "{}/{}/display-{}.{}",
            user.id,
            id,
            Utc::now().timestamp_millis(),
            file.extension()
        );
        let bucket = state.service.bucket(MEMORIES_BUCKET);
        bucket
            .upload(&path, file.data.clone(), &file.content_type)
            .await?;
        let public_url = bucket.public_url(&path);

        state
            .service
            .from("media")
            .update(json!({ "file_url": public_url }))
            .eq("memory_id", id)
            .eq("file_type", "image")
            .execute()
            .await?;
    }

    Ok(Json(json!({ "message": "Memory and Media updated successfully" })))
}

/// `DELETE /api/memories/:id` — best-effort blob cleanup, then the row
/// delete scoped to the owner. Storage failures are logged, never
/// fatal; the row delete is what matters.
pub async fn delete_memory(
    State(state): State<AppState>,
    Authed(user): Authed,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let media: Vec<FileUrlRow> = state
        .service
        .from("media")
        .select("file_url")
        .eq("memory_id", id)
        .fetch()
        .await?;

    let paths: Vec<String> = media
        .iter()
        .filter_map(|row| row.file_url.as_deref())
        .filter_map(derive_storage_path)
        .collect();

    if !paths.is_empty() {
        info!(memory_id = %id, count = paths.len(), "storage cleanup");
        if let Err(err) = state.service.bucket(MEMORIES_BUCKET).remove(&paths).await {
            warn!(memory_id = %id, error = %err, "storage cleanup failed, continuing with row delete");
        }
    }

    state
        .service
        .from("memories")
        .delete()
        .eq("id", id)
        .eq("user_id", user.id)
        .execute()
        .await?;

    Ok(Json(json!({
        "message": "Memory and associated files deleted successfully."
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds_first_page() {
        assert_eq!(page_bounds(1, 12), (0, 11));
    }

    #[test]
    fn test_page_bounds_second_page_of_twelve() {
        // Rows 13-24 by descending creation time.
        assert_eq!(page_bounds(2, 12), (12, 23));
    }

    #[test]
    fn test_page_bounds_zero_page_clamps_to_first() {
        assert_eq!(page_bounds(0, 20), (0, 19));
    }

    #[test]
    fn test_page_bounds_huge_page_saturates() {
        let (from, to) = page_bounds(u64::MAX, 12);
        assert!(to >= from);
    }

    #[test]
    fn test_sanitize_search_strips_filter_structure() {
        assert_eq!(sanitize_search_term("beach, (sunset)"), "beach sunset");
        assert_eq!(sanitize_search_term(r#"a"b\c"#), "abc");
        assert_eq!(sanitize_search_term("plain trip"), "plain trip");
    }

    #[test]
    fn test_sanitize_search_keeps_wildcards() {
        assert_eq!(sanitize_search_term("bea%ch"), "bea%ch");
    }
}
