//! Album HTTP handlers: listing, creation, membership, and ZIP export.

use std::io::{Cursor, Write};

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use keepsake_core::{Album, AlbumMemoryRef, Memory};
use keepsake_store::{derive_storage_path, Order, MEMORIES_BUCKET};

use crate::auth::{AdminAuthed, Authed};
use crate::error::ApiError;
use crate::handlers::memories::create_memory_from_file;
use crate::shape::{album_admin_summary, album_detail, album_with_cover};
use crate::state::AppState;
use crate::upload::collect_multipart;

const ALBUM_COVER_JOINS: &str = "*, album_memories (memory:memories (media (file_url)))";
const ALBUM_DETAIL_JOINS: &str =
    "*, album_memories (memory:memories (*, media (file_url, file_type)))";

/// Collapse whitespace runs to underscores for archive file names.
pub(crate) fn underscore_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// `GET /api/albums` — the caller's albums with cover URLs and counts.
pub async fn list_albums(
    State(state): State<AppState>,
    Authed(user): Authed,
) -> Result<Json<Value>, ApiError> {
    let albums: Vec<Album> = state
        .anon
        .from("albums")
        .select(ALBUM_COVER_JOINS)
        .eq("user_id", user.id)
        .order("created_at", Order::Desc)
        .fetch()
        .await?;

    let data: Vec<Value> = albums.iter().map(album_with_cover).collect();
    Ok(Json(Value::Array(data)))
}

/// `GET /api/albums/all` — admin view of every album with its
/// creator's name.
pub async fn list_all_albums(
    State(state): State<AppState>,
    AdminAuthed(_admin): AdminAuthed,
) -> Result<Json<Value>, ApiError> {
    let albums: Vec<Album> = state
        .service
        .from("albums")
        .select("*, profiles:user_id (name), album_memories (memory_id)")
        .order("created_at", Order::Desc)
        .fetch()
        .await?;

    let data: Vec<Value> = albums.iter().map(album_admin_summary).collect();
    Ok(Json(json!({ "data": data })))
}

#[derive(Debug, Deserialize)]
pub struct CreateAlbumRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// `POST /api/albums` — create an empty album for the caller.
pub async fn create_album(
    State(state): State<AppState>,
    Authed(user): Authed,
    Json(request): Json<CreateAlbumRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Album name is required".into()))?;

    let album: Album = state
        .service
        .from("albums")
        .insert(json!({
            "user_id": user.id,
            "name": name,
            "description": request.description,
        }))
        .select("*")
        .fetch_one()
        .await?;

    Ok((StatusCode::CREATED, Json(serde_json::to_value(&album)?)))
}

/// `GET /api/albums/:id` — one owned album with its flattened memory
/// list. Any lookup failure surfaces as 404.
pub async fn get_album(
    State(state): State<AppState>,
    Authed(user): Authed,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let album: Album = state
        .service
        .from("albums")
        .select(ALBUM_DETAIL_JOINS)
        .eq("id", id)
        .eq("user_id", user.id)
        .fetch_one()
        .await
        .map_err(|_| ApiError::NotFound("Album not found".into()))?;

    Ok(Json(album_detail(&album)))
}

#[derive(Debug, Deserialize)]
pub struct LinkMemoriesRequest {
    #[serde(default, rename = "memoryIds")]
    pub memory_ids_camel: Option<Vec<Uuid>>,
    #[serde(default)]
    pub memory_ids: Option<Vec<Uuid>>,
}

impl LinkMemoriesRequest {
    fn ids(self) -> Vec<Uuid> {
        self.memory_ids_camel
            .or(self.memory_ids)
            .unwrap_or_default()
    }
}

/// `POST /api/albums/:id/memories` — two intake modes on one route,
/// switched by content type: a JSON body links existing memories into
/// the album, a multipart body uploads new files as memories born
/// inside it.
pub async fn add_memories_to_album(
    State(state): State<AppState>,
    Authed(user): Authed,
    Path(album_id): Path<Uuid>,
    request: Request,
) -> Result<Json<Value>, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("Upload error: {}", e)))?;
        let body = collect_multipart(multipart).await?;
        if body.files.is_empty() {
            return Err(ApiError::BadRequest("No files or memory IDs provided.".into()));
        }

        let location = body.field("location").unwrap_or("").to_string();
        let mut created: Vec<Memory> = Vec::new();
        for file in &body.files {
            let title = body
                .field("title")
                .unwrap_or(file.file_name.as_str())
                .to_string();
            let result =
                create_memory_from_file(&state, user.id, &title, &location, Some(album_id), file)
                    .await;
            let memory = match result {
                Ok(memory) => memory,
                Err(err) => {
                    warn!(file = %file.file_name, error = ?err, "album upload item failed, skipping");
                    continue;
                }
            };

            // The join row is what album views read; album_id on the
            // memory row is informational.
            if let Err(err) = state
                .service
                .from("album_memories")
                .upsert(
                    json!({ "album_id": album_id, "memory_id": memory.id }),
                    "album_id,memory_id",
                )
                .execute()
                .await
            {
                warn!(memory_id = %memory.id, error = %err, "album link failed for uploaded memory");
            }
            created.push(memory);
        }

        info!(album_id = %album_id, count = created.len(), "memories uploaded to album");
        return Ok(Json(json!({
            "message": "Memories uploaded to album",
            "memories": created,
        })));
    }

    let Json(payload) = Json::<LinkMemoriesRequest>::from_request(request, &())
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let ids = payload.ids();
    if ids.is_empty() {
        return Err(ApiError::BadRequest("No files or memory IDs provided.".into()));
    }

    let rows: Vec<Value> = ids
        .iter()
        .map(|memory_id| json!({ "album_id": album_id, "memory_id": memory_id }))
        .collect();
    state
        .service
        .from("album_memories")
        .upsert(Value::Array(rows), "album_id,memory_id")
        .execute()
        .await?;

    Ok(Json(json!({ "message": "Memories linked successfully" })))
}

/// `DELETE /api/albums/:id/memories/:memory_id` — unlink one memory.
/// The memory row itself survives.
pub async fn remove_memory_from_album(
    State(state): State<AppState>,
    Authed(user): Authed,
    Path((album_id, memory_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    let client = if user.is_admin() {
        &state.service
    } else {
        &state.anon
    };

    client
        .from("album_memories")
        .delete()
        .eq("album_id", album_id)
        .eq("memory_id", memory_id)
        .execute()
        .await?;

    Ok(Json(json!({ "message": "Memory removed from album" })))
}

/// `DELETE /api/albums/:id` — drop the join rows first, then the album
/// row. Memories linked to the album are never deleted.
pub async fn delete_album(
    State(state): State<AppState>,
    Authed(user): Authed,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let is_admin = user.is_admin();
    let client = if is_admin { &state.service } else { &state.anon };

    client
        .from("album_memories")
        .delete()
        .eq("album_id", id)
        .execute()
        .await?;

    let mut query = client.from("albums").delete().eq("id", id);
    if !is_admin {
        query = query.eq("user_id", user.id);
    }
    query.execute().await?;

    Ok(Json(json!({ "message": "Album and its links deleted successfully" })))
}

#[derive(Deserialize)]
struct ArchiveAlbum {
    name: Option<String>,
    user_id: Uuid,
    #[serde(default)]
    memories: Vec<AlbumMemoryRef>,
}

/// `GET /api/albums/:id/download` — stream the album's media as a ZIP
/// attachment. Owner or admin only; entries whose blob cannot be
/// fetched are skipped so one bad object never sinks the export.
pub async fn download_album(
    State(state): State<AppState>,
    Authed(user): Authed,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let album: ArchiveAlbum = state
        .service
        .from("albums")
        .select("name, user_id, memories:album_memories (memory:memories (id, user_id, title, media (file_url)))")
        .eq("id", id)
        .fetch_one()
        .await
        .map_err(|_| ApiError::NotFound("Album not found".into()))?;

    if !user.is_admin() && album.user_id != user.id {
        return Err(ApiError::Forbidden("Unauthorized".into()));
    }

    let archive_err = |e: zip::result::ZipError| ApiError::Internal(format!("archive build failed: {}", e));
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let bucket = state.service.bucket(MEMORIES_BUCKET);

    for memory in album.memories.iter().filter_map(|am| am.memory.as_ref()) {
        let Some(file_url) = memory.media.first().and_then(|m| m.file_url.as_deref()) else {
            continue;
        };
        let Some(path) = derive_storage_path(file_url) else {
            continue;
        };

        let data = match bucket.download(&path).await {
            Ok(data) => data,
            Err(err) => {
                warn!(path, error = %err, "download failed, skipping archive entry");
                continue;
            }
        };

        let extension = path.rsplit_once('.').map(|(_, e)| e).unwrap_or("jpg");
        let title = memory.title.as_deref().unwrap_or("photo");
        let id_string = memory.id.to_string();
        let entry_name = format!(
            "{}_{}.{}",
            underscore_whitespace(title),
            &id_string[..5],
            extension
        );

        writer.start_file(entry_name, options).map_err(archive_err)?;
        writer
            .write_all(&data)
            .map_err(|e| ApiError::Internal(format!("archive write failed: {}", e)))?;
    }

    let bytes = writer.finish().map_err(archive_err)?.into_inner();
    let album_name = album.name.as_deref().unwrap_or("album");
    let disposition = format!(
        "attachment; filename={}.zip",
        underscore_whitespace(album_name)
    );

    info!(album_id = %id, bytes = bytes.len(), "album archive built");
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
