//! Response-shape flattening.
//!
//! Pure transformations from the store's nested join results to the
//! flat DTOs the frontend consumes. No I/O here; URL resolution is
//! string construction over the configured store endpoint.

use serde_json::{json, Value};

use keepsake_core::{Album, Memory, Tag};

/// Resolve a stored `file_url` to something a browser can fetch.
///
/// Relative paths become public bucket URLs; absolute URLs pass
/// through untouched.
pub fn resolve_public_url(store_url: &str, file_url: &str) -> String {
    if file_url.starts_with("http://") || file_url.starts_with("https://") {
        return file_url.to_string();
    }
    format!(
        "{}/storage/v1/object/public/memories/{}",
        store_url.trim_end_matches('/'),
        file_url
    )
}

/// Flatten one memory row with embedded joins into the response DTO:
/// first visual media → `display_url`/`media_type`, first audio media
/// → `voice_url`, tag join rows → flat `{id, name}` list.
pub fn flatten_memory(memory: &Memory, store_url: &str) -> Value {
    let visual = memory
        .media
        .iter()
        .find(|m| m.file_type.map(|k| k.is_visual()).unwrap_or(false));
    let audio = memory
        .media
        .iter()
        .find(|m| m.file_type.map(|k| !k.is_visual()).unwrap_or(false));

    let resolve = |url: Option<&String>| -> Value {
        url.map(|u| Value::String(resolve_public_url(store_url, u)))
            .unwrap_or(Value::Null)
    };

    let tags: Vec<Tag> = memory
        .memory_tags
        .iter()
        .filter_map(|mt| mt.tags.clone())
        .collect();

    let mut flat = serde_json::to_value(memory).unwrap_or_else(|_| json!({}));
    if let Some(map) = flat.as_object_mut() {
        map.insert("display_url".into(), resolve(visual.and_then(|m| m.file_url.as_ref())));
        map.insert(
            "media_type".into(),
            Value::String(
                visual
                    .and_then(|m| m.file_type)
                    .map(|k| k.as_str().to_string())
                    .unwrap_or_else(|| "image".to_string()),
            ),
        );
        map.insert("voice_url".into(), resolve(audio.and_then(|m| m.file_url.as_ref())));
        map.insert("tags".into(), serde_json::to_value(tags).unwrap_or(Value::Null));
        map.remove("memory_tags");
    }
    flat
}

/// Album list entry for the owner view: the raw row plus
/// `total_memories` and a `cover_url` taken from the first linked
/// memory's first media file.
pub fn album_with_cover(album: &Album) -> Value {
    let cover_url = album
        .album_memories
        .first()
        .and_then(|am| am.memory.as_ref())
        .and_then(|m| m.media.first())
        .and_then(|m| m.file_url.clone());

    let mut value = serde_json::to_value(album).unwrap_or_else(|_| json!({}));
    if let Some(map) = value.as_object_mut() {
        map.insert("total_memories".into(), json!(album.album_memories.len()));
        map.insert("cover_url".into(), cover_url.map(Value::String).unwrap_or(Value::Null));
    }
    value
}

/// Album list entry for the admin view: a trimmed row with the
/// creator's name and the linked-memory count.
pub fn album_admin_summary(album: &Album) -> Value {
    let creator = album
        .profiles
        .as_ref()
        .and_then(|p| p.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    json!({
        "id": album.id,
        "name": album.name,
        "description": album.description,
        "creator": creator,
        "total_memories": album.album_memories.len(),
        "created_at": album.created_at,
    })
}

/// Album detail: the album row plus a flat `memories` list where each
/// entry carries a `display_url` from its first media file. Join rows
/// whose memory is missing (deleted out from under the join) drop out.
pub fn album_detail(album: &Album) -> Value {
    let memories: Vec<Value> = album
        .album_memories
        .iter()
        .filter_map(|am| am.memory.as_ref())
        .map(|memory| {
            let display_url = memory.media.first().and_then(|m| m.file_url.clone());
            let mut value = serde_json::to_value(memory).unwrap_or_else(|_| json!({}));
            if let Some(map) = value.as_object_mut() {
                map.insert(
                    "display_url".into(),
                    display_url.map(Value::String).unwrap_or(Value::Null),
                );
            }
            value
        })
        .collect();

    let mut value = serde_json::to_value(album).unwrap_or_else(|_| json!({}));
    if let Some(map) = value.as_object_mut() {
        map.remove("album_memories");
        map.insert("memories".into(), Value::Array(memories));
    }
    value
}
