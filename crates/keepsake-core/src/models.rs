//! Domain models for keepsake.
//!
//! These are the row shapes as seen by this service. Storage semantics
//! (constraints, RLS, cascades) are owned by the external store; the
//! structs here only need to deserialize what the store's REST surface
//! returns, including embedded join resources.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller role resolved from the profiles table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Authenticated caller identity, resolved once per request by the
/// authentication gate and passed by value into handlers.
#[derive(Debug, Clone, Serialize)]
pub struct AuthPrincipal {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthPrincipal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Media classification stored on media rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// True for media that renders in the memory card (image or video).
    pub fn is_visual(&self) -> bool {
        matches!(self, MediaKind::Image | MediaKind::Video)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

/// A user profile row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// Embedded profile fragment returned by joined selects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRef {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// A tag row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// An embedded `memory_tags` join row carrying its tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryTagRef {
    #[serde(default)]
    pub tags: Option<Tag>,
}

/// An embedded media fragment on a memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_type: Option<MediaKind>,
}

/// A memory row, optionally with embedded media/tag/profile joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub memory_date: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_milestone: Option<bool>,
    #[serde(default)]
    pub album_id: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub memory_tags: Vec<MemoryTagRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<ProfileRef>,
}

/// An embedded `album_memories` join row.
///
/// Depending on the select, either only `memory_id` (counting) or the
/// full `memory` resource (flattening) is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumMemoryRef {
    #[serde(default)]
    pub memory_id: Option<Uuid>,
    #[serde(default)]
    pub memory: Option<Memory>,
}

/// An album row, optionally with embedded join graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub album_memories: Vec<AlbumMemoryRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<ProfileRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_deserializes_lowercase() {
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert!(role.is_admin());
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert!(!role.is_admin());
    }

    #[test]
    fn test_media_kind_visual() {
        assert!(MediaKind::Image.is_visual());
        assert!(MediaKind::Video.is_visual());
        assert!(!MediaKind::Audio.is_visual());
    }

    #[test]
    fn test_memory_deserializes_embedded_joins() {
        let json = serde_json::json!({
            "id": "4a1f2a50-9d6e-4c58-8b7d-0f6f1f6f2a10",
            "user_id": "0b9c7e18-2f4d-4a6e-b4e0-5a2d9c8e7f61",
            "title": "Beach day",
            "is_milestone": false,
            "media": [
                { "file_url": "u/m/display-abc.jpg", "file_type": "image" }
            ],
            "memory_tags": [
                { "tags": { "id": "7c2f1e34-5a6b-4c7d-8e9f-0a1b2c3d4e5f", "name": "summer" } },
                { "tags": null }
            ]
        });
        let memory: Memory = serde_json::from_value(json).unwrap();
        assert_eq!(memory.media.len(), 1);
        assert_eq!(memory.memory_tags.len(), 2);
        assert!(memory.memory_tags[1].tags.is_none());
        assert_eq!(memory.media[0].file_type, Some(MediaKind::Image));
    }

    #[test]
    fn test_memory_tolerates_missing_joins() {
        let json = serde_json::json!({
            "id": "4a1f2a50-9d6e-4c58-8b7d-0f6f1f6f2a10",
            "user_id": "0b9c7e18-2f4d-4a6e-b4e0-5a2d9c8e7f61"
        });
        let memory: Memory = serde_json::from_value(json).unwrap();
        assert!(memory.media.is_empty());
        assert!(memory.memory_tags.is_empty());
        assert!(memory.profiles.is_none());
    }

    #[test]
    fn test_album_count_only_join() {
        let json = serde_json::json!({
            "id": "1f2e3d4c-5b6a-4978-8675-4c3b2a190807",
            "user_id": "0b9c7e18-2f4d-4a6e-b4e0-5a2d9c8e7f61",
            "name": "Trips",
            "album_memories": [
                { "memory_id": "4a1f2a50-9d6e-4c58-8b7d-0f6f1f6f2a10" }
            ]
        });
        let album: Album = serde_json::from_value(json).unwrap();
        assert_eq!(album.album_memories.len(), 1);
        assert!(album.album_memories[0].memory.is_none());
    }
}
