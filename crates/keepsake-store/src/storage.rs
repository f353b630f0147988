//! Object storage client: path-addressed blobs in store buckets.

use bytes::Bytes;
use serde_json::json;
use tracing::debug;

use keepsake_core::{Error, Result};

use crate::client::StoreClient;

/// Bucket holding all memory media blobs.
pub const MEMORIES_BUCKET: &str = "memories";

/// Handle on one object-storage bucket.
pub struct StorageBucket<'a> {
    client: &'a StoreClient,
    bucket: String,
}

impl<'a> StorageBucket<'a> {
    pub(crate) fn new(client: &'a StoreClient, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    /// Upload a blob, overwriting any existing object at `path`.
    pub async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let url = self.object_url(path);
        let response = self
            .client
            .request(self.client.http.post(&url))
            .header("x-upsert", "true")
            .header("Content-Type", content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("upload of {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Storage(format!(
                "upload of {} returned {}: {}",
                path, status, body
            )));
        }

        debug!(path, bucket = %self.bucket, "blob uploaded");
        Ok(())
    }

    /// Download a blob by path.
    pub async fn download(&self, path: &str) -> Result<Bytes> {
        let url = self.object_url(path);
        let response = self
            .client
            .request(self.client.http.get(&url))
            .send()
            .await
            .map_err(|e| Error::Storage(format!("download of {} failed: {}", path, e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("object {}", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Storage(format!(
                "download of {} returned {}: {}",
                path, status, body
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| Error::Storage(format!("download of {} truncated: {}", path, e)))
    }

    /// Best-effort bulk delete of blob paths.
    pub async fn remove(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = format!(
            "{}/storage/v1/object/{}",
            self.client.base_url, self.bucket
        );
        let response = self
            .client
            .request(self.client.http.delete(&url))
            .json(&json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| Error::Storage(format!("bulk delete failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Storage(format!(
                "bulk delete returned {}: {}",
                status, body
            )));
        }

        debug!(count = paths.len(), bucket = %self.bucket, "blobs removed");
        Ok(())
    }

    /// Public URL for a stored path. Pure string construction; the
    /// bucket must have public read enabled for the URL to resolve.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.client.base_url, self.bucket, path
        )
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.client.base_url, self.bucket, path
        )
    }
}

/// Derive the bucket-relative storage path from a media row's
/// `file_url`, which may be stored as a relative path or as any of the
/// absolute public-URL shapes the application has written historically.
///
/// Returns `None` when no storage path can be recovered, so callers
/// skip the blob instead of issuing a delete for a garbage path.
pub fn derive_storage_path(file_url: &str) -> Option<String> {
    let trimmed = file_url.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Drop any query string before inspecting the path.
    let without_query = trimmed.split('?').next().unwrap_or(trimmed);

    if !without_query.starts_with("http://") && !without_query.starts_with("https://") {
        // Already a bucket-relative path.
        return Some(without_query.trim_start_matches('/').to_string());
    }

    // Canonical public-URL shape.
    if let Some((_, rest)) = without_query.split_once("/public/memories/") {
        if !rest.is_empty() {
            return Some(rest.to_string());
        }
        return None;
    }

    // Other absolute shapes: take everything after the bucket segment.
    let segments: Vec<&str> = without_query.split('/').collect();
    let bucket_pos = segments.iter().position(|s| *s == MEMORIES_BUCKET)?;
    let rest = &segments[bucket_pos + 1..];
    if rest.is_empty() || rest.iter().all(|s| s.is_empty()) {
        return None;
    }
    Some(rest.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_passes_through() {
        assert_eq!(
            derive_storage_path("user1/mem1/display-abc.jpg").as_deref(),
            Some("user1/mem1/display-abc.jpg")
        );
    }

    #[test]
    fn test_leading_slash_stripped() {
        assert_eq!(
            derive_storage_path("/user1/mem1/display-abc.jpg").as_deref(),
            Some("user1/mem1/display-abc.jpg")
        );
    }

    #[test]
    fn test_public_url_form() {
        let url = "https://xyz.supabase.co/storage/v1/object/public/memories/u/m/audio-1.mp3";
        assert_eq!(derive_storage_path(url).as_deref(), Some("u/m/audio-1.mp3"));
    }

    #[test]
    fn test_public_url_with_query_string() {
        let url = "https://xyz.supabase.co/storage/v1/object/public/memories/u/m/a.jpg?download=1";
        assert_eq!(derive_storage_path(url).as_deref(), Some("u/m/a.jpg"));
    }

    #[test]
    fn test_signed_url_form_after_bucket_segment() {
        let url = "https://xyz.supabase.co/storage/v1/object/sign/memories/u/m/a.jpg";
        assert_eq!(derive_storage_path(url).as_deref(), Some("u/m/a.jpg"));
    }

    #[test]
    fn test_url_without_bucket_is_none() {
        assert_eq!(derive_storage_path("https://cdn.example.com/other/a.jpg"), None);
    }

    #[test]
    fn test_empty_and_bare_bucket_are_none() {
        assert_eq!(derive_storage_path(""), None);
        assert_eq!(derive_storage_path("   "), None);
        assert_eq!(
            derive_storage_path("https://xyz.supabase.co/storage/v1/object/public/memories/"),
            None
        );
    }
}
