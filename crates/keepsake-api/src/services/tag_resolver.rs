//! Tag identifier resolution.
//!
//! Memory creation accepts tag identifiers that are either existing
//! tag UUIDs or free-text names. Names resolve case-insensitively to
//! an existing tag or create one on first use; every resolved id is
//! then idempotently associated with the memory.
//!
//! Logic lives here, over the [`TagRepository`] capability, so it is
//! exercised against an in-memory repository in tests without the
//! HTTP layer or a live store.

use tracing::warn;
use uuid::Uuid;

use keepsake_core::{Result, TagRepository};

/// Parse the raw `tags` form field into individual identifiers.
///
/// Clients send either a JSON array string (`["summer","beach"]`) or a
/// comma-separated list (`summer, beach`). Blank entries drop out.
pub fn parse_tag_identifiers(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let entries: Vec<String> = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<String>>(trimmed)
            .unwrap_or_else(|_| vec![trimmed.to_string()])
    } else {
        trimmed.split(',').map(str::to_string).collect()
    };

    entries
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Resolve each identifier to a tag id and associate it with the
/// memory. Returns the number of associations made.
///
/// A failed tag creation skips that identifier rather than aborting
/// the batch; association itself is an idempotent upsert, so repeated
/// identifiers (including case variants of one name) converge on a
/// single association.
pub async fn resolve_and_link_tags<R: TagRepository + ?Sized>(
    repo: &R,
    memory_id: Uuid,
    identifiers: &[String],
) -> Result<usize> {
    let mut linked = 0;

    for identifier in identifiers {
        let tag_id = match Uuid::parse_str(identifier) {
            Ok(id) => id,
            Err(_) => match repo.find_by_name(identifier).await? {
                Some(tag) => tag.id,
                None => match repo.create(identifier).await {
                    Ok(id) => id,
                    Err(err) => {
                        warn!(tag = %identifier, error = %err, "tag creation failed, skipping");
                        continue;
                    }
                },
            },
        };

        repo.link_to_memory(memory_id, tag_id).await?;
        linked += 1;
    }

    Ok(linked)
}
