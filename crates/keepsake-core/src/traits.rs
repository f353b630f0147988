//! Repository traits for keepsake abstractions.
//!
//! These traits sit at the seams where handler logic needs a test
//! double instead of the live store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Tag;

/// Tag persistence capability.
///
/// Tag resolution (UUID passthrough, case-insensitive find-or-create,
/// idempotent association) is pure logic over this trait, so it can be
/// exercised against an in-memory implementation in tests.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Find a tag by case-insensitive exact name match.
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// Create a tag with the given name, returning its id.
    async fn create(&self, name: &str) -> Result<Uuid>;

    /// Idempotently associate a tag with a memory. Duplicate pairs are
    /// ignored, not errors.
    async fn link_to_memory(&self, memory_id: Uuid, tag_id: Uuid) -> Result<()>;
}
