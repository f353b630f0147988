//! Live [`TagRepository`] implementation over the store's rows.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use keepsake_core::{Result, Tag, TagRepository};

use crate::client::StoreClient;

#[derive(Deserialize)]
struct IdRow {
    id: Uuid,
}

#[async_trait]
impl TagRepository for StoreClient {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        self.from("tags")
            .select("id, name")
            .ilike("name", name)
            .fetch_optional::<Tag>()
            .await
    }

    async fn create(&self, name: &str) -> Result<Uuid> {
        let row = self
            .from("tags")
            .insert(json!({ "name": name }))
            .select("id")
            .fetch_one::<IdRow>()
            .await?;
        Ok(row.id)
    }

    async fn link_to_memory(&self, memory_id: Uuid, tag_id: Uuid) -> Result<()> {
        self.from("memory_tags")
            .upsert(
                json!({ "memory_id": memory_id, "tag_id": tag_id }),
                "memory_id,tag_id",
            )
            .execute()
            .await
    }
}
