//! Integration tests for tag identifier resolution.
//!
//! Exercises the find-or-create and association logic against an
//! in-memory repository: UUID identifiers pass straight through, names
//! match case-insensitively, unknown names create tags, and repeated
//! identifiers converge on a single association.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use keepsake_api::services::{parse_tag_identifiers, resolve_and_link_tags};
use keepsake_core::{Error, Result, Tag, TagRepository};

#[derive(Default)]
struct InMemoryTags {
    tags: Mutex<HashMap<String, Tag>>,
    links: Mutex<Vec<(Uuid, Uuid)>>,
    fail_creates: bool,
}

impl InMemoryTags {
    fn with_tag(self, name: &str) -> Self {
        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.tags
            .lock()
            .unwrap()
            .insert(name.to_lowercase(), tag);
        self
    }

    fn tag_id(&self, name: &str) -> Uuid {
        self.tags.lock().unwrap()[&name.to_lowercase()].id
    }

    fn links(&self) -> Vec<(Uuid, Uuid)> {
        self.links.lock().unwrap().clone()
    }
}

#[async_trait]
impl TagRepository for InMemoryTags {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        Ok(self.tags.lock().unwrap().get(&name.to_lowercase()).cloned())
    }

    async fn create(&self, name: &str) -> Result<Uuid> {
        if self.fail_creates {
            return Err(Error::Store("insert rejected".into()));
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        let id = tag.id;
        self.tags.lock().unwrap().insert(name.to_lowercase(), tag);
        Ok(id)
    }

    async fn link_to_memory(&self, memory_id: Uuid, tag_id: Uuid) -> Result<()> {
        let mut links = self.links.lock().unwrap();
        if !links.contains(&(memory_id, tag_id)) {
            links.push((memory_id, tag_id));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_uuid_identifiers_pass_through() {
    let repo = InMemoryTags::default();
    let memory_id = Uuid::new_v4();
    let existing = Uuid::new_v4();

    let linked = resolve_and_link_tags(&repo, memory_id, &[existing.to_string()])
        .await
        .unwrap();

    assert_eq!(linked, 1);
    assert_eq!(repo.links(), vec![(memory_id, existing)]);
    // No tag row was created for a UUID identifier.
    assert!(repo.tags.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_names_match_case_insensitively() {
    let repo = InMemoryTags::default().with_tag("Summer");
    let memory_id = Uuid::new_v4();

    let linked = resolve_and_link_tags(&repo, memory_id, &["summer".to_string()])
        .await
        .unwrap();

    assert_eq!(linked, 1);
    assert_eq!(repo.links(), vec![(memory_id, repo.tag_id("Summer"))]);
    assert_eq!(repo.tags.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_names_create_tags() {
    let repo = InMemoryTags::default();
    let memory_id = Uuid::new_v4();

    let linked = resolve_and_link_tags(&repo, memory_id, &["beach".to_string()])
        .await
        .unwrap();

    assert_eq!(linked, 1);
    assert_eq!(repo.links(), vec![(memory_id, repo.tag_id("beach"))]);
}

#[tokio::test]
async fn test_case_variants_converge_on_one_association() {
    let repo = InMemoryTags::default();
    let memory_id = Uuid::new_v4();
    let identifiers = vec![
        "Summer".to_string(),
        "summer".to_string(),
        "SUMMER".to_string(),
    ];

    resolve_and_link_tags(&repo, memory_id, &identifiers)
        .await
        .unwrap();

    assert_eq!(repo.tags.lock().unwrap().len(), 1);
    assert_eq!(repo.links().len(), 1);
}

#[tokio::test]
async fn test_mixed_uuids_and_names() {
    let repo = InMemoryTags::default().with_tag("family");
    let memory_id = Uuid::new_v4();
    let existing = Uuid::new_v4();
    let identifiers = vec![
        existing.to_string(),
        "family".to_string(),
        "new-trip".to_string(),
    ];

    let linked = resolve_and_link_tags(&repo, memory_id, &identifiers)
        .await
        .unwrap();

    assert_eq!(linked, 3);
    assert_eq!(repo.links().len(), 3);
}

#[tokio::test]
async fn test_failed_creation_skips_without_aborting() {
    let repo = InMemoryTags {
        fail_creates: true,
        ..Default::default()
    }
    .with_tag("kept");
    let memory_id = Uuid::new_v4();
    let identifiers = vec!["doomed".to_string(), "kept".to_string()];

    let linked = resolve_and_link_tags(&repo, memory_id, &identifiers)
        .await
        .unwrap();

    assert_eq!(linked, 1);
    assert_eq!(repo.links(), vec![(memory_id, repo.tag_id("kept"))]);
}

#[tokio::test]
async fn test_parse_then_resolve_json_payload() {
    let repo = InMemoryTags::default();
    let memory_id = Uuid::new_v4();

    let identifiers = parse_tag_identifiers(r#"["sunset", "road trip"]"#);
    let linked = resolve_and_link_tags(&repo, memory_id, &identifiers)
        .await
        .unwrap();

    assert_eq!(linked, 2);
    assert_eq!(repo.tags.lock().unwrap().len(), 2);
}
