//! Optional content enrichment (spec.md §1 "out of scope" for the core,
//! SPEC_FULL.md §15): for each result entity, fetch a content blob from a
//! content-addressed store keyed by a hash of the entity's canonical
//! identifier, and attach it to the response. The core's data model never
//! sees this — enrichment happens entirely at the API layer.

use std::collections::HashMap;
use std::path::PathBuf;

use query_core::collaborators::BoxFuture;

/// Read-only access to content blobs, addressed by a hash of some caller
/// key (here, an entity identifier).
pub trait ContentStore: Send + Sync {
    fn fetch<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<String>>;
}

fn content_hash(key: &str) -> String {
    blake3::hash(key.as_bytes()).to_hex().to_string()
}

/// Blobs stored as files named by `content_hash`, under a base directory.
pub struct FsContentStore {
    base_dir: PathBuf,
}

impl FsContentStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }
}

impl ContentStore for FsContentStore {
    fn fetch<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            let path = self.base_dir.join(content_hash(key));
            tokio::fs::read_to_string(path).await.ok()
        })
    }
}

/// An in-memory stand-in keyed directly by entity id, useful for tests and
/// small deployments that don't warrant a filesystem store.
#[derive(Default)]
pub struct InMemoryContentStore {
    blobs: HashMap<String, String>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(mut self, entity_id: impl Into<String>, body: impl Into<String>) -> Self {
        self.blobs.insert(entity_id.into(), body.into());
        self
    }
}

impl ContentStore for InMemoryContentStore {
    fn fetch<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move { self.blobs.get(key).cloned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_returns_stored_blob() {
        let store = InMemoryContentStore::new().with_blob("gw", "George Washington biography");
        assert_eq!(store.fetch("gw").await, Some("George Washington biography".to_string()));
        assert_eq!(store.fetch("missing").await, None);
    }

    #[tokio::test]
    async fn fs_store_reads_blob_named_by_content_hash() {
        let dir = std::env::temp_dir().join(format!("query-api-test-{}", content_hash("unique-test-key")));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let hash = content_hash("gw");
        tokio::fs::write(dir.join(&hash), "blob body").await.unwrap();

        let store = FsContentStore::new(&dir);
        assert_eq!(store.fetch("gw").await, Some("blob body".to_string()));
        assert_eq!(store.fetch("missing").await, None);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
