use std::sync::Arc;

use query_core::collaborators::{Embedder, GraphStore, VectorIndex};
use query_core::config::EngineConfig;

use crate::enrichment::ContentStore;
use crate::lineage::CollectionHierarchy;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<dyn GraphStore>,
    pub vector: Arc<dyn VectorIndex>,
    pub embedder: Arc<dyn Embedder>,
    pub engine_config: EngineConfig,
    pub content_store: Arc<dyn ContentStore>,
    pub hierarchy: Arc<dyn CollectionHierarchy>,
}
