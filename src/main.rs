use std::error::Error;
use std::sync::Arc;

use query_api::{AppState, ServerConfig, build_router};
use query_api::enrichment::{ContentStore, FsContentStore, InMemoryContentStore};
use query_api::lineage::{CollectionHierarchy, InMemoryHierarchy};
use query_collaborators::{InMemoryGraphBuilder, OllamaConfig, OllamaEmbedder, QdrantConfig, QdrantVectorIndex};
use query_core::EngineConfig;
use query_core::collaborators::{Embedder, GraphStore, VectorIndex};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file.
    // Fails if .env file not found, not readable or invalid.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let engine_config = EngineConfig::from_env();
    let server_config = ServerConfig::from_env();

    let (graph, vector): (Arc<dyn GraphStore>, Arc<dyn VectorIndex>) = if std::env::var("QP_QDRANT_URL").is_ok() {
        tracing::info!("using qdrant-backed vector index");
        let qdrant = Arc::new(QdrantVectorIndex::connect(QdrantConfig::from_env())?);
        let graph = Arc::new(InMemoryGraphBuilder::new().build());
        (graph, qdrant)
    } else {
        tracing::info!("no QP_QDRANT_URL set, using in-memory reference graph and vector index");
        let memory = Arc::new(InMemoryGraphBuilder::new().build());
        (memory.clone(), memory)
    };

    let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(OllamaConfig::from_env()));

    let content_store: Arc<dyn ContentStore> = match std::env::var("QP_CONTENT_DIR") {
        Ok(dir) => Arc::new(FsContentStore::new(dir)),
        Err(_) => Arc::new(InMemoryContentStore::new()),
    };

    let hierarchy: Arc<dyn CollectionHierarchy> = Arc::new(InMemoryHierarchy::new());

    let state = Arc::new(AppState { graph, vector, embedder, engine_config, content_store, hierarchy });

    let router = build_router(state, &server_config);

    tracing::info!(bind_addr = %server_config.bind_addr, "starting path query engine");
    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
