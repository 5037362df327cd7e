//! Concrete implementations of the `query-core` collaborator traits:
//! an in-memory reference graph/vector store for tests and small
//! deployments, a Qdrant-backed vector index, and an Ollama-backed
//! embedder for production use.

pub mod memory;
pub mod ollama;
pub mod qdrant;

pub use memory::{InMemoryGraph, InMemoryGraphBuilder};
pub use ollama::{OllamaConfig, OllamaEmbedder};
pub use qdrant::{QdrantConfig, QdrantVectorIndex};
