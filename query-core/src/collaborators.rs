//! Collaborator contracts (spec §4.7): graph store, vector index, embedder.
//!
//! The core depends only on these traits; concrete implementations (a real
//! graph database, Qdrant, an embedding service) live outside this crate.
//! Methods return boxed futures rather than using `async fn` in the trait so
//! the traits stay dyn-compatible — the driver holds `Arc<dyn GraphStore>`
//! etc., the same way the teacher's `EmbeddingsProvider` trait is consumed
//! as a trait object.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::ast::Direction;
use crate::error::QueryError;
use crate::model::{Entity, LineageScope, RelationshipSet};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error surfaced by a concrete collaborator adapter (transport, auth,
/// malformed response, ...). Converts into [`QueryError::Collaborator`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        CollaboratorError(message.into())
    }
}

impl From<CollaboratorError> for QueryError {
    fn from(err: CollaboratorError) -> Self {
        QueryError::Collaborator(err.0)
    }
}

pub type CollabResult<T> = Result<T, CollaboratorError>;

/// A single labelled endpoint of a graph path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEndpoint {
    pub id: String,
    pub label: String,
    pub type_tag: String,
}

/// One edge traversed along a returned path, oriented as actually walked.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdgeStep {
    pub from: PathEndpoint,
    pub predicate: String,
    pub to: PathEndpoint,
    pub direction: Direction,
}

/// An ordered sequence of edges connecting a source to a target.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    pub source_id: String,
    pub target_id: String,
    pub edges: Vec<GraphEdgeStep>,
}

impl GraphPath {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Result of a path/reachability query: the paths found plus whether the
/// graph store truncated exploration before exhausting the search space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathsResult {
    pub paths: Vec<GraphPath>,
    pub truncated: bool,
}

/// A match returned by the vector index: identifier, similarity score in
/// `[0, 1]`, and opaque metadata the adapter chooses to surface.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub id: String,
    pub score: f32,
}

/// Read-only access to the canonical entity/relationship graph.
pub trait GraphStore: Send + Sync {
    fn fetch_entity<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CollabResult<Option<Entity>>>;

    fn fetch_entities<'a>(
        &'a self,
        ids: &'a [String],
    ) -> BoxFuture<'a, CollabResult<HashMap<String, Entity>>>;

    fn fetch_relationships<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CollabResult<RelationshipSet>>;

    /// Paths between every (source, target) pair within `[1, max_depth]` hops.
    fn find_paths<'a>(
        &'a self,
        sources: &'a [String],
        targets: &'a [String],
        max_depth: u32,
        lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<PathsResult>>;

    /// All entities of `type_tag` reachable from `sources` within `max_depth` hops.
    fn reachable_by_type<'a>(
        &'a self,
        sources: &'a [String],
        type_tag: &'a str,
        max_depth: u32,
        lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<PathsResult>>;
}

/// Nearest-neighbour search over entity embeddings.
pub trait VectorIndex: Send + Sync {
    fn query_by_embedding<'a>(
        &'a self,
        embedding: &'a [f32],
        k: usize,
        types: Option<&'a [String]>,
        lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>>;

    /// Restrict the search to a caller-provided identifier set and rank by text.
    fn rank_among<'a>(
        &'a self,
        ids: &'a [String],
        embedding: &'a [f32],
    ) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>>;

    /// Up to `k` arbitrary entities matching `types`, with no ranking text —
    /// used by a bare type-only entry point (spec §4.3). Scores are the
    /// index's own notion of relevance (e.g. recency) and are not comparable
    /// across calls the way a semantic score is.
    fn sample_by_type<'a>(
        &'a self,
        types: &'a [String],
        k: usize,
        lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>>;
}

/// Bundles the three collaborator handles the driver threads through every
/// stage, mirroring how the engine's per-query state is otherwise stateless.
pub struct Collaborators<'a> {
    pub graph: &'a dyn GraphStore,
    pub vector: &'a dyn VectorIndex,
    pub embedder: &'a dyn Embedder,
}

/// Batched text-to-vector embedding.
pub trait Embedder: Send + Sync {
    fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, CollabResult<Vec<Vec<f32>>>>;
}
