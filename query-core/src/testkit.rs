//! In-memory collaborator fixtures for tests.
//!
//! These are not a production graph store / vector index — they are a
//! minimal, deterministic stand-in used by this crate's own unit and
//! integration tests (and usable by downstream crates writing tests against
//! the engine without standing up a real graph database or embedding
//! service).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::collaborators::{
    BoxFuture, CollabResult, Collaborators, Embedder, GraphStore, PathsResult, VectorHit, VectorIndex,
};
use crate::model::{Entity, LineageScope, RelationshipSet};

#[derive(Default)]
pub struct FakeCollaborators {
    entities: HashMap<String, Entity>,
    relationships: HashMap<String, RelationshipSet>,
    query_responses: Mutex<VecDeque<Vec<VectorHit>>>,
    sample_responses: Mutex<VecDeque<Vec<VectorHit>>>,
    rank_responses: Mutex<VecDeque<Vec<VectorHit>>>,
    find_paths_responses: Mutex<VecDeque<PathsResult>>,
    reachable_responses: Mutex<VecDeque<PathsResult>>,
}

impl FakeCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.insert(entity.id.clone(), entity);
        self
    }

    pub fn with_relationships(mut self, id: impl Into<String>, set: RelationshipSet) -> Self {
        self.relationships.insert(id.into(), set);
        self
    }

    pub fn push_query_hits(self, hits: Vec<VectorHit>) -> Self {
        self.query_responses.lock().unwrap().push_back(hits);
        self
    }

    pub fn push_sample_hits(self, hits: Vec<VectorHit>) -> Self {
        self.sample_responses.lock().unwrap().push_back(hits);
        self
    }

    pub fn push_rank_hits(self, hits: Vec<VectorHit>) -> Self {
        self.rank_responses.lock().unwrap().push_back(hits);
        self
    }

    pub fn push_paths(self, result: PathsResult) -> Self {
        self.find_paths_responses.lock().unwrap().push_back(result);
        self
    }

    pub fn push_reachable(self, result: PathsResult) -> Self {
        self.reachable_responses.lock().unwrap().push_back(result);
        self
    }

    pub fn as_collaborators(&self) -> Collaborators<'_> {
        Collaborators { graph: self, vector: self, embedder: self }
    }
}

impl GraphStore for FakeCollaborators {
    fn fetch_entity<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CollabResult<Option<Entity>>> {
        Box::pin(async move { Ok(self.entities.get(id).cloned()) })
    }

    fn fetch_entities<'a>(
        &'a self,
        ids: &'a [String],
    ) -> BoxFuture<'a, CollabResult<HashMap<String, Entity>>> {
        Box::pin(async move {
            Ok(ids
                .iter()
                .filter_map(|id| self.entities.get(id).cloned().map(|e| (id.clone(), e)))
                .collect())
        })
    }

    fn fetch_relationships<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CollabResult<RelationshipSet>> {
        Box::pin(async move { Ok(self.relationships.get(id).cloned().unwrap_or_default()) })
    }

    fn find_paths<'a>(
        &'a self,
        _sources: &'a [String],
        _targets: &'a [String],
        _max_depth: u32,
        _lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<PathsResult>> {
        Box::pin(async move {
            Ok(self.find_paths_responses.lock().unwrap().pop_front().unwrap_or_default())
        })
    }

    fn reachable_by_type<'a>(
        &'a self,
        _sources: &'a [String],
        _type_tag: &'a str,
        _max_depth: u32,
        _lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<PathsResult>> {
        Box::pin(async move {
            Ok(self.reachable_responses.lock().unwrap().pop_front().unwrap_or_default())
        })
    }
}

impl VectorIndex for FakeCollaborators {
    fn query_by_embedding<'a>(
        &'a self,
        _embedding: &'a [f32],
        _k: usize,
        _types: Option<&'a [String]>,
        _lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>> {
        Box::pin(async move { Ok(self.query_responses.lock().unwrap().pop_front().unwrap_or_default()) })
    }

    fn rank_among<'a>(
        &'a self,
        _ids: &'a [String],
        _embedding: &'a [f32],
    ) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>> {
        Box::pin(async move { Ok(self.rank_responses.lock().unwrap().pop_front().unwrap_or_default()) })
    }

    fn sample_by_type<'a>(
        &'a self,
        _types: &'a [String],
        _k: usize,
        _lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>> {
        Box::pin(async move { Ok(self.sample_responses.lock().unwrap().pop_front().unwrap_or_default()) })
    }
}

impl Embedder for FakeCollaborators {
    fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, CollabResult<Vec<Vec<f32>>>> {
        Box::pin(async move { Ok(texts.iter().map(|t| fake_embedding(t)).collect()) })
    }
}

/// A deterministic, content-derived stand-in for a real embedding: identical
/// text always yields an identical (and thus maximally similar) vector, and
/// distinct text yields a distinct one — enough for tests that exercise
/// fuzzy-relation rescoring without a real embedding model.
fn fake_embedding(text: &str) -> Vec<f32> {
    let mut seed: u64 = 0xcbf29ce484222325;
    for byte in text.bytes() {
        seed ^= byte as u64;
        seed = seed.wrapping_mul(0x100000001b3);
    }
    (0..4)
        .map(|i| {
            let mut s = seed.wrapping_add(i).wrapping_mul(0x2545F4914F6CDD1D);
            s ^= s >> 33;
            (s as i64 as f64 / i64::MAX as f64) as f32
        })
        .collect()
}
