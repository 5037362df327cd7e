//! Reference `GraphStore` + `VectorIndex` over an in-process petgraph
//! directed graph and a linear-scan embedding table. Not meant to scale —
//! useful for tests, demos, and small deployments that don't warrant a real
//! graph database or vector store.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::{Direction as PetDirection, Graph};
use tokio::sync::RwLock;

use query_core::ast::Direction;
use query_core::collaborators::{
    BoxFuture, CollabResult, GraphEdgeStep, GraphPath, GraphStore, PathEndpoint, PathsResult, VectorHit,
    VectorIndex,
};
use query_core::model::{Entity, LineageScope, Properties, Relationship, RelationshipSet};
use query_core::similarity::cosine_similarity;

/// Caps how many nodes a single BFS walk will dequeue before giving up and
/// reporting `truncated` — mirrors the bounded expansion in
/// `codegraph-prep`'s neighbor-fill pass, just without its hop-decayed score.
const SCAN_LIMIT: usize = 10_000;

#[derive(Debug, Clone)]
struct EdgeData {
    predicate: String,
    properties: Properties,
    source_collection: String,
}

/// Builds an `InMemoryGraph`/`InMemoryVectorIndex` pair from entities,
/// edges, and embeddings, then hands out shared, interior-mutable handles.
#[derive(Default)]
pub struct InMemoryGraphBuilder {
    graph: Graph<Entity, EdgeData>,
    index: HashMap<String, NodeIndex>,
    embeddings: HashMap<String, Vec<f32>>,
}

impl InMemoryGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        let id = entity.id.clone();
        let idx = self.graph.add_node(entity);
        self.index.insert(id, idx);
        self
    }

    pub fn with_edge(
        mut self,
        subject_id: &str,
        predicate: impl Into<String>,
        object_id: &str,
        source_collection: impl Into<String>,
    ) -> Self {
        let s = *self.index.get(subject_id).expect("subject entity not added");
        let o = *self.index.get(object_id).expect("object entity not added");
        self.graph.add_edge(
            s,
            o,
            EdgeData { predicate: predicate.into(), properties: Properties::default(), source_collection: source_collection.into() },
        );
        self
    }

    pub fn with_embedding(mut self, id: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings.insert(id.into(), embedding);
        self
    }

    pub fn build(self) -> InMemoryGraph {
        InMemoryGraph { graph: self.graph, index: self.index, embeddings: RwLock::new(self.embeddings) }
    }
}

/// The graph half: entities and typed, labelled edges between them.
pub struct InMemoryGraph {
    graph: Graph<Entity, EdgeData>,
    index: HashMap<String, NodeIndex>,
    embeddings: RwLock<HashMap<String, Vec<f32>>>,
}

impl InMemoryGraph {
    fn endpoint(&self, idx: NodeIndex) -> PathEndpoint {
        let e = &self.graph[idx];
        PathEndpoint { id: e.id.clone(), label: e.label.clone(), type_tag: e.type_tag.clone() }
    }

    fn edge_allowed(&self, edge: &EdgeData, lineage: Option<&LineageScope>) -> bool {
        lineage.map(|l| l.collection_ids.contains(&edge.source_collection)).unwrap_or(true)
    }

    /// Breadth-first search from every source, bounded to `max_depth` hops
    /// and walking both edge directions, collecting one `GraphPath` per
    /// `accept`-ed node reached (spec §4.7: the store decides how to reach a
    /// target, the driver only consumes the resulting edges).
    fn bfs_paths(
        &self,
        sources: &[String],
        max_depth: u32,
        lineage: Option<&LineageScope>,
        accept: impl Fn(NodeIndex) -> bool,
    ) -> PathsResult {
        let mut paths = Vec::new();
        let mut truncated = false;

        for source_id in sources {
            let Some(&root) = self.index.get(source_id) else { continue };
            let mut visited: HashSet<NodeIndex> = HashSet::new();
            visited.insert(root);
            let mut queue: VecDeque<(NodeIndex, Vec<GraphEdgeStep>)> = VecDeque::new();
            queue.push_back((root, Vec::new()));
            let mut scanned = 0usize;

            while let Some((idx, path_so_far)) = queue.pop_front() {
                let depth = path_so_far.len() as u32;
                if depth > 0 && accept(idx) {
                    paths.push(GraphPath {
                        source_id: source_id.clone(),
                        target_id: self.graph[idx].id.clone(),
                        edges: path_so_far.clone(),
                    });
                }
                if depth == max_depth {
                    continue;
                }
                scanned += 1;
                if scanned > SCAN_LIMIT {
                    truncated = true;
                    break;
                }

                for e in self.graph.edges_directed(idx, PetDirection::Outgoing) {
                    if !self.edge_allowed(e.weight(), lineage) {
                        continue;
                    }
                    let next = e.target();
                    if visited.insert(next) {
                        let mut steps = path_so_far.clone();
                        steps.push(GraphEdgeStep {
                            from: self.endpoint(idx),
                            predicate: e.weight().predicate.clone(),
                            to: self.endpoint(next),
                            direction: Direction::Outgoing,
                        });
                        queue.push_back((next, steps));
                    }
                }
                for e in self.graph.edges_directed(idx, PetDirection::Incoming) {
                    if !self.edge_allowed(e.weight(), lineage) {
                        continue;
                    }
                    let prev = e.source();
                    if visited.insert(prev) {
                        let mut steps = path_so_far.clone();
                        steps.push(GraphEdgeStep {
                            from: self.endpoint(idx),
                            predicate: e.weight().predicate.clone(),
                            to: self.endpoint(prev),
                            direction: Direction::Incoming,
                        });
                        queue.push_back((prev, steps));
                    }
                }
            }
        }

        PathsResult { paths, truncated }
    }
}

impl GraphStore for InMemoryGraph {
    fn fetch_entity<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CollabResult<Option<Entity>>> {
        Box::pin(async move { Ok(self.index.get(id).map(|&idx| self.graph[idx].clone())) })
    }

    fn fetch_entities<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, CollabResult<HashMap<String, Entity>>> {
        Box::pin(async move {
            Ok(ids
                .iter()
                .filter_map(|id| self.index.get(id).map(|&idx| (id.clone(), self.graph[idx].clone())))
                .collect())
        })
    }

    fn fetch_relationships<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CollabResult<RelationshipSet>> {
        Box::pin(async move {
            let Some(&idx) = self.index.get(id) else { return Ok(RelationshipSet::default()) };

            let outgoing = self
                .graph
                .edges_directed(idx, PetDirection::Outgoing)
                .map(|e| Relationship {
                    subject_id: id.to_string(),
                    predicate: e.weight().predicate.clone(),
                    object_id: self.graph[e.target()].id.clone(),
                    properties: e.weight().properties.clone(),
                    source_collection: e.weight().source_collection.clone(),
                })
                .collect();

            let incoming = self
                .graph
                .edges_directed(idx, PetDirection::Incoming)
                .map(|e| Relationship {
                    subject_id: self.graph[e.source()].id.clone(),
                    predicate: e.weight().predicate.clone(),
                    object_id: id.to_string(),
                    properties: e.weight().properties.clone(),
                    source_collection: e.weight().source_collection.clone(),
                })
                .collect();

            Ok(RelationshipSet { outgoing, incoming })
        })
    }

    fn find_paths<'a>(
        &'a self,
        sources: &'a [String],
        targets: &'a [String],
        max_depth: u32,
        lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<PathsResult>> {
        Box::pin(async move {
            let target_set: HashSet<&str> = targets.iter().map(|s| s.as_str()).collect();
            Ok(self.bfs_paths(sources, max_depth, lineage, |idx| target_set.contains(self.graph[idx].id.as_str())))
        })
    }

    fn reachable_by_type<'a>(
        &'a self,
        sources: &'a [String],
        type_tag: &'a str,
        max_depth: u32,
        lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<PathsResult>> {
        Box::pin(async move { Ok(self.bfs_paths(sources, max_depth, lineage, |idx| self.graph[idx].type_tag == type_tag)) })
    }
}

impl VectorIndex for InMemoryGraph {
    fn query_by_embedding<'a>(
        &'a self,
        embedding: &'a [f32],
        k: usize,
        types: Option<&'a [String]>,
        lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>> {
        Box::pin(async move {
            let table = self.embeddings.read().await;
            let mut hits: Vec<VectorHit> = table
                .iter()
                .filter_map(|(id, vector)| {
                    let &idx = self.index.get(id)?;
                    let entity = &self.graph[idx];
                    if let Some(types) = types {
                        if !types.contains(&entity.type_tag) {
                            return None;
                        }
                    }
                    if let Some(lineage) = lineage {
                        if !lineage.allows(&entity.source_collections) {
                            return None;
                        }
                    }
                    Some(VectorHit { id: id.clone(), score: cosine_similarity(embedding, vector) })
                })
                .collect();
            hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
            hits.truncate(k);
            Ok(hits)
        })
    }

    fn rank_among<'a>(&'a self, ids: &'a [String], embedding: &'a [f32]) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>> {
        Box::pin(async move {
            let table = self.embeddings.read().await;
            let mut hits: Vec<VectorHit> = ids
                .iter()
                .filter_map(|id| table.get(id).map(|v| VectorHit { id: id.clone(), score: cosine_similarity(embedding, v) }))
                .collect();
            hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
            Ok(hits)
        })
    }

    fn sample_by_type<'a>(
        &'a self,
        types: &'a [String],
        k: usize,
        lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>> {
        Box::pin(async move {
            let mut hits: Vec<VectorHit> = self
                .index
                .values()
                .filter_map(|&idx| {
                    let entity = &self.graph[idx];
                    if !types.contains(&entity.type_tag) {
                        return None;
                    }
                    if let Some(lineage) = lineage {
                        if !lineage.allows(&entity.source_collections) {
                            return None;
                        }
                    }
                    Some(VectorHit { id: entity.id.clone(), score: 1.0 })
                })
                .collect();
            hits.sort_by(|a, b| a.id.cmp(&b.id));
            hits.truncate(k);
            Ok(hits)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_core::model::Properties as Props;

    fn entity(id: &str, type_tag: &str) -> Entity {
        Entity { id: id.into(), label: id.into(), type_tag: type_tag.into(), properties: Props::default(), source_collections: vec!["default".into()] }
    }

    fn fixture() -> InMemoryGraph {
        InMemoryGraphBuilder::new()
            .with_entity(entity("gw", "person"))
            .with_entity(entity("tj", "person"))
            .with_entity(entity("cc", "organization"))
            .with_entity(entity("d1732", "date"))
            .with_edge("gw", "BORN_ON", "d1732", "default")
            .with_edge("gw", "AFFILIATED_WITH", "cc", "default")
            .with_edge("tj", "AFFILIATED_WITH", "cc", "default")
            .with_embedding("gw", vec![1.0, 0.0])
            .with_embedding("tj", vec![0.9, 0.1])
            .build()
    }

    #[tokio::test]
    async fn find_paths_reaches_direct_target() {
        let g = fixture();
        let result = g.find_paths(&["gw".into()], &["d1732".into()], 2, None).await.unwrap();
        assert_eq!(result.paths.len(), 1);
        assert_eq!(result.paths[0].edges.len(), 1);
        assert_eq!(result.paths[0].edges[0].predicate, "BORN_ON");
    }

    #[tokio::test]
    async fn find_paths_walks_incoming_edges_for_two_hop_peer() {
        let g = fixture();
        let result = g.find_paths(&["gw".into()], &["tj".into()], 2, None).await.unwrap();
        assert_eq!(result.paths.len(), 1);
        assert_eq!(result.paths[0].edges.len(), 2);
        assert_eq!(result.paths[0].edges[1].direction, Direction::Incoming);
    }

    #[tokio::test]
    async fn reachable_by_type_finds_every_match_within_depth() {
        let g = fixture();
        let result = g.reachable_by_type(&["gw".into()], "person", 2, None).await.unwrap();
        let ids: HashSet<&str> = result.paths.iter().map(|p| p.target_id.as_str()).collect();
        assert_eq!(ids, HashSet::from(["tj"]));
    }

    #[tokio::test]
    async fn query_by_embedding_ranks_closest_first() {
        let g = fixture();
        let hits = g.query_by_embedding(&[1.0, 0.0], 5, None, None).await.unwrap();
        assert_eq!(hits[0].id, "gw");
    }

    #[tokio::test]
    async fn lineage_scope_excludes_edges_outside_allowed_collections() {
        let g = InMemoryGraphBuilder::new()
            .with_entity(entity("a", "person"))
            .with_entity(entity("b", "person"))
            .with_edge("a", "KNOWS", "b", "other-collection")
            .build();
        let scope = LineageScope { collection_ids: vec!["default".into()] };
        let result = g.find_paths(&["a".into()], &["b".into()], 2, Some(&scope)).await.unwrap();
        assert!(result.paths.is_empty());
    }
}
