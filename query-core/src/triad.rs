//! Triad executor (spec §4.4): the per-hop routing table over a graph store,
//! a vector index, and an embedder. Each hop is resolved independently of
//! the others — the driver is what threads candidates from one hop to the
//! next.

use std::collections::HashMap;

use crate::ast::{Filter, Hop, RelationMatch};
use crate::collaborators::{Collaborators, Embedder, VectorHit};
use crate::config::EngineConfig;
use crate::error::{QueryError, QueryResult};
use crate::model::{Entity, LineageScope};
use crate::path::{CandidatePath, EdgeStep, EntityStep, PathStep};

/// Result of resolving one hop: the surviving candidates plus bookkeeping
/// the driver folds into response metadata (spec §6).
#[derive(Debug, Default)]
pub struct HopOutcome {
    pub candidates: Vec<CandidatePath>,
    pub candidates_explored: usize,
    pub truncated: bool,
}

pub async fn execute_hop(
    hop: &Hop,
    sources: &[CandidatePath],
    beam_width: usize,
    config: &EngineConfig,
    collab: &Collaborators<'_>,
    lineage: Option<&LineageScope>,
) -> QueryResult<HopOutcome> {
    if sources.is_empty() {
        return Ok(HopOutcome::default());
    }
    let max_depth = hop.depth.clamped_max(config.max_depth);
    let min_depth = hop.depth.min;
    let source_ids: Vec<String> = sources.iter().map(|c| c.current_entity().id.clone()).collect();

    tracing::debug!(
        relation = ?hop.relation,
        filter = ?hop.filter,
        depth_min = min_depth,
        depth_max = max_depth,
        beam_width,
        sources = sources.len(),
        "executing hop"
    );

    let outcome = match &hop.filter {
        None => HopOutcome::default(),
        Some(Filter::SemanticText(text)) => {
            semantic_hop(hop, sources, &source_ids, text, None, beam_width, max_depth, min_depth, config, collab, lineage)
                .await?
        }
        Some(Filter::TypeSetPlusSemantic { types, text }) => {
            semantic_hop(hop, sources, &source_ids, text, Some(types), beam_width, max_depth, min_depth, config, collab, lineage)
                .await?
        }
        Some(Filter::TypeSet(types)) => {
            type_set_hop(hop, sources, &source_ids, types, max_depth, min_depth, collab, lineage).await?
        }
        Some(Filter::ExactId(id)) => {
            exact_id_hop(hop, sources, &source_ids, id, max_depth, min_depth, collab, lineage).await?
        }
    };

    Ok(cap_candidates(outcome, config.max_candidates_per_hop))
}

/// Spec §5: safety cap on candidates materialised per hop. Candidates beyond
/// the configured limit are dropped from the carried-forward set and the hop
/// is marked truncated; `candidates_explored` still reports the full count.
fn cap_candidates(mut outcome: HopOutcome, max_candidates_per_hop: usize) -> HopOutcome {
    if outcome.candidates.len() > max_candidates_per_hop {
        tracing::warn!(
            materialised = outcome.candidates.len(),
            cap = max_candidates_per_hop,
            "hop candidates truncated by max_candidates_per_hop"
        );
        outcome.candidates.truncate(max_candidates_per_hop);
        outcome.truncated = true;
    }
    outcome
}

#[allow(clippy::too_many_arguments)]
async fn semantic_hop(
    hop: &Hop,
    sources: &[CandidatePath],
    source_ids: &[String],
    text: &str,
    types: Option<&[String]>,
    beam_width: usize,
    max_depth: u32,
    min_depth: u32,
    config: &EngineConfig,
    collab: &Collaborators<'_>,
    lineage: Option<&LineageScope>,
) -> QueryResult<HopOutcome> {
    let embeddings = collab
        .embedder
        .embed(std::slice::from_ref(&text.to_string()))
        .await
        .inspect_err(|e| tracing::error!(error = %e, "embedder call failed for hop text"))?;
    let embedding = embeddings
        .into_iter()
        .next()
        .ok_or_else(|| QueryError::Collaborator("embedder returned no vector for hop text".into()))?;

    let hits = collab
        .vector
        .query_by_embedding(&embedding, beam_width, types, lineage)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "vector index query failed for hop"))?;
    if hits.is_empty() {
        return Ok(HopOutcome::default());
    }

    let target_ids: Vec<String> = hits.iter().map(|h| h.id.clone()).collect();
    let target_entities = collab
        .graph
        .fetch_entities(&target_ids)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "graph store fetch_entities failed for hop"))?;
    let target_scores: HashMap<String, f32> =
        hits.iter().map(|h| (h.id.clone(), h.score.clamp(0.0, 1.0))).collect();

    let paths = collab
        .graph
        .find_paths(source_ids, &target_ids, max_depth, lineage)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "graph store find_paths failed for hop"))?;
    let source_by_id = index_sources(sources);

    let mut candidates = build_candidates(&paths.paths, &source_by_id, &target_entities, &target_scores, min_depth);
    if let RelationMatch::Fuzzy(terms) = &hop.relation {
        candidates = fuzzy_rescore(candidates, terms, collab.embedder).await?;
    }

    if paths.paths.is_empty() {
        candidates.extend(no_path_fallback(sources, &hits, &target_entities, &target_scores, config, beam_width));
    }

    Ok(HopOutcome { candidates_explored: candidates.len(), candidates, truncated: paths.truncated })
}

#[allow(clippy::too_many_arguments)]
async fn type_set_hop(
    hop: &Hop,
    sources: &[CandidatePath],
    source_ids: &[String],
    types: &[String],
    max_depth: u32,
    min_depth: u32,
    collab: &Collaborators<'_>,
    lineage: Option<&LineageScope>,
) -> QueryResult<HopOutcome> {
    let mut all_paths = Vec::new();
    let mut truncated = false;
    for type_tag in types {
        let result = collab
            .graph
            .reachable_by_type(source_ids, type_tag, max_depth, lineage)
            .await
            .inspect_err(|e| tracing::error!(error = %e, type_tag, "graph store reachable_by_type failed for hop"))?;
        truncated |= result.truncated;
        all_paths.extend(result.paths);
    }
    if all_paths.is_empty() {
        return Ok(HopOutcome { truncated, ..HopOutcome::default() });
    }

    let target_ids: Vec<String> = all_paths.iter().map(|p| p.target_id.clone()).collect();
    let target_entities = collab
        .graph
        .fetch_entities(&target_ids)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "graph store fetch_entities failed for hop"))?;
    let source_by_id = index_sources(sources);

    let mut candidates = build_candidates(&all_paths, &source_by_id, &target_entities, &HashMap::new(), min_depth);
    if let RelationMatch::Fuzzy(terms) = &hop.relation {
        candidates = fuzzy_rescore(candidates, terms, collab.embedder).await?;
    }
    Ok(HopOutcome { candidates_explored: candidates.len(), candidates, truncated })
}

#[allow(clippy::too_many_arguments)]
async fn exact_id_hop(
    hop: &Hop,
    sources: &[CandidatePath],
    source_ids: &[String],
    target_id: &str,
    max_depth: u32,
    min_depth: u32,
    collab: &Collaborators<'_>,
    lineage: Option<&LineageScope>,
) -> QueryResult<HopOutcome> {
    let targets = vec![target_id.to_string()];
    let paths = collab
        .graph
        .find_paths(source_ids, &targets, max_depth, lineage)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "graph store find_paths failed for hop"))?;
    if paths.paths.is_empty() {
        return Ok(HopOutcome { truncated: paths.truncated, ..HopOutcome::default() });
    }

    let target_entities = collab
        .graph
        .fetch_entities(&targets)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "graph store fetch_entities failed for hop"))?;
    let source_by_id = index_sources(sources);
    let mut candidates = build_candidates(&paths.paths, &source_by_id, &target_entities, &HashMap::new(), min_depth);
    if let RelationMatch::Fuzzy(terms) = &hop.relation {
        candidates = fuzzy_rescore(candidates, terms, collab.embedder).await?;
    }
    Ok(HopOutcome { candidates_explored: candidates.len(), candidates, truncated: paths.truncated })
}

fn index_sources(sources: &[CandidatePath]) -> HashMap<&str, &CandidatePath> {
    sources.iter().map(|c| (c.current_entity().id.as_str(), c)).collect()
}

/// Fold graph-store paths into extended, deduplicated candidates (spec
/// §4.4's scoring formula and "dedup by terminal identifier" rule).
fn build_candidates(
    paths: &[crate::collaborators::GraphPath],
    source_by_id: &HashMap<&str, &CandidatePath>,
    target_entities: &HashMap<String, Entity>,
    target_scores: &HashMap<String, f32>,
    min_depth: u32,
) -> Vec<CandidatePath> {
    let mut by_target: HashMap<String, CandidatePath> = HashMap::new();

    for graph_path in paths {
        if (graph_path.len() as u32) < min_depth {
            continue;
        }
        let Some(source) = source_by_id.get(graph_path.source_id.as_str()) else { continue };
        let Some(target_entity) = target_entities.get(&graph_path.target_id) else { continue };
        let target_s = target_scores.get(&graph_path.target_id).copied().unwrap_or(1.0);
        let source_s = source.score;
        let decay = 0.9f32.powi(graph_path.len().max(1) as i32 - 1);
        let blended = ((source_s + target_s) / 2.0) * decay;
        let new_score = (source.score * blended).clamp(0.0, 1.0);

        let mut hops = Vec::with_capacity(graph_path.edges.len());
        for (idx, edge) in graph_path.edges.iter().enumerate() {
            let entity = if idx + 1 == graph_path.edges.len() {
                EntityStep {
                    id: target_entity.id.clone(),
                    label: target_entity.label.clone(),
                    type_tag: target_entity.type_tag.clone(),
                    score: Some(target_s),
                }
            } else {
                EntityStep { id: edge.to.id.clone(), label: edge.to.label.clone(), type_tag: edge.to.type_tag.clone(), score: None }
            };
            hops.push((EdgeStep::real(edge.predicate.clone(), edge.direction), entity));
        }

        let Some(extended) = source.extend_many(hops, new_score) else { continue };
        by_target
            .entry(graph_path.target_id.clone())
            .and_modify(|existing| {
                if extended.score > existing.score {
                    *existing = extended.clone();
                }
            })
            .or_insert(extended);
    }

    by_target.into_values().collect()
}

/// Spec §4.4: when a semantic hop's graph query returns no paths, emit up to
/// `limit` synthetic one-step candidates off the highest-scoring source, each
/// carrying a sentinel "no path found" edge and the fixed penalty factor.
fn no_path_fallback(
    sources: &[CandidatePath],
    hits: &[VectorHit],
    target_entities: &HashMap<String, Entity>,
    target_scores: &HashMap<String, f32>,
    config: &EngineConfig,
    limit: usize,
) -> Vec<CandidatePath> {
    let Some(base) = sources.iter().max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
    else {
        return Vec::new();
    };

    hits.iter()
        .take(limit)
        .filter_map(|hit| {
            let entity = target_entities.get(&hit.id)?;
            if base.has_visited(&entity.id) {
                return None;
            }
            let target_s = target_scores.get(&hit.id).copied().unwrap_or(hit.score.clamp(0.0, 1.0));
            let new_score = (target_s * config.no_path_penalty).clamp(0.0, 1.0);
            let entity_step = EntityStep {
                id: entity.id.clone(),
                label: entity.label.clone(),
                type_tag: entity.type_tag.clone(),
                score: Some(target_s),
            };
            base.extend(EdgeStep::sentinel_no_path(), entity_step, new_score)
        })
        .collect()
}

/// Spec §4.4: embed the distinct edge predicates appearing in `candidates`
/// alongside the query's relation terms in one batch, then multiply each
/// candidate's score by the best cosine similarity of its edge to any term.
async fn fuzzy_rescore(
    candidates: Vec<CandidatePath>,
    terms: &[String],
    embedder: &dyn Embedder,
) -> QueryResult<Vec<CandidatePath>> {
    if candidates.is_empty() {
        return Ok(candidates);
    }

    let mut predicates: Vec<String> = Vec::new();
    for candidate in &candidates {
        if let Some(PathStep::Edge(edge)) = last_edge(candidate) {
            if !edge.no_path_found && !predicates.contains(&edge.predicate) {
                predicates.push(edge.predicate.clone());
            }
        }
    }
    if predicates.is_empty() {
        return Ok(candidates);
    }

    let mut batch = predicates.clone();
    batch.extend(terms.iter().cloned());
    let embeddings = embedder.embed(&batch).await.inspect_err(|e| tracing::error!(error = %e, "embedder call failed for fuzzy rescore"))?;
    let (predicate_embeds, term_embeds) = embeddings.split_at(predicates.len());

    let similarity: HashMap<&str, f32> = predicates
        .iter()
        .zip(predicate_embeds)
        .map(|(pred, emb)| (pred.as_str(), crate::similarity::max_similarity(emb, term_embeds)))
        .collect();

    Ok(candidates
        .into_iter()
        .map(|candidate| {
            let mut steps = candidate.steps().to_vec();
            let mut factor = 1.0f32;
            if let Some(PathStep::Edge(edge)) = steps.iter_mut().rev().find(|s| matches!(s, PathStep::Edge(_))) {
                if !edge.no_path_found {
                    let sim = similarity.get(edge.predicate.as_str()).copied().unwrap_or(0.0);
                    edge.score = Some(sim);
                    factor = sim;
                }
            }
            let new_score = candidate.score * factor;
            candidate.rescored(new_score, steps)
        })
        .collect())
}

fn last_edge(candidate: &CandidatePath) -> Option<&PathStep> {
    candidate.steps().iter().rev().find(|s| matches!(s, PathStep::Edge(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Direction, DepthRange};
    use crate::collaborators::{GraphEdgeStep, GraphPath, PathEndpoint, PathsResult};
    use crate::model::Entity;
    use crate::path::EntityStep;
    use crate::testkit::FakeCollaborators;

    fn entry(id: &str) -> CandidatePath {
        CandidatePath::from_entry(EntityStep { id: id.into(), label: id.into(), type_tag: "person".into(), score: Some(1.0) })
    }

    fn hop(filter: Filter) -> Hop {
        Hop { direction: Direction::Outgoing, relation: RelationMatch::Wildcard, depth: DepthRange::SINGLE, filter: Some(filter) }
    }

    fn hop_with_depth(filter: Filter, depth: DepthRange) -> Hop {
        Hop { direction: Direction::Outgoing, relation: RelationMatch::Wildcard, depth, filter: Some(filter) }
    }

    fn edge(from: &str, predicate: &str, to: &str) -> GraphEdgeStep {
        GraphEdgeStep {
            from: PathEndpoint { id: from.into(), label: from.into(), type_tag: "person".into() },
            predicate: predicate.into(),
            to: PathEndpoint { id: to.into(), label: to.into(), type_tag: "organization".into() },
            direction: Direction::Outgoing,
        }
    }

    #[tokio::test]
    async fn depth_range_min_excludes_paths_shorter_than_min() {
        let fakes = FakeCollaborators::new()
            .with_entity(Entity { id: "too-short".into(), label: "too-short".into(), type_tag: "organization".into(), properties: Default::default(), source_collections: vec![] })
            .with_entity(Entity { id: "long-enough".into(), label: "long-enough".into(), type_tag: "organization".into(), properties: Default::default(), source_collections: vec![] })
            .push_reachable(PathsResult {
                paths: vec![
                    GraphPath { source_id: "gw".into(), target_id: "too-short".into(), edges: vec![edge("gw", "affiliated", "too-short")] },
                    GraphPath {
                        source_id: "gw".into(),
                        target_id: "long-enough".into(),
                        edges: vec![edge("gw", "affiliated", "mid"), edge("mid", "affiliated", "long-enough")],
                    },
                ],
                truncated: false,
            });
        let collab = fakes.as_collaborators();
        let config = EngineConfig::default();
        let sources = vec![entry("gw")];
        let depth_hop = hop_with_depth(Filter::TypeSet(vec!["organization".into()]), DepthRange { min: 2, max: Some(2) });
        let outcome = execute_hop(&depth_hop, &sources, 5, &config, &collab, None).await.unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].current_entity().id, "long-enough");
    }

    #[tokio::test]
    async fn max_candidates_per_hop_caps_and_marks_truncated() {
        let fakes = FakeCollaborators::new()
            .with_entity(Entity { id: "org-a".into(), label: "org-a".into(), type_tag: "organization".into(), properties: Default::default(), source_collections: vec![] })
            .with_entity(Entity { id: "org-b".into(), label: "org-b".into(), type_tag: "organization".into(), properties: Default::default(), source_collections: vec![] })
            .push_reachable(PathsResult {
                paths: vec![
                    GraphPath { source_id: "gw".into(), target_id: "org-a".into(), edges: vec![edge("gw", "affiliated", "org-a")] },
                    GraphPath { source_id: "gw".into(), target_id: "org-b".into(), edges: vec![edge("gw", "affiliated", "org-b")] },
                ],
                truncated: false,
            });
        let collab = fakes.as_collaborators();
        let config = EngineConfig { max_candidates_per_hop: 1, ..EngineConfig::default() };
        let sources = vec![entry("gw")];
        let outcome =
            execute_hop(&hop(Filter::TypeSet(vec!["organization".into()])), &sources, 5, &config, &collab, None).await.unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert!(outcome.truncated);
        assert_eq!(outcome.candidates_explored, 2);
    }

    #[tokio::test]
    async fn semantic_hop_extends_and_scores() {
        let fakes = FakeCollaborators::new()
            .with_entity(Entity { id: "tj".into(), label: "Thomas Jefferson".into(), type_tag: "person".into(), properties: Default::default(), source_collections: vec![] })
            .push_query_hits(vec![VectorHit { id: "tj".into(), score: 0.8 }])
            .push_paths(PathsResult {
                paths: vec![GraphPath {
                    source_id: "gw".into(),
                    target_id: "tj".into(),
                    edges: vec![GraphEdgeStep {
                        from: PathEndpoint { id: "gw".into(), label: "gw".into(), type_tag: "person".into() },
                        predicate: "knows".into(),
                        to: PathEndpoint { id: "tj".into(), label: "tj".into(), type_tag: "person".into() },
                        direction: Direction::Outgoing,
                    }],
                }],
                truncated: false,
            });
        let collab = fakes.as_collaborators();
        let config = EngineConfig::default();
        let sources = vec![entry("gw")];
        let outcome = execute_hop(&hop(Filter::SemanticText("founders".into())), &sources, 5, &config, &collab, None)
            .await
            .unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].current_entity().id, "tj");
        assert!((outcome.candidates[0].score - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn semantic_hop_falls_back_when_no_paths_found() {
        let fakes = FakeCollaborators::new()
            .with_entity(Entity { id: "tj".into(), label: "Thomas Jefferson".into(), type_tag: "person".into(), properties: Default::default(), source_collections: vec![] })
            .push_query_hits(vec![VectorHit { id: "tj".into(), score: 0.6 }])
            .push_paths(PathsResult::default());
        let collab = fakes.as_collaborators();
        let config = EngineConfig::default();
        let sources = vec![entry("gw")];
        let outcome = execute_hop(&hop(Filter::SemanticText("founders".into())), &sources, 5, &config, &collab, None)
            .await
            .unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        let candidate = &outcome.candidates[0];
        assert!((candidate.score - 0.3).abs() < 1e-6);
        assert!(matches!(candidate.steps().first().unwrap(), PathStep::Entity(_)));
        match &candidate.steps()[1] {
            PathStep::Edge(e) => assert!(e.no_path_found),
            _ => panic!("expected an edge step"),
        }
    }

    #[tokio::test]
    async fn type_set_hop_dedupes_by_terminal_id() {
        let fakes = FakeCollaborators::new()
            .with_entity(Entity { id: "org".into(), label: "Continental Congress".into(), type_tag: "organization".into(), properties: Default::default(), source_collections: vec![] })
            .push_reachable(PathsResult {
                paths: vec![
                    GraphPath {
                        source_id: "gw".into(),
                        target_id: "org".into(),
                        edges: vec![GraphEdgeStep {
                            from: PathEndpoint { id: "gw".into(), label: "gw".into(), type_tag: "person".into() },
                            predicate: "affiliated".into(),
                            to: PathEndpoint { id: "org".into(), label: "org".into(), type_tag: "organization".into() },
                            direction: Direction::Outgoing,
                        }],
                    },
                    GraphPath {
                        source_id: "tj".into(),
                        target_id: "org".into(),
                        edges: vec![GraphEdgeStep {
                            from: PathEndpoint { id: "tj".into(), label: "tj".into(), type_tag: "person".into() },
                            predicate: "affiliated".into(),
                            to: PathEndpoint { id: "org".into(), label: "org".into(), type_tag: "organization".into() },
                            direction: Direction::Outgoing,
                        }],
                    },
                ],
                truncated: false,
            });
        let collab = fakes.as_collaborators();
        let config = EngineConfig::default();
        let mut low = entry("tj");
        low.score = 0.4;
        let sources = vec![entry("gw"), low];
        let outcome = execute_hop(&hop(Filter::TypeSet(vec!["organization".into()])), &sources, 5, &config, &collab, None)
            .await
            .unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].current_entity().id, "org");
    }
}
