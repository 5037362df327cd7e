//! Entry resolver (spec §4.3): turns an [`EntryPoint`] into initial
//! candidate paths.

use crate::ast::EntryPoint;
use crate::collaborators::Collaborators;
use crate::error::{QueryError, QueryResult};
use crate::model::LineageScope;
use crate::path::{CandidatePath, EntityStep};

pub async fn resolve(
    entry: &EntryPoint,
    k_explore: usize,
    collab: &Collaborators<'_>,
    lineage: Option<&LineageScope>,
) -> QueryResult<Vec<CandidatePath>> {
    match entry {
        EntryPoint::ExactId(id) => resolve_exact_id(id, collab).await,
        EntryPoint::SemanticText(text) => resolve_semantic_text(text, None, k_explore, collab, lineage).await,
        EntryPoint::TypeOnly(types) => resolve_type_only(types, k_explore, collab, lineage).await,
        EntryPoint::TypePlusSemantic { types, text } => {
            resolve_semantic_text(text, Some(types), k_explore, collab, lineage).await
        }
    }
}

async fn resolve_exact_id(id: &str, collab: &Collaborators<'_>) -> QueryResult<Vec<CandidatePath>> {
    let entity = collab
        .graph
        .fetch_entity(id)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "graph store fetch_entity failed for entry resolution"))?;
    Ok(match entity {
        Some(e) => vec![CandidatePath::from_entry(EntityStep {
            id: e.id,
            label: e.label,
            type_tag: e.type_tag,
            score: Some(1.0),
        })],
        None => Vec::new(),
    })
}

async fn resolve_semantic_text(
    text: &str,
    types: Option<&[String]>,
    k_explore: usize,
    collab: &Collaborators<'_>,
    lineage: Option<&LineageScope>,
) -> QueryResult<Vec<CandidatePath>> {
    let embeddings = collab
        .embedder
        .embed(std::slice::from_ref(&text.to_string()))
        .await
        .inspect_err(|e| tracing::error!(error = %e, "embedder call failed for entry text"))?;
    let embedding = embeddings
        .into_iter()
        .next()
        .ok_or_else(|| QueryError::Collaborator("embedder returned no vector for entry text".into()))?;

    let hits = collab
        .vector
        .query_by_embedding(&embedding, k_explore, types, lineage)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "vector index query failed for entry resolution"))?;

    hits_to_candidates(hits, collab, lineage).await
}

async fn resolve_type_only(
    types: &[String],
    k_explore: usize,
    collab: &Collaborators<'_>,
    lineage: Option<&LineageScope>,
) -> QueryResult<Vec<CandidatePath>> {
    let hits = collab
        .vector
        .sample_by_type(types, k_explore, lineage)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "vector index sample_by_type failed for entry resolution"))?;
    hits_to_candidates(hits, collab, lineage).await
}

async fn hits_to_candidates(
    hits: Vec<crate::collaborators::VectorHit>,
    collab: &Collaborators<'_>,
    lineage: Option<&LineageScope>,
) -> QueryResult<Vec<CandidatePath>> {
    if hits.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = hits.iter().map(|h| h.id.clone()).collect();
    let entities = collab
        .graph
        .fetch_entities(&ids)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "graph store fetch_entities failed for entry resolution"))?;

    let mut candidates = Vec::with_capacity(hits.len());
    for hit in hits {
        let Some(entity) = entities.get(&hit.id) else { continue };
        if let Some(scope) = lineage {
            if !scope.allows(&entity.source_collections) {
                continue;
            }
        }
        candidates.push(CandidatePath::from_entry(EntityStep {
            id: entity.id.clone(),
            label: entity.label.clone(),
            type_tag: entity.type_tag.clone(),
            score: Some(hit.score.clamp(0.0, 1.0)),
        }));
    }
    Ok(candidates)
}
