//! Query driver (spec §4.5): orchestrates entry resolution, the entry
//! filter, and the hop sequence, and is the only component that assembles
//! response metadata.
//!
//! Errors in the five-member taxonomy (`parse_error`, `invalid_entry_point`,
//! `unsupported_query`, `no_entry_point`, `no_path_found`) are captured into
//! [`QueryResponse::error`] rather than propagated — "no 500-style bubbling
//! from the core" (spec §6). A collaborator failure or deadline expiry is a
//! genuine `Err`: those are infrastructure failures, not query outcomes.

use std::time::{Duration, Instant};

use crate::ast::{EntryPoint, Filter, Query};
use crate::beam;
use crate::collaborators::Collaborators;
use crate::entry_resolver;
use crate::error::{QueryError, QueryResult};
use crate::model::LineageScope;
use crate::path::{CandidatePath, PathStep};
use crate::triad;

#[derive(Debug, Clone, PartialEq)]
pub struct ResultPath {
    pub steps: Vec<PathStep>,
    pub score: f32,
}

impl From<CandidatePath> for ResultPath {
    fn from(candidate: CandidatePath) -> Self {
        ResultPath { steps: candidate.steps().to_vec(), score: candidate.score }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorInfo {
    pub tag: &'static str,
    pub reason: String,
    pub stopped_at_hop: Option<usize>,
    pub partial_path: Option<ResultPath>,
}

/// Running count of candidates materialised at each stage, folded across the
/// whole query (spec §4.5: "a running sum maintained by each stage").
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub query: String,
    pub hops: usize,
    pub k: usize,
    pub k_explore: usize,
    pub candidates_explored: usize,
    pub execution_time: Duration,
    pub results: Vec<ResultPath>,
    pub error: Option<ErrorInfo>,
    pub lineage: Option<LineageScope>,
}

pub async fn run(
    source: &str,
    query: &Query,
    k: Option<usize>,
    k_explore: Option<usize>,
    config: &crate::config::EngineConfig,
    collab: &Collaborators<'_>,
    lineage: Option<LineageScope>,
) -> QueryResult<QueryResponse> {
    let k = k.unwrap_or(config.default_k);
    let k_explore = k_explore.unwrap_or_else(|| config.default_k_explore()).max(k);

    match tokio::time::timeout(config.deadline, execute(source, query, k, k_explore, config, collab, lineage)).await {
        Ok(result) => result,
        Err(_) => Err(QueryError::DeadlineExceeded),
    }
}

async fn execute(
    source: &str,
    query: &Query,
    k: usize,
    k_explore: usize,
    config: &crate::config::EngineConfig,
    collab: &Collaborators<'_>,
    lineage: Option<LineageScope>,
) -> QueryResult<QueryResponse> {
    let started = Instant::now();
    let lineage_ref = lineage.as_ref();

    tracing::info!(query = source, hops = query.hops.len(), k, k_explore, "query received");

    if let Err(e) = query.validate() {
        return Ok(log_outcome(error_response(source, query, k, k_explore, 0, started, e, None, None, lineage)));
    }

    let mut candidates_explored = 0usize;

    // §4.3: a type-only entry with no hops and a semantic entry filter skips
    // sampling its own candidates entirely and resolves as one combined call.
    let deferred = match (query.hops.is_empty(), &query.entry, &query.entry_filter) {
        (true, EntryPoint::TypeOnly(types), Some(filter)) => deferred_entry(types, filter),
        _ => None,
    };

    let mut candidates = match &deferred {
        Some(combined) => entry_resolver::resolve(combined, k_explore, collab, lineage_ref).await?,
        None => entry_resolver::resolve(&query.entry, k_explore, collab, lineage_ref).await?,
    };
    candidates_explored += candidates.len();

    if candidates.is_empty() {
        return Ok(log_outcome(error_response(
            source,
            query,
            k,
            k_explore,
            candidates_explored,
            started,
            QueryError::NoEntryPoint,
            None,
            None,
            lineage,
        )));
    }

    if deferred.is_none() {
        if let Some(filter) = &query.entry_filter {
            candidates = apply_entry_filter(filter, candidates, collab).await?;
            if candidates.is_empty() {
                return Ok(log_outcome(error_response(
                    source,
                    query,
                    k,
                    k_explore,
                    candidates_explored,
                    started,
                    QueryError::NoEntryPoint,
                    None,
                    None,
                    lineage,
                )));
            }
        }
    }

    if query.hops.is_empty() {
        return Ok(log_outcome(success_response(source, query, k, k_explore, candidates_explored, started, candidates, lineage)));
    }

    for (idx, hop) in query.hops.iter().enumerate() {
        let beam_width = beam::beam_width(idx, query.hops.len(), k, k_explore);
        let outcome = triad::execute_hop(hop, &candidates, beam_width, config, collab, lineage_ref).await?;
        candidates_explored += outcome.candidates_explored;

        if outcome.candidates.is_empty() {
            let partial = beam::top_k(candidates.clone(), 1).into_iter().next();
            return Ok(log_outcome(error_response(
                source,
                query,
                k,
                k_explore,
                candidates_explored,
                started,
                QueryError::NoPathFound { stopped_at_hop: idx },
                Some(idx),
                partial,
                lineage,
            )));
        }

        candidates = beam::top_k(outcome.candidates, beam_width);
    }

    Ok(log_outcome(success_response(source, query, k, k_explore, candidates_explored, started, candidates, lineage)))
}

/// Logs the query's outcome at exit (spec §11: `info!` with query, hop
/// count, result count and elapsed time; a response-contract error logs at
/// `warn!` instead since it's still a normal, tagged outcome, not a fault).
fn log_outcome(response: QueryResponse) -> QueryResponse {
    let elapsed_ms = response.execution_time.as_millis();
    match &response.error {
        Some(err) => tracing::warn!(
            query = response.query,
            tag = err.tag,
            hops = response.hops,
            candidates_explored = response.candidates_explored,
            elapsed_ms,
            "query finished with error"
        ),
        None => tracing::info!(
            query = response.query,
            hops = response.hops,
            results = response.results.len(),
            candidates_explored = response.candidates_explored,
            elapsed_ms,
            "query finished"
        ),
    }
    response
}

fn deferred_entry(types: &[String], filter: &Filter) -> Option<EntryPoint> {
    match filter {
        Filter::SemanticText(text) => Some(EntryPoint::TypePlusSemantic { types: types.to_vec(), text: text.clone() }),
        Filter::TypeSetPlusSemantic { types, text } => {
            Some(EntryPoint::TypePlusSemantic { types: types.clone(), text: text.clone() })
        }
        Filter::TypeSet(_) | Filter::ExactId(_) => None,
    }
}

/// Apply a filter to already-resolved candidates directly, the way the
/// triad's filter stage would without the preceding edge (spec §4.5 step 4).
async fn apply_entry_filter(
    filter: &Filter,
    candidates: Vec<CandidatePath>,
    collab: &Collaborators<'_>,
) -> QueryResult<Vec<CandidatePath>> {
    match filter {
        Filter::TypeSet(types) => Ok(candidates
            .into_iter()
            .filter(|c| types.iter().any(|t| t == &c.current_entity().type_tag))
            .collect()),
        Filter::ExactId(id) => Ok(candidates.into_iter().filter(|c| &c.current_entity().id == id).collect()),
        Filter::SemanticText(text) => rerank_by_text(candidates, text, collab).await,
        Filter::TypeSetPlusSemantic { types, text } => {
            let narrowed: Vec<_> =
                candidates.into_iter().filter(|c| types.iter().any(|t| t == &c.current_entity().type_tag)).collect();
            rerank_by_text(narrowed, text, collab).await
        }
    }
}

async fn rerank_by_text(
    candidates: Vec<CandidatePath>,
    text: &str,
    collab: &Collaborators<'_>,
) -> QueryResult<Vec<CandidatePath>> {
    if candidates.is_empty() {
        return Ok(candidates);
    }
    let embeddings = collab
        .embedder
        .embed(std::slice::from_ref(&text.to_string()))
        .await
        .inspect_err(|e| tracing::error!(error = %e, "embedder call failed for entry filter text"))?;
    let embedding = embeddings
        .into_iter()
        .next()
        .ok_or_else(|| QueryError::Collaborator("embedder returned no vector for entry filter text".into()))?;

    let ids: Vec<String> = candidates.iter().map(|c| c.current_entity().id.clone()).collect();
    let hits = collab
        .vector
        .rank_among(&ids, &embedding)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "vector index rank_among failed for entry filter"))?;
    let scores: std::collections::HashMap<String, f32> =
        hits.into_iter().map(|h| (h.id, h.score.clamp(0.0, 1.0))).collect();

    Ok(candidates
        .into_iter()
        .filter_map(|c| {
            let score = *scores.get(&c.current_entity().id)?;
            let steps = c.steps().to_vec();
            Some(c.rescored(score, steps))
        })
        .collect())
}

#[allow(clippy::too_many_arguments)]
fn success_response(
    source: &str,
    query: &Query,
    k: usize,
    k_explore: usize,
    candidates_explored: usize,
    started: Instant,
    candidates: Vec<CandidatePath>,
    lineage: Option<LineageScope>,
) -> QueryResponse {
    let ranked = beam::top_k(candidates, k);
    QueryResponse {
        query: source.to_string(),
        hops: query.hops.len(),
        k,
        k_explore,
        candidates_explored,
        execution_time: started.elapsed(),
        results: ranked.into_iter().map(ResultPath::from).collect(),
        error: None,
        lineage,
    }
}

#[allow(clippy::too_many_arguments)]
fn error_response(
    source: &str,
    query: &Query,
    k: usize,
    k_explore: usize,
    candidates_explored: usize,
    started: Instant,
    err: QueryError,
    stopped_at_hop: Option<usize>,
    partial: Option<CandidatePath>,
    lineage: Option<LineageScope>,
) -> QueryResponse {
    let tag = error_tag(&err);
    QueryResponse {
        query: source.to_string(),
        hops: query.hops.len(),
        k,
        k_explore,
        candidates_explored,
        execution_time: started.elapsed(),
        results: Vec::new(),
        error: Some(ErrorInfo {
            tag,
            reason: err.to_string(),
            stopped_at_hop,
            partial_path: partial.map(ResultPath::from),
        }),
        lineage,
    }
}

/// Maps a `QueryError` to one of the five response-contract error tags
/// (spec §6); exposed so callers that catch a parse error before ever
/// building a `Query` (and thus before calling [`run`]) can still shape an
/// error response the same way.
pub fn error_tag(err: &QueryError) -> &'static str {
    match err {
        QueryError::Lexical { .. } | QueryError::Parse { .. } => "parse_error",
        QueryError::InvalidEntryPoint => "invalid_entry_point",
        QueryError::UnsupportedQuery { .. } => "unsupported_query",
        QueryError::NoEntryPoint => "no_entry_point",
        QueryError::NoPathFound { .. } => "no_path_found",
        QueryError::Collaborator(_) | QueryError::DeadlineExceeded => "collaborator_error",
    }
}
