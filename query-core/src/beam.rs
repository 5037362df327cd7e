//! Beam / scoring policy (spec §4.6): pure, stateless helpers shared by the
//! triad executor and the query driver.

use crate::path::CandidatePath;

/// Keep the top `limit` candidates by score, breaking ties by path length
/// (shorter first) and then by terminal identifier, for determinism.
pub fn top_k(mut candidates: Vec<CandidatePath>, limit: usize) -> Vec<CandidatePath> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.edge_count().cmp(&b.edge_count()))
            .then_with(|| a.current_entity().id.cmp(&b.current_entity().id))
    });
    candidates.truncate(limit);
    candidates
}

/// Beam width for `hop_index` (0-based) out of `total_hops`: the final hop
/// gets `k`, every intermediate hop gets `k_explore`.
pub fn beam_width(hop_index: usize, total_hops: usize, k: usize, k_explore: usize) -> usize {
    if hop_index + 1 == total_hops {
        k
    } else {
        k_explore
    }
}
