//! Candidate path representation: the unit of execution state (spec §3).
//!
//! Paths are immutable values — extension always produces a new
//! [`CandidatePath`], never mutates one in place, matching spec invariant 3
//! (scores are non-increasing along an extension).

use std::collections::HashSet;

use crate::ast::Direction;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityStep {
    pub id: String,
    pub label: String,
    pub type_tag: String,
    /// Per-target semantic score, when the step came from a semantic filter.
    pub score: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeStep {
    pub predicate: String,
    pub direction: Direction,
    /// Set by fuzzy-relation rescoring (spec §4.4); absent otherwise.
    pub score: Option<f32>,
    /// Marks the synthetic edge of a "no path found" fallback candidate.
    pub no_path_found: bool,
}

impl EdgeStep {
    pub fn real(predicate: impl Into<String>, direction: Direction) -> Self {
        EdgeStep { predicate: predicate.into(), direction, score: None, no_path_found: false }
    }

    pub fn sentinel_no_path() -> Self {
        EdgeStep {
            predicate: String::new(),
            direction: Direction::Outgoing,
            score: None,
            no_path_found: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    Entity(EntityStep),
    Edge(EdgeStep),
}

/// In-flight execution state for one partial traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePath {
    /// Alternating entity/edge steps, always starting and ending on an entity.
    steps: Vec<PathStep>,
    /// Aggregate score in `[0, 1]`.
    pub score: f32,
    /// Every identifier that has appeared on this path (invariant 2).
    visited: HashSet<String>,
}

impl CandidatePath {
    pub fn from_entry(entity: EntityStep) -> Self {
        let mut visited = HashSet::new();
        visited.insert(entity.id.clone());
        let score = entity.score.unwrap_or(1.0).clamp(0.0, 1.0);
        CandidatePath { steps: vec![PathStep::Entity(entity)], score, visited }
    }

    /// The current (terminal) entity — invariant 1.
    pub fn current_entity(&self) -> &EntityStep {
        match self.steps.last() {
            Some(PathStep::Entity(e)) => e,
            _ => unreachable!("a candidate path always ends on an entity step"),
        }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn has_visited(&self, id: &str) -> bool {
        self.visited.contains(id)
    }

    /// Number of edge-steps taken so far.
    pub fn edge_count(&self) -> usize {
        self.steps.iter().filter(|s| matches!(s, PathStep::Edge(_))).count()
    }

    /// Extend this path by one hop. Returns `None` if `entity` would revisit
    /// an identifier already on the path (cycle guard, spec invariant 2).
    pub fn extend(&self, edge: EdgeStep, entity: EntityStep, new_score: f32) -> Option<CandidatePath> {
        if self.visited.contains(&entity.id) {
            return None;
        }
        let mut visited = self.visited.clone();
        visited.insert(entity.id.clone());
        let mut steps = self.steps.clone();
        steps.push(PathStep::Edge(edge));
        steps.push(PathStep::Entity(entity));
        Some(CandidatePath { steps, score: new_score.clamp(0.0, 1.0), visited })
    }

    /// Extend by a whole graph-store path (possibly several edges, for a
    /// variable-depth hop) as a single logical extension. Returns `None` if
    /// any intermediate or terminal identifier would revisit the path.
    pub fn extend_many(&self, hops: Vec<(EdgeStep, EntityStep)>, new_score: f32) -> Option<CandidatePath> {
        let mut visited = self.visited.clone();
        for (_, entity) in &hops {
            if !visited.insert(entity.id.clone()) {
                return None;
            }
        }
        let mut steps = self.steps.clone();
        for (edge, entity) in hops {
            steps.push(PathStep::Edge(edge));
            steps.push(PathStep::Entity(entity));
        }
        Some(CandidatePath { steps, score: new_score.clamp(0.0, 1.0), visited })
    }

    /// Replace the score in place without altering steps or visited set —
    /// used by fuzzy-relation rescoring, which annotates edge-step scores
    /// and recomputes the aggregate afterward (spec §4.4).
    pub fn rescored(&self, new_score: f32, steps: Vec<PathStep>) -> CandidatePath {
        CandidatePath { steps, score: new_score.clamp(0.0, 1.0), visited: self.visited.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str) -> EntityStep {
        EntityStep { id: id.into(), label: id.into(), type_tag: "person".into(), score: None }
    }

    #[test]
    fn extension_rejects_cycles() {
        let a = CandidatePath::from_entry(entity("a"));
        let extended = a.extend(EdgeStep::real("knows", Direction::Outgoing), entity("a"), 0.5);
        assert!(extended.is_none());
    }

    #[test]
    fn extension_never_increases_score() {
        let a = CandidatePath::from_entry(entity("a"));
        let b = a.extend(EdgeStep::real("knows", Direction::Outgoing), entity("b"), 2.0).unwrap();
        assert!(b.score <= 1.0);
    }

    #[test]
    fn visited_set_grows_monotonically() {
        let a = CandidatePath::from_entry(entity("a"));
        let b = a.extend(EdgeStep::real("knows", Direction::Outgoing), entity("b"), 0.5).unwrap();
        assert!(b.has_visited("a"));
        assert!(b.has_visited("b"));
        assert_eq!(b.edge_count(), 1);
    }
}
