//! Abstract syntax tree produced by the parser (spec §3, §4.2).

/// Maximum traversal depth the engine will ever explore; an unbounded upper
/// bound in a depth range is clamped to this value (spec §3 invariant 4, §5).
pub const MAX_DEPTH: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum EntryPoint {
    SemanticText(String),
    ExactId(String),
    TypeOnly(Vec<String>),
    TypePlusSemantic { types: Vec<String>, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    TypeSet(Vec<String>),
    ExactId(String),
    SemanticText(String),
    TypeSetPlusSemantic { types: Vec<String>, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
    Bidirectional,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelationMatch {
    Wildcard,
    Fuzzy(Vec<String>),
}

impl RelationMatch {
    pub fn is_fuzzy(&self) -> bool {
        matches!(self, RelationMatch::Fuzzy(_))
    }
}

/// Inclusive `[min, max]` hop-count range. `max` of `None` means unbounded,
/// clamped later to [`MAX_DEPTH`] (spec §3 invariant 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl DepthRange {
    pub const SINGLE: DepthRange = DepthRange { min: 1, max: Some(1) };

    pub fn clamped_max(&self, configured_max: u32) -> u32 {
        self.max.unwrap_or(configured_max).min(configured_max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub direction: Direction,
    pub relation: RelationMatch,
    pub depth: DepthRange,
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub entry: EntryPoint,
    pub entry_filter: Option<Filter>,
    pub hops: Vec<Hop>,
}

impl Query {
    /// Invariant 6: a type-only entry is legal only for zero-hop queries.
    pub fn validate(&self) -> Result<(), crate::error::QueryError> {
        if matches!(self.entry, EntryPoint::TypeOnly(_)) && !self.hops.is_empty() {
            return Err(crate::error::QueryError::InvalidEntryPoint);
        }
        for (idx, hop) in self.hops.iter().enumerate() {
            let max = hop.depth.clamped_max(MAX_DEPTH);
            if hop.relation.is_fuzzy() && max > 1 {
                return Err(crate::error::QueryError::UnsupportedQuery {
                    hop_index: idx,
                    reason: "fuzzy relation matching is only valid at depth 1".into(),
                });
            }
            if max > 1 && hop.filter.is_none() {
                return Err(crate::error::QueryError::UnsupportedQuery {
                    hop_index: idx,
                    reason: "variable-depth hop requires a target filter".into(),
                });
            }
        }
        Ok(())
    }
}
