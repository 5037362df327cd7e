//! Unified error type for the query-core crate.

use thiserror::Error;

/// Errors produced while lexing, parsing, validating or executing a query.
///
/// Every variant carries what the driver needs to build response metadata
/// (spec.md §6, §7) without re-deriving it from scratch.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Unterminated string, bad `@`, or an unrecognised character.
    #[error("lexical error at byte {position}: {message}")]
    Lexical { position: usize, message: String },

    /// Grammar mismatch while parsing the token stream.
    #[error("parse error at token {position}: {message}")]
    Parse { position: usize, message: String },

    /// A type-only entry point was combined with at least one hop.
    #[error("type-only entry point cannot be followed by hops")]
    InvalidEntryPoint,

    /// A hop's constraints can never be executed (fuzzy relation + variable
    /// depth, or variable depth without a target filter).
    #[error("unsupported query at hop {hop_index}: {reason}")]
    UnsupportedQuery { hop_index: usize, reason: String },

    /// Entry resolution returned no candidates.
    #[error("no entry point found")]
    NoEntryPoint,

    /// A hop returned no candidates.
    #[error("no path found, stopped at hop {stopped_at_hop}")]
    NoPathFound { stopped_at_hop: usize },

    /// A graph store, vector index, or embedder call failed.
    #[error("collaborator failure: {0}")]
    Collaborator(String),

    /// The overall query deadline elapsed while a collaborator call was in flight.
    #[error("query deadline exceeded")]
    DeadlineExceeded,
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;
