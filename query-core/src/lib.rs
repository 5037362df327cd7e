//! Path query engine core: lexer, parser, and triad-based executor.
//!
//! This crate is pure query logic. It depends only on the [`collaborators`]
//! traits (graph store, vector index, embedder) and has no knowledge of
//! HTTP, Qdrant, or any particular graph database — those live in
//! downstream crates that implement the traits and drive [`driver::run`].

pub mod ast;
pub mod beam;
pub mod collaborators;
pub mod config;
pub mod driver;
pub mod entry_resolver;
pub mod error;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod path;
pub mod similarity;
pub mod testkit;
pub mod triad;

pub use ast::Query;
pub use collaborators::Collaborators;
pub use config::EngineConfig;
pub use driver::{error_tag, run, ErrorInfo, QueryResponse, ResultPath};
pub use error::{QueryError, QueryResult};
pub use model::LineageScope;

/// Parse and validate source text into a [`Query`] without executing it —
/// useful for callers that want to surface lexical/grammar errors before
/// committing to collaborator round-trips.
pub fn parse(src: &str) -> QueryResult<Query> {
    parser::parse(src)
}
