//! structgraph core library
//!
//! Extracts record types and their relationships from C and C++ codebases
//! and resolves them into a deterministic type graph.
//!
//! The pipeline runs in stages:
//! [`discovery`] → [`frontend`] → [`classify`] → [`store`] → [`graph`].
//! [`pipeline`] drives all of them for a codebase root.

pub mod ast;
pub mod classify;
pub mod compile_db;
pub mod discovery;
pub mod error;
pub mod facts;
pub mod frontend;
pub mod graph;
pub mod identity;
pub mod pipeline;
pub mod store;

// Re-export commonly used types
pub use error::{ExtractError, Result};
pub use facts::{Fact, Reference, RelationshipKind, Symbol};
pub use graph::{Edge, TypeGraph};
pub use identity::{Identity, SymbolKind};
pub use pipeline::{extract, ExtractConfig, Extraction};
pub use store::FactStore;
