//! Facts emitted by the classifier
//!
//! A translation unit is reduced to a flat sequence of [`Fact`]s: one
//! [`Symbol`] per captured type declaration and one [`Reference`] per
//! captured member relationship. Facts from different units are merged by
//! [`crate::store::FactStore`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::Location;
use crate::identity::Identity;

/// A captured record or alias declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub identity: Identity,
    /// None for synthetic or unlocated declarations
    pub location: Option<Location>,
    /// Aliased type; only ever set on alias symbols
    pub origin: Option<Identity>,
}

impl Symbol {
    pub fn record(identity: Identity, location: Option<Location>) -> Self {
        Self {
            identity,
            location,
            origin: None,
        }
    }

    pub fn alias(identity: Identity, location: Option<Location>, origin: Option<Identity>) -> Self {
        Self {
            identity,
            location,
            origin,
        }
    }
}

/// How one type relates to another
///
/// Variant order is part of the edge sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    /// Embedded by value
    Composition,
    /// Held through a pointer or reference
    Aggregation,
    /// Held through a pointer or reference, for callers preferring UML association
    Association,
    /// Base type
    Generalization,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationshipKind::Composition => "composition",
            RelationshipKind::Aggregation => "aggregation",
            RelationshipKind::Association => "association",
            RelationshipKind::Generalization => "generalization",
        };
        f.write_str(s)
    }
}

/// A member-level relationship between two identities, before alias resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub from: Identity,
    pub to: Identity,
    pub kind: RelationshipKind,
    /// Member name; empty for base-type relationships
    pub field_name: String,
}

impl Reference {
    pub fn new(
        from: Identity,
        to: Identity,
        kind: RelationshipKind,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            from,
            to,
            kind,
            field_name: field_name.into(),
        }
    }

    /// Deduplication key of the reference table
    pub fn key(&self) -> ReferenceKey {
        (self.from.clone(), self.to.clone(), self.kind)
    }
}

/// `(from, to, kind)`
pub type ReferenceKey = (Identity, Identity, RelationshipKind);

/// One unit of extracted information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fact {
    Symbol(Symbol),
    Reference(Reference),
}

impl From<Symbol> for Fact {
    fn from(symbol: Symbol) -> Self {
        Fact::Symbol(symbol)
    }
}

impl From<Reference> for Fact {
    fn from(reference: Reference) -> Self {
        Fact::Reference(reference)
    }
}
