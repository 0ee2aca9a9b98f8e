//! Canonical type identities
//!
//! An [`Identity`] names a type independently of the file or declaration it
//! was seen in. It is the only key used for deduplication and for addressing
//! graph nodes, so it must come purely from syntax: the spelled name plus
//! whether the referenced type is a record or an alias.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::{AstNode, TypeCategory};

/// Record tags a reference's spelled type may carry
const RECORD_TAGS: [&str; 3] = ["struct ", "class ", "union "];

/// What kind of type an identity names
///
/// Variant order is part of the node sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Struct,
    Alias,
    /// Primitives, opaque and unresolved external types
    Unknown,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Struct => "struct",
            SymbolKind::Alias => "alias",
            SymbolKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// `(name, kind)` key naming one type across all translation units
///
/// Ordering is by name, then kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub kind: SymbolKind,
}

impl Identity {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn record(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Struct)
    }

    pub fn alias(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Alias)
    }

    pub fn unknown(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Unknown)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Derive the identity a type reference points at
///
/// Never fails: a reference without a display name yields an `Unknown`
/// identity with an empty name.
pub fn identity_of(reference: &AstNode) -> Identity {
    let spelled = reference.display_name.as_deref().unwrap_or_default().trim();

    if let Some(name) = strip_record_tag(spelled) {
        return Identity::record(name);
    }
    if reference.type_category == TypeCategory::Alias {
        return Identity::alias(spelled);
    }
    Identity::unknown(spelled)
}

fn strip_record_tag(spelled: &str) -> Option<&str> {
    RECORD_TAGS
        .iter()
        .find_map(|tag| spelled.strip_prefix(tag))
        .map(str::trim_start)
}
