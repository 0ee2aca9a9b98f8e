//! Fact classification
//!
//! The [`Classifier`] looks at one node at a time and decides which facts it
//! yields and whether the walk may continue into its children. Records and
//! aliases are captured whole, including their members, so the walk stops
//! at them; every other node is transparent.
//!
//! [`Classifier::extract_facts`] drives a whole translation unit through
//! [`crate::ast::walk`].

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::ast::{self, AstNode, NodeKind, Walk};
use crate::facts::{Fact, Reference, RelationshipKind, Symbol};
use crate::identity::{identity_of, Identity, SymbolKind};

/// Parameters of a classification run
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    /// Only declarations located under this directory are captured
    pub root: PathBuf,
    /// Relationship recorded for pointer and reference members
    pub pointer_relationship: RelationshipKind,
}

impl ClassifyConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pointer_relationship: RelationshipKind::Aggregation,
        }
    }

    pub fn with_pointer_relationship(mut self, kind: RelationshipKind) -> Self {
        self.pointer_relationship = kind;
        self
    }
}

/// Result of classifying one node
#[derive(Debug, Default, PartialEq)]
pub struct Classification {
    pub facts: Vec<Fact>,
    /// The node was captured whole; its children must not be visited
    pub stop_descending: bool,
}

impl Classification {
    fn transparent() -> Self {
        Self::default()
    }

    fn captured(facts: Vec<Fact>) -> Self {
        Self {
            facts,
            stop_descending: true,
        }
    }
}

/// Turns lowered syntax nodes into facts
pub struct Classifier {
    config: ClassifyConfig,
}

impl Classifier {
    pub fn new(config: ClassifyConfig) -> Self {
        Self { config }
    }

    /// Classify a single node given its ancestor path
    pub fn classify(&self, node: &AstNode, ancestors: &[&AstNode]) -> Classification {
        trace!(
            kind = ?node.kind,
            name = node.display_name.as_deref().unwrap_or(""),
            depth = ancestors.len(),
            "visit"
        );

        if node.display_name.is_none() || !self.is_under_root(node) {
            return Classification::transparent();
        }

        match node.kind {
            NodeKind::Record if node.is_definition => {
                let mut facts = Vec::new();
                self.capture_record(node, &mut facts);
                Classification::captured(facts)
            }
            NodeKind::TypeAlias => {
                let mut facts = Vec::new();
                self.capture_alias(node, &mut facts);
                Classification::captured(facts)
            }
            _ => Classification::transparent(),
        }
    }

    /// Walk a whole tree and collect every fact it yields, in document order
    pub fn extract_facts(&self, root: &AstNode) -> Vec<Fact> {
        let mut facts = Vec::new();
        ast::walk(root, |node, ancestors| {
            let classification = self.classify(node, ancestors);
            facts.extend(classification.facts);
            if classification.stop_descending {
                Walk::Skip
            } else {
                Walk::Descend
            }
        });
        facts
    }

    /// Unlocated nodes are synthetic and always pass
    fn is_under_root(&self, node: &AstNode) -> bool {
        match &node.location {
            Some(location) => location.file.starts_with(&self.config.root),
            None => true,
        }
    }

    fn capture_record(&self, node: &AstNode, facts: &mut Vec<Fact>) {
        let Some(name) = node.display_name.as_deref() else {
            return;
        };
        let owner = Identity::record(name);
        debug!(record = name, location = ?node.location, "captured record");
        facts.push(Symbol::record(owner.clone(), node.location.clone()).into());

        for member in &node.children {
            match member.kind {
                NodeKind::Field => self.capture_field(&owner, member, facts),
                NodeKind::BaseSpecifier => {
                    if let Some(base) = first_reference(member, |_| true) {
                        facts.push(
                            Reference::new(
                                owner.clone(),
                                base,
                                RelationshipKind::Generalization,
                                "",
                            )
                            .into(),
                        );
                    }
                }
                // Member types: `struct Outer { struct Impl {...}; typedef ... };`
                NodeKind::Record if is_named_definition(member) => {
                    self.capture_record(member, facts)
                }
                NodeKind::TypeAlias if member.display_name.is_some() => {
                    self.capture_alias(member, facts)
                }
                _ => {}
            }
        }
    }

    fn capture_field(&self, owner: &Identity, field: &AstNode, facts: &mut Vec<Fact>) {
        let Some(field_name) = field.display_name.as_deref() else {
            return;
        };

        for nested in &field.children {
            if is_named_definition(nested) {
                self.capture_record(nested, facts);
            }
        }

        let Some(target) = first_reference(field, |_| true) else {
            return;
        };
        let kind = if field.type_category.is_pointer_shaped() {
            self.config.pointer_relationship
        } else {
            RelationshipKind::Composition
        };
        facts.push(Reference::new(owner.clone(), target, kind, field_name).into());
    }

    fn capture_alias(&self, node: &AstNode, facts: &mut Vec<Fact>) {
        let Some(name) = node.display_name.as_deref() else {
            return;
        };
        let origin = first_reference(node, |id| id.kind != SymbolKind::Unknown);
        debug!(alias = name, origin = ?origin, "captured alias");
        facts.push(Symbol::alias(Identity::alias(name), node.location.clone(), origin).into());

        for nested in &node.children {
            if is_named_definition(nested) {
                self.capture_record(nested, facts);
            }
        }
    }
}

fn is_named_definition(node: &AstNode) -> bool {
    node.kind == NodeKind::Record && node.is_definition && node.display_name.is_some()
}

/// First accepted type reference below `node`, in document order
///
/// A named nested record definition counts as a reference to that record and
/// is not searched further. Anonymous nested records are skipped whole.
fn first_reference<F>(node: &AstNode, accept: F) -> Option<Identity>
where
    F: Fn(&Identity) -> bool + Copy,
{
    for child in &node.children {
        match child.kind {
            NodeKind::Record => {
                if let Some(name) = &child.display_name {
                    let id = Identity::record(name.as_str());
                    if accept(&id) {
                        return Some(id);
                    }
                }
                continue;
            }
            NodeKind::TypeRef if child.display_name.as_deref().is_some_and(|n| !n.is_empty()) => {
                let id = identity_of(child);
                if accept(&id) {
                    return Some(id);
                }
            }
            _ => {}
        }
        if let Some(found) = first_reference(child, accept) {
            return Some(found);
        }
    }
    None
}
