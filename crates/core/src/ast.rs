//! Language-neutral syntax tree handed from the front-end to the classifier
//!
//! The front-end lowers whatever parser it uses into this small owned model:
//! one [`AstNode`] per declaration or type reference the classifier may care
//! about, with everything else collapsed into [`NodeKind::Other`] containers
//! so nested declarations stay reachable.
//!
//! Traversal goes through [`walk`], an explicit-stack preorder walk that lets
//! the visitor prune a subtree by returning [`Walk::Skip`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Source position of a declaration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Absolute, canonical path of the file holding the declaration
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: usize,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Kinds of nodes the front-end distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    TranslationUnit,
    /// `struct`, `class` or `union` declaration
    Record,
    /// `typedef` or C++ `using X = ...`
    TypeAlias,
    /// Data member of a record
    Field,
    /// Base-class entry of a record definition
    BaseSpecifier,
    /// Use of a named type
    TypeRef,
    /// Anything else; kept only as a container for children
    Other,
}

/// Category of a type as seen by the front-end
///
/// On a [`NodeKind::Field`] it is the shape of the declared type. On a
/// [`NodeKind::TypeRef`] it is the category of the referenced type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeCategory {
    Record,
    Alias,
    Pointer,
    Reference,
    Array,
    Primitive,
    #[default]
    Unexposed,
}

impl TypeCategory {
    /// Whether a member of this type refers to its target instead of embedding it
    pub fn is_pointer_shaped(self) -> bool {
        matches!(self, TypeCategory::Pointer | TypeCategory::Reference)
    }
}

/// One node of the lowered syntax tree
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: NodeKind,
    /// Declared name, or the spelled type for references (`struct Point`)
    pub display_name: Option<String>,
    pub type_category: TypeCategory,
    pub location: Option<Location>,
    /// True for declarations that carry a body
    pub is_definition: bool,
    pub children: Vec<AstNode>,
}

impl AstNode {
    /// Create a childless node with no name, location or type information
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            display_name: None,
            type_category: TypeCategory::Unexposed,
            location: None,
            is_definition: false,
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: TypeCategory) -> Self {
        self.type_category = category;
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn definition(mut self) -> Self {
        self.is_definition = true;
        self
    }

    pub fn with_children(mut self, children: Vec<AstNode>) -> Self {
        self.children = children;
        self
    }

    pub fn push(&mut self, child: AstNode) {
        self.children.push(child);
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(AstNode::subtree_len).sum::<usize>()
    }
}

/// Visitor verdict for [`walk`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Visit this node's children next
    Descend,
    /// Leave this node's children unvisited
    Skip,
}

/// Preorder walk over `root` in document order
///
/// The visitor receives each node together with its ancestor path (outermost
/// first, excluding the node itself).
pub fn walk<'a, F>(root: &'a AstNode, mut visit: F)
where
    F: FnMut(&'a AstNode, &[&'a AstNode]) -> Walk,
{
    let mut stack: Vec<(&'a AstNode, usize)> = vec![(root, 0)];
    let mut path: Vec<&'a AstNode> = Vec::new();

    while let Some((node, depth)) = stack.pop() {
        path.truncate(depth);
        if visit(node, &path) == Walk::Skip {
            continue;
        }
        path.push(node);
        // Reverse so the first child is popped first
        for child in node.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }
}

/// Indented text rendering of a tree, one node per line
///
/// Each line reads `name [kind:category] [file:line] {definition}`, with
/// `-` for unnamed nodes and the bracket parts omitted when absent.
pub fn dump(root: &AstNode) -> String {
    let mut out = String::new();
    walk(root, |node, ancestors| {
        out.push_str(&"  ".repeat(ancestors.len()));
        out.push_str(node.display_name.as_deref().unwrap_or("-"));
        out.push_str(&format!(" [{:?}:{:?}]", node.kind, node.type_category));
        if let Some(location) = &node.location {
            out.push_str(&format!(" [{location}]"));
        }
        if node.is_definition {
            out.push_str(" {definition}");
        }
        out.push('\n');
        Walk::Descend
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> AstNode {
        AstNode::new(NodeKind::TranslationUnit).with_children(vec![
            AstNode::new(NodeKind::Record).named("A").with_children(vec![
                AstNode::new(NodeKind::Field).named("x"),
                AstNode::new(NodeKind::Field).named("y"),
            ]),
            AstNode::new(NodeKind::Other).with_children(vec![
                AstNode::new(NodeKind::Record).named("B"),
            ]),
        ])
    }

    #[test]
    fn test_walk_visits_in_document_order() {
        let tree = sample_tree();
        let mut seen = Vec::new();
        walk(&tree, |node, _| {
            seen.push(node.display_name.clone().unwrap_or_else(|| "-".to_string()));
            Walk::Descend
        });
        assert_eq!(seen, vec!["-", "A", "x", "y", "-", "B"]);
    }

    #[test]
    fn test_walk_skip_prunes_subtree() {
        let tree = sample_tree();
        let mut seen = Vec::new();
        walk(&tree, |node, _| {
            if let Some(name) = &node.display_name {
                seen.push(name.clone());
            }
            if node.kind == NodeKind::Record {
                Walk::Skip
            } else {
                Walk::Descend
            }
        });
        assert_eq!(seen, vec!["A", "B"]);
    }

    #[test]
    fn test_walk_reports_ancestors() {
        let tree = sample_tree();
        let mut depths = Vec::new();
        walk(&tree, |node, ancestors| {
            if node.kind == NodeKind::Field {
                let parent = ancestors.last().and_then(|p| p.display_name.clone());
                depths.push((ancestors.len(), parent));
            }
            Walk::Descend
        });
        assert_eq!(
            depths,
            vec![(2, Some("A".to_string())), (2, Some("A".to_string()))]
        );
    }

    #[test]
    fn test_pointer_shape() {
        assert!(TypeCategory::Pointer.is_pointer_shaped());
        assert!(TypeCategory::Reference.is_pointer_shaped());
        assert!(!TypeCategory::Record.is_pointer_shaped());
        assert!(!TypeCategory::Array.is_pointer_shaped());
    }

    #[test]
    fn test_location_display() {
        let loc = Location::new("/src/shapes.h", 12);
        assert_eq!(loc.to_string(), "/src/shapes.h:12");
    }

    #[test]
    fn test_dump_indents_by_depth() {
        let field = AstNode::new(NodeKind::Field)
            .named("start")
            .with_category(TypeCategory::Pointer);
        let record = AstNode::new(NodeKind::Record)
            .named("Line")
            .with_category(TypeCategory::Record)
            .at(Location::new("/src/line.c", 3))
            .definition()
            .with_children(vec![field]);
        let tree = AstNode::new(NodeKind::TranslationUnit).with_children(vec![record]);

        assert_eq!(
            dump(&tree),
            "- [TranslationUnit:Unexposed]\n\
             \x20 Line [Record:Record] [/src/line.c:3] {definition}\n\
             \x20   start [Field:Pointer]\n"
        );
    }
}
