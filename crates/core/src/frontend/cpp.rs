//! tree-sitter-cpp lowering
//!
//! Maps the concrete syntax tree onto [`AstNode`]s. Only declarations that
//! can hold type information are kept: records, typedefs, `using` aliases
//! and, inside records, data members and base classes. Containers such as
//! namespaces, `extern "C"` blocks, templates and function bodies become
//! [`NodeKind::Other`] nodes when they hold anything of interest and vanish
//! otherwise. Expressions are never entered.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tree_sitter::{Node, Tree};

use super::{Diagnostic, ParsedFile};
use crate::ast::{AstNode, Location, NodeKind, TypeCategory};

const RECORD_KINDS: [&str; 3] = ["struct_specifier", "class_specifier", "union_specifier"];

/// Names of the types declared in one translation unit
#[derive(Debug, Default, Clone)]
pub struct TypeIndex {
    records: HashSet<String>,
    aliases: HashSet<String>,
    enums: HashSet<String>,
}

impl TypeIndex {
    /// Record every type name declared in `file`
    pub(crate) fn collect(&mut self, file: &ParsedFile) {
        let source = file.source.as_str();
        for_each_named(file.tree.root_node(), |node| {
            match node.kind() {
                kind if RECORD_KINDS.contains(&kind) => {
                    if let Some(name) = node.child_by_field_name("name") {
                        self.records.insert(simple_name(text(name, source)).to_string());
                    }
                }
                "enum_specifier" => {
                    if let Some(name) = node.child_by_field_name("name") {
                        self.enums.insert(simple_name(text(name, source)).to_string());
                    }
                }
                "type_definition" => {
                    for declarator in field_children(node, "declarator") {
                        if let Some(name) = Declarator::of(declarator, source).name {
                            self.aliases.insert(simple_name(&name).to_string());
                        }
                    }
                }
                "alias_declaration" => {
                    if let Some(name) = node.child_by_field_name("name") {
                        self.aliases.insert(simple_name(text(name, source)).to_string());
                    }
                }
                _ => {}
            }
            !is_expression(node.kind())
        });
    }

    /// Category of a bare (untagged) type name
    ///
    /// Aliases take precedence, so after `typedef struct Node Node;` the
    /// name `Node` refers to the alias.
    pub fn category(&self, spelled: &str) -> TypeCategory {
        let name = simple_name(spelled);
        if self.aliases.contains(name) {
            TypeCategory::Alias
        } else if self.records.contains(name) {
            TypeCategory::Record
        } else if self.enums.contains(name) {
            TypeCategory::Primitive
        } else {
            TypeCategory::Unexposed
        }
    }
}

/// `#include` directives as `(node start byte, spelled path, quoted)`
pub(crate) fn include_directives(tree: &Tree, source: &str) -> Vec<(usize, String, bool)> {
    let mut found = Vec::new();
    for_each_named(tree.root_node(), |node| {
        if node.kind() != "preproc_include" {
            return !is_expression(node.kind());
        }
        if let Some(path) = node.child_by_field_name("path") {
            let quoted = match path.kind() {
                "string_literal" => Some(true),
                "system_lib_string" => Some(false),
                // Macro-computed includes are out of reach
                _ => None,
            };
            let spelled = text(path, source).trim_matches(|c| c == '"' || c == '<' || c == '>');
            if let Some(quoted) = quoted.filter(|_| !spelled.is_empty()) {
                found.push((node.start_byte(), spelled.to_string(), quoted));
            }
        }
        false
    });
    found
}

/// `ERROR` and `MISSING` nodes of a parsed file, in document order
pub(crate) fn syntax_diagnostics(file: &ParsedFile) -> Vec<Diagnostic> {
    let root = file.tree.root_node();
    let mut found = Vec::new();
    if !root.has_error() {
        return found;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            found.push(Diagnostic {
                location: location(file, node),
                message: format!("missing `{}`", node.kind()),
            });
        } else if node.is_error() {
            let snippet: String = text(node, &file.source)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .take(40)
                .collect();
            found.push(Diagnostic {
                location: location(file, node),
                message: format!("syntax error near `{snippet}`"),
            });
        } else if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    found
}

/// Lower the unit rooted at `main`; None if `main` was never parsed
pub(crate) fn lower_unit(
    files: &HashMap<PathBuf, ParsedFile>,
    index: &TypeIndex,
    main: &Path,
) -> Option<AstNode> {
    let file = files.get(main)?;
    let mut lowering = Lowering {
        files,
        index,
        emitted: HashSet::from([main.to_path_buf()]),
        template_params: Vec::new(),
    };
    let children = lowering.lower_children(file, file.tree.root_node());
    Some(
        AstNode::new(NodeKind::TranslationUnit)
            .named(main.display().to_string())
            .with_children(children),
    )
}

struct Lowering<'a> {
    files: &'a HashMap<PathBuf, ParsedFile>,
    index: &'a TypeIndex,
    /// Files already inlined into this unit
    emitted: HashSet<PathBuf>,
    /// Type parameters of the enclosing templates, innermost last
    template_params: Vec<String>,
}

impl<'a> Lowering<'a> {
    fn lower_children(&mut self, file: &'a ParsedFile, node: Node<'a>) -> Vec<AstNode> {
        let mut out = Vec::new();
        for child in named_children(node) {
            self.lower_into(file, child, &mut out);
        }
        out
    }

    fn lower_into(&mut self, file: &'a ParsedFile, node: Node<'a>, out: &mut Vec<AstNode>) {
        match node.kind() {
            kind if RECORD_KINDS.contains(&kind) => {
                if node.child_by_field_name("body").is_some() {
                    out.push(self.lower_record(file, node, None));
                }
            }
            "type_definition" => out.extend(self.lower_typedef(file, node)),
            "alias_declaration" => out.extend(self.lower_using(file, node)),
            "preproc_include" => out.extend(self.lower_include(file, node)),
            "template_declaration" => {
                let depth = self.template_params.len();
                if let Some(params) = node.child_by_field_name("parameters") {
                    self.template_params
                        .extend(template_parameter_names(params, &file.source));
                }
                let children = self.lower_children(file, node);
                self.template_params.truncate(depth);
                if !children.is_empty() {
                    out.push(AstNode::new(NodeKind::Other).with_children(children));
                }
            }
            kind if is_expression(kind) => {}
            _ => {
                let children = self.lower_children(file, node);
                if !children.is_empty() {
                    out.push(AstNode::new(NodeKind::Other).with_children(children));
                }
            }
        }
    }

    fn lower_include(&mut self, file: &'a ParsedFile, node: Node<'a>) -> Option<AstNode> {
        let header = file.includes.get(&node.start_byte())?;
        if !self.emitted.insert(header.clone()) {
            return None;
        }
        let files = self.files;
        let included = files.get(header)?;
        let children = self.lower_children(included, included.tree.root_node());
        Some(AstNode::new(NodeKind::Other).with_children(children))
    }

    /// `fallback_name` names anonymous records, e.g. from an enclosing typedef
    fn lower_record(
        &mut self,
        file: &'a ParsedFile,
        node: Node<'a>,
        fallback_name: Option<&str>,
    ) -> AstNode {
        let source = file.source.as_str();
        let name = node
            .child_by_field_name("name")
            .map(|n| simple_name(text(n, source)))
            .or(fallback_name);

        let mut record = AstNode::new(NodeKind::Record)
            .with_category(TypeCategory::Record)
            .at(location(file, node))
            .definition();
        if let Some(name) = name {
            record = record.named(name);
        }

        for clause in named_children(node) {
            if clause.kind() != "base_class_clause" {
                continue;
            }
            for base in named_children(clause) {
                if let Some(type_node) = self.lower_base(file, base) {
                    record.push(
                        AstNode::new(NodeKind::BaseSpecifier)
                            .at(location(file, base))
                            .with_children(vec![type_node]),
                    );
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            let members = self.lower_members(file, body);
            record.children.extend(members);
        }
        record
    }

    fn lower_base(&mut self, file: &'a ParsedFile, node: Node<'a>) -> Option<AstNode> {
        match node.kind() {
            "type_identifier" | "qualified_identifier" => self.type_ref(file, node),
            // Base<Derived>: the base is the template, not its arguments
            "template_type" => self.type_ref(file, node.child_by_field_name("name")?),
            _ => None,
        }
    }

    fn lower_members(&mut self, file: &'a ParsedFile, body: Node<'a>) -> Vec<AstNode> {
        let mut members = Vec::new();
        for member in named_children(body) {
            match member.kind() {
                "field_declaration" => members.extend(self.lower_field(file, member)),
                "type_definition" => members.extend(self.lower_typedef(file, member)),
                "alias_declaration" => members.extend(self.lower_using(file, member)),
                kind if kind.starts_with("preproc_") => {
                    members.extend(self.lower_members(file, member))
                }
                _ => {}
            }
        }
        members
    }

    /// One field node per declarator; methods and static members yield none
    fn lower_field(&mut self, file: &'a ParsedFile, node: Node<'a>) -> Vec<AstNode> {
        let source = file.source.as_str();
        let is_static = named_children(node)
            .iter()
            .any(|c| c.kind() == "storage_class_specifier" && text(*c, source) == "static");
        if is_static {
            return Vec::new();
        }
        let Some(type_node) = node.child_by_field_name("type") else {
            return Vec::new();
        };

        let declarators = field_children(node, "declarator");
        let lowered = self.lower_type(file, type_node);
        if declarators.is_empty() {
            // `struct Impl {...};` inside a class body declares a member type
            return lowered
                .into_iter()
                .filter(|n| n.kind == NodeKind::Record)
                .collect();
        }

        let value_category = self.value_category(file, type_node);
        declarators
            .into_iter()
            .filter_map(|declarator| {
                let info = Declarator::of(declarator, source);
                if info.is_method() {
                    return None;
                }
                let name = info.name.as_deref()?;
                Some(
                    AstNode::new(NodeKind::Field)
                        .named(name)
                        .with_category(info.shape().unwrap_or(value_category))
                        .at(location(file, declarator))
                        .with_children(lowered.iter().cloned().collect()),
                )
            })
            .collect()
    }

    fn lower_typedef(&mut self, file: &'a ParsedFile, node: Node<'a>) -> Vec<AstNode> {
        let source = file.source.as_str();
        let names: Vec<String> = field_children(node, "declarator")
            .into_iter()
            .filter_map(|d| Declarator::of(d, source).name)
            .collect();
        let Some(first) = names.first() else {
            return Vec::new();
        };

        let aliased = node.child_by_field_name("type").and_then(|t| {
            if RECORD_KINDS.contains(&t.kind()) && t.child_by_field_name("body").is_some() {
                Some(self.lower_record(file, t, Some(simple_name(first))))
            } else {
                self.lower_type(file, t)
            }
        });

        names
            .iter()
            .map(|name| {
                AstNode::new(NodeKind::TypeAlias)
                    .named(simple_name(name))
                    .with_category(TypeCategory::Alias)
                    .at(location(file, node))
                    .definition()
                    .with_children(aliased.iter().cloned().collect())
            })
            .collect()
    }

    fn lower_using(&mut self, file: &'a ParsedFile, node: Node<'a>) -> Option<AstNode> {
        let name = node.child_by_field_name("name")?;
        let aliased = node
            .child_by_field_name("type")
            .and_then(|t| self.lower_type(file, t));
        Some(
            AstNode::new(NodeKind::TypeAlias)
                .named(simple_name(text(name, &file.source)))
                .with_category(TypeCategory::Alias)
                .at(location(file, node))
                .definition()
                .with_children(aliased.into_iter().collect()),
        )
    }

    /// Lower a type specifier; None for primitives and anything unnamed
    fn lower_type(&mut self, file: &'a ParsedFile, node: Node<'a>) -> Option<AstNode> {
        let source = file.source.as_str();
        match node.kind() {
            kind if RECORD_KINDS.contains(&kind) => {
                if node.child_by_field_name("body").is_some() {
                    return Some(self.lower_record(file, node, None));
                }
                let name = node.child_by_field_name("name")?;
                Some(
                    AstNode::new(NodeKind::TypeRef)
                        .named(format!("{} {}", record_tag(kind), simple_name(text(name, source))))
                        .with_category(TypeCategory::Record),
                )
            }
            "qualified_identifier" => match node.child_by_field_name("name") {
                Some(inner) if inner.kind() == "template_type" => self.lower_type(file, inner),
                _ => self.type_ref(file, node),
            },
            "type_identifier" => self.type_ref(file, node),
            // vector<Point>: scan the arguments, the template itself is opaque
            "template_type" => {
                let arguments = node.child_by_field_name("arguments")?;
                let refs: Vec<AstNode> = named_children(arguments)
                    .into_iter()
                    .filter_map(|arg| self.lower_type(file, arg))
                    .collect();
                (!refs.is_empty()).then(|| AstNode::new(NodeKind::Other).with_children(refs))
            }
            "type_descriptor" => self.lower_type(file, node.child_by_field_name("type")?),
            _ => None,
        }
    }

    fn type_ref(&self, file: &ParsedFile, node: Node<'_>) -> Option<AstNode> {
        let spelled = text(node, &file.source);
        // `T`, `T::value_type`: dependent on a template parameter
        let head = spelled.split([':', '<']).next().unwrap_or(spelled).trim();
        if self.template_params.iter().any(|param| param == head) {
            return None;
        }
        let reference = AstNode::new(NodeKind::TypeRef);
        match self.index.category(spelled) {
            TypeCategory::Record => Some(
                reference
                    .named(format!("struct {}", simple_name(spelled)))
                    .with_category(TypeCategory::Record),
            ),
            TypeCategory::Alias => Some(
                reference
                    .named(simple_name(spelled))
                    .with_category(TypeCategory::Alias),
            ),
            TypeCategory::Primitive => None,
            other => Some(reference.named(spelled).with_category(other)),
        }
    }

    /// Category of a member declared by value with this type specifier
    fn value_category(&self, file: &ParsedFile, node: Node<'_>) -> TypeCategory {
        match node.kind() {
            "primitive_type" | "sized_type_specifier" | "enum_specifier" => TypeCategory::Primitive,
            kind if RECORD_KINDS.contains(&kind) => TypeCategory::Record,
            "type_identifier" | "qualified_identifier" => {
                self.index.category(text(node, &file.source))
            }
            _ => TypeCategory::Unexposed,
        }
    }
}

/// What a declarator chain says about the declared entity
#[derive(Debug, Default)]
struct Declarator {
    name: Option<String>,
    pointer: bool,
    reference: bool,
    array: bool,
    function: bool,
}

impl Declarator {
    fn of(node: Node<'_>, source: &str) -> Self {
        let mut info = Self::default();
        let mut current = Some(node);
        while let Some(node) = current {
            current = match node.kind() {
                "field_identifier" | "identifier" | "type_identifier" | "primitive_type"
                | "qualified_identifier" | "destructor_name" | "operator_name" => {
                    info.name = Some(text(node, source).to_string());
                    None
                }
                "pointer_declarator" | "pointer_field_declarator" | "pointer_type_declarator" => {
                    info.pointer = true;
                    inner_declarator(node)
                }
                "reference_declarator"
                | "reference_field_declarator"
                | "reference_type_declarator" => {
                    info.reference = true;
                    inner_declarator(node)
                }
                "array_declarator" | "array_field_declarator" | "array_type_declarator" => {
                    info.array = true;
                    inner_declarator(node)
                }
                "function_declarator"
                | "function_field_declarator"
                | "function_type_declarator" => {
                    info.function = true;
                    inner_declarator(node)
                }
                "parenthesized_declarator" | "attributed_declarator" | "init_declarator" => {
                    inner_declarator(node)
                }
                _ => None,
            };
        }
        info
    }

    /// A function declarator not reached through a pointer declares a method
    fn is_method(&self) -> bool {
        self.function && !self.pointer && !self.reference
    }

    /// Declared shape, when the declarator alone decides it
    fn shape(&self) -> Option<TypeCategory> {
        if self.pointer {
            Some(TypeCategory::Pointer)
        } else if self.reference {
            Some(TypeCategory::Reference)
        } else if self.array {
            Some(TypeCategory::Array)
        } else {
            None
        }
    }
}

fn inner_declarator(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("declarator")
        .or_else(|| named_children(node).pop())
}

/// Names introduced by a `template_parameter_list`
fn template_parameter_names(params: Node<'_>, source: &str) -> Vec<String> {
    named_children(params)
        .into_iter()
        .filter_map(|param| template_parameter_name(param, source))
        .collect()
}

fn template_parameter_name(param: Node<'_>, source: &str) -> Option<String> {
    match param.kind() {
        "type_parameter_declaration"
        | "variadic_type_parameter_declaration"
        | "optional_type_parameter_declaration" => param
            .child_by_field_name("name")
            .or_else(|| {
                named_children(param)
                    .into_iter()
                    .rfind(|c| c.kind() == "type_identifier")
            })
            .map(|name| text(name, source).to_string()),
        // template <template <typename> class C>
        "template_template_parameter_declaration" => named_children(param)
            .into_iter()
            .rev()
            .find_map(|inner| template_parameter_name(inner, source)),
        _ => None,
    }
}

fn record_tag(kind: &str) -> &'static str {
    match kind {
        "class_specifier" => "class",
        "union_specifier" => "union",
        _ => "struct",
    }
}

/// `ns::Box<int>` → `Box`
fn simple_name(spelled: &str) -> &str {
    let base = spelled.split('<').next().unwrap_or(spelled).trim();
    base.rsplit("::").next().unwrap_or(base).trim()
}

fn is_expression(kind: &str) -> bool {
    kind.ends_with("_expression")
        || matches!(
            kind,
            "argument_list"
                | "initializer_list"
                | "string_literal"
                | "raw_string_literal"
                | "concatenated_string"
                | "char_literal"
                | "number_literal"
                | "comment"
        )
}

fn location(file: &ParsedFile, node: Node<'_>) -> Location {
    Location::new(file.path.clone(), node.start_position().row + 1)
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Preorder over named nodes; `visit` returns whether to enter the children
fn for_each_named<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>) -> bool) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if visit(node) {
            stack.extend(named_children(node).into_iter().rev());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    const PATH: &str = "/project/test.cpp";

    fn lower(source: &str) -> AstNode {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_cpp::LANGUAGE.into()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        let parsed = ParsedFile {
            path: PathBuf::from(PATH),
            source: source.to_string(),
            tree,
            includes: HashMap::new(),
        };
        let mut index = TypeIndex::default();
        index.collect(&parsed);
        let files = HashMap::from([(PathBuf::from(PATH), parsed)]);
        lower_unit(&files, &index, Path::new(PATH)).unwrap()
    }

    fn find<'n>(node: &'n AstNode, kind: NodeKind, name: &str) -> Option<&'n AstNode> {
        if node.kind == kind && node.display_name.as_deref() == Some(name) {
            return Some(node);
        }
        node.children.iter().find_map(|c| find(c, kind, name))
    }

    fn type_refs(node: &AstNode) -> Vec<(String, TypeCategory)> {
        let mut refs = Vec::new();
        crate::ast::walk(node, |n, _| {
            if n.kind == NodeKind::TypeRef {
                refs.push((n.display_name.clone().unwrap_or_default(), n.type_category));
            }
            crate::ast::Walk::Descend
        });
        refs
    }

    #[test]
    fn test_c_struct_fields() {
        let root = lower(
            "struct Point { int x; int y; };\n\
             struct Line { struct Point *start; struct Point end; };\n",
        );
        let line = find(&root, NodeKind::Record, "Line").unwrap();
        assert!(line.is_definition);
        assert_eq!(line.location, Some(Location::new(PATH, 2)));

        let start = find(line, NodeKind::Field, "start").unwrap();
        assert_eq!(start.type_category, TypeCategory::Pointer);
        assert_eq!(
            type_refs(start),
            vec![("struct Point".to_string(), TypeCategory::Record)]
        );

        let end = find(line, NodeKind::Field, "end").unwrap();
        assert_eq!(end.type_category, TypeCategory::Record);

        let point = find(&root, NodeKind::Record, "Point").unwrap();
        assert_eq!(point.children.len(), 2);
        assert!(type_refs(point).is_empty());
    }

    #[test]
    fn test_multiple_declarators() {
        let root = lower("struct P { int v; };\nstruct Pair { P a, *b; };\n");
        let pair = find(&root, NodeKind::Record, "Pair").unwrap();

        let a = find(pair, NodeKind::Field, "a").unwrap();
        let b = find(pair, NodeKind::Field, "b").unwrap();
        assert_eq!(a.type_category, TypeCategory::Record);
        assert_eq!(b.type_category, TypeCategory::Pointer);
        assert_eq!(type_refs(b), vec![("struct P".to_string(), TypeCategory::Record)]);
    }

    #[test]
    fn test_class_members() {
        let root = lower(
            "struct Shape { int id; };\n\
             struct Point { int x; };\n\
             class Circle : public Shape {\n\
             public:\n\
                 Circle();\n\
                 double area() const;\n\
                 static int count;\n\
                 Point *center;\n\
                 Point &origin;\n\
                 void (*on_draw)(int);\n\
             };\n",
        );
        let circle = find(&root, NodeKind::Record, "Circle").unwrap();
        let fields: Vec<_> = circle
            .children
            .iter()
            .filter(|c| c.kind == NodeKind::Field)
            .filter_map(|c| c.display_name.clone())
            .collect();
        assert_eq!(fields, vec!["center", "origin", "on_draw"]);

        let origin = find(circle, NodeKind::Field, "origin").unwrap();
        assert_eq!(origin.type_category, TypeCategory::Reference);
        let on_draw = find(circle, NodeKind::Field, "on_draw").unwrap();
        assert_eq!(on_draw.type_category, TypeCategory::Pointer);

        let base = circle
            .children
            .iter()
            .find(|c| c.kind == NodeKind::BaseSpecifier)
            .unwrap();
        assert_eq!(
            type_refs(base),
            vec![("struct Shape".to_string(), TypeCategory::Record)]
        );
    }

    #[test]
    fn test_anonymous_typedef_record_takes_alias_name() {
        let root = lower("typedef struct { float x, y, z; } Vec3;\n");
        let alias = find(&root, NodeKind::TypeAlias, "Vec3").unwrap();
        let body = find(alias, NodeKind::Record, "Vec3").unwrap();
        assert!(body.is_definition);
        assert_eq!(body.children.len(), 3);
    }

    #[test]
    fn test_alias_name_wins_over_record_name() {
        let root = lower("typedef struct Node Node;\nstruct Node { Node *next; };\n");
        let alias = find(&root, NodeKind::TypeAlias, "Node").unwrap();
        assert_eq!(
            type_refs(alias),
            vec![("struct Node".to_string(), TypeCategory::Record)]
        );

        let node = find(&root, NodeKind::Record, "Node").unwrap();
        let next = find(node, NodeKind::Field, "next").unwrap();
        assert_eq!(type_refs(next), vec![("Node".to_string(), TypeCategory::Alias)]);
    }

    #[test]
    fn test_template_arguments_are_scanned() {
        let root = lower("struct Point { int x; };\nstruct Path { std::vector<Point> points; };\n");
        let path = find(&root, NodeKind::Record, "Path").unwrap();
        let points = find(path, NodeKind::Field, "points").unwrap();
        assert_eq!(
            type_refs(points),
            vec![("struct Point".to_string(), TypeCategory::Record)]
        );
    }

    #[test]
    fn test_template_parameters_are_not_references() {
        let root = lower(
            "struct Point { int x; };\n\
             template <typename T, class Alloc = int>\n\
             struct Box { T value; T *next; typename T::size_type n; Alloc a; Point p; };\n",
        );
        let boxed = find(&root, NodeKind::Record, "Box").unwrap();
        assert_eq!(
            type_refs(boxed),
            vec![("struct Point".to_string(), TypeCategory::Record)]
        );
        let value = find(boxed, NodeKind::Field, "value").unwrap();
        assert!(value.children.is_empty());
    }

    #[test]
    fn test_template_parameters_are_scoped() {
        let root = lower(
            "template <typename T> struct Box { T value; };\n\
             struct Holder { T raw; };\n",
        );
        let holder = find(&root, NodeKind::Record, "Holder").unwrap();
        assert_eq!(
            type_refs(holder),
            vec![("T".to_string(), TypeCategory::Unexposed)]
        );
    }

    #[test]
    fn test_enums_and_primitives_have_no_references() {
        let root = lower(
            "enum Color { RED, GREEN };\n\
             struct Pixel { enum Color c; unsigned long n; char name[8]; };\n",
        );
        let pixel = find(&root, NodeKind::Record, "Pixel").unwrap();
        assert!(type_refs(pixel).is_empty());
        let name = find(pixel, NodeKind::Field, "name").unwrap();
        assert_eq!(name.type_category, TypeCategory::Array);
    }

    #[test]
    fn test_unknown_names_are_unexposed() {
        let root = lower("struct Guard { pthread_mutex_t lock; };\n");
        let guard = find(&root, NodeKind::Record, "Guard").unwrap();
        assert_eq!(
            type_refs(guard),
            vec![("pthread_mutex_t".to_string(), TypeCategory::Unexposed)]
        );
    }

    #[test]
    fn test_declarations_inside_namespaces_and_functions() {
        let root = lower(
            "namespace geo { struct Point { int x; }; }\n\
             void f() { struct Local { int y; }; }\n",
        );
        assert!(find(&root, NodeKind::Record, "Point").is_some());
        assert!(find(&root, NodeKind::Record, "Local").is_some());
    }

    #[test]
    fn test_using_alias() {
        let root = lower("struct Point { int x; };\nusing Spot = Point;\n");
        let alias = find(&root, NodeKind::TypeAlias, "Spot").unwrap();
        assert_eq!(
            type_refs(alias),
            vec![("struct Point".to_string(), TypeCategory::Record)]
        );
    }

    #[test]
    fn test_include_directives() {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_cpp::LANGUAGE.into()).unwrap();
        let source = "#include \"a.h\"\n#include <b.h>\n#include MACRO\n";
        let tree = parser.parse(source, None).unwrap();

        let found: Vec<_> = include_directives(&tree, source)
            .into_iter()
            .map(|(_, spelled, quoted)| (spelled, quoted))
            .collect();
        assert_eq!(
            found,
            vec![("a.h".to_string(), true), ("b.h".to_string(), false)]
        );
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("ns::Box<int>"), "Box");
        assert_eq!(simple_name("Point"), "Point");
        assert_eq!(simple_name("a::b::C"), "C");
    }
}
