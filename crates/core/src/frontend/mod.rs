//! AST front-end for C and C++ sources
//!
//! Parses a source file with tree-sitter and lowers it into the
//! [`AstNode`](crate::ast::AstNode) model the classifier consumes.
//!
//! # Translation units
//!
//! A unit is the compiled file plus every project header it reaches through
//! `#include`, the way a compiler would see it. Compilation happens in two
//! passes:
//!
//! - **Pass 1**: parse the source file and, transitively, every include that
//!   resolves to a file on disk. Names of records, typedefs, `using` aliases
//!   and enums declared anywhere in the unit go into a [`TypeIndex`].
//! - **Pass 2**: lower the source file, inlining each header at its first
//!   `#include` site. The index decides whether a bare type name refers to a
//!   record or an alias.
//!
//! Include resolution: `"..."` searches the including file's directory, then
//! the `-I` directories; `<...>` searches only the `-I` directories.
//! Unresolved includes (system headers, generated files) are skipped.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use tree_sitter::{Parser, Tree};

use crate::ast::{AstNode, Location};
use crate::error::{ExtractError, Result};

mod cpp;

pub use cpp::TypeIndex;

/// A lowered translation unit
#[derive(Debug)]
pub struct TranslationUnit {
    /// Canonical path of the compiled file
    pub path: PathBuf,
    pub root: AstNode,
    /// Every file parsed for this unit, compiled file first
    pub files: Vec<PathBuf>,
    /// Syntax problems in any parsed file; the tree is partial when non-empty
    pub diagnostics: Vec<Diagnostic>,
}

/// One syntax problem reported by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Front-end configured for one compile command
#[derive(Debug, Clone, Default)]
pub struct FrontEnd {
    include_dirs: Vec<PathBuf>,
}

/// Source text with its syntax tree and resolved includes
pub(crate) struct ParsedFile {
    pub(crate) path: PathBuf,
    pub(crate) source: String,
    pub(crate) tree: Tree,
    /// `#include` node start byte → resolved header
    pub(crate) includes: HashMap<usize, PathBuf>,
}

impl FrontEnd {
    pub fn new(include_dirs: Vec<PathBuf>) -> Self {
        Self { include_dirs }
    }

    /// Compile one source file into a lowered translation unit
    pub fn compile(&self, path: &Path) -> Result<TranslationUnit> {
        let main = path.canonicalize().map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_cpp::LANGUAGE.into())?;

        // Pass 1: the compiled file and every reachable header
        let mut files: HashMap<PathBuf, ParsedFile> = HashMap::new();
        let mut order: Vec<PathBuf> = Vec::new();
        let mut pending = VecDeque::from([main.clone()]);
        let mut seen: HashSet<PathBuf> = HashSet::new();

        while let Some(next) = pending.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }
            let parsed = match self.parse_file(&mut parser, &next) {
                Ok(parsed) => parsed,
                Err(err) if next == main => return Err(err),
                Err(err) => {
                    warn!(header = %next.display(), error = %err, "skipping unreadable header");
                    continue;
                }
            };
            let mut headers: Vec<(&usize, &PathBuf)> = parsed.includes.iter().collect();
            headers.sort();
            pending.extend(headers.into_iter().map(|(_, header)| header.clone()));
            order.push(next.clone());
            files.insert(next, parsed);
        }

        let mut index = TypeIndex::default();
        let mut diagnostics = Vec::new();
        for path in &order {
            let parsed = &files[path];
            index.collect(parsed);
            for diagnostic in cpp::syntax_diagnostics(parsed) {
                warn!(
                    location = %diagnostic.location,
                    "{}, continuing with partial tree",
                    diagnostic.message
                );
                diagnostics.push(diagnostic);
            }
        }

        // Pass 2: lower with includes inlined
        let root = cpp::lower_unit(&files, &index, &main).ok_or_else(|| ExtractError::Parse {
            path: main.clone(),
        })?;

        debug!(
            unit = %main.display(),
            files = order.len(),
            nodes = root.subtree_len(),
            "compiled translation unit"
        );

        Ok(TranslationUnit {
            path: main,
            root,
            files: order,
            diagnostics,
        })
    }

    fn parse_file(&self, parser: &mut Parser, path: &Path) -> Result<ParsedFile> {
        let source = std::fs::read_to_string(path).map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| ExtractError::Parse {
                path: path.to_path_buf(),
            })?;

        let mut includes = HashMap::new();
        for (offset, spelled, quoted) in cpp::include_directives(&tree, &source) {
            match self.resolve_include(path, &spelled, quoted) {
                Some(header) => {
                    includes.insert(offset, header);
                }
                None => debug!(from = %path.display(), include = %spelled, "unresolved include"),
            }
        }

        Ok(ParsedFile {
            path: path.to_path_buf(),
            source,
            tree,
            includes,
        })
    }

    fn resolve_include(&self, from: &Path, spelled: &str, quoted: bool) -> Option<PathBuf> {
        let local = if quoted { from.parent() } else { None };
        local
            .into_iter()
            .chain(self.include_dirs.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(spelled))
            .find(|candidate| candidate.is_file())
            .and_then(|found| found.canonicalize().ok())
    }
}
