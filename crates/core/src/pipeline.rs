//! Extraction driver
//!
//! Discovers translation units, compiles and classifies them in parallel and
//! folds the per-unit fact batches into one [`FactStore`].
//!
//! Units are independent, so each worker produces its own batch. Batches
//! are merged by the calling thread alone, in sorted path order, so the
//! first-write/last-write policies of the store give the same result no
//! matter how the workers were scheduled. A unit that fails to compile is
//! logged and contributes nothing.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::classify::{ClassifyConfig, Classifier};
use crate::compile_db::{CompileDatabase, DATABASE_FILE};
use crate::discovery::{self, DEFAULT_PATTERNS};
use crate::error::{ExtractError, Result};
use crate::facts::{Fact, RelationshipKind};
use crate::frontend::{FrontEnd, TranslationUnit};
use crate::graph::TypeGraph;
use crate::store::FactStore;

/// Everything a run needs to know
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Codebase root; compile-db lookup key and capture filter
    pub root: PathBuf,
    /// Database path; `<root>/compile_commands.json` when unset
    pub compile_db: Option<PathBuf>,
    /// Glob patterns selecting translation units, relative to `root`
    pub patterns: Vec<String>,
    /// Regular expression candidate paths must match
    pub path_filter: Option<Regex>,
    pub pointer_relationship: RelationshipKind,
    /// Worker threads; 0 lets rayon decide
    pub jobs: usize,
    /// Keep each compiled unit's lowered tree in [`Extraction::units`]
    pub retain_trees: bool,
}

impl ExtractConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            compile_db: None,
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            path_filter: None,
            pointer_relationship: RelationshipKind::Aggregation,
            jobs: 0,
            retain_trees: false,
        }
    }

    pub fn with_compile_db(mut self, path: impl Into<PathBuf>) -> Self {
        self.compile_db = Some(path.into());
        self
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Compile and set the path filter
    pub fn with_path_filter(mut self, pattern: &str) -> Result<Self> {
        self.path_filter = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn with_pointer_relationship(mut self, kind: RelationshipKind) -> Self {
        self.pointer_relationship = kind;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_retained_trees(mut self, retain: bool) -> Self {
        self.retain_trees = retain;
        self
    }
}

/// A translation unit that contributed no facts
#[derive(Debug)]
pub struct SkippedUnit {
    pub path: PathBuf,
    pub error: ExtractError,
}

/// Result of an extraction run
#[derive(Debug, Default)]
pub struct Extraction {
    pub store: FactStore,
    /// Units that compiled, in merge order
    pub compiled: Vec<PathBuf>,
    pub skipped: Vec<SkippedUnit>,
    /// Lowered trees of the compiled units when `retain_trees` is set
    pub units: Vec<TranslationUnit>,
}

impl Extraction {
    /// Resolve the merged facts into the type graph
    pub fn graph(&self) -> TypeGraph {
        TypeGraph::build(self.store.symbols(), self.store.references())
    }
}

/// Run discovery, compilation and merging for a codebase
///
/// Fails only on configuration problems: an inaccessible root, bad glob
/// patterns or a thread pool that cannot start.
pub fn extract(config: &ExtractConfig) -> Result<Extraction> {
    let root = config
        .root
        .canonicalize()
        .map_err(|source| ExtractError::Root {
            path: config.root.clone(),
            source,
        })?;

    let files = discovery::discover_files(&root, &config.patterns, config.path_filter.as_ref())?;
    info!(root = %root.display(), candidates = files.len(), "discovered translation units");

    let database = load_database(config, &root);
    extract_files(config, &root, &files, database.as_ref())
}

/// Compile and merge an explicit list of files
///
/// `root` must already be canonical. Without a database every file is
/// compiled with no arguments.
pub fn extract_files(
    config: &ExtractConfig,
    root: &Path,
    files: &[PathBuf],
    database: Option<&CompileDatabase>,
) -> Result<Extraction> {
    let classifier = Classifier::new(
        ClassifyConfig::new(root).with_pointer_relationship(config.pointer_relationship),
    );

    let mut files = files.to_vec();
    files.sort();
    files.dedup();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()?;
    let outcomes: Vec<(PathBuf, Result<(TranslationUnit, Vec<Fact>)>)> = pool.install(|| {
        files
            .par_iter()
            .map(|path| (path.clone(), extract_unit(&classifier, database, path)))
            .collect()
    });

    let mut extraction = Extraction::default();
    for (path, outcome) in outcomes {
        match outcome {
            Ok((unit, facts)) => {
                extraction.store.merge(facts);
                extraction.compiled.push(path);
                if config.retain_trees {
                    extraction.units.push(unit);
                }
            }
            Err(error) => {
                warn!(unit = %path.display(), error = %error, "skipping translation unit");
                extraction.skipped.push(SkippedUnit { path, error });
            }
        }
    }

    info!(
        compiled = extraction.compiled.len(),
        skipped = extraction.skipped.len(),
        symbols = extraction.store.symbols().len(),
        references = extraction.store.references().len(),
        collisions = extraction.store.collisions().len(),
        "merged facts"
    );
    Ok(extraction)
}

/// Compile one unit and classify its tree
pub fn extract_unit(
    classifier: &Classifier,
    database: Option<&CompileDatabase>,
    path: &Path,
) -> Result<(TranslationUnit, Vec<Fact>)> {
    let include_dirs = match database {
        Some(database) => database.require(path)?.include_dirs.clone(),
        None => Vec::new(),
    };
    let unit = FrontEnd::new(include_dirs).compile(path)?;
    let facts = classifier.extract_facts(&unit.root);
    debug!(
        unit = %unit.path.display(),
        files = unit.files.len(),
        diagnostics = unit.diagnostics.len(),
        facts = facts.len(),
        "extracted translation unit"
    );
    Ok((unit, facts))
}

/// A missing or unreadable database is not fatal: units compile without arguments
fn load_database(config: &ExtractConfig, root: &Path) -> Option<CompileDatabase> {
    let path = config
        .compile_db
        .clone()
        .unwrap_or_else(|| root.join(DATABASE_FILE));
    if !path.exists() {
        warn!(
            path = %path.display(),
            "no compilation database, compiling every file without arguments"
        );
        return None;
    }
    match CompileDatabase::load(&path) {
        Ok(database) => {
            info!(
                path = %database.path().display(),
                entries = database.len(),
                "loaded compilation database"
            );
            Some(database)
        }
        Err(error) => {
            warn!(error = %error, "ignoring compilation database");
            None
        }
    }
}
