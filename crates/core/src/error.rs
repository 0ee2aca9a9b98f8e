//! Error types for the extraction pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while discovering, compiling or extracting
///
/// Per-unit variants (`Read`, `Parse`, `MissingCompileCommand`) are turned
/// into warnings by the pipeline; they never abort a run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("codebase root {path} is not accessible: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse { path: PathBuf },

    #[error("failed to load language grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("failed to load compilation database {path}: {source}")]
    CompileDatabase {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no compile command for {path} in {database}")]
    MissingCompileCommand { path: PathBuf, database: PathBuf },

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("invalid path filter: {0}")]
    PathFilter(#[from] regex::Error),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;
