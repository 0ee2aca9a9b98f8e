//! File discovery module with gitignore-aware filtering
//!
//! This module finds the translation units to compile under a codebase root.
//! Candidates must match one of the glob patterns and, when given, the path
//! filter regular expression. `.gitignore` rules are respected.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use regex::Regex;
use tracing::warn;

use crate::error::{ExtractError, Result};

/// Source file patterns used when none are configured
pub const DEFAULT_PATTERNS: [&str; 4] = ["**/*.c", "**/*.cc", "**/*.cpp", "**/*.cxx"];

/// Discover files matching glob patterns in a project directory
///
/// # Arguments
/// * `root` - Root directory to search
/// * `patterns` - Glob patterns relative to `root` (e.g., &["**/*.c", "src/**/*.cpp"])
/// * `filter` - Optional regular expression the absolute path must match
///
/// # Returns
/// Sorted absolute paths of matching files, excluding those matched by .gitignore
///
/// # Example
/// ```no_run
/// use structgraph_core::discovery;
///
/// let files = discovery::discover_files(std::path::Path::new("my_project"), &["**/*.c"], None).unwrap();
/// println!("Found {} files", files.len());
/// ```
pub fn discover_files<S: AsRef<str>>(
    root: &Path,
    patterns: &[S],
    filter: Option<&Regex>,
) -> Result<Vec<PathBuf>> {
    let canonical_root = root.canonicalize().map_err(|source| ExtractError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    let glob_matcher = build_glob_matcher(patterns)?;

    let mut files = Vec::new();
    for result in build_walker(&canonical_root) {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                // Keep walking; one unreadable directory must not hide the rest
                warn!(error = %err, "error walking directory");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let Ok(rel_path) = entry.path().strip_prefix(&canonical_root) else {
            continue;
        };
        if !glob_matcher.is_match(rel_path) {
            continue;
        }
        if let Some(filter) = filter {
            if !filter.is_match(&entry.path().to_string_lossy()) {
                continue;
            }
        }
        files.push(entry.into_path());
    }

    files.sort();
    Ok(files)
}

/// Discover C and C++ sources with [`DEFAULT_PATTERNS`]
pub fn discover_sources(root: &Path) -> Result<Vec<PathBuf>> {
    discover_files(root, &DEFAULT_PATTERNS, None)
}

/// Build a glob matcher from the provided patterns
fn build_glob_matcher<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref())?);
    }
    Ok(builder.build()?)
}

/// Build a WalkBuilder with proper ignore configuration
fn build_walker(root: &Path) -> ignore::Walk {
    let mut builder = WalkBuilder::new(root);
    builder
        .git_ignore(true)
        .git_exclude(true)
        .hidden(false)
        .parents(true); // Also check parent directories for .gitignore

    // Outside a git repository WalkBuilder skips the root .gitignore
    let gitignore_path = root.join(".gitignore");
    if gitignore_path.exists() {
        if let Some(err) = builder.add_ignore(&gitignore_path) {
            warn!(path = %gitignore_path.display(), error = %err, "unreadable .gitignore");
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_discover_basic() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        File::create(root.join("main.c")).unwrap();
        File::create(root.join("shapes.cpp")).unwrap();
        File::create(root.join("shapes.h")).unwrap();

        let files = discover_sources(root).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.is_absolute()));
        assert!(files.iter().any(|p| p.ends_with("main.c")));
        assert!(files.iter().any(|p| p.ends_with("shapes.cpp")));
    }

    #[test]
    fn test_respect_gitignore() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let mut gitignore = File::create(root.join(".gitignore")).unwrap();
        gitignore.write_all(b"build/\n").unwrap();

        fs::create_dir_all(root.join("build")).unwrap();
        File::create(root.join("build/generated.c")).unwrap();
        File::create(root.join("main.c")).unwrap();

        let files = discover_sources(root).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("main.c"));
    }

    #[test]
    fn test_path_filter() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("tests")).unwrap();
        File::create(root.join("src/net.c")).unwrap();
        File::create(root.join("tests/test_net.c")).unwrap();

        let filter = Regex::new(r"/src/").unwrap();
        let files = discover_files(root, &["**/*.c"], Some(&filter)).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/net.c"));
    }

    #[test]
    fn test_results_are_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for name in ["c.c", "a.c", "b.c"] {
            File::create(root.join(name)).unwrap();
        }

        let files = discover_sources(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name())
            .filter_map(|n| n.to_str())
            .collect();
        assert_eq!(names, vec!["a.c", "b.c", "c.c"]);
    }

    #[test]
    fn test_invalid_glob() {
        let temp_dir = TempDir::new().unwrap();
        let err = discover_files(temp_dir.path(), &["src/[.c"], None).unwrap_err();
        assert!(matches!(err, ExtractError::Glob(_)));
    }

    #[test]
    fn test_missing_root() {
        let err = discover_sources(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ExtractError::Root { .. }));
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(discover_sources(temp_dir.path()).unwrap().is_empty());
    }
}
