//! Compilation database (`compile_commands.json`) lookup
//!
//! Only the include search path matters to the front-end, so each entry is
//! reduced to its `-I` directories, resolved against the entry's working
//! directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{ExtractError, Result};

/// Conventional database file name
pub const DATABASE_FILE: &str = "compile_commands.json";

/// One entry as written by CMake, Bear, etc.
#[derive(Debug, Deserialize)]
struct RawEntry {
    directory: PathBuf,
    file: PathBuf,
    #[serde(default)]
    arguments: Option<Vec<String>>,
    #[serde(default)]
    command: Option<String>,
}

/// Arguments the front-end needs for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileCommand {
    pub file: PathBuf,
    pub include_dirs: Vec<PathBuf>,
}

/// Loaded compilation database keyed by absolute source path
#[derive(Debug)]
pub struct CompileDatabase {
    path: PathBuf,
    entries: HashMap<PathBuf, CompileCommand>,
}

impl CompileDatabase {
    /// Load a database from disk
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json(&json, base, path)
    }

    /// Parse database contents; relative entry directories resolve against `base`
    pub fn from_json(json: &str, base: &Path, path: &Path) -> Result<Self> {
        let raw: Vec<RawEntry> =
            serde_json::from_str(json).map_err(|source| ExtractError::CompileDatabase {
                path: path.to_path_buf(),
                source,
            })?;

        let mut entries = HashMap::new();
        for entry in raw {
            let directory = base.join(&entry.directory);
            let file = normalize(&directory.join(&entry.file));
            let args = match (entry.arguments, entry.command) {
                (Some(args), _) => args,
                (None, Some(command)) => command.split_whitespace().map(str::to_string).collect(),
                (None, None) => Vec::new(),
            };
            let include_dirs = include_dirs(&args, &directory);
            // First entry for a file wins, as with clang tooling
            entries.entry(file.clone()).or_insert(CompileCommand { file, include_dirs });
        }

        debug!(path = %path.display(), entries = entries.len(), "loaded compilation database");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Compile command for a source file
    pub fn lookup(&self, file: &Path) -> Option<&CompileCommand> {
        self.entries.get(&normalize(file))
    }

    /// Like [`lookup`](Self::lookup), but a missing entry is an error
    pub fn require(&self, file: &Path) -> Result<&CompileCommand> {
        self.lookup(file)
            .ok_or_else(|| ExtractError::MissingCompileCommand {
                path: file.to_path_buf(),
                database: self.path.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `-I<dir>` and `-I <dir>` arguments, in order
fn include_dirs(args: &[String], directory: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some(rest) = arg.strip_prefix("-I") else {
            continue;
        };
        let dir = if rest.is_empty() {
            match iter.next() {
                Some(next) => next.as_str(),
                None => break,
            }
        } else {
            rest
        };
        dirs.push(normalize(&directory.join(dir)));
    }
    dirs
}

/// Canonical path when it exists on disk, the path as given otherwise
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_entry() {
        let json = r#"[{
            "directory": "/work/build",
            "file": "../src/main.c",
            "arguments": ["cc", "-I../include", "-I", "/opt/inc", "-DDEBUG", "-c", "main.c"]
        }]"#;
        let db = CompileDatabase::from_json(json, Path::new("/"), Path::new("db.json")).unwrap();

        let cmd = db.lookup(Path::new("/work/build/../src/main.c")).unwrap();
        assert_eq!(
            cmd.include_dirs,
            vec![PathBuf::from("/work/build/../include"), PathBuf::from("/opt/inc")]
        );
    }

    #[test]
    fn test_command_entry() {
        let json = r#"[{
            "directory": "/work",
            "file": "a.c",
            "command": "gcc -Iinc -c a.c"
        }]"#;
        let db = CompileDatabase::from_json(json, Path::new("/"), Path::new("db.json")).unwrap();
        let cmd = db.lookup(Path::new("/work/a.c")).unwrap();
        assert_eq!(cmd.include_dirs, vec![PathBuf::from("/work/inc")]);
    }

    #[test]
    fn test_missing_entry() {
        let db = CompileDatabase::from_json("[]", Path::new("/"), Path::new("db.json")).unwrap();
        assert!(db.is_empty());
        let err = db.require(Path::new("/work/b.c")).unwrap_err();
        assert!(matches!(err, ExtractError::MissingCompileCommand { .. }));
    }

    #[test]
    fn test_malformed_database() {
        let err = CompileDatabase::from_json("{", Path::new("/"), Path::new("db.json")).unwrap_err();
        assert!(matches!(err, ExtractError::CompileDatabase { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("a.c"), "struct A { int x; };").unwrap();
        std::fs::write(
            root.join(DATABASE_FILE),
            r#"[{"directory": ".", "file": "a.c", "arguments": ["cc", "-Iinclude", "a.c"]}]"#,
        )
        .unwrap();

        let db = CompileDatabase::load(&root.join(DATABASE_FILE)).unwrap();
        assert_eq!(db.len(), 1);
        let cmd = db.lookup(&root.join("a.c")).unwrap();
        assert_eq!(cmd.file, root.join("a.c"));
        assert_eq!(cmd.include_dirs, vec![root.join("./include")]);
    }
}
