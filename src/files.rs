//! File sources for the rule engine
//!
//! The engine never walks directories itself. It receives a [`FileSource`]
//! that lists files (relative to the project root) and reads them on demand,
//! so a single unreadable file only costs that file.

use crate::detectors::base::is_script_path;
use anyhow::{bail, Result};
use ignore::{DirEntry, WalkBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Directories never analysed, even when not gitignored
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    ".next",
    "out",
    "coverage",
    ".git",
];

#[derive(Error, Debug)]
pub enum FileError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not valid UTF-8")]
    NotUtf8(PathBuf),
}

/// Trait for supplying source files to the engine.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// rayon workers.
pub trait FileSource: Send + Sync {
    /// Relative paths of every file to analyse
    fn paths(&self) -> &[PathBuf];

    /// Read one file as UTF-8 text
    fn read(&self, path: &Path) -> Result<String, FileError>;
}

/// Files discovered on disk under a project root
pub struct WalkedFiles {
    root: PathBuf,
    paths: Vec<PathBuf>,
}

impl WalkedFiles {
    /// Walk `root`, honouring .gitignore and skipping [`EXCLUDED_DIRS`].
    ///
    /// A missing root is the one fatal input error.
    pub fn discover(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            bail!("Project path does not exist: {}", root.display());
        }

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false)
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !(entry.depth() > 0
                    && entry.file_type().is_some_and(|t| t.is_dir())
                    && EXCLUDED_DIRS.contains(&name.as_ref()))
            })
            .build();

        let mut paths = Vec::new();
        for entry in walker.filter_map(entry_or_warn) {
            let path = entry.path();
            if !path.is_file() || !is_script_path(path) || is_generated(path) {
                continue;
            }
            if let Ok(rel) = path.strip_prefix(root) {
                paths.push(rel.to_path_buf());
            }
        }
        paths.sort();

        debug!("Discovered {} source files under {}", paths.len(), root.display());
        Ok(Self {
            root: root.to_path_buf(),
            paths,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Walk errors (unreadable directories, bad links) skip that entry only
fn entry_or_warn(entry: Result<DirEntry, ignore::Error>) -> Option<DirEntry> {
    match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("Skipping unreadable path during discovery: {}", e);
            None
        }
    }
}

/// Type declarations and minified bundles are not hand-written source
fn is_generated(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    name.ends_with(".d.ts") || name.ends_with(".min.js")
}

impl FileSource for WalkedFiles {
    fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn read(&self, path: &Path) -> Result<String, FileError> {
        let full = self.root.join(path);
        let bytes = std::fs::read(&full).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FileError::NotFound(path.to_path_buf())
            } else {
                FileError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        String::from_utf8(bytes).map_err(|_| FileError::NotUtf8(path.to_path_buf()))
    }
}

/// In-memory file set, for tests and for callers that already hold content
#[derive(Default)]
pub struct InMemoryFiles {
    paths: Vec<PathBuf>,
    contents: BTreeMap<PathBuf, Option<String>>,
}

impl InMemoryFiles {
    /// Build from `(relative_path, content)` pairs
    pub fn new<P: Into<PathBuf>, S: Into<String>>(entries: impl IntoIterator<Item = (P, S)>) -> Self {
        let mut files = Self::default();
        for (path, content) in entries {
            files = files.with_file(path, content);
        }
        files
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        if !self.contents.contains_key(&path) {
            self.paths.push(path.clone());
        }
        self.contents.insert(path, Some(content.into()));
        self
    }

    /// A listed file whose read fails, as an unreadable file on disk would
    pub fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !self.contents.contains_key(&path) {
            self.paths.push(path.clone());
        }
        self.contents.insert(path, None);
        self
    }
}

impl FileSource for InMemoryFiles {
    fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn read(&self, path: &Path) -> Result<String, FileError> {
        match self.contents.get(path) {
            Some(Some(content)) => Ok(content.clone()),
            Some(None) => Err(FileError::Read {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "unreadable"),
            }),
            None => Err(FileError::NotFound(path.to_path_buf())),
        }
    }
}
