//! Read-only views of a source tree
//!
//! Collectors never touch the filesystem directly; they ask a [`SourceTree`]
//! for paths and contents. [`DirectoryTree`] walks a directory once
//! (gitignore-aware) and caches contents so every collector shares a single
//! read per file. Both trees carry an [`AnalysisCache`] so each source file is
//! parsed once per run. [`MemoryTree`] backs tests.

use crate::error::{ConfigError, ConfigResult};
use crate::syntax::AnalysisCache;
use dashmap::DashMap;
use ignore::overrides::OverrideBuilder;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Source languages the collectors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Rust,
    Go,
}

impl Language {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext {
            "py" | "pyi" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "mts" | "cts" => Some(Language::TypeScript),
            "tsx" => Some(Language::Tsx),
            "rs" => Some(Language::Rust),
            "go" => Some(Language::Go),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Rust => "rust",
            Language::Go => "go",
        }
    }
}

/// Read-only access to a set of files.
///
/// Paths are relative to the tree root and listed in sorted order.
pub trait SourceTree: Send + Sync {
    fn entries(&self) -> &[PathBuf];

    fn read(&self, path: &Path) -> io::Result<Arc<String>>;

    /// Parse results shared by every collector over this tree.
    fn analyses(&self) -> &AnalysisCache;

    /// Entries in a supported source language.
    fn source_files(&self) -> Vec<(PathBuf, Language)> {
        self.entries()
            .iter()
            .filter_map(|p| Language::from_path(p).map(|lang| (p.clone(), lang)))
            .collect()
    }

    /// Entries whose file name is `name`, at any depth.
    fn files_named(&self, name: &str) -> Vec<PathBuf> {
        self.entries()
            .iter()
            .filter(|p| p.file_name().and_then(|n| n.to_str()) == Some(name))
            .cloned()
            .collect()
    }
}

/// A directory on disk.
pub struct DirectoryTree {
    root: PathBuf,
    entries: Vec<PathBuf>,
    contents: DashMap<PathBuf, Arc<String>>,
    analyses: AnalysisCache,
}

impl DirectoryTree {
    /// Walk `root`, honouring `.gitignore` and the `exclude` globs.
    pub fn open(root: &Path, exclude: &[String]) -> ConfigResult<Self> {
        if !root.is_dir() {
            return Err(ConfigError::InvalidValue(format!(
                "source directory {} does not exist or is not a directory",
                root.display()
            )));
        }

        let mut overrides = OverrideBuilder::new(root);
        for pattern in exclude {
            overrides.add(&format!("!{}", pattern)).map_err(|e| {
                ConfigError::InvalidValue(format!("bad exclude pattern '{}': {}", pattern, e))
            })?;
        }
        let overrides = overrides
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("bad exclude patterns: {}", e)))?;

        let walker = ignore::WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .overrides(overrides)
            .build();

        let mut entries: Vec<PathBuf> = walker
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
            .collect();
        entries.sort();

        debug!("Found {} files under {}", entries.len(), root.display());

        Ok(Self {
            root: root.to_path_buf(),
            entries,
            contents: DashMap::new(),
            analyses: AnalysisCache::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceTree for DirectoryTree {
    fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    fn read(&self, path: &Path) -> io::Result<Arc<String>> {
        if let Some(content) = self.contents.get(path) {
            return Ok(Arc::clone(&content));
        }

        let content = Arc::new(std::fs::read_to_string(self.root.join(path))?);
        self.contents
            .insert(path.to_path_buf(), Arc::clone(&content));
        Ok(content)
    }

    fn analyses(&self) -> &AnalysisCache {
        &self.analyses
    }
}

/// An in-memory tree.
#[derive(Default)]
pub struct MemoryTree {
    entries: Vec<PathBuf>,
    files: BTreeMap<PathBuf, Option<Arc<String>>>,
    analyses: AnalysisCache,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files
            .insert(path.into(), Some(Arc::new(content.into())));
        self.reindex();
        self
    }

    /// A listed file whose read fails.
    pub fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into(), None);
        self.reindex();
        self
    }

    fn reindex(&mut self) {
        self.entries = self.files.keys().cloned().collect();
    }
}

impl SourceTree for MemoryTree {
    fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    fn read(&self, path: &Path) -> io::Result<Arc<String>> {
        match self.files.get(path) {
            Some(Some(content)) => Ok(Arc::clone(content)),
            Some(None) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "stream did not contain valid UTF-8",
            )),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        }
    }

    fn analyses(&self) -> &AnalysisCache {
        &self.analyses
    }
}
