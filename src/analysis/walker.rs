use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::analysis::cancel::CancellationToken;
use crate::analysis::error::{Advisory, AdvisoryKind, AnalysisError};

/// Directory names that are never descended into.
pub const PRUNED_DIRECTORIES: &[&str] = &[
    // dependency caches
    "node_modules",
    "vendor",
    "bower_components",
    "__pycache__",
    "venv",
    ".venv",
    ".tox",
    ".gradle",
    // version control
    ".git",
    ".svn",
    ".hg",
    // build output
    "target",
    "dist",
    "build",
    "out",
    "bin",
    "obj",
    ".next",
    ".nuxt",
    "coverage",
    ".cache",
    // IDE state
    ".idea",
    ".vscode",
    ".vs",
];

/// OS metadata files that are dropped from results.
pub const METADATA_FILES: &[&str] = &["Thumbs.db", "desktop.ini", ".DS_Store"];

/// Rules the walker applies before yielding or descending.
///
/// Built once and handed to each [`Walker`]; concurrent runs each hold their own
/// copy so nothing is shared or mutated across runs.
#[derive(Debug, Clone)]
pub struct IgnorePolicy {
    pruned_dirs: HashSet<String>,
    metadata_files: HashSet<String>,
    skip_hidden: bool,
}

impl Default for IgnorePolicy {
    fn default() -> Self {
        IgnorePolicy {
            pruned_dirs: PRUNED_DIRECTORIES.iter().map(|s| s.to_string()).collect(),
            metadata_files: METADATA_FILES.iter().map(|s| s.to_string()).collect(),
            skip_hidden: true,
        }
    }
}

impl IgnorePolicy {
    /// A policy that prunes nothing and hides nothing.
    pub fn empty() -> Self {
        IgnorePolicy {
            pruned_dirs: HashSet::new(),
            metadata_files: HashSet::new(),
            skip_hidden: false,
        }
    }

    pub fn with_pruned_dir(mut self, name: impl Into<String>) -> Self {
        self.pruned_dirs.insert(name.into());
        self
    }

    pub fn with_metadata_file(mut self, name: impl Into<String>) -> Self {
        self.metadata_files.insert(name.into());
        self
    }

    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Directory whose contents must not be visited at all.
    pub fn prunes_dir(&self, name: &str) -> bool {
        self.pruned_dirs.contains(name) || self.is_hidden(name)
    }

    /// Entry left out of results (its siblings are unaffected).
    pub fn excludes(&self, name: &str) -> bool {
        self.is_hidden(name) || self.metadata_files.contains(name)
    }

    fn is_hidden(&self, name: &str) -> bool {
        self.skip_hidden && name.starts_with('.')
    }
}

/// One visited filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Path relative to the walk root, `/`-separated.
    pub relative_path: String,
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("cannot read project root {}: {message}", path.display())]
    Root { path: PathBuf, message: String },

    #[error("cannot read {relative_path}: {message}")]
    Subtree { relative_path: String, message: String },

    #[error("walk cancelled")]
    Cancelled,
}

/// Everything a completed walk produced.
#[derive(Debug, Default)]
pub struct WalkOutput {
    pub entries: Vec<WalkEntry>,
    pub failures: Vec<Advisory>,
}

/// Depth-first traversal of a project root.
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    policy: IgnorePolicy,
}

impl Walker {
    pub fn new(root: impl Into<PathBuf>, policy: IgnorePolicy) -> Self {
        Walker {
            root: root.into(),
            policy,
        }
    }

    /// Start a fresh walk. Each call is independent of any earlier one.
    pub fn walk<'a>(&'a self, cancel: &'a CancellationToken) -> Walk<'a> {
        Walk {
            inner: WalkDir::new(&self.root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter(),
            walker: self,
            cancel,
            done: false,
        }
    }

    /// Drain a walk, keeping unreadable subtrees as advisories.
    ///
    /// Failing to read the root itself is fatal.
    pub fn collect(&self, cancel: &CancellationToken) -> Result<WalkOutput, AnalysisError> {
        let mut output = WalkOutput::default();

        for item in self.walk(cancel) {
            match item {
                Ok(entry) => output.entries.push(entry),
                Err(WalkError::Cancelled) => return Err(AnalysisError::Cancelled),
                Err(WalkError::Root { path, message }) => {
                    return Err(AnalysisError::InvalidInput { path, reason: message });
                }
                Err(WalkError::Subtree { relative_path, message }) => {
                    log::warn!("Skipping unreadable entry {}: {}", relative_path, message);
                    output.failures.push(Advisory::new(
                        AdvisoryKind::PartialReadFailure,
                        relative_path,
                        message,
                    ));
                }
            }
        }

        Ok(output)
    }
}

/// Lazy iterator returned by [`Walker::walk`].
pub struct Walk<'a> {
    inner: walkdir::IntoIter,
    walker: &'a Walker,
    cancel: &'a CancellationToken,
    done: bool,
}

impl<'a> Iterator for Walk<'a> {
    type Item = Result<WalkEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if self.cancel.is_cancelled() {
                self.done = true;
                return Some(Err(WalkError::Cancelled));
            }

            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.walker.root.clone());
                    let message = err
                        .io_error()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| err.to_string());

                    if err.depth() == 0 {
                        self.done = true;
                        return Some(Err(WalkError::Root { path, message }));
                    }
                    return Some(Err(WalkError::Subtree {
                        relative_path: relative_key(&self.walker.root, &path),
                        message,
                    }));
                }
            };

            if entry.depth() == 0 {
                if !entry.path().is_dir() {
                    self.done = true;
                    return Some(Err(WalkError::Root {
                        path: entry.path().to_path_buf(),
                        message: "not a directory".to_string(),
                    }));
                }
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            let is_dir = entry.file_type().is_dir();

            if is_dir && self.walker.policy.prunes_dir(&name) {
                self.inner.skip_current_dir();
                continue;
            }
            if self.walker.policy.excludes(&name) {
                continue;
            }

            let relative_path = relative_key(&self.walker.root, entry.path());
            let size = match entry.metadata() {
                Ok(meta) if !is_dir => meta.len(),
                Ok(_) => 0,
                Err(err) => {
                    if is_dir {
                        self.inner.skip_current_dir();
                    }
                    return Some(Err(WalkError::Subtree {
                        relative_path,
                        message: err.to_string(),
                    }));
                }
            };

            return Some(Ok(WalkEntry {
                path: entry.path().to_path_buf(),
                relative_path,
                name,
                is_dir,
                size,
            }));
        }
    }
}

/// `/`-joined path of `path` relative to `root`; empty for the root itself.
pub fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Relative key of the directory containing `key`; `""` for top-level entries.
pub fn parent_key(key: &str) -> &str {
    match key.rfind('/') {
        Some(idx) => &key[..idx],
        None => "",
    }
}
