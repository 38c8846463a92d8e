//! Directory traversal driven by a [`PatternSet`].
//!
//! Uses the `ignore` crate's walker with every built-in filter turned off:
//! hidden files and `.gitignore` rules are not applied implicitly, the
//! pattern set alone decides which files are kept.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use thiserror::Error;
use tracing::{debug, trace};

use crate::filter::PatternSet;

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Maximum depth to recurse below the root (None = unlimited).
    pub max_depth: Option<usize>,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
}

impl WalkOptions {
    /// Set maximum depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// A selected file, or a directory on the way to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Forward-slash path relative to the root's parent, so it starts with
    /// the root directory's own name.
    pub relative: String,
    /// Number of components in `relative`.
    pub depth: usize,
    pub is_dir: bool,
    /// File size in bytes (files only).
    pub size: Option<u64>,
}

impl PathInfo {
    fn directory(path: PathBuf, relative: String) -> Self {
        let depth = component_count(&relative);
        Self {
            path,
            relative,
            depth,
            is_dir: true,
            size: None,
        }
    }

    fn file(path: PathBuf, relative: String, size: Option<u64>) -> Self {
        let depth = component_count(&relative);
        Self {
            path,
            relative,
            depth,
            is_dir: false,
            size,
        }
    }

    /// The final path component.
    pub fn name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or(&self.relative)
    }
}

/// Walk `root` and keep the files `filter` includes.
///
/// Files are tested with their path relative to `root`. The result lists the
/// ancestor directories of every kept file first (shallowest first, no
/// duplicates), followed by the files in walk order.
///
/// # Examples
///
/// ```no_run
/// use sourcepack::filter::PatternSet;
/// use sourcepack::walker::collect_paths;
/// use std::path::Path;
///
/// let filter = PatternSet::compile(["*.go"]);
/// for info in collect_paths(Path::new("."), &filter).unwrap() {
///     println!("{}", info.relative);
/// }
/// ```
pub fn collect_paths(root: &Path, filter: &PatternSet) -> Result<Vec<PathInfo>, WalkError> {
    collect_paths_with_options(root, filter, &WalkOptions::default())
}

/// Walk with custom options.
pub fn collect_paths_with_options(
    root: &Path,
    filter: &PatternSet,
    options: &WalkOptions,
) -> Result<Vec<PathInfo>, WalkError> {
    let base = resolve_base(root)?;
    let display_base = base.parent().unwrap_or(&base).to_path_buf();

    let mut builder = WalkBuilder::new(&base);
    builder
        .standard_filters(false)
        .follow_links(options.follow_symlinks)
        .max_depth(options.max_depth)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    let mut visited = 0usize;

    for result in builder.build() {
        let entry = result.map_err(|e| convert_error(e, &base))?;
        if entry.depth() == 0 || entry.file_type().is_some_and(|ft| ft.is_dir()) {
            continue;
        }
        visited += 1;

        let path = entry.path();
        let Ok(within_base) = path.strip_prefix(&base) else {
            continue;
        };
        let candidate = to_slash(within_base);

        let verdict = filter.explain(&candidate);
        match verdict.decisive {
            Some(pattern) => trace!(path = %candidate, included = verdict.included, decided_by = %pattern, "evaluated"),
            None => trace!(path = %candidate, "no pattern matched"),
        }
        if !verdict.included {
            continue;
        }

        let relative = path
            .strip_prefix(&display_base)
            .map(to_slash)
            .unwrap_or_else(|_| candidate.clone());
        let size = entry.metadata().ok().map(|m| m.len());
        files.push(PathInfo::file(path.to_path_buf(), relative, size));
    }

    debug!(
        root = %base.display(),
        visited,
        selected = files.len(),
        "walk complete"
    );

    Ok(with_ancestors(files, &display_base))
}

fn resolve_base(root: &Path) -> Result<PathBuf, WalkError> {
    if !root.exists() {
        return Err(WalkError::NotFound {
            path: root.to_path_buf(),
        });
    }

    let canonical = fs::canonicalize(root).map_err(|source| WalkError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    if canonical.is_dir() {
        return Ok(canonical);
    }
    match canonical.parent() {
        Some(parent) => Ok(parent.to_path_buf()),
        None => Err(WalkError::NotFound { path: canonical }),
    }
}

/// Prepend the ancestor directories of each file, deduplicated.
fn with_ancestors(files: Vec<PathInfo>, display_base: &Path) -> Vec<PathInfo> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(files.len() * 2);

    for file in &files {
        let components: Vec<&str> = file.relative.split('/').collect();
        let mut current = String::new();
        for component in &components[..components.len().saturating_sub(1)] {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(component);

            if seen.insert(current.clone()) {
                result.push(PathInfo::directory(display_base.join(&current), current.clone()));
            }
        }
    }

    result.extend(files);
    result
}

fn convert_error(err: ignore::Error, base: &Path) -> WalkError {
    let path = error_path(&err).unwrap_or_else(|| base.to_path_buf());
    let message = err.to_string();
    match err.into_io_error() {
        Some(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
            WalkError::PermissionDenied { path }
        }
        Some(source) => WalkError::Io { path, source },
        None => WalkError::Io {
            path,
            source: std::io::Error::other(message),
        },
    }
}

fn error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.clone()),
        _ => None,
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn component_count(relative: &str) -> usize {
    relative.split('/').filter(|s| !s.is_empty()).count()
}
