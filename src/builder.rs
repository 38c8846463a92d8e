//! Fluent builder API for sourcepack.
//!
//! Wires the pieces together: filter patterns and ignore files become one
//! [`PatternSet`], the walker selects paths with it, and the output module
//! renders the document.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::PackError;
use crate::filter::PatternSet;
use crate::outline::OutlineRegistry;
use crate::output::{generate_output, timestamp_now, OutputFormat, OutputOptions};
use crate::walker::{collect_paths_with_options, PathInfo, WalkOptions};

/// Filters applied when none are given: everything except dot-entries at
/// the root.
pub const DEFAULT_FILTERS: &[&str] = &["*", "!.*"];

/// Builder for packing a directory into one document.
///
/// # Examples
///
/// ```no_run
/// use sourcepack::builder::Pack;
///
/// let document = Pack::new("./project")
///     .filters(["*.go", "!*_test.go"])
///     .outline(true)
///     .build()
///     .unwrap();
/// println!("{document}");
/// ```
#[derive(Debug)]
pub struct Pack {
    root: PathBuf,
    filters: Vec<String>,
    ignore_files: Vec<PathBuf>,
    gitignore: bool,
    options: OutputOptions,
    walk_options: WalkOptions,
    timestamp: Option<String>,
    registry: OutlineRegistry,
}

impl Pack {
    /// Create a new builder for the given root path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            filters: DEFAULT_FILTERS.iter().map(|s| s.to_string()).collect(),
            ignore_files: Vec::new(),
            gitignore: false,
            options: OutputOptions::default(),
            walk_options: WalkOptions::default(),
            timestamp: None,
            registry: OutlineRegistry::with_defaults(),
        }
    }

    /// Replace the filter patterns. Later patterns win.
    pub fn filters<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Add an ignore file. Its patterns exclude paths and override filters.
    pub fn ignore_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignore_files.push(path.into());
        self
    }

    /// Also use the root's `.gitignore` as an ignore file, if it exists.
    pub fn gitignore(mut self, enable: bool) -> Self {
        self.gitignore = enable;
        self
    }

    /// Include the file tree section.
    pub fn tree(mut self, enable: bool) -> Self {
        self.options.tree = enable;
        self
    }

    /// Include file contents.
    pub fn dump(mut self, enable: bool) -> Self {
        self.options.dump = enable;
        self
    }

    /// Include language outlines.
    pub fn outline(mut self, enable: bool) -> Self {
        self.options.outline = enable;
        self
    }

    /// Dump binary files as text instead of a placeholder.
    pub fn include_binary(mut self, include: bool) -> Self {
        self.options.skip_binary = !include;
        self
    }

    /// Annotate tree entries with file sizes.
    pub fn sizes(mut self, enable: bool) -> Self {
        self.options.sizes = enable;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.options.format = format;
        self
    }

    /// Use a fixed header timestamp instead of the current time.
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Set maximum directory depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.walk_options.max_depth = Some(depth);
        self
    }

    /// Replace the outline registry.
    pub fn registry(mut self, registry: OutlineRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn output_options(&self) -> &OutputOptions {
        &self.options
    }

    /// Compile filters and ignore files into the set used for the walk.
    ///
    /// Ignore files are inverted and appended after the filters, so their
    /// exclusions win and their `!` lines can re-include.
    pub fn pattern_set(&self) -> Result<PatternSet, PackError> {
        let mut set = PatternSet::compile(&self.filters);

        for path in self.ignore_paths() {
            let ignore = PatternSet::from_file(&path).map_err(PackError::IgnoreFile)?;
            debug!(path = %path.display(), patterns = ignore.len(), "applying ignore file");
            set = set.with_higher_precedence(ignore.negate_all());
        }

        Ok(set)
    }

    /// Select paths under the root.
    pub fn paths(&self) -> Result<Vec<PathInfo>, PackError> {
        if !self.root.exists() {
            return Err(PackError::PathNotFound(self.root.clone()));
        }
        let set = self.pattern_set()?;
        Ok(collect_paths_with_options(&self.root, &set, &self.walk_options)?)
    }

    /// Build and return the rendered document.
    pub fn build(&self) -> Result<String, PackError> {
        if self.options.is_empty() {
            return Err(PackError::EmptyOutput);
        }

        let paths = self.paths()?;
        let timestamp = self.timestamp.clone().unwrap_or_else(timestamp_now);
        Ok(generate_output(&paths, &self.registry, &self.options, &timestamp)?)
    }

    fn ignore_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.ignore_files.clone();
        if self.gitignore {
            let gitignore = root_dir(&self.root).join(".gitignore");
            if gitignore.is_file() {
                paths.push(gitignore);
            }
        }
        paths
    }
}

fn root_dir(root: &Path) -> &Path {
    if root.is_file() {
        root.parent().unwrap_or(root)
    } else {
        root
    }
}
