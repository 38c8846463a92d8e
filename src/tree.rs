//! File tree representation and rendering.
//!
//! Provides types for representing the selected directory structure and
//! functions for rendering it with box-drawing characters.

use std::cmp::Ordering;
use std::path::PathBuf;

use crate::walker::PathInfo;

/// Rendered in place of a tree when nothing was selected.
pub const EMPTY_TREE: &str = "< no paths found >\n";

/// The type of a filesystem node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File { size: u64 },
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_directory(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File { .. })
    }
}

/// A node in the file tree.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// File or directory name (not full path).
    pub name: String,
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Type of node (file or directory).
    pub kind: NodeKind,
    /// Child nodes (empty for files).
    children: Vec<FileNode>,
}

impl FileNode {
    /// Create a new directory node.
    pub fn directory(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            children: Vec::new(),
        }
    }

    /// Create a new file node.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File { size },
            children: Vec::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Add a child node. Only valid for directories.
    pub fn add_child(&mut self, child: FileNode) {
        self.children.push(child);
    }

    /// Get child nodes.
    pub fn children(&self) -> &[FileNode] {
        &self.children
    }

    /// Sort children: directories first, then case-insensitively by name.
    pub fn sort_children(&mut self) {
        self.children.sort_by(|a, b| match (&a.kind, &b.kind) {
            (NodeKind::Directory, NodeKind::File { .. }) => Ordering::Less,
            (NodeKind::File { .. }, NodeKind::Directory) => Ordering::Greater,
            _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        });

        for child in &mut self.children {
            child.sort_children();
        }
    }

    fn child_dir_mut(&mut self, name: &str) -> Option<&mut FileNode> {
        self.children
            .iter_mut()
            .find(|c| c.is_directory() && c.name == name)
    }
}

/// Build a sorted tree from walker output.
///
/// The first path component of every entry names the root. Returns `None`
/// when `paths` is empty.
pub fn build_tree(paths: &[PathInfo]) -> Option<FileNode> {
    let first = paths.iter().min_by_key(|p| p.depth)?;
    let root_name = first.relative.split('/').next()?.to_string();
    let root_path = if first.depth == 1 {
        first.path.clone()
    } else {
        first
            .path
            .ancestors()
            .nth(first.depth - 1)
            .map(PathBuf::from)
            .unwrap_or_default()
    };

    let mut root = FileNode::directory(root_name, root_path);

    for info in paths {
        let components: Vec<&str> = info.relative.split('/').skip(1).collect();
        if components.is_empty() {
            continue;
        }
        insert(&mut root, &components, info);
    }

    root.sort_children();
    Some(root)
}

fn insert(node: &mut FileNode, components: &[&str], info: &PathInfo) {
    let (name, rest) = match components.split_first() {
        Some(split) => split,
        None => return,
    };

    if rest.is_empty() {
        if info.is_dir {
            if node.child_dir_mut(name).is_none() {
                node.add_child(FileNode::directory(*name, &info.path));
            }
        } else {
            node.add_child(FileNode::file(*name, &info.path, info.size.unwrap_or(0)));
        }
        return;
    }

    if node.child_dir_mut(name).is_none() {
        let dir_path = info
            .path
            .ancestors()
            .nth(rest.len())
            .map(PathBuf::from)
            .unwrap_or_default();
        node.add_child(FileNode::directory(*name, dir_path));
    }
    if let Some(child) = node.child_dir_mut(name) {
        insert(child, rest, info);
    }
}

/// Options for rendering the tree.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Show file sizes.
    pub show_size: bool,
}

impl RenderOptions {
    /// Create options with file sizes shown.
    pub fn with_sizes() -> Self {
        Self { show_size: true }
    }

    /// Create minimal options (no metadata).
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// Box-drawing characters for tree rendering.
const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const VERTICAL: &str = "│   ";
const SPACE: &str = "    ";

/// Render a file tree to a string with box-drawing characters.
///
/// # Examples
///
/// ```
/// use sourcepack::tree::{FileNode, RenderOptions, render_tree};
///
/// let mut root = FileNode::directory("project", "project");
/// root.add_child(FileNode::file("main.go", "project/main.go", 1024));
/// root.sort_children();
///
/// let output = render_tree(&root, &RenderOptions::minimal());
/// assert_eq!(output, "project/\n└── main.go\n");
/// ```
pub fn render_tree(root: &FileNode, options: &RenderOptions) -> String {
    let mut output = String::with_capacity(4096);
    render_node(&mut output, root, "", true, true, options);
    output
}

/// Build and render the tree for walker output, or [`EMPTY_TREE`].
pub fn render_paths(paths: &[PathInfo], options: &RenderOptions) -> String {
    match build_tree(paths) {
        Some(root) => render_tree(&root, options),
        None => EMPTY_TREE.to_string(),
    }
}

fn render_node(
    output: &mut String,
    node: &FileNode,
    prefix: &str,
    is_last: bool,
    is_root: bool,
    options: &RenderOptions,
) {
    let branch = if is_root {
        ""
    } else if is_last {
        LAST_BRANCH
    } else {
        BRANCH
    };

    output.push_str(prefix);
    output.push_str(branch);
    output.push_str(&node.name);

    if node.is_directory() {
        output.push('/');
    }

    if let NodeKind::File { size, .. } = &node.kind {
        if options.show_size {
            output.push_str(" [");
            output.push_str(&format_size(*size));
            output.push(']');
        }
    }

    output.push('\n');

    let child_count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == child_count - 1;

        let new_prefix = if is_root {
            String::new()
        } else {
            let continuation = if is_last { SPACE } else { VERTICAL };
            format!("{}{}", prefix, continuation)
        };

        render_node(output, child, &new_prefix, is_last_child, false, options);
    }
}

/// Format file size for display.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes < KB {
        format!("{}B", bytes)
    } else if bytes < MB {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    }
}
