//! Language outlines using tree-sitter.
//!
//! An outline lists the top-level symbols of a source file (functions,
//! types, constants) with signatures and doc comments, without bodies.
//! Outliners are looked up by file extension through an [`OutlineRegistry`].

mod go;

pub use go::GoOutliner;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use smallvec::SmallVec;
use thiserror::Error;
use tree_sitter::{Node, Parser};

// Thread-local parser caching to avoid re-initialization overhead.
// Parser initialization can fail (grammar version mismatch), so no panics here.
thread_local! {
    static GO_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

fn init_go_parser() -> Result<Parser, ()> {
    let mut p = Parser::new();
    p.set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|_| ())?;
    Ok(p)
}

fn with_cached_parser<F, R>(
    cell: &'static std::thread::LocalKey<RefCell<Option<Parser>>>,
    init: fn() -> Result<Parser, ()>,
    language: &'static str,
    f: F,
) -> Result<R, OutlineError>
where
    F: FnOnce(&mut Parser) -> R,
{
    cell.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(init().map_err(|()| OutlineError::ParserInit { language })?);
        }

        let parser = slot
            .as_mut()
            .ok_or(OutlineError::ParserInit { language })?;
        Ok(f(parser))
    })
}

/// Execute a function with a cached Go parser.
pub(crate) fn with_go_parser<F, R>(f: F) -> Result<R, OutlineError>
where
    F: FnOnce(&mut Parser) -> R,
{
    with_cached_parser(&GO_PARSER, init_go_parser, "Go", f)
}

/// Find a child node by kind.
pub(crate) fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    node.children(&mut node.walk()).find(|c| c.kind() == kind)
}

/// Extract node text from content.
pub(crate) fn node_text(node: Node, content: &str) -> String {
    content[node.byte_range()].to_string()
}

/// The kind of an outlined symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Method,
    Struct,
    Interface,
    Type,
    Field,
    Const,
    Var,
}

impl SymbolKind {
    /// Lowercase name, as used in serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Struct => "struct",
            SymbolKind::Interface => "interface",
            SymbolKind::Type => "type",
            SymbolKind::Field => "field",
            SymbolKind::Const => "const",
            SymbolKind::Var => "var",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbol extracted from source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    pub signature: Option<String>,
    pub doc: Option<String>,
    /// Struct fields or interface methods.
    pub children: Vec<Symbol>, // Vec needed for recursive type
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            signature: None,
            doc: None,
            children: Vec::new(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    pub fn with_children(mut self, children: Vec<Symbol>) -> Self {
        self.children = children;
        self
    }
}

/// The outline of one source file.
#[derive(Debug, Clone)]
pub struct FileOutline {
    pub path: PathBuf,
    /// Top-level symbols in source order.
    pub symbols: SmallVec<[Symbol; 16]>,
    /// Syntax errors. When present, `symbols` is empty.
    pub errors: Vec<String>,
}

impl FileOutline {
    /// Create an empty outline for a file.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            symbols: SmallVec::new(),
            errors: Vec::new(),
        }
    }

    /// Create an outline that only reports syntax errors.
    pub fn with_errors(path: impl Into<PathBuf>, errors: Vec<String>) -> Self {
        Self {
            errors,
            ..Self::empty(path)
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Count symbols including nested ones.
    pub fn symbol_count(&self) -> usize {
        fn count_nested(symbol: &Symbol) -> usize {
            1 + symbol.children.iter().map(count_nested).sum::<usize>()
        }
        self.symbols.iter().map(count_nested).sum()
    }
}

/// Errors during outline extraction.
///
/// Syntax errors in the source are not errors here; they are reported in
/// [`FileOutline::errors`].
#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("failed to initialize {language} parser")]
    ParserInit { language: &'static str },

    #[error("parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// A language-specific outline extractor.
pub trait Outliner: Send + Sync {
    /// File extensions handled, with the leading dot (e.g. `.go`).
    fn extensions(&self) -> &[&'static str];

    /// Outline `content`, which was read from `path`.
    fn outline(&self, content: &str, path: &Path) -> Result<FileOutline, OutlineError>;
}

/// Maps file extensions to outliners.
#[derive(Default)]
pub struct OutlineRegistry {
    outliners: Vec<Box<dyn Outliner>>,
    by_extension: HashMap<&'static str, usize>,
}

impl OutlineRegistry {
    /// An empty registry. Nothing is supported.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in outliner.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(GoOutliner);
        registry
    }

    /// Register an outliner for each of its extensions. Later registrations
    /// replace earlier ones for the same extension.
    pub fn register(&mut self, outliner: impl Outliner + 'static) {
        let index = self.outliners.len();
        for &ext in outliner.extensions() {
            self.by_extension.insert(ext, index);
        }
        self.outliners.push(Box::new(outliner));
    }

    /// Whether an outliner handles this path's extension.
    pub fn is_supported(&self, path: &Path) -> bool {
        self.outliner_for(path).is_some()
    }

    /// The outliner for this path's extension, if any.
    pub fn outliner_for(&self, path: &Path) -> Option<&dyn Outliner> {
        let ext = path.extension()?.to_str()?;
        let index = self.by_extension.get(format!(".{ext}").as_str())?;
        self.outliners.get(*index).map(|o| o.as_ref())
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<_> = self.by_extension.keys().copied().collect();
        exts.sort_unstable();
        exts
    }
}

impl fmt::Debug for OutlineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}
