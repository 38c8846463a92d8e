//! sourcepack - pack a source tree into a single document.
//!
//! sourcepack walks a directory, keeps the files selected by gitignore-style
//! patterns, and renders them as one document: a file tree, language outlines
//! (signatures and doc comments) and the file contents.
//!
//! # Quick Start
//!
//! ```no_run
//! use sourcepack::builder::Pack;
//!
//! let document = Pack::new("./my-project")
//!     .filters(["**/*.go", "!**/*_test.go"])
//!     .ignore_file("./my-project/.gitignore")
//!     .outline(true)
//!     .build()
//!     .unwrap();
//!
//! println!("{document}");
//! ```
//!
//! # Modules
//!
//! - [`filter`] - Gitignore-style pattern compilation and path matching
//! - [`walker`] - Directory traversal driven by a pattern set
//! - [`tree`] - File tree representation and rendering
//! - [`content`] - File loading with binary detection
//! - [`outline`] - Tree-sitter based outlines
//! - [`output`] - Text and JSON documents
//! - [`builder`] - Fluent API tying it together
//!
//! # Supported Languages
//!
//! Outlines are produced for Go (`.go`). Every other file still appears in
//! the tree and contents sections.

pub mod filter;
pub mod errors;
pub mod tree;
pub mod walker;
pub mod content;
pub mod outline;
pub mod output;
pub mod builder;

// Re-export key types at crate root for convenience
pub use builder::Pack;
pub use content::{ContentError, FileContent};
pub use errors::PackError;
pub use filter::{FilterError, Pattern, PatternSet, Verdict};
pub use outline::{FileOutline, OutlineError, OutlineRegistry, Outliner, Symbol, SymbolKind};
pub use output::{OutputError, OutputFormat, OutputOptions, OutputTarget};
pub use tree::{FileNode, NodeKind, RenderOptions};
pub use walker::{PathInfo, WalkError};
