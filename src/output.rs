//! Output formatting for sourcepack.
//!
//! Assembles the selected paths into a single document, either plain text
//! with markdown-style headings or pretty-printed JSON. Each section (file
//! tree, language outlines, file contents) can be switched off.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::content::{load_content, ContentError, FileContent};
use crate::outline::{FileOutline, OutlineError, OutlineRegistry, Symbol};
use crate::tree::{render_paths, RenderOptions};
use crate::walker::PathInfo;

/// Name written into the document header.
pub const GENERATOR: &str = "sourcepack";

/// Errors that can occur during output generation.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Outline(#[from] OutlineError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to stdout: {0}")]
    Stdout(#[source] io::Error),
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text with markdown-style section headings (default).
    #[default]
    Text,
    /// JSON for programmatic access.
    Json,
}

impl OutputFormat {
    /// File extension for documents in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

/// Options controlling what to include in output.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    /// Include the file tree section.
    pub tree: bool,
    /// Include file contents.
    pub dump: bool,
    /// Include language outlines.
    pub outline: bool,
    /// Replace binary file contents with a marker.
    pub skip_binary: bool,
    /// Annotate tree entries with file sizes.
    pub sizes: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            tree: true,
            dump: true,
            outline: false,
            skip_binary: true,
            sizes: false,
        }
    }
}

impl OutputOptions {
    /// Whether every section is switched off.
    pub fn is_empty(&self) -> bool {
        !self.tree && !self.dump && !self.outline
    }

    fn render_options(&self) -> RenderOptions {
        if self.sizes {
            RenderOptions::with_sizes()
        } else {
            RenderOptions::minimal()
        }
    }
}

/// Where the finished document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// Current local time in the document header format.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Generate the complete document for `paths`.
///
/// Directories in `paths` only contribute to the tree; outlines and
/// contents are produced for files, in order.
pub fn generate_output(
    paths: &[PathInfo],
    registry: &OutlineRegistry,
    options: &OutputOptions,
    timestamp: &str,
) -> Result<String, OutputError> {
    debug!(
        paths = paths.len(),
        format = ?options.format,
        tree = options.tree,
        dump = options.dump,
        outline = options.outline,
        "generating output"
    );

    match options.format {
        OutputFormat::Text => generate_text(paths, registry, options, timestamp),
        OutputFormat::Json => generate_json(paths, registry, options, timestamp),
    }
}

/// Write a finished document, creating parent directories as needed.
pub fn write_output(target: &OutputTarget, document: &str) -> Result<(), OutputError> {
    match target {
        OutputTarget::Stdout => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(document.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(OutputError::Stdout)
        }
        OutputTarget::File(path) => {
            let write_err = |source| OutputError::Write {
                path: path.clone(),
                source,
            };
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
            fs::write(path, document).map_err(write_err)?;
            debug!(path = %path.display(), bytes = document.len(), "wrote output");
            Ok(())
        }
    }
}

fn files(paths: &[PathInfo]) -> impl Iterator<Item = &PathInfo> {
    paths.iter().filter(|p| !p.is_dir)
}

/// Outline a file if an outliner handles it.
fn outline_file(
    info: &PathInfo,
    registry: &OutlineRegistry,
) -> Result<Option<FileOutline>, OutputError> {
    let Some(outliner) = registry.outliner_for(&info.path) else {
        return Ok(None);
    };

    let text = match load_content(&info.path, false)? {
        FileContent::Text(text) => text,
        FileContent::Binary => String::new(),
    };
    let outline = outliner.outline(&text, &info.path)?;
    trace!(path = %info.relative, symbols = outline.symbol_count(), "outlined");
    Ok(Some(outline))
}

// ============================================================================
// Text Formatting
// ============================================================================

fn generate_text(
    paths: &[PathInfo],
    registry: &OutlineRegistry,
    options: &OutputOptions,
    timestamp: &str,
) -> Result<String, OutputError> {
    let mut output = String::with_capacity(8192);
    output.push_str(&format!("## Generated with {GENERATOR} at: {timestamp}\n\n"));

    if options.tree {
        output.push_str("## File Tree\n\n");
        output.push_str(&render_paths(paths, &options.render_options()));
        output.push('\n');
    }

    if options.outline {
        output.push_str("## Language-Specific Outlines\n\n");
        for info in files(paths) {
            let Some(outline) = outline_file(info, registry)? else {
                continue;
            };
            output.push_str(&format!("\n### File: {}\n", info.relative));
            output.push_str(&format_outline_text(&outline));
        }
    }

    if options.dump {
        output.push_str("## File Contents\n\n");
        for info in files(paths) {
            output.push_str(&format!("--- File: {}\n", info.relative));
            match load_content(&info.path, options.skip_binary)? {
                FileContent::Text(text) => output.push_str(&text),
                FileContent::Binary => output.push_str("<binary file>"),
            }
            output.push_str("\n\n");
        }
    }

    Ok(output)
}

fn format_outline_text(outline: &FileOutline) -> String {
    if outline.has_errors() {
        return format!("Parsing errors:\n{}\n", outline.errors.join("\n"));
    }

    let mut output = String::new();
    write_symbols(&mut output, &outline.symbols, 0);
    output
}

fn write_symbols(output: &mut String, symbols: &[Symbol], depth: usize) {
    let indent = "  ".repeat(depth);

    for symbol in symbols {
        output.push_str(&format!(
            "{indent}{}: {}",
            symbol.kind.as_str().to_uppercase(),
            symbol.name
        ));
        if let Some(signature) = symbol.signature.as_deref().filter(|s| !s.is_empty()) {
            output.push_str(&format!(" ({signature})"));
        }
        output.push('\n');

        if let Some(doc) = &symbol.doc {
            output.push_str(&format!("{indent}  Documentation:\n"));
            for line in doc.trim().lines() {
                output.push_str(&format!("{indent}    {line}\n"));
            }
        }

        write_symbols(output, &symbol.children, depth + 1);
    }
}

// ============================================================================
// JSON Formatting
// ============================================================================

#[derive(Serialize)]
struct JsonDocument<'a> {
    timestamp: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tree: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<JsonFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    outlines: Vec<JsonOutline>,
}

#[derive(Serialize)]
struct JsonFile {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    binary: bool,
}

#[derive(Serialize)]
struct JsonOutline {
    path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    symbols: Vec<JsonSymbol>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

#[derive(Serialize)]
struct JsonSymbol {
    #[serde(rename = "type")]
    kind: &'static str,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    documentation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<JsonSymbol>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn generate_json(
    paths: &[PathInfo],
    registry: &OutlineRegistry,
    options: &OutputOptions,
    timestamp: &str,
) -> Result<String, OutputError> {
    let tree = options
        .tree
        .then(|| render_paths(paths, &options.render_options()));

    let mut json_files = Vec::new();
    if options.dump {
        for info in files(paths) {
            let file = match load_content(&info.path, options.skip_binary)? {
                FileContent::Text(text) => JsonFile {
                    path: info.relative.clone(),
                    content: Some(text),
                    binary: false,
                },
                FileContent::Binary => JsonFile {
                    path: info.relative.clone(),
                    content: None,
                    binary: true,
                },
            };
            json_files.push(file);
        }
    }

    let mut json_outlines = Vec::new();
    if options.outline {
        for info in files(paths) {
            if let Some(outline) = outline_file(info, registry)? {
                json_outlines.push(JsonOutline {
                    path: info.relative.clone(),
                    symbols: outline.symbols.iter().map(symbol_to_json).collect(),
                    errors: outline.errors,
                });
            }
        }
    }

    let document = JsonDocument {
        timestamp,
        tree,
        files: json_files,
        outlines: json_outlines,
    };

    Ok(serde_json::to_string_pretty(&document)?)
}

fn symbol_to_json(symbol: &Symbol) -> JsonSymbol {
    JsonSymbol {
        kind: symbol.kind.as_str(),
        name: symbol.name.clone(),
        signature: symbol.signature.clone().filter(|s| !s.is_empty()),
        documentation: symbol.doc.clone(),
        children: symbol.children.iter().map(symbol_to_json).collect(),
    }
}
