//! Go outlines using tree-sitter.

use std::path::Path;

use tracing::debug;
use tree_sitter::Node;

use super::{
    find_child_by_kind, node_text, with_go_parser, FileOutline, OutlineError, Outliner, Symbol,
    SymbolKind,
};

/// Syntax errors reported per file before giving up.
const MAX_REPORTED_ERRORS: usize = 10;

/// Outliner for `.go` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoOutliner;

impl Outliner for GoOutliner {
    fn extensions(&self) -> &[&'static str] {
        &[".go"]
    }

    fn outline(&self, content: &str, path: &Path) -> Result<FileOutline, OutlineError> {
        with_go_parser(|parser| -> Result<FileOutline, OutlineError> {
            let tree = parser
                .parse(content, None)
                .ok_or_else(|| OutlineError::Parse {
                    path: path.to_path_buf(),
                    message: "parser produced no tree".to_string(),
                })?;

            let root = tree.root_node();
            if root.has_error() {
                let mut errors = Vec::new();
                collect_syntax_errors(root, path, &mut errors);
                if errors.is_empty() {
                    errors.push(format!("{}: syntax error", path.display()));
                }
                debug!(path = %path.display(), errors = errors.len(), "go source has syntax errors");
                return Ok(FileOutline::with_errors(path, errors));
            }

            let mut symbols = Vec::new();
            extract_from_node(root, content, &mut symbols);

            let mut outline = FileOutline::empty(path);
            outline.symbols = symbols.into();
            Ok(outline)
        })?
    }
}

fn extract_from_node(node: Node, content: &str, symbols: &mut Vec<Symbol>) {
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_declaration" => symbols.extend(extract_function(child, content)),
            "method_declaration" => symbols.extend(extract_method(child, content)),
            "type_declaration" => extract_type_decl(child, content, symbols),
            "const_declaration" => extract_value_decl(child, content, SymbolKind::Const, symbols),
            "var_declaration" => extract_value_decl(child, content, SymbolKind::Var, symbols),
            _ => {}
        }
    }
}

fn extract_function(node: Node, content: &str) -> Option<Symbol> {
    let name = node_text(node.child_by_field_name("name")?, content);

    let mut signature = format!("func {name}");
    push_func_tail(node, content, &mut signature);

    Some(
        Symbol::new(SymbolKind::Function, name)
            .with_signature(signature)
            .with_doc(doc_comment(node, content)),
    )
}

fn extract_method(node: Node, content: &str) -> Option<Symbol> {
    let name = node_text(node.child_by_field_name("name")?, content);
    let receiver = node.child_by_field_name("receiver")?;

    let mut signature = format!("func {} {name}", node_text(receiver, content));
    push_func_tail(node, content, &mut signature);

    // Methods are named after their receiver type, e.g. `*Server.Start`.
    let qualified = match receiver_type(receiver, content) {
        Some(recv) => format!("{recv}.{name}"),
        None => name,
    };

    Some(
        Symbol::new(SymbolKind::Method, qualified)
            .with_signature(signature)
            .with_doc(doc_comment(node, content)),
    )
}

/// Append type parameters, parameters and result to a signature.
fn push_func_tail(node: Node, content: &str, signature: &mut String) {
    if let Some(type_params) = node.child_by_field_name("type_parameters") {
        signature.push_str(&node_text(type_params, content));
    }
    if let Some(params) = node.child_by_field_name("parameters") {
        signature.push_str(&node_text(params, content));
    }
    if let Some(result) = node.child_by_field_name("result") {
        signature.push(' ');
        signature.push_str(&node_text(result, content));
    }
}

fn receiver_type(receiver: Node, content: &str) -> Option<String> {
    let param = find_child_by_kind(receiver, "parameter_declaration")?;
    param
        .child_by_field_name("type")
        .map(|ty| node_text(ty, content))
}

fn extract_type_decl(node: Node, content: &str, symbols: &mut Vec<Symbol>) {
    // Grouped declarations share the doc comment above `type (`.
    let doc = doc_comment(node, content);
    let mut cursor = node.walk();

    for spec in node.named_children(&mut cursor) {
        if matches!(spec.kind(), "type_spec" | "type_alias") {
            if let Some(symbol) = extract_type_spec(spec, content) {
                symbols.push(symbol.with_doc(doc.clone()));
            }
        }
    }
}

fn extract_type_spec(node: Node, content: &str) -> Option<Symbol> {
    let name = node_text(node.child_by_field_name("name")?, content);
    let ty = node.child_by_field_name("type")?;

    let symbol = match ty.kind() {
        "struct_type" => {
            Symbol::new(SymbolKind::Struct, name).with_children(struct_fields(ty, content))
        }
        "interface_type" => {
            Symbol::new(SymbolKind::Interface, name).with_children(interface_methods(ty, content))
        }
        _ => Symbol::new(SymbolKind::Type, name),
    };
    Some(symbol)
}

fn struct_fields(struct_type: Node, content: &str) -> Vec<Symbol> {
    let mut fields = Vec::new();
    let Some(list) = find_child_by_kind(struct_type, "field_declaration_list") else {
        return fields;
    };

    let mut cursor = list.walk();
    for decl in list.named_children(&mut cursor) {
        if decl.kind() != "field_declaration" {
            continue;
        }
        let Some(ty) = decl.child_by_field_name("type") else {
            continue;
        };
        let doc = doc_comment(decl, content);

        let mut name_cursor = decl.walk();
        let names: Vec<String> = decl
            .children_by_field_name("name", &mut name_cursor)
            .filter(|n| n.kind() == "field_identifier")
            .map(|n| node_text(n, content))
            .collect();

        if names.is_empty() {
            // Embedded field: named by its type, including any leading `*`.
            let embedded = content[decl.start_byte()..ty.end_byte()].to_string();
            fields.push(
                Symbol::new(SymbolKind::Field, embedded.clone())
                    .with_signature(embedded)
                    .with_doc(doc),
            );
            continue;
        }

        let ty_text = node_text(ty, content);
        for name in names {
            fields.push(
                Symbol::new(SymbolKind::Field, name)
                    .with_signature(ty_text.clone())
                    .with_doc(doc.clone()),
            );
        }
    }

    fields
}

fn interface_methods(interface_type: Node, content: &str) -> Vec<Symbol> {
    let mut methods = Vec::new();
    let mut cursor = interface_type.walk();

    for elem in interface_type.named_children(&mut cursor) {
        // method_spec in older grammars, method_elem in newer ones.
        // Embedded interfaces and type constraints are skipped.
        if !matches!(elem.kind(), "method_elem" | "method_spec") {
            continue;
        }
        let Some(name) = elem.child_by_field_name("name") else {
            continue;
        };

        let mut signature = String::new();
        push_func_tail(elem, content, &mut signature);

        methods.push(
            Symbol::new(SymbolKind::Method, node_text(name, content))
                .with_signature(signature)
                .with_doc(doc_comment(elem, content)),
        );
    }

    methods
}

fn extract_value_decl(node: Node, content: &str, kind: SymbolKind, symbols: &mut Vec<Symbol>) {
    let doc = doc_comment(node, content);
    collect_value_specs(node, content, kind, &doc, symbols);
}

fn collect_value_specs(
    node: Node,
    content: &str,
    kind: SymbolKind,
    doc: &Option<String>,
    symbols: &mut Vec<Symbol>,
) {
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "const_spec" | "var_spec" => {
                let signature = child
                    .child_by_field_name("type")
                    .map(|ty| node_text(ty, content));

                let mut name_cursor = child.walk();
                for name in child
                    .children_by_field_name("name", &mut name_cursor)
                    .filter(|n| n.kind() == "identifier")
                {
                    let mut symbol =
                        Symbol::new(kind, node_text(name, content)).with_doc(doc.clone());
                    symbol.signature = signature.clone();
                    symbols.push(symbol);
                }
            }
            "const_spec_list" | "var_spec_list" => {
                collect_value_specs(child, content, kind, doc, symbols)
            }
            _ => {}
        }
    }
}

/// The comment block directly above `node`, with comment markers removed.
///
/// Comments must be contiguous and end on the line before the node. A
/// trailing comment on the previous line's code does not count.
fn doc_comment(node: Node, content: &str) -> Option<String> {
    let mut lines = Vec::new();
    let mut next_row = node.start_position().row;
    let mut prev = node.prev_sibling();

    while let Some(sibling) = prev {
        if sibling.kind() != "comment" || sibling.end_position().row + 1 != next_row {
            break;
        }
        if let Some(before) = sibling.prev_named_sibling() {
            if before.kind() != "comment" && before.end_position().row == sibling.start_position().row {
                break;
            }
        }

        lines.push(comment_text(&node_text(sibling, content)));
        next_row = sibling.start_position().row;
        prev = sibling.prev_sibling();
    }

    if lines.is_empty() {
        return None;
    }
    lines.reverse();
    let doc = lines.join("\n").trim().to_string();
    (!doc.is_empty()).then_some(doc)
}

fn comment_text(raw: &str) -> String {
    if let Some(line) = raw.strip_prefix("//") {
        return line.strip_prefix(' ').unwrap_or(line).trim_end().to_string();
    }
    raw.trim_start_matches("/*")
        .trim_end_matches("*/")
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_syntax_errors(node: Node, path: &Path, errors: &mut Vec<String>) {
    if errors.len() >= MAX_REPORTED_ERRORS {
        return;
    }

    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        let what = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "unexpected syntax".to_string()
        };
        errors.push(format!(
            "{}:{}:{}: {}",
            path.display(),
            pos.row + 1,
            pos.column + 1,
            what
        ));
        return;
    }

    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_syntax_errors(child, path, errors);
    }
}
