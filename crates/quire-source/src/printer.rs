//! Canonical printer
//!
//! Output rules: two-space indent, single quotes, no semicolons, no
//! trailing commas, one entry per line for non-empty containers. Parsing
//! printed output and printing it again yields the same bytes.

use crate::literal::{Annotated, Literal, Member};
use crate::module::{ExportDecl, ImportDecl, Item, Statement};
use std::fmt::Write as _;

const INDENT: &str = "  ";

pub(crate) fn render_items(items: &[Item]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            if item.blank_before {
                out.push('\n');
            }
        }
        match &item.statement {
            Statement::Import(import) => render_import(import, &mut out),
            Statement::Export(export) => render_export(export, &mut out),
            Statement::Verbatim(text) => out.push_str(text),
        }
        if let Some(comment) = &item.trailing {
            out.push(' ');
            out.push_str(comment);
        }
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn render_import(import: &ImportDecl, out: &mut String) {
    out.push_str("import ");
    if import.type_only {
        out.push_str("type ");
    }
    let mut clause = Vec::new();
    if let Some(default) = &import.default {
        clause.push(default.clone());
    }
    if let Some(namespace) = &import.namespace {
        clause.push(format!("* as {namespace}"));
    }
    if !import.named.is_empty() || clause.is_empty() {
        let named: Vec<String> = import
            .named
            .iter()
            .map(|s| match &s.alias {
                Some(alias) => format!("{} as {alias}", s.name),
                None => s.name.clone(),
            })
            .collect();
        if named.is_empty() {
            clause.push("{}".into());
        } else {
            clause.push(format!("{{ {} }}", named.join(", ")));
        }
    }
    out.push_str(&clause.join(", "));
    out.push_str(" from ");
    quote(&import.source, out);
}

fn render_export(export: &ExportDecl, out: &mut String) {
    let _ = write!(out, "export {} {}", export.keyword, export.name);
    if let Some(ty) = &export.type_annotation {
        let _ = write!(out, ": {ty}");
    }
    out.push_str(" = ");
    render_literal(&export.value, 0, out);
}

/// Print a literal whose first line is already positioned at `depth`
pub(crate) fn render_literal(literal: &Literal, depth: usize, out: &mut String) {
    match literal {
        Literal::Null => out.push_str("null"),
        Literal::Undefined => out.push_str("undefined"),
        Literal::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Literal::Number(text) | Literal::Identifier(text) | Literal::Raw(text) => {
            out.push_str(text);
        }
        Literal::String(s) => quote(s, out),
        Literal::Array(array) => render_block(
            ('[', ']'),
            &array.elements,
            &array.dangling,
            depth,
            out,
            |value, depth, out| render_literal(value, depth, out),
        ),
        Literal::Object(object) => render_block(
            ('{', '}'),
            &object.members,
            &object.dangling,
            depth,
            out,
            |member, depth, out| match member {
                Member::Property(p) => {
                    render_key(&p.key, out);
                    out.push_str(": ");
                    render_literal(&p.value, depth, out);
                }
                Member::Raw(text) => out.push_str(text),
            },
        ),
    }
}

fn render_block<T>(
    (open, close): (char, char),
    entries: &[Annotated<T>],
    dangling: &[String],
    depth: usize,
    out: &mut String,
    render: impl Fn(&T, usize, &mut String),
) {
    out.push(open);
    if entries.is_empty() && dangling.is_empty() {
        out.push(close);
        return;
    }
    out.push('\n');
    let inner = depth + 1;
    for (i, entry) in entries.iter().enumerate() {
        for comment in &entry.leading {
            indent(inner, out);
            out.push_str(comment);
            out.push('\n');
        }
        indent(inner, out);
        render(&entry.value, inner, out);
        if i + 1 < entries.len() {
            out.push(',');
        }
        if let Some(comment) = &entry.trailing {
            out.push(' ');
            out.push_str(comment);
        }
        out.push('\n');
    }
    for comment in dangling {
        indent(inner, out);
        out.push_str(comment);
        out.push('\n');
    }
    indent(depth, out);
    out.push(close);
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Whether `key` can be written without quotes
pub(crate) fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn render_key(key: &str, out: &mut String) {
    if is_identifier(key) {
        out.push_str(key);
    } else {
        quote(key, out);
    }
}

fn quote(value: &str, out: &mut String) {
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}
