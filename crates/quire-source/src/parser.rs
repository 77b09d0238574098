//! tree-sitter front end
//!
//! Lowers a TypeScript syntax tree into [`Item`]s. Only the statement and
//! literal forms the catalog writes are modeled; anything else is captured
//! as source text so it survives a rewrite untouched.

use crate::error::{SourceError, SourceResult};
use crate::literal::{Annotated, ArrayLiteral, Literal, Member, ObjectLiteral, Property};
use crate::module::{ExportDecl, ImportDecl, ImportSpecifier, Item, Statement};
use tree_sitter::Node;

/// Parse `text` into top-level items
pub(crate) fn parse_items(text: &str) -> SourceResult<Vec<Item>> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
        .map_err(|e| SourceError::ParserInit(e.to_string()))?;

    let tree = parser.parse(text, None).ok_or_else(|| SourceError::Parse {
        line: 1,
        column: 1,
        message: "parser produced no tree".into(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(syntax_error(root, text));
    }

    let source = Source(text);
    let mut items: Vec<Item> = Vec::new();
    let mut prev_end: Option<usize> = None;

    for node in children(root) {
        let start = node.start_position().row;
        if node.kind() == "comment" && prev_end == Some(start) {
            if let Some(last) = items.last_mut().filter(|i| i.trailing.is_none()) {
                last.trailing = Some(source.text(node).to_string());
                continue;
            }
        }
        let mut statement = statement(node, source);
        let mut trailing = None;
        if !matches!(statement, Statement::Verbatim(_)) {
            if let Some(comment) = inner_trailing_comment(node) {
                let same_line = comment
                    .prev_sibling()
                    .is_some_and(|p| p.end_position().row == comment.start_position().row);
                if same_line {
                    trailing = Some(source.text(comment).to_string());
                } else {
                    statement = Statement::Verbatim(source.text(node).trim_end().to_string());
                }
            }
        }
        items.push(Item {
            blank_before: prev_end.is_some_and(|end| start > end + 1),
            statement,
            trailing,
        });
        prev_end = Some(node.end_position().row);
    }

    Ok(items)
}

#[derive(Clone, Copy)]
struct Source<'a>(&'a str);

impl<'a> Source<'a> {
    fn text(self, node: Node<'_>) -> &'a str {
        &self.0[node.byte_range()]
    }
}

fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::with_capacity(node.child_count());
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            out.push(child);
        }
    }
    out
}

/// Comment swallowed into the end of a statement by automatic semicolon insertion
fn inner_trailing_comment(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    loop {
        let last = current.child(current.child_count().checked_sub(1)?)?;
        if last.kind() == "comment" {
            return Some(last);
        }
        current = last;
    }
}

fn syntax_error(root: Node<'_>, text: &str) -> SourceError {
    let node = first_error(root).unwrap_or(root);
    let at = node.start_position();
    let message = if node.is_missing() {
        format!("missing {}", node.kind())
    } else {
        let snippet: String = text[node.byte_range()].chars().take(40).collect();
        format!("unexpected '{}'", snippet.trim())
    };
    SourceError::Parse {
        line: at.row + 1,
        column: at.column + 1,
        message,
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    children(node).into_iter().find_map(first_error)
}

fn statement(node: Node<'_>, source: Source<'_>) -> Statement {
    let lowered = match node.kind() {
        "import_statement" => import(node, source).map(Statement::Import),
        "export_statement" => export(node, source).map(Statement::Export),
        _ => None,
    };
    lowered.unwrap_or_else(|| Statement::Verbatim(source.text(node).trim_end().to_string()))
}

fn import(node: Node<'_>, source: Source<'_>) -> Option<ImportDecl> {
    let mut decl = ImportDecl::default();
    let mut has_clause = false;
    for child in children(node) {
        match child.kind() {
            "import" | "from" | ";" | "comment" => {}
            "type" => decl.type_only = true,
            "import_clause" => {
                has_clause = true;
                import_clause(child, source, &mut decl)?;
            }
            "string" => decl.source = string(child, source)?,
            _ => return None,
        }
    }
    has_clause.then_some(decl)
}

fn import_clause(node: Node<'_>, source: Source<'_>, decl: &mut ImportDecl) -> Option<()> {
    for child in children(node) {
        match child.kind() {
            "," => {}
            "identifier" => decl.default = Some(source.text(child).to_string()),
            "namespace_import" => {
                let name = children(child).into_iter().find(|c| c.kind() == "identifier")?;
                decl.namespace = Some(source.text(name).to_string());
            }
            "named_imports" => {
                for spec in children(child) {
                    match spec.kind() {
                        "{" | "}" | "," => {}
                        "import_specifier" => decl.named.push(import_specifier(spec, source)?),
                        _ => return None,
                    }
                }
            }
            _ => return None,
        }
    }
    Some(())
}

fn import_specifier(node: Node<'_>, source: Source<'_>) -> Option<ImportSpecifier> {
    if children(node).first().is_some_and(|c| c.kind() == "type") {
        return None;
    }
    let name = node.child_by_field_name("name")?;
    if name.kind() != "identifier" {
        return None;
    }
    Some(ImportSpecifier {
        name: source.text(name).to_string(),
        alias: node
            .child_by_field_name("alias")
            .map(|a| source.text(a).to_string()),
    })
}

fn export(node: Node<'_>, source: Source<'_>) -> Option<ExportDecl> {
    if children(node).iter().any(|c| c.kind() == "default") {
        return None;
    }
    let declaration = node.child_by_field_name("declaration")?;
    if declaration.kind() != "lexical_declaration" {
        return None;
    }

    let parts = children(declaration);
    let keyword = parts.first()?;
    let declarators: Vec<_> = parts
        .iter()
        .filter(|c| c.kind() == "variable_declarator")
        .collect();
    let [declarator] = declarators.as_slice() else {
        return None;
    };

    let name = declarator.child_by_field_name("name")?;
    if name.kind() != "identifier" {
        return None;
    }
    let value = declarator.child_by_field_name("value")?;
    let type_annotation = declarator.child_by_field_name("type").map(|t| {
        source
            .text(t)
            .trim_start()
            .trim_start_matches(':')
            .trim()
            .to_string()
    });

    Some(ExportDecl {
        keyword: source.text(*keyword).to_string(),
        name: source.text(name).to_string(),
        type_annotation,
        value: literal(value, source),
    })
}

fn literal(node: Node<'_>, source: Source<'_>) -> Literal {
    let raw = || Literal::Raw(source.text(node).to_string());
    match node.kind() {
        "array" => Literal::Array(array(node, source)),
        "object" => Literal::Object(object(node, source)),
        "string" => string(node, source).map_or_else(raw, Literal::String),
        "number" => Literal::Number(source.text(node).to_string()),
        "true" => Literal::Bool(true),
        "false" => Literal::Bool(false),
        "null" => Literal::Null,
        "undefined" => Literal::Undefined,
        "identifier" => Literal::Identifier(source.text(node).to_string()),
        "unary_expression" => match node.child_by_field_name("argument") {
            Some(arg) if arg.kind() == "number" && source.text(node).starts_with('-') => {
                Literal::Number(format!("-{}", source.text(arg)))
            }
            _ => raw(),
        },
        "parenthesized_expression" => {
            let inner: Vec<_> = children(node)
                .into_iter()
                .filter(|c| c.is_named() && c.kind() != "comment")
                .collect();
            match inner.as_slice() {
                [only] => literal(*only, source),
                _ => raw(),
            }
        }
        _ => raw(),
    }
}

fn array(node: Node<'_>, source: Source<'_>) -> ArrayLiteral {
    let mut out = ArrayLiteral::default();
    let mut pending = Vec::new();
    let mut last_row = None;

    for child in children(node) {
        match child.kind() {
            "[" | "]" | "," => {}
            "comment" => {
                let text = source.text(child).to_string();
                if let Some(last) = out.elements.last_mut() {
                    if pending.is_empty()
                        && last.trailing.is_none()
                        && last_row == Some(child.start_position().row)
                    {
                        last.trailing = Some(text);
                        continue;
                    }
                }
                pending.push(text);
            }
            _ => {
                out.elements.push(Annotated {
                    leading: std::mem::take(&mut pending),
                    value: literal(child, source),
                    trailing: None,
                });
                last_row = Some(child.end_position().row);
            }
        }
    }

    out.dangling = pending;
    out
}

fn object(node: Node<'_>, source: Source<'_>) -> ObjectLiteral {
    let mut out = ObjectLiteral::default();
    let mut pending = Vec::new();
    let mut last_row = None;

    for child in children(node) {
        let member = match child.kind() {
            "{" | "}" | "," => continue,
            "comment" => {
                let text = source.text(child).to_string();
                if let Some(last) = out.members.last_mut() {
                    if pending.is_empty()
                        && last.trailing.is_none()
                        && last_row == Some(child.start_position().row)
                    {
                        last.trailing = Some(text);
                        continue;
                    }
                }
                pending.push(text);
                continue;
            }
            "pair" => pair(child, source),
            "shorthand_property_identifier" => {
                let name = source.text(child).to_string();
                Member::Property(Property {
                    key: name.clone(),
                    value: Literal::Identifier(name),
                })
            }
            _ => Member::Raw(source.text(child).to_string()),
        };
        out.members.push(Annotated {
            leading: std::mem::take(&mut pending),
            value: member,
            trailing: None,
        });
        last_row = Some(child.end_position().row);
    }

    out.dangling = pending;
    out
}

fn pair(node: Node<'_>, source: Source<'_>) -> Member {
    let raw = || Member::Raw(source.text(node).to_string());
    let (Some(key), Some(value)) = (
        node.child_by_field_name("key"),
        node.child_by_field_name("value"),
    ) else {
        return raw();
    };
    let key = match key.kind() {
        "property_identifier" | "number" => source.text(key).to_string(),
        "string" => match string(key, source) {
            Some(k) => k,
            None => return raw(),
        },
        _ => return raw(),
    };
    Member::Property(Property {
        key,
        value: literal(value, source),
    })
}

fn string(node: Node<'_>, source: Source<'_>) -> Option<String> {
    let mut out = String::new();
    for child in children(node) {
        match child.kind() {
            "'" | "\"" => {}
            "string_fragment" => out.push_str(source.text(child)),
            "escape_sequence" => unescape(source.text(child), &mut out)?,
            _ => return None,
        }
    }
    Some(out)
}

fn unescape(sequence: &str, out: &mut String) -> Option<()> {
    let body = sequence.strip_prefix('\\')?;
    let mut chars = body.chars();
    let first = chars.next()?;
    match first {
        'n' => out.push('\n'),
        't' => out.push('\t'),
        'r' => out.push('\r'),
        'b' => out.push('\u{8}'),
        'f' => out.push('\u{c}'),
        'v' => out.push('\u{b}'),
        '0' if body.len() == 1 => out.push('\0'),
        '\n' | '\r' | '\u{2028}' | '\u{2029}' => {}
        'x' => out.push(char::from_u32(u32::from_str_radix(chars.as_str(), 16).ok()?)?),
        'u' => {
            let hex = chars.as_str();
            let hex = hex
                .strip_prefix('{')
                .and_then(|h| h.strip_suffix('}'))
                .unwrap_or(hex);
            out.push(char::from_u32(u32::from_str_radix(hex, 16).ok()?)?);
        }
        other => out.push(other),
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn only_export(text: &str) -> ExportDecl {
        let items = parse_items(text).unwrap();
        items
            .into_iter()
            .find_map(|i| match i.statement {
                Statement::Export(e) => Some(e),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn lowers_catalog_index() {
        let text = "\
import { TopicCategory } from './types'

export const topics: TopicCategory[] = [
  {
    title: 'Frontend',
    id: 'frontend',
    slug: 'frontend',
    items: []
  }
]

export * from './types'
";
        let items = parse_items(text).unwrap();
        assert_eq!(items.len(), 3);
        assert!(matches!(&items[0].statement, Statement::Import(i) if i.named[0].name == "TopicCategory"));
        assert!(items[1].blank_before);
        assert_eq!(
            items[2].statement,
            Statement::Verbatim("export * from './types'".into())
        );

        let Statement::Export(decl) = &items[1].statement else {
            panic!("expected export");
        };
        assert_eq!(decl.type_annotation.as_deref(), Some("TopicCategory[]"));
        let first = decl.value.as_array().unwrap().iter().next().unwrap();
        assert_eq!(first.as_object().unwrap().get_str("title"), Some("Frontend"));
    }

    #[test]
    fn decodes_string_escapes() {
        let decl = only_export(r#"export const s = { a: 'it\'s', b: "tab\there", c: 'A\x42' }"#);
        let object = decl.value.as_object().unwrap();
        assert_eq!(object.get_str("a"), Some("it's"));
        assert_eq!(object.get_str("b"), Some("tab\there"));
        assert_eq!(object.get_str("c"), Some("AB"));
    }

    #[test]
    fn attaches_comments() {
        let decl = only_export(
            "export const xs = [\n  // first\n  1, // one\n  2\n  // end\n]\n",
        );
        let array = decl.value.as_array().unwrap();
        assert_eq!(array.elements[0].leading, vec!["// first".to_string()]);
        assert_eq!(array.elements[0].trailing.as_deref(), Some("// one"));
        assert!(array.elements[1].leading.is_empty());
        assert_eq!(array.dangling, vec!["// end".to_string()]);
    }

    #[test]
    fn unsupported_values_stay_raw() {
        let decl = only_export("export const x = { when: Date.now(), ...rest, n: -1 }");
        let object = decl.value.as_object().unwrap();
        assert_eq!(object.get("when"), Some(&Literal::Raw("Date.now()".into())));
        assert_eq!(object.get("n"), Some(&Literal::Number("-1".into())));
        assert!(object
            .members
            .iter()
            .any(|m| m.value == Member::Raw("...rest".into())));
    }

    #[test]
    fn multi_binding_export_is_verbatim() {
        let items = parse_items("export const a = 1, b = 2\n").unwrap();
        assert_eq!(items[0].statement, Statement::Verbatim("export const a = 1, b = 2".into()));
    }

    #[test]
    fn reports_syntax_error_position() {
        let err = parse_items("export const topics = [\n  { id: 'a' \n").unwrap_err();
        assert!(matches!(err, SourceError::Parse { line, .. } if line >= 1));
    }

    #[test]
    fn trailing_top_level_comment_joins_statement() {
        let items = parse_items("import { a } from './a' // keep\nexport const b = 1\n").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].trailing.as_deref(), Some("// keep"));
        assert!(!items[1].blank_before);
    }
}
