//! Parsed source module
//!
//! A [`SourceModule`] holds the top-level statements of one file. Imports
//! and single-binding exported declarations are modeled; every other
//! statement and top-level comment is kept as verbatim text.

use crate::edit::{self, Edit, EditOutcome};
use crate::error::{SourceError, SourceResult};
use crate::literal::Literal;
use crate::{parser, printer};

/// One top-level statement with its layout
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Whether an empty line separates this item from the previous one
    pub blank_before: bool,
    /// The statement
    pub statement: Statement,
    /// Comment on the same line after the statement
    pub trailing: Option<String>,
}

/// Top-level statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `import ... from '...'`
    Import(ImportDecl),
    /// `export const name: Type = literal`
    Export(ExportDecl),
    /// Anything else, including comments
    Verbatim(String),
}

/// Import statement
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportDecl {
    /// `import type`
    pub type_only: bool,
    /// Default binding
    pub default: Option<String>,
    /// `* as name`
    pub namespace: Option<String>,
    /// `{ a, b as c }`
    pub named: Vec<ImportSpecifier>,
    /// Module path
    pub source: String,
}

/// One `{ name as alias }` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    /// Exported name in the imported module
    pub name: String,
    /// Local alias
    pub alias: Option<String>,
}

impl ImportSpecifier {
    /// Local binding introduced by this specifier
    #[inline]
    #[must_use]
    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl ImportDecl {
    /// `import { a, b } from 'source'`
    #[must_use]
    pub fn named<I, S>(names: I, source: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            named: names
                .into_iter()
                .map(|n| ImportSpecifier {
                    name: n.into(),
                    alias: None,
                })
                .collect(),
            source: source.into(),
            ..Self::default()
        }
    }

    /// Mark as `import type`
    #[inline]
    #[must_use]
    pub fn type_only(mut self) -> Self {
        self.type_only = true;
        self
    }

    /// Whether no binding is left
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.namespace.is_none() && self.named.is_empty()
    }

    /// Whether `binding` is introduced locally
    #[must_use]
    pub fn binds(&self, binding: &str) -> bool {
        self.default.as_deref() == Some(binding)
            || self.namespace.as_deref() == Some(binding)
            || self.named.iter().any(|s| s.local() == binding)
    }
}

/// Exported variable declaration with a single binding
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDecl {
    /// `const` or `let`
    pub keyword: String,
    /// Binding name
    pub name: String,
    /// Type annotation text without the colon
    pub type_annotation: Option<String>,
    /// Initializer
    pub value: Literal,
}

impl ExportDecl {
    /// `export const name: ty = value`
    #[must_use]
    pub fn constant(name: impl Into<String>, ty: Option<&str>, value: Literal) -> Self {
        Self {
            keyword: "const".into(),
            name: name.into(),
            type_annotation: ty.map(str::to_string),
            value,
        }
    }
}

/// Parsed file ready for structural edits
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceModule {
    items: Vec<Item>,
}

impl SourceModule {
    /// Empty module
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse source text
    ///
    /// # Errors
    /// Returns [`SourceError::Parse`] when the text is not valid TypeScript.
    pub fn parse(text: &str) -> SourceResult<Self> {
        Ok(Self {
            items: parser::parse_items(text)?,
        })
    }

    /// Print the module in canonical form
    #[must_use]
    pub fn render(&self) -> String {
        printer::render_items(&self.items)
    }

    /// Top-level items
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Append a statement
    pub fn push(&mut self, statement: Statement, blank_before: bool) {
        self.items.push(Item {
            blank_before,
            statement,
            trailing: None,
        });
    }

    /// Builder form of [`push`](Self::push)
    #[must_use]
    pub fn with(mut self, statement: Statement, blank_before: bool) -> Self {
        self.push(statement, blank_before);
        self
    }

    /// Exported declarations in order
    pub fn exports(&self) -> impl Iterator<Item = &ExportDecl> {
        self.items.iter().filter_map(|i| match &i.statement {
            Statement::Export(e) => Some(e),
            _ => None,
        })
    }

    /// Import statements in order
    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.items.iter().filter_map(|i| match &i.statement {
            Statement::Import(d) => Some(d),
            _ => None,
        })
    }

    /// The only exported declaration, if exactly one exists
    #[must_use]
    pub fn sole_export(&self) -> Option<&ExportDecl> {
        let mut exports = self.exports();
        match (exports.next(), exports.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Exported declaration named `name`
    ///
    /// # Errors
    /// Returns [`SourceError::DeclarationNotFound`].
    pub fn declaration(&self, name: &str) -> SourceResult<&ExportDecl> {
        self.exports()
            .find(|e| e.name == name)
            .ok_or_else(|| SourceError::DeclarationNotFound(name.to_string()))
    }

    fn declaration_mut(&mut self, name: &str) -> SourceResult<&mut ExportDecl> {
        self.items
            .iter_mut()
            .find_map(|i| match &mut i.statement {
                Statement::Export(e) if e.name == name => Some(e),
                _ => None,
            })
            .ok_or_else(|| SourceError::DeclarationNotFound(name.to_string()))
    }

    /// Initializer of the declaration named `name`
    ///
    /// # Errors
    /// Returns [`SourceError::DeclarationNotFound`].
    pub fn read(&self, name: &str) -> SourceResult<&Literal> {
        self.declaration(name).map(|d| &d.value)
    }

    /// Initializer of `name` as JSON
    ///
    /// # Errors
    /// Returns [`SourceError::DeclarationNotFound`] or
    /// [`SourceError::ShapeMismatch`] for values JSON cannot hold.
    pub fn read_json(&self, name: &str) -> SourceResult<serde_json::Value> {
        self.read(name)?.to_json().map_err(|e| e.within(name))
    }

    /// Apply one structural edit to the declaration named `name`
    ///
    /// # Errors
    /// Returns [`SourceError::DeclarationNotFound`] or
    /// [`SourceError::ShapeMismatch`]. The module is unchanged on error.
    pub fn apply(&mut self, name: &str, edit: Edit) -> SourceResult<EditOutcome> {
        if let Edit::RenameBinding { from, to } = &edit {
            let (from, to) = (from.clone(), to.clone());
            let decl = self.declaration_mut(name)?;
            let mut affected = edit::rename_identifiers(&mut decl.value, &from, &to);
            affected += self.rename_import(&from, &to);
            tracing::debug!("renamed binding {} -> {} ({} sites)", from, to, affected);
            return Ok(EditOutcome { affected });
        }
        let decl = self.declaration_mut(name)?;
        let mut value = decl.value.clone();
        let outcome = edit::apply(name, &mut value, edit)?;
        decl.value = value;
        Ok(outcome)
    }

    fn rename_import(&mut self, from: &str, to: &str) -> usize {
        let mut renamed = 0;
        for item in &mut self.items {
            let Statement::Import(import) = &mut item.statement else {
                continue;
            };
            if import.default.as_deref() == Some(from) {
                import.default = Some(to.to_string());
                renamed += 1;
            }
            if import.namespace.as_deref() == Some(from) {
                import.namespace = Some(to.to_string());
                renamed += 1;
            }
            for spec in &mut import.named {
                if spec.alias.as_deref() == Some(from) {
                    spec.alias = Some(to.to_string());
                    renamed += 1;
                } else if spec.alias.is_none() && spec.name == from {
                    spec.name = to.to_string();
                    renamed += 1;
                }
            }
        }
        renamed
    }

    /// Ensure `binding` is imported from `source`.
    ///
    /// Joins an existing value import of the same module, otherwise inserts
    /// a new statement after the last value import (or before the first
    /// type import). Returns `false` when the binding was already imported.
    pub fn add_named_import(&mut self, binding: &str, source: &str) -> bool {
        if self.imports().any(|i| i.binds(binding)) {
            return false;
        }
        let existing = self.items.iter_mut().find_map(|i| match &mut i.statement {
            Statement::Import(d) if !d.type_only && d.source == source => Some(d),
            _ => None,
        });
        if let Some(import) = existing {
            import.named.push(ImportSpecifier {
                name: binding.to_string(),
                alias: None,
            });
            return true;
        }

        let is_import = |item: &Item, type_only: bool| {
            matches!(&item.statement, Statement::Import(d) if d.type_only == type_only)
        };
        let index = match self.items.iter().rposition(|i| is_import(i, false)) {
            Some(last) => last + 1,
            None => self
                .items
                .iter()
                .position(|i| is_import(i, true))
                .unwrap_or(0),
        };
        if index == 0 {
            if let Some(first) = self.items.first_mut() {
                first.blank_before = !matches!(first.statement, Statement::Import(_));
            }
        }
        self.items.insert(
            index,
            Item {
                blank_before: false,
                statement: Statement::Import(ImportDecl::named([binding], source)),
                trailing: None,
            },
        );
        true
    }

    /// Remove `binding` from value imports, dropping statements left empty.
    /// Returns `false` when nothing imported it.
    pub fn remove_import_binding(&mut self, binding: &str) -> bool {
        let mut removed = false;
        for item in &mut self.items {
            if let Statement::Import(import) = &mut item.statement {
                if import.type_only {
                    continue;
                }
                let before = import.named.len();
                import.named.retain(|s| s.local() != binding);
                removed |= import.named.len() != before;
                if import.default.as_deref() == Some(binding) {
                    import.default = None;
                    removed = true;
                }
                if import.namespace.as_deref() == Some(binding) {
                    import.namespace = None;
                    removed = true;
                }
            }
        }

        let mut index = 0;
        while index < self.items.len() {
            let empty = matches!(&self.items[index].statement, Statement::Import(d) if d.is_empty());
            if empty {
                let gone = self.items.remove(index);
                if let Some(next) = self.items.get_mut(index) {
                    next.blank_before |= gone.blank_before && index > 0;
                }
            } else {
                index += 1;
            }
        }
        removed
    }
}

/// Parse `text`, apply one edit to `name` and print the result.
///
/// # Errors
/// Any [`SourceError`] from parsing or editing.
pub fn mutate(text: &str, name: &str, edit: Edit) -> SourceResult<String> {
    let mut module = SourceModule::parse(text)?;
    module.apply(name, edit)?;
    Ok(module.render())
}
