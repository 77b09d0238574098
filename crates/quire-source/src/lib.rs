//! Quire structural source editing
//!
//! Reads and rewrites exported literals in TypeScript modules through a
//! syntax tree, never through text substitution.
//!
//! # Pipeline
//!
//! ```text
//! text ──tree-sitter──▶ SourceModule ──Edit──▶ SourceModule ──printer──▶ text
//!                       (imports, exports,                    (canonical,
//!                        verbatim statements)                  idempotent)
//! ```
//!
//! # Core Concepts
//!
//! - [`SourceModule`]: top-level statements of one file
//! - [`Literal`]: owned, editable initializer tree with comments attached
//! - [`Edit`]: one structural change to a named declaration
//! - [`Shape`]: literal shape an edit requires
//! - [`mutate`]: parse, edit and print in one call
//!
//! # Example
//!
//! ```rust,ignore
//! use quire_source::{mutate, Edit, Matcher};
//!
//! let text = mutate(source, "topics", Edit::DeleteWhere(Matcher::field("id", "backend")))?;
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod edit;
mod error;
mod literal;
mod module;
mod parser;
mod printer;

pub use edit::{Edit, EditOutcome, Matcher, PatchOp, Shape};
pub use error::{SourceError, SourceResult};
pub use literal::{Annotated, ArrayLiteral, Literal, Member, ObjectLiteral, Property};
pub use module::{
    mutate, ExportDecl, ImportDecl, ImportSpecifier, Item, SourceModule, Statement,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
