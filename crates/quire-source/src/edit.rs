//! Structural edits on a declaration's literal
//!
//! Each [`Edit`] states the literal shape it needs. The shape is checked
//! before anything changes, so a failed edit never leaves a half-applied
//! value behind.

use crate::error::{SourceError, SourceResult};
use crate::literal::{Annotated, ArrayLiteral, Literal, Member, ObjectLiteral};
use std::fmt::{self, Display, Formatter};

/// Literal shape an edit operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `[{...}, {...}]`
    ArrayOfObjects,
    /// `{ key: binding, ... }`
    ObjectOfIdentifiers,
    /// A single `{...}`
    Object,
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ArrayOfObjects => "an array of objects",
            Self::ObjectOfIdentifiers => "an object of identifiers",
            Self::Object => "an object",
        })
    }
}

/// Selects elements or entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Object element whose string field equals a value
    Field {
        /// Field name
        field: String,
        /// Required value
        value: String,
    },
    /// Map entry with this key
    Key(String),
}

impl Matcher {
    /// Match objects where `field == value`
    #[inline]
    #[must_use]
    pub fn field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Match the entry keyed `key`
    #[inline]
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    fn matches_element(&self, element: &Literal) -> bool {
        match self {
            Self::Field { field, value } => element
                .as_object()
                .and_then(|o| o.get_str(field))
                .is_some_and(|v| v == value),
            Self::Key(_) => false,
        }
    }

    fn matches_key(&self, key: &str) -> bool {
        matches!(self, Self::Key(k) if k == key)
    }
}

/// Field-level change inside an object
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    /// Set `field` to `value`
    Set {
        /// Field name
        field: String,
        /// New value
        value: Literal,
    },
    /// Append `value` to the array in `field`, creating it when absent
    Push {
        /// Array field
        field: String,
        /// Element to append
        value: Literal,
    },
    /// Drop elements of the array in `field` selected by `matcher`
    RemoveWhere {
        /// Array field
        field: String,
        /// Selector
        matcher: Matcher,
    },
    /// Set `subfield` on every object in the array `field`
    SetInEach {
        /// Array field
        field: String,
        /// Field set on each element
        subfield: String,
        /// New value
        value: Literal,
    },
    /// Patch every object in the array `field` selected by `matcher`
    UpdateIn {
        /// Array field
        field: String,
        /// Selector
        matcher: Matcher,
        /// Changes applied to each match
        patch: Vec<PatchOp>,
    },
}

impl PatchOp {
    /// `field = value`
    #[inline]
    #[must_use]
    pub fn set(field: impl Into<String>, value: Literal) -> Self {
        Self::Set {
            field: field.into(),
            value,
        }
    }
}

/// One structural edit
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Insert an object into an array of objects, appending when `index` is `None`
    Insert {
        /// New element
        element: Literal,
        /// Position
        index: Option<usize>,
    },
    /// Insert `key: binding` into an object of identifiers, replacing an existing key
    InsertEntry {
        /// Entry key
        key: String,
        /// Identifier value
        value: Literal,
    },
    /// Remove every element or entry the matcher selects
    DeleteWhere(Matcher),
    /// Patch every object element the matcher selects
    UpdateWhere {
        /// Selector
        matcher: Matcher,
        /// Changes applied to each match
        patch: Vec<PatchOp>,
    },
    /// Reorder array elements by the value of `field`.
    ///
    /// Listed elements come first in list order, the rest keep their
    /// relative order after them. Unknown and repeated keys are ignored.
    Reorder {
        /// Key field
        field: String,
        /// Desired order
        order: Vec<String>,
    },
    /// Reorder object entries by key, with the same rules as [`Edit::Reorder`]
    ReorderEntries(Vec<String>),
    /// Rename an imported binding and its references in the declaration
    RenameBinding {
        /// Current local name
        from: String,
        /// New local name
        to: String,
    },
    /// Patch a single-object declaration
    Patch(Vec<PatchOp>),
    /// Replace the whole value with one of the same kind
    Replace(Literal),
}

/// Result of an applied edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditOutcome {
    /// Elements, entries or sites touched
    pub affected: usize,
}

pub(crate) fn apply(name: &str, value: &mut Literal, edit: Edit) -> SourceResult<EditOutcome> {
    let affected = match edit {
        Edit::Insert { element, index } => {
            let array = array_of_objects(name, value)?;
            if element.as_object().is_none() {
                return Err(SourceError::shape(name, "given an object", element.kind_name()));
            }
            let at = index.map_or(array.len(), |i| i.min(array.len()));
            array.elements.insert(at, Annotated::new(element));
            1
        }
        Edit::InsertEntry { key, value: entry } => {
            let map = object_of_identifiers(name, value)?;
            if !matches!(entry, Literal::Identifier(_)) {
                return Err(SourceError::shape(name, "given an identifier", entry.kind_name()));
            }
            map.set(key, entry);
            1
        }
        Edit::DeleteWhere(matcher) => match matcher {
            Matcher::Key(_) => {
                let map = object_of_identifiers(name, value)?;
                let before = map.members.len();
                map.members.retain(|m| match &m.value {
                    Member::Property(p) => !matcher.matches_key(&p.key),
                    Member::Raw(_) => true,
                });
                before - map.members.len()
            }
            Matcher::Field { .. } => {
                let array = array_of_objects(name, value)?;
                let before = array.len();
                array.elements.retain(|e| !matcher.matches_element(&e.value));
                before - array.len()
            }
        },
        Edit::UpdateWhere { matcher, patch } => {
            let array = array_of_objects(name, value)?;
            let mut staged = array.clone();
            let mut affected = 0;
            for element in &mut staged.elements {
                if matcher.matches_element(&element.value) {
                    if let Literal::Object(object) = &mut element.value {
                        apply_patch(name, object, &patch)?;
                        affected += 1;
                    }
                }
            }
            *array = staged;
            affected
        }
        Edit::Reorder { field, order } => {
            let array = array_of_objects(name, value)?;
            let key = |e: &Annotated<Literal>| {
                e.value
                    .as_object()
                    .and_then(|o| o.get_str(&field))
                    .map(str::to_string)
            };
            reorder(&mut array.elements, &order, key)
        }
        Edit::ReorderEntries(order) => {
            let map = object_of_identifiers(name, value)?;
            let key = |m: &Annotated<Member>| match &m.value {
                Member::Property(p) => Some(p.key.clone()),
                Member::Raw(_) => None,
            };
            reorder(&mut map.members, &order, key)
        }
        Edit::RenameBinding { from, to } => rename_identifiers(value, &from, &to),
        Edit::Patch(patch) => {
            let Literal::Object(object) = value else {
                return Err(SourceError::shape(name, Shape::Object.to_string(), value.kind_name()));
            };
            let mut staged = object.clone();
            apply_patch(name, &mut staged, &patch)?;
            *object = staged;
            patch.len()
        }
        Edit::Replace(replacement) => {
            if std::mem::discriminant(value) != std::mem::discriminant(&replacement) {
                return Err(SourceError::shape(
                    name,
                    replacement.kind_name(),
                    value.kind_name(),
                ));
            }
            *value = replacement;
            1
        }
    };
    Ok(EditOutcome { affected })
}

fn array_of_objects<'a>(name: &str, value: &'a mut Literal) -> SourceResult<&'a mut ArrayLiteral> {
    let found = value.kind_name();
    let Literal::Array(array) = value else {
        return Err(SourceError::shape(name, Shape::ArrayOfObjects.to_string(), found));
    };
    if let Some(bad) = array.iter().find(|e| e.as_object().is_none()) {
        return Err(SourceError::shape(
            name,
            Shape::ArrayOfObjects.to_string(),
            format!("an array containing {}", bad.kind_name()),
        ));
    }
    Ok(array)
}

fn object_of_identifiers<'a>(
    name: &str,
    value: &'a mut Literal,
) -> SourceResult<&'a mut ObjectLiteral> {
    let found = value.kind_name();
    let Literal::Object(object) = value else {
        return Err(SourceError::shape(name, Shape::ObjectOfIdentifiers.to_string(), found));
    };
    for member in &object.members {
        let bad = match &member.value {
            Member::Property(p) if matches!(p.value, Literal::Identifier(_)) => continue,
            Member::Property(p) => p.value.kind_name(),
            Member::Raw(_) => "an expression",
        };
        return Err(SourceError::shape(
            name,
            Shape::ObjectOfIdentifiers.to_string(),
            format!("an entry holding {bad}"),
        ));
    }
    Ok(object)
}

fn apply_patch(name: &str, object: &mut ObjectLiteral, patch: &[PatchOp]) -> SourceResult<()> {
    for op in patch {
        match op {
            PatchOp::Set { field, value } => object.set(field.clone(), value.clone()),
            PatchOp::Push { field, value } => {
                if object.get(field).is_none() {
                    object.set(field.clone(), Literal::Array(ArrayLiteral::new()));
                }
                field_array(name, object, field)?.push(value.clone());
            }
            PatchOp::RemoveWhere { field, matcher } => {
                field_array(name, object, field)?
                    .elements
                    .retain(|e| !matcher.matches_element(&e.value));
            }
            PatchOp::SetInEach {
                field,
                subfield,
                value,
            } => {
                for element in &mut field_array(name, object, field)?.elements {
                    if let Literal::Object(inner) = &mut element.value {
                        inner.set(subfield.clone(), value.clone());
                    }
                }
            }
            PatchOp::UpdateIn {
                field,
                matcher,
                patch,
            } => {
                for element in &mut field_array(name, object, field)?.elements {
                    if !matcher.matches_element(&element.value) {
                        continue;
                    }
                    if let Literal::Object(inner) = &mut element.value {
                        apply_patch(name, inner, patch)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn field_array<'a>(
    name: &str,
    object: &'a mut ObjectLiteral,
    field: &str,
) -> SourceResult<&'a mut ArrayLiteral> {
    match object.get_mut(field) {
        Some(Literal::Array(array)) => Ok(array),
        Some(other) => Err(SourceError::shape(
            format!("{name}.{field}"),
            "an array",
            other.kind_name(),
        )),
        None => Err(SourceError::shape(format!("{name}.{field}"), "an array", "nothing")),
    }
}

fn reorder<T>(
    entries: &mut Vec<Annotated<T>>,
    order: &[String],
    key: impl Fn(&Annotated<T>) -> Option<String>,
) -> usize {
    let mut rest: Vec<Option<Annotated<T>>> = std::mem::take(entries).into_iter().map(Some).collect();
    let keys: Vec<Option<String>> = rest.iter().map(|e| e.as_ref().and_then(&key)).collect();

    let mut placed = 0;
    for wanted in order {
        let hit = keys
            .iter()
            .enumerate()
            .position(|(i, k)| rest[i].is_some() && k.as_deref() == Some(wanted.as_str()));
        if let Some(i) = hit {
            if let Some(entry) = rest[i].take() {
                entries.push(entry);
                placed += 1;
            }
        }
    }
    entries.extend(rest.into_iter().flatten());
    placed
}

/// Rename identifier references inside a literal
pub(crate) fn rename_identifiers(value: &mut Literal, from: &str, to: &str) -> usize {
    match value {
        Literal::Identifier(name) if name == from => {
            *name = to.to_string();
            1
        }
        Literal::Array(array) => array
            .elements
            .iter_mut()
            .map(|e| rename_identifiers(&mut e.value, from, to))
            .sum(),
        Literal::Object(object) => object
            .members
            .iter_mut()
            .map(|m| match &mut m.value {
                Member::Property(p) => rename_identifiers(&mut p.value, from, to),
                Member::Raw(_) => 0,
            })
            .sum(),
        _ => 0,
    }
}
