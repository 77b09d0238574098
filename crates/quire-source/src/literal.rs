//! Owned literal tree
//!
//! A [`Literal`] is the editable form of a declaration's initializer. Values
//! the catalog never produces (calls, spreads, templates) are kept as
//! [`Literal::Raw`] source text and printed back unchanged.

use crate::error::{SourceError, SourceResult};
use serde_json::{Map, Number, Value};

/// Initializer value of an exported declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `true` / `false`
    Bool(bool),
    /// Numeric literal, kept as written
    Number(String),
    /// Decoded string contents
    String(String),
    /// Reference to a binding
    Identifier(String),
    /// `[ ... ]`
    Array(ArrayLiteral),
    /// `{ ... }`
    Object(ObjectLiteral),
    /// Any other expression, verbatim
    Raw(String),
}

/// Value with the comments that surround it in source
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotated<T> {
    /// Comments on the lines before the value
    pub leading: Vec<String>,
    /// The value itself
    pub value: T,
    /// Comment on the same line after the value
    pub trailing: Option<String>,
}

impl<T> Annotated<T> {
    /// Wrap a value without comments
    #[inline]
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            leading: Vec::new(),
            value,
            trailing: None,
        }
    }
}

/// Array literal
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayLiteral {
    /// Elements in order
    pub elements: Vec<Annotated<Literal>>,
    /// Comments after the last element
    pub dangling: Vec<String>,
}

/// Object literal
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectLiteral {
    /// Members in order
    pub members: Vec<Annotated<Member>>,
    /// Comments after the last member
    pub dangling: Vec<String>,
}

/// Object member
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// `key: value`
    Property(Property),
    /// Spread, method or computed key, verbatim
    Raw(String),
}

/// Keyed object property
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Decoded key
    pub key: String,
    /// Value
    pub value: Literal,
}

impl Literal {
    /// String literal
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Identifier reference
    #[inline]
    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Short description used in shape errors
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Bool(_) => "a boolean",
            Self::Number(_) => "a number",
            Self::String(_) => "a string",
            Self::Identifier(_) => "an identifier",
            Self::Array(_) => "an array",
            Self::Object(_) => "an object",
            Self::Raw(_) => "an expression",
        }
    }

    /// String contents, also accepting identifiers
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Identifier(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as array
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayLiteral> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as mutable array
    pub fn as_array_mut(&mut self) -> Option<&mut ArrayLiteral> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as object
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectLiteral> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrow as mutable object
    pub fn as_object_mut(&mut self) -> Option<&mut ObjectLiteral> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Build a literal from a JSON value.
    ///
    /// Strings become quoted literals, numbers and booleans are written as
    /// is, `null` becomes the null literal and containers recurse. Object
    /// key order is preserved.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.to_string()),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(ArrayLiteral {
                elements: items.iter().map(|v| Annotated::new(Self::from_json(v))).collect(),
                dangling: Vec::new(),
            }),
            Value::Object(map) => {
                let mut object = ObjectLiteral::default();
                for (key, v) in map {
                    object.set(key.clone(), Self::from_json(v));
                }
                Self::Object(object)
            }
        }
    }

    /// Convert to a JSON value.
    ///
    /// Identifiers become their name as a string and `undefined` becomes
    /// `null`. Comments are dropped.
    ///
    /// # Errors
    /// Returns [`SourceError::ShapeMismatch`] for verbatim expressions and
    /// numbers JSON cannot represent.
    pub fn to_json(&self) -> SourceResult<Value> {
        Ok(match self {
            Self::Null | Self::Undefined => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(text) => Value::Number(
                text.parse::<Number>()
                    .map_err(|_| SourceError::shape("", "a JSON number", text.clone()))?,
            ),
            Self::String(s) | Self::Identifier(s) => Value::String(s.clone()),
            Self::Array(array) => Value::Array(
                array
                    .elements
                    .iter()
                    .enumerate()
                    .map(|(i, el)| el.value.to_json().map_err(|e| e.within(&i.to_string())))
                    .collect::<SourceResult<_>>()?,
            ),
            Self::Object(object) => {
                let mut map = Map::new();
                for member in &object.members {
                    match &member.value {
                        Member::Property(p) => {
                            let value = p.value.to_json().map_err(|e| e.within(&p.key))?;
                            map.insert(p.key.clone(), value);
                        }
                        Member::Raw(text) => {
                            return Err(SourceError::shape("", "a plain property", text.clone()));
                        }
                    }
                }
                Value::Object(map)
            }
            Self::Raw(text) => return Err(SourceError::shape("", "a literal", text.clone())),
        })
    }
}

impl ArrayLiteral {
    /// Empty array
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element
    pub fn push(&mut self, value: Literal) {
        self.elements.push(Annotated::new(value));
    }

    /// Number of elements
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether there are no elements
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate element values
    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.elements.iter().map(|e| &e.value)
    }
}

impl ObjectLiteral {
    /// Empty object
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate keyed properties
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.members.iter().filter_map(|m| match &m.value {
            Member::Property(p) => Some(p),
            Member::Raw(_) => None,
        })
    }

    /// Value of `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Literal> {
        self.properties().find(|p| p.key == key).map(|p| &p.value)
    }

    /// Mutable value of `key`
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Literal> {
        self.members.iter_mut().find_map(|m| match &mut m.value {
            Member::Property(p) if p.key == key => Some(&mut p.value),
            _ => None,
        })
    }

    /// String value of `key`
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Literal::as_str)
    }

    /// Set `key`, replacing in place when present so comments and order stay
    pub fn set(&mut self, key: impl Into<String>, value: Literal) {
        let key = key.into();
        if let Some(slot) = self.get_mut(&key) {
            *slot = value;
        } else {
            self.members
                .push(Annotated::new(Member::Property(Property { key, value })));
        }
    }

    /// Remove `key`, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Literal> {
        let index = self
            .members
            .iter()
            .position(|m| matches!(&m.value, Member::Property(p) if p.key == key))?;
        match self.members.remove(index).value {
            Member::Property(p) => Some(p.value),
            Member::Raw(_) => None,
        }
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties().map(|p| p.key.as_str())
    }

    /// Number of members
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether there are no members
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn json_conversion_keeps_key_order() {
        let value = json!({"title": "Backend", "id": "backend", "items": [], "n": 3, "ok": true, "x": null});
        let literal = Literal::from_json(&value);
        let keys: Vec<_> = literal.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["title", "id", "items", "n", "ok", "x"]);
        assert_eq!(literal.to_json().unwrap(), value);
    }

    #[test]
    fn identifiers_read_as_names() {
        let mut object = ObjectLiteral::new();
        object.set("go", Literal::ident("goTopic"));
        assert_eq!(Literal::Object(object).to_json().unwrap(), json!({"go": "goTopic"}));
    }

    #[test]
    fn raw_expression_is_not_json() {
        let mut object = ObjectLiteral::new();
        object.set("when", Literal::Raw("Date.now()".into()));
        let err = Literal::Object(object).to_json().unwrap_err();
        assert_eq!(
            err,
            SourceError::ShapeMismatch {
                name: "when".into(),
                expected: "a literal".into(),
                found: "Date.now()".into(),
            }
        );
    }

    #[test]
    fn set_replaces_in_place() {
        let mut object = ObjectLiteral::new();
        object.set("a", Literal::string("1"));
        object.set("b", Literal::string("2"));
        object.set("a", Literal::string("3"));
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(object.get_str("a"), Some("3"));
        assert_eq!(object.remove("a"), Some(Literal::string("3")));
        assert_eq!(object.len(), 1);
    }
}
