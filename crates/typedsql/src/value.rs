//! Logical types and runtime values.
//!
//! [`TypeTag`] is a closed set of logical types arranged in a small hierarchy
//! (`Int` is a `Number`, `Date` is a `Temporal`, everything is `Any`). The
//! hierarchy drives both bind-variable merging and literal handler lookup.
//!
//! Domain types (identifiers, codes, ...) that live outside this crate are
//! represented by [`TypeTag::Domain`] and [`Value::Domain`], which wrap a base
//! value under a caller-chosen name.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Name of an externally defined domain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DomainTag(pub &'static str);

impl DomainTag {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

/// Logical type of a value, bind variable or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeTag {
    Any,
    Bool,
    Number,
    Int,
    Float,
    Decimal,
    Text,
    Temporal,
    Date,
    Time,
    Timestamp,
    Uuid,
    Domain(DomainTag),
}

impl TypeTag {
    /// The direct supertype, `None` for [`TypeTag::Any`].
    pub fn parent(&self) -> Option<TypeTag> {
        match self {
            TypeTag::Any => None,
            TypeTag::Int | TypeTag::Float | TypeTag::Decimal => Some(TypeTag::Number),
            TypeTag::Date | TypeTag::Time | TypeTag::Timestamp => Some(TypeTag::Temporal),
            TypeTag::Bool
            | TypeTag::Number
            | TypeTag::Text
            | TypeTag::Temporal
            | TypeTag::Uuid
            | TypeTag::Domain(_) => Some(TypeTag::Any),
        }
    }

    /// This tag followed by every supertype up to [`TypeTag::Any`].
    ///
    /// This is the exact order in which literal handlers are looked up.
    pub fn lookup_chain(&self) -> Vec<TypeTag> {
        let mut chain = vec![*self];
        let mut current = *self;
        while let Some(parent) = current.parent() {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// True when a value of type `other` can be used where `self` is expected.
    pub fn is_assignable_from(&self, other: &TypeTag) -> bool {
        other.lookup_chain().contains(self)
    }

    /// True when `value` is an instance of this type.
    pub fn is_instance(&self, value: &Value) -> bool {
        self.is_assignable_from(&value.type_tag())
    }

    /// Whether `<`, `<=`, `>`, `>=` are meaningful for this type.
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            TypeTag::Number
                | TypeTag::Int
                | TypeTag::Float
                | TypeTag::Decimal
                | TypeTag::Text
                | TypeTag::Temporal
                | TypeTag::Date
                | TypeTag::Time
                | TypeTag::Timestamp
        )
    }

    pub fn is_numeric(&self) -> bool {
        TypeTag::Number.is_assignable_from(self)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Any => f.write_str("Any"),
            TypeTag::Bool => f.write_str("Bool"),
            TypeTag::Number => f.write_str("Number"),
            TypeTag::Int => f.write_str("Int"),
            TypeTag::Float => f.write_str("Float"),
            TypeTag::Decimal => f.write_str("Decimal"),
            TypeTag::Text => f.write_str("Text"),
            TypeTag::Temporal => f.write_str("Temporal"),
            TypeTag::Date => f.write_str("Date"),
            TypeTag::Time => f.write_str("Time"),
            TypeTag::Timestamp => f.write_str("Timestamp"),
            TypeTag::Uuid => f.write_str("Uuid"),
            TypeTag::Domain(tag) => write!(f, "Domain({})", tag.0),
        }
    }
}

/// A runtime value that can appear as a literal or as a bind value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
    /// A domain value wrapping its base representation.
    Domain(DomainTag, Box<Value>),
}

impl Value {
    /// The most specific type of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Decimal(_) => TypeTag::Decimal,
            Value::Text(_) => TypeTag::Text,
            Value::Date(_) => TypeTag::Date,
            Value::Time(_) => TypeTag::Time,
            Value::Timestamp(_) => TypeTag::Timestamp,
            Value::Uuid(_) => TypeTag::Uuid,
            Value::Domain(tag, _) => TypeTag::Domain(*tag),
        }
    }

    pub fn domain(tag: DomainTag, base: impl Into<Value>) -> Self {
        Value::Domain(tag, Box::new(base.into()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Time(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Domain(tag, inner) => write!(f, "{}({inner})", tag.0),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}
