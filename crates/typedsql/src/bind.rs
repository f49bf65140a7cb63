//! Bind variables.
//!
//! A [`BindVariable`] is a named, typed, optionally valued placeholder. The same
//! logical variable may be referenced from several places in one query (an outer
//! select and a correlated subselect, say); [`BindVariable::combine`] decides
//! whether two such references agree and what the merged variable looks like.

use crate::error::{SqlGenError, SqlGenResult};
use crate::value::{TypeTag, Value};
use serde::Serialize;
use std::fmt;

/// Canonical, upper-cased bind variable name matching `[A-Z][A-Z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BindName(String);

impl BindName {
    /// Normalize and validate a bind name.
    ///
    /// Surrounding whitespace is trimmed and the name is upper-cased, so
    /// `"name1"`, `"NAME1"` and `" Name1 "` are the same name.
    pub fn of(name: &str) -> SqlGenResult<Self> {
        let normalized = name.trim().to_ascii_uppercase();
        let mut chars = normalized.chars();
        let Some(first) = chars.next() else {
            return Err(SqlGenError::name("bind name cannot be empty"));
        };
        if !first.is_ascii_uppercase() {
            return Err(SqlGenError::name(format!(
                "bind name '{name}' must start with a letter"
            )));
        }
        if let Some(c) = chars.find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '_')) {
            return Err(SqlGenError::name(format!(
                "invalid character '{c}' in bind name '{name}'"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BindName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for BindName {
    type Error = SqlGenError;

    fn try_from(value: &str) -> SqlGenResult<Self> {
        BindName::of(value)
    }
}

/// A named, typed bind variable with an optional value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindVariable {
    name: BindName,
    type_tag: TypeTag,
    value: Option<Value>,
}

impl BindVariable {
    /// Create a bind variable without a value.
    pub fn new(name: BindName, type_tag: TypeTag) -> Self {
        Self {
            name,
            type_tag,
            value: None,
        }
    }

    /// Create a bind variable carrying a value; the value must be an instance of `type_tag`.
    pub fn with_value(name: BindName, type_tag: TypeTag, value: Value) -> SqlGenResult<Self> {
        if !type_tag.is_instance(&value) {
            return Err(SqlGenError::TypeConflict {
                name: name.to_string(),
                existing: type_tag,
                incoming: value.type_tag(),
            });
        }
        Ok(Self {
            name,
            type_tag,
            value: Some(value),
        })
    }

    /// Create a bind variable typed after its value.
    pub fn of_value(name: BindName, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name,
            type_tag: value.type_tag(),
            value: Some(value),
        }
    }

    pub fn name(&self) -> &BindName {
        &self.name
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Merge two references to the same variable.
    ///
    /// The narrower type wins when one type is assignable to the other;
    /// a present value wins over an absent one; two different values conflict.
    pub fn combine(&self, other: &BindVariable) -> SqlGenResult<BindVariable> {
        if self.name != other.name {
            return Err(SqlGenError::name(format!(
                "cannot combine bind variables {} and {}",
                self.name, other.name
            )));
        }

        let type_tag = if other.type_tag.is_assignable_from(&self.type_tag) {
            self.type_tag
        } else if self.type_tag.is_assignable_from(&other.type_tag) {
            match &self.value {
                Some(v) if !other.type_tag.is_instance(v) => {
                    return Err(self.type_conflict(other));
                }
                _ => other.type_tag,
            }
        } else {
            return Err(self.type_conflict(other));
        };

        let value = match (&self.value, &other.value) {
            (None, None) => None,
            (Some(v), None) | (None, Some(v)) => Some(v.clone()),
            (Some(a), Some(b)) if a == b => Some(a.clone()),
            (Some(a), Some(b)) => {
                return Err(SqlGenError::ValueConflict {
                    name: self.name.to_string(),
                    existing: a.to_string(),
                    incoming: b.to_string(),
                });
            }
        };

        if let Some(v) = &value {
            if !type_tag.is_instance(v) {
                return Err(self.type_conflict(other));
            }
        }

        Ok(BindVariable {
            name: self.name.clone(),
            type_tag,
            value,
        })
    }

    fn type_conflict(&self, other: &BindVariable) -> SqlGenError {
        SqlGenError::TypeConflict {
            name: self.name.to_string(),
            existing: self.type_tag,
            incoming: other.type_tag,
        }
    }
}

/// Every placeholder position of one bind variable in a rendered statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindWithPosition {
    pub name: BindName,
    pub type_tag: TypeTag,
    /// 1-based placeholder indices in left-to-right text order.
    pub positions: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> BindName {
        BindName::of(s).unwrap()
    }

    #[test]
    fn bind_name_normalizes_case_and_whitespace() {
        assert_eq!(name("name1"), name("NAME1"));
        assert_eq!(name(" Name1 "), name("NAME1"));
        assert_eq!(name("a_b").as_str(), "A_B");
    }

    #[test]
    fn bind_name_rejects_malformed() {
        assert!(BindName::of("").is_err());
        assert!(BindName::of("1abc").is_err());
        assert!(BindName::of("_abc").is_err());
        assert!(BindName::of("ab-c").is_err());
        assert!(BindName::of("a b").is_err());
    }

    #[test]
    fn with_value_checks_instance() {
        assert!(BindVariable::with_value(name("x"), TypeTag::Number, Value::Int(1)).is_ok());
        let err = BindVariable::with_value(name("x"), TypeTag::Int, Value::from("a")).unwrap_err();
        assert!(matches!(err, SqlGenError::TypeConflict { .. }));
    }

    #[test]
    fn combine_adopts_present_value() {
        let a = BindVariable::new(name("x"), TypeTag::Int);
        let b = BindVariable::of_value(name("x"), 5i64);
        let merged = a.combine(&b).unwrap();
        assert_eq!(merged.value(), Some(&Value::Int(5)));
        assert_eq!(b.combine(&a).unwrap().value(), Some(&Value::Int(5)));
    }

    #[test]
    fn combine_keeps_specific_type() {
        let general = BindVariable::new(name("x"), TypeTag::Number);
        let specific = BindVariable::new(name("x"), TypeTag::Decimal);
        assert_eq!(specific.combine(&general).unwrap().type_tag(), TypeTag::Decimal);
        assert_eq!(general.combine(&specific).unwrap().type_tag(), TypeTag::Decimal);
    }

    #[test]
    fn combine_narrowing_type_requires_value_fit() {
        let general = BindVariable::with_value(name("x"), TypeTag::Number, Value::Int(1)).unwrap();
        let narrower = BindVariable::new(name("x"), TypeTag::Decimal);
        let err = narrower.combine(&general).unwrap_err();
        assert!(matches!(err, SqlGenError::TypeConflict { .. }));
        let err = general.combine(&narrower).unwrap_err();
        assert!(matches!(err, SqlGenError::TypeConflict { .. }));
    }

    #[test]
    fn combine_rejects_unrelated_types() {
        let a = BindVariable::new(name("x"), TypeTag::Text);
        let b = BindVariable::new(name("x"), TypeTag::Int);
        assert!(matches!(
            a.combine(&b).unwrap_err(),
            SqlGenError::TypeConflict { .. }
        ));
    }

    #[test]
    fn combine_rejects_different_values() {
        let a = BindVariable::of_value(name("x"), 1i64);
        let b = BindVariable::of_value(name("x"), 2i64);
        assert!(matches!(
            a.combine(&b).unwrap_err(),
            SqlGenError::ValueConflict { .. }
        ));
        assert_eq!(a.combine(&a.clone()).unwrap(), a);
    }

    #[test]
    fn combine_rejects_different_names() {
        let a = BindVariable::new(name("x"), TypeTag::Int);
        let b = BindVariable::new(name("y"), TypeTag::Int);
        assert!(matches!(a.combine(&b).unwrap_err(), SqlGenError::Name(_)));
    }
}
