//! SQL identifier handling.
//!
//! [`SimpleName`] is a single identifier segment, [`NamePath`] a dot-delimited
//! path of segments (`schema.table`, `alias.column`).
//!
//! - Unquoted segments are validated against `[A-Za-z_][A-Za-z0-9_$#]*` and folded
//!   to lower case.
//! - Quoted segments keep their case, allow any character except NUL, and escape
//!   `"` as `""`.
//!
//! # Example
//! ```ignore
//! use typedsql::NamePath;
//!
//! let t = NamePath::parse("Sales.Orders")?;
//! assert_eq!(t.to_sql(), "sales.orders");
//! assert!(t.matches(&NamePath::parse("orders")?));
//! # Ok::<(), typedsql::SqlGenError>(())
//! ```

use crate::error::{SqlGenError, SqlGenResult};
use serde::Serialize;
use std::fmt;

/// A single identifier segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum SimpleName {
    /// Unquoted identifier, stored lower-cased.
    Unquoted(String),
    /// Quoted identifier, stored verbatim (without the surrounding quotes).
    Quoted(String),
}

impl SimpleName {
    /// Parse a single segment; dots are not allowed outside quotes.
    pub fn parse(s: &str) -> SqlGenResult<Self> {
        let path = NamePath::parse(s)?;
        match <[SimpleName; 1]>::try_from(path.segments) {
            Ok([name]) => Ok(name),
            Err(_) => Err(SqlGenError::name(format!(
                "'{s}' is a qualified name, expected a single identifier"
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SimpleName::Unquoted(s) | SimpleName::Quoted(s) => s,
        }
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        match self {
            SimpleName::Unquoted(s) => out.push_str(s),
            SimpleName::Quoted(s) => {
                out.push('"');
                for ch in s.chars() {
                    if ch == '"' {
                        out.push_str("\"\"");
                    } else {
                        out.push(ch);
                    }
                }
                out.push('"');
            }
        }
    }

    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.as_str().len() + 2);
        self.write_sql(&mut out);
        out
    }
}

impl fmt::Display for SimpleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// A dot-delimited identifier path, e.g. `schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NamePath {
    segments: Vec<SimpleName>,
}

impl NamePath {
    /// Parse an identifier path, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table.column`
    /// - Quoted: `"CamelCase"."UserTable"`
    /// - Mixed: `public."UserTable".id`
    pub fn parse(s: &str) -> SqlGenResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SqlGenError::name("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(SqlGenError::name("identifier cannot contain NUL character"));
        }

        let mut segments = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !segments.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(SqlGenError::name(format!("trailing '.' in '{s}'")));
                        }
                    }
                    Some(c) => {
                        return Err(SqlGenError::name(format!(
                            "expected '.' between identifier parts of '{s}', got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                name.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => {
                            return Err(SqlGenError::name(format!(
                                "unclosed quoted identifier in '{s}'"
                            )));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(SqlGenError::name("empty quoted identifier"));
                }
                segments.push(SimpleName::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let ok = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c == '#' || c.is_ascii_alphanumeric()
                };
                if !ok {
                    return Err(SqlGenError::name(format!(
                        "invalid character '{c}' in identifier '{s}'"
                    )));
                }
                name.push(c.to_ascii_lowercase());
                chars.next();
            }
            if name.is_empty() {
                return Err(SqlGenError::name(format!("empty identifier segment in '{s}'")));
            }
            segments.push(SimpleName::Unquoted(name));
        }

        Ok(Self { segments })
    }

    pub fn from_simple(name: SimpleName) -> Self {
        Self {
            segments: vec![name],
        }
    }

    /// Build a path from already-parsed segments; `segments` must not be empty.
    pub(crate) fn from_segments(segments: Vec<SimpleName>) -> Self {
        debug_assert!(!segments.is_empty());
        Self { segments }
    }

    pub fn segments(&self) -> &[SimpleName] {
        &self.segments
    }

    /// The right-most segment.
    pub fn last(&self) -> &SimpleName {
        // Non-empty by construction.
        &self.segments[self.segments.len() - 1]
    }

    /// True when `other`'s segments are a right-aligned suffix of this path.
    ///
    /// `sales.orders` matches `orders` and `sales.orders`, but not `orders.id`
    /// or `hr.orders`.
    pub fn matches(&self, other: &NamePath) -> bool {
        other.segments.len() <= self.segments.len()
            && self
                .segments
                .iter()
                .rev()
                .zip(other.segments.iter().rev())
                .all(|(a, b)| a == b)
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            segment.write_sql(out);
        }
    }

    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }
}

impl fmt::Display for NamePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl From<SimpleName> for NamePath {
    fn from(name: SimpleName) -> Self {
        NamePath::from_simple(name)
    }
}

/// Convert an input into a [`NamePath`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoNamePath {
    fn into_name_path(self) -> SqlGenResult<NamePath>;
}

impl IntoNamePath for NamePath {
    fn into_name_path(self) -> SqlGenResult<NamePath> {
        Ok(self)
    }
}

impl IntoNamePath for &NamePath {
    fn into_name_path(self) -> SqlGenResult<NamePath> {
        Ok(self.clone())
    }
}

impl IntoNamePath for &str {
    fn into_name_path(self) -> SqlGenResult<NamePath> {
        NamePath::parse(self)
    }
}

impl IntoNamePath for String {
    fn into_name_path(self) -> SqlGenResult<NamePath> {
        NamePath::parse(&self)
    }
}
