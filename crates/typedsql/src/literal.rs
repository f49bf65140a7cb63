//! Literal and parameter encoding per type.
//!
//! A [`LiteralHandler`] knows three things about one logical type: its SQL type
//! name, how to spell a value as inline SQL text, and how to bind a value as a
//! statement parameter. [`LiteralRegistry`] maps [`TypeTag`]s to handlers and
//! resolves a type by walking [`TypeTag::lookup_chain`], so a handler registered
//! for `Number` also serves `Int` unless `Int` has its own.
//!
//! # Example
//! ```ignore
//! use typedsql::{LiteralRegistry, Value};
//!
//! let registry = LiteralRegistry::with_defaults();
//! assert_eq!(registry.literal_text(&Value::from("it's"))?, "'it''s'");
//! # Ok::<(), typedsql::SqlGenError>(())
//! ```

use crate::error::{SqlGenError, SqlGenResult};
use crate::params::{Param, ParamSink};
use crate::value::{TypeTag, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

const NEWLINE_JOIN: &str = "'||CHR(10)||'";

/// Encoder for one logical type.
pub trait LiteralHandler: Send + Sync {
    /// SQL type name, e.g. `VARCHAR` or `NUMERIC`.
    fn sql_type(&self) -> &str;

    /// Inline SQL text for `value`.
    fn to_literal(&self, value: &Value) -> SqlGenResult<String>;

    /// Bind `value` (or a typed NULL) at a 1-based placeholder position.
    fn bind(
        &self,
        sink: &mut dyn ParamSink,
        position: usize,
        value: Option<&Value>,
    ) -> SqlGenResult<()>;
}

fn unsupported(value: &Value) -> SqlGenError {
    SqlGenError::NoHandlerForType(value.type_tag())
}

/// Quote a string as a SQL text literal.
///
/// Single quotes are doubled and newlines are spliced in with `CHR(10)`, so the
/// literal always stays on one line:
/// `a'b\nc` becomes `'a''b'||CHR(10)||'c'`.
pub fn escape_text_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\n' => out.push_str(NEWLINE_JOIN),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Inverse of [`escape_text_literal`]; `None` when `literal` is not in that form.
pub fn unescape_text_literal(literal: &str) -> Option<String> {
    let mut out = String::with_capacity(literal.len());
    let mut rest = literal.strip_prefix('\'')?;
    loop {
        let mut chars = rest.char_indices();
        let mut closed_at = None;
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                if rest[i + 1..].starts_with('\'') {
                    out.push('\'');
                    chars.next();
                } else {
                    closed_at = Some(i);
                    break;
                }
            } else {
                out.push(c);
            }
        }
        let after = &rest[closed_at? + 1..];
        if after.is_empty() {
            return Some(out);
        }
        rest = after.strip_prefix("||CHR(10)||'")?;
        out.push('\n');
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolHandler;

impl LiteralHandler for BoolHandler {
    fn sql_type(&self) -> &str {
        "BOOLEAN"
    }

    fn to_literal(&self, value: &Value) -> SqlGenResult<String> {
        match value {
            Value::Bool(true) => Ok("TRUE".to_string()),
            Value::Bool(false) => Ok("FALSE".to_string()),
            other => Err(unsupported(other)),
        }
    }

    fn bind(&self, sink: &mut dyn ParamSink, position: usize, value: Option<&Value>) -> SqlGenResult<()> {
        match value {
            Some(Value::Bool(v)) => sink.set(position, Param::new(*v)),
            None => sink.set(position, Param::new(None::<bool>)),
            Some(other) => return Err(unsupported(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntHandler;

impl LiteralHandler for IntHandler {
    fn sql_type(&self) -> &str {
        "BIGINT"
    }

    fn to_literal(&self, value: &Value) -> SqlGenResult<String> {
        match value {
            Value::Int(v) => Ok(v.to_string()),
            other => Err(unsupported(other)),
        }
    }

    fn bind(&self, sink: &mut dyn ParamSink, position: usize, value: Option<&Value>) -> SqlGenResult<()> {
        match value {
            Some(Value::Int(v)) => sink.set(position, Param::new(*v)),
            None => sink.set(position, Param::new(None::<i64>)),
            Some(other) => return Err(unsupported(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FloatHandler;

impl LiteralHandler for FloatHandler {
    fn sql_type(&self) -> &str {
        "DOUBLE PRECISION"
    }

    fn to_literal(&self, value: &Value) -> SqlGenResult<String> {
        match value {
            Value::Float(v) if v.is_finite() => Ok(v.to_string()),
            Value::Float(v) => Err(SqlGenError::mismatch(
                "literal",
                format!("non-finite float {v} has no SQL literal"),
            )),
            other => Err(unsupported(other)),
        }
    }

    fn bind(&self, sink: &mut dyn ParamSink, position: usize, value: Option<&Value>) -> SqlGenResult<()> {
        match value {
            Some(Value::Float(v)) => sink.set(position, Param::new(*v)),
            None => sink.set(position, Param::new(None::<f64>)),
            Some(other) => return Err(unsupported(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalHandler;

impl LiteralHandler for DecimalHandler {
    fn sql_type(&self) -> &str {
        "NUMERIC"
    }

    fn to_literal(&self, value: &Value) -> SqlGenResult<String> {
        match value {
            Value::Decimal(v) => Ok(v.to_string()),
            other => Err(unsupported(other)),
        }
    }

    fn bind(&self, sink: &mut dyn ParamSink, position: usize, value: Option<&Value>) -> SqlGenResult<()> {
        match value {
            Some(Value::Decimal(v)) => sink.set(position, Param::new(*v)),
            None => sink.set(position, Param::new(None::<Decimal>)),
            Some(other) => return Err(unsupported(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextHandler;

impl LiteralHandler for TextHandler {
    fn sql_type(&self) -> &str {
        "VARCHAR"
    }

    fn to_literal(&self, value: &Value) -> SqlGenResult<String> {
        match value {
            Value::Text(v) => Ok(escape_text_literal(v)),
            other => Err(unsupported(other)),
        }
    }

    fn bind(&self, sink: &mut dyn ParamSink, position: usize, value: Option<&Value>) -> SqlGenResult<()> {
        match value {
            Some(Value::Text(v)) => sink.set(position, Param::new(v.clone())),
            None => sink.set(position, Param::new(None::<String>)),
            Some(other) => return Err(unsupported(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateHandler;

impl LiteralHandler for DateHandler {
    fn sql_type(&self) -> &str {
        "DATE"
    }

    fn to_literal(&self, value: &Value) -> SqlGenResult<String> {
        match value {
            Value::Date(v) => Ok(format!("DATE '{}'", v.format("%Y-%m-%d"))),
            other => Err(unsupported(other)),
        }
    }

    fn bind(&self, sink: &mut dyn ParamSink, position: usize, value: Option<&Value>) -> SqlGenResult<()> {
        match value {
            Some(Value::Date(v)) => sink.set(position, Param::new(*v)),
            None => sink.set(position, Param::new(None::<NaiveDate>)),
            Some(other) => return Err(unsupported(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeHandler;

impl LiteralHandler for TimeHandler {
    fn sql_type(&self) -> &str {
        "TIME"
    }

    fn to_literal(&self, value: &Value) -> SqlGenResult<String> {
        match value {
            Value::Time(v) => Ok(format!("TIME '{}'", v.format("%H:%M:%S%.f"))),
            other => Err(unsupported(other)),
        }
    }

    fn bind(&self, sink: &mut dyn ParamSink, position: usize, value: Option<&Value>) -> SqlGenResult<()> {
        match value {
            Some(Value::Time(v)) => sink.set(position, Param::new(*v)),
            None => sink.set(position, Param::new(None::<NaiveTime>)),
            Some(other) => return Err(unsupported(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampHandler;

impl LiteralHandler for TimestampHandler {
    fn sql_type(&self) -> &str {
        "TIMESTAMP"
    }

    fn to_literal(&self, value: &Value) -> SqlGenResult<String> {
        match value {
            Value::Timestamp(v) => Ok(format!("TIMESTAMP '{}'", v.format("%Y-%m-%d %H:%M:%S%.f"))),
            other => Err(unsupported(other)),
        }
    }

    fn bind(&self, sink: &mut dyn ParamSink, position: usize, value: Option<&Value>) -> SqlGenResult<()> {
        match value {
            Some(Value::Timestamp(v)) => sink.set(position, Param::new(*v)),
            None => sink.set(position, Param::new(None::<NaiveDateTime>)),
            Some(other) => return Err(unsupported(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidHandler;

impl LiteralHandler for UuidHandler {
    fn sql_type(&self) -> &str {
        "UUID"
    }

    fn to_literal(&self, value: &Value) -> SqlGenResult<String> {
        match value {
            Value::Uuid(v) => Ok(format!("'{v}'")),
            other => Err(unsupported(other)),
        }
    }

    fn bind(&self, sink: &mut dyn ParamSink, position: usize, value: Option<&Value>) -> SqlGenResult<()> {
        match value {
            Some(Value::Uuid(v)) => sink.set(position, Param::new(*v)),
            None => sink.set(position, Param::new(None::<Uuid>)),
            Some(other) => return Err(unsupported(other)),
        }
        Ok(())
    }
}

/// Handler for a domain type that is encoded exactly like its base value.
///
/// Unwraps [`Value::Domain`] and delegates to the base type's handler.
pub struct DomainHandler {
    sql_type: String,
    base: Arc<dyn LiteralHandler>,
}

impl DomainHandler {
    pub fn new(sql_type: impl Into<String>, base: impl LiteralHandler + 'static) -> Self {
        Self {
            sql_type: sql_type.into(),
            base: Arc::new(base),
        }
    }
}

impl LiteralHandler for DomainHandler {
    fn sql_type(&self) -> &str {
        &self.sql_type
    }

    fn to_literal(&self, value: &Value) -> SqlGenResult<String> {
        match value {
            Value::Domain(_, inner) => self.base.to_literal(inner),
            other => self.base.to_literal(other),
        }
    }

    fn bind(&self, sink: &mut dyn ParamSink, position: usize, value: Option<&Value>) -> SqlGenResult<()> {
        match value {
            Some(Value::Domain(_, inner)) => self.base.bind(sink, position, Some(inner)),
            other => self.base.bind(sink, position, other),
        }
    }
}

/// Thread-safe map from [`TypeTag`] to [`LiteralHandler`].
///
/// Registration is meant to happen once at startup; lookups may come from many
/// concurrent renders.
pub struct LiteralRegistry {
    handlers: RwLock<HashMap<TypeTag, Arc<dyn LiteralHandler>>>,
}

impl LiteralRegistry {
    /// Create a registry without any handlers.
    pub fn empty() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with handlers for every built-in value type.
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.register(TypeTag::Bool, BoolHandler);
        registry.register(TypeTag::Int, IntHandler);
        registry.register(TypeTag::Float, FloatHandler);
        registry.register(TypeTag::Decimal, DecimalHandler);
        registry.register(TypeTag::Text, TextHandler);
        registry.register(TypeTag::Date, DateHandler);
        registry.register(TypeTag::Time, TimeHandler);
        registry.register(TypeTag::Timestamp, TimestampHandler);
        registry.register(TypeTag::Uuid, UuidHandler);
        registry
    }

    /// Register a handler for `tag`.
    ///
    /// A second registration for the same tag replaces the first (last one
    /// wins) and logs a warning. Returns the replaced handler, if any.
    pub fn register(
        &self,
        tag: TypeTag,
        handler: impl LiteralHandler + 'static,
    ) -> Option<Arc<dyn LiteralHandler>> {
        self.register_arc(tag, Arc::new(handler))
    }

    pub fn register_arc(
        &self,
        tag: TypeTag,
        handler: Arc<dyn LiteralHandler>,
    ) -> Option<Arc<dyn LiteralHandler>> {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let previous = handlers.insert(tag, handler);
        if let Some(old) = &previous {
            tracing::warn!(
                type_tag = %tag,
                replaced_sql_type = old.sql_type(),
                "replacing literal handler"
            );
        }
        previous
    }

    /// Resolve the handler for `tag`: exact match first, then each supertype.
    pub fn handler_for(&self, tag: TypeTag) -> SqlGenResult<Arc<dyn LiteralHandler>> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        tag.lookup_chain()
            .into_iter()
            .find_map(|t| handlers.get(&t).cloned())
            .ok_or(SqlGenError::NoHandlerForType(tag))
    }

    /// SQL type name for `tag`.
    pub fn sql_type(&self, tag: TypeTag) -> SqlGenResult<String> {
        Ok(self.handler_for(tag)?.sql_type().to_string())
    }

    /// Inline SQL text for `value`.
    pub fn literal_text(&self, value: &Value) -> SqlGenResult<String> {
        self.handler_for(value.type_tag())?.to_literal(value)
    }

    /// Bind `value` of type `tag` at `position`.
    pub fn bind(
        &self,
        sink: &mut dyn ParamSink,
        position: usize,
        tag: TypeTag,
        value: Option<&Value>,
    ) -> SqlGenResult<()> {
        self.handler_for(tag)?.bind(sink, position, value)
    }
}

impl Default for LiteralRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for LiteralRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut tags: Vec<String> = handlers.keys().map(ToString::to_string).collect();
        tags.sort();
        f.debug_struct("LiteralRegistry").field("types", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PgParams;
    use crate::value::DomainTag;

    #[test]
    fn text_literal_escaping() {
        assert_eq!(escape_text_literal(""), "''");
        assert_eq!(escape_text_literal("it's"), "'it''s'");
        assert_eq!(escape_text_literal("a\nb"), "'a'||CHR(10)||'b'");
        assert_eq!(escape_text_literal("\n"), "''||CHR(10)||''");
    }

    #[test]
    fn unescape_inverts_escape() {
        for s in ["", "x", "'", "''", "a\nb", "\n\n'\n", "||CHR(10)||"] {
            assert_eq!(unescape_text_literal(&escape_text_literal(s)).as_deref(), Some(s));
        }
        assert_eq!(unescape_text_literal("abc"), None);
        assert_eq!(unescape_text_literal("'abc"), None);
        assert_eq!(unescape_text_literal("'a'b"), None);
    }

    #[test]
    fn default_literals() {
        let registry = LiteralRegistry::with_defaults();
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let ts = date.and_hms_opt(13, 5, 9).unwrap();
        assert_eq!(registry.literal_text(&Value::Int(-3)).unwrap(), "-3");
        assert_eq!(registry.literal_text(&Value::Bool(true)).unwrap(), "TRUE");
        assert_eq!(registry.literal_text(&Value::Date(date)).unwrap(), "DATE '2024-02-29'");
        assert_eq!(
            registry.literal_text(&Value::Timestamp(ts)).unwrap(),
            "TIMESTAMP '2024-02-29 13:05:09'"
        );
        assert_eq!(
            registry.literal_text(&Value::Decimal(Decimal::new(1250, 2))).unwrap(),
            "12.50"
        );
    }

    #[test]
    fn lookup_falls_back_to_supertype() {
        let registry = LiteralRegistry::empty();
        registry.register(TypeTag::Number, DecimalHandler);
        assert_eq!(registry.sql_type(TypeTag::Decimal).unwrap(), "NUMERIC");
        assert_eq!(registry.sql_type(TypeTag::Number).unwrap(), "NUMERIC");
        assert_eq!(
            registry.sql_type(TypeTag::Text).unwrap_err(),
            SqlGenError::NoHandlerForType(TypeTag::Text)
        );
    }

    #[test]
    fn unregistered_domain_has_no_handler() {
        let registry = LiteralRegistry::with_defaults();
        let tag = DomainTag::new("customer_id");
        let value = Value::domain(tag, 42i64);
        assert_eq!(
            registry.literal_text(&value).unwrap_err(),
            SqlGenError::NoHandlerForType(TypeTag::Domain(tag))
        );

        registry.register(TypeTag::Domain(tag), DomainHandler::new("CUSTOMER_ID", IntHandler));
        assert_eq!(registry.literal_text(&value).unwrap(), "42");
    }

    #[test]
    fn last_registration_wins() {
        let registry = LiteralRegistry::with_defaults();
        let replaced = registry.register(TypeTag::Text, DomainHandler::new("CLOB", TextHandler));
        assert_eq!(replaced.map(|h| h.sql_type().to_string()).as_deref(), Some("VARCHAR"));
        assert_eq!(registry.sql_type(TypeTag::Text).unwrap(), "CLOB");
    }

    #[test]
    fn bind_sets_position() {
        let registry = LiteralRegistry::with_defaults();
        let mut params = PgParams::with_len(2);
        registry
            .bind(&mut params, 2, TypeTag::Text, Some(&Value::from("x")))
            .unwrap();
        registry.bind(&mut params, 1, TypeTag::Int, None).unwrap();
        assert_eq!(params.as_refs().unwrap().len(), 2);
        assert!(registry
            .bind(&mut params, 1, TypeTag::Int, Some(&Value::from("x")))
            .is_err());
    }
}
