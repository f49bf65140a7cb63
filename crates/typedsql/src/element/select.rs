use super::condition::Condition;
use super::expr::Expr;
use super::from::FromElement;
use super::raw::RawSql;
use crate::bind::BindVariable;
use crate::error::{SqlGenError, SqlGenResult};
use crate::name::SimpleName;
use crate::value::TypeTag;
use std::collections::HashSet;
use std::sync::Arc;

/// One item of a `SELECT` list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    expr: Expr,
    alias: Option<SimpleName>,
}

impl SelectColumn {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: &str) -> SqlGenResult<Self> {
        Ok(Self {
            expr,
            alias: Some(SimpleName::parse(alias)?),
        })
    }

    /// Raw SQL column of unknown type.
    pub fn raw(sql: &str, alias: Option<&str>, binds: Vec<BindVariable>) -> SqlGenResult<Self> {
        Ok(Self {
            expr: Expr::Raw {
                sql: Arc::new(RawSql::parse(sql, binds)?),
                type_tag: TypeTag::Any,
            },
            alias: alias.map(SimpleName::parse).transpose()?,
        })
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn alias(&self) -> Option<&SimpleName> {
        self.alias.as_ref()
    }

    pub fn type_tag(&self) -> TypeTag {
        self.expr.type_tag()
    }
}

impl From<Expr> for SelectColumn {
    fn from(expr: Expr) -> Self {
        SelectColumn::new(expr)
    }
}

/// A complete `SELECT ... FROM ... WHERE ...` query.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    columns: Vec<SelectColumn>,
    from: Vec<FromElement>,
    condition: Condition,
}

impl Select {
    /// Create a select. An empty `from` list renders as `FROM dual`.
    ///
    /// Fails when there are no columns, or when a column alias or a `FROM`
    /// qualifier is used twice.
    pub fn new(
        columns: Vec<SelectColumn>,
        from: Vec<FromElement>,
        condition: Condition,
    ) -> SqlGenResult<Self> {
        if columns.is_empty() {
            return Err(SqlGenError::mismatch("SELECT", "at least one column is required"));
        }

        let mut seen = HashSet::new();
        for alias in columns.iter().filter_map(SelectColumn::alias) {
            if !seen.insert(alias) {
                return Err(SqlGenError::DuplicateAlias(alias.to_sql()));
            }
        }

        let mut seen = HashSet::new();
        for qualifier in from.iter().filter_map(FromElement::qualifier) {
            let sql = qualifier.to_sql();
            if !seen.insert(qualifier) {
                return Err(SqlGenError::DuplicateAlias(sql));
            }
        }

        Ok(Self {
            columns,
            from,
            condition,
        })
    }

    pub fn columns(&self) -> &[SelectColumn] {
        &self.columns
    }

    pub fn from(&self) -> &[FromElement] {
        &self.from
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn column_types(&self) -> Vec<TypeTag> {
        self.columns.iter().map(SelectColumn::type_tag).collect()
    }
}
