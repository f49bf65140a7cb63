//! Fluent construction of [`Select`] trees.
//!
//! Builder methods never fail on the spot: the first error (a bad name, a
//! type mismatch in a condition, a malformed raw fragment) is kept and
//! returned by [`SelectBuilder::build`], so a whole query can be written as
//! one chain.
//!
//! # Example
//! ```ignore
//! use typedsql::{BindName, BindVariable, Expr, Renderer, TypeTag, select};
//!
//! let status = BindVariable::new(BindName::of("status")?, TypeTag::Text);
//! let query = select()
//!     .from("orders", "o")
//!     .column("id")
//!     .column_aliased("total", "amount")
//!     .try_where(Expr::typed_column("status", TypeTag::Text)?.eq(Expr::bind(status)))
//!     .build()?;
//! let stmt = Renderer::new().render(&query)?;
//! # Ok::<(), typedsql::SqlGenError>(())
//! ```

use crate::bind::BindVariable;
use crate::element::{Condition, Expr, FromElement, Select, SelectColumn};
use crate::error::{SqlGenError, SqlGenResult};
use crate::name::IntoNamePath;
use crate::render::Renderer;
use crate::statement::Statement;
use crate::value::TypeTag;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::marker::PhantomData;
use uuid::Uuid;

/// Start building a select.
pub fn select() -> SelectBuilder {
    SelectBuilder::new()
}

/// Builder for [`Select`].
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    columns: Vec<SelectColumn>,
    from: Vec<FromElement>,
    conditions: Vec<Condition>,
    build_error: Option<SqlGenError>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn record<T>(&mut self, result: SqlGenResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.build_error.get_or_insert(err);
                None
            }
        }
    }

    fn push_from(mut self, element: SqlGenResult<FromElement>) -> Self {
        if let Some(element) = self.record(element) {
            self.from.push(element);
        }
        self
    }

    fn push_column(mut self, column: SqlGenResult<SelectColumn>) -> Self {
        if let Some(column) = self.record(column) {
            self.columns.push(column);
        }
        self
    }

    // ==================== FROM ====================

    /// Add a table with an alias.
    pub fn from(self, table: impl IntoNamePath, alias: &str) -> Self {
        self.push_from(FromElement::aliased(table, alias))
    }

    /// Add a table without an alias.
    pub fn from_table(self, table: impl IntoNamePath) -> Self {
        self.push_from(FromElement::table(table))
    }

    /// Add a nested select.
    pub fn from_select(self, select: Select, alias: &str) -> Self {
        self.push_from(FromElement::subselect(select, alias))
    }

    /// Add a raw SQL fragment, e.g. a table function call.
    pub fn from_raw(self, sql: &str, alias: Option<&str>, binds: Vec<BindVariable>) -> Self {
        self.push_from(FromElement::raw(sql, alias, binds))
    }

    // ==================== SELECT list ====================

    /// Add a column of unknown type.
    pub fn column(self, name: impl IntoNamePath) -> Self {
        self.push_column(Expr::column(name).map(SelectColumn::new))
    }

    pub fn column_typed(self, name: impl IntoNamePath, type_tag: TypeTag) -> Self {
        self.push_column(Expr::typed_column(name, type_tag).map(SelectColumn::new))
    }

    pub fn column_aliased(self, name: impl IntoNamePath, alias: &str) -> Self {
        self.push_column(Expr::column(name).and_then(|e| SelectColumn::aliased(e, alias)))
    }

    /// Add an arbitrary expression.
    pub fn expr(self, expr: Expr) -> Self {
        self.push_column(Ok(SelectColumn::new(expr)))
    }

    pub fn expr_aliased(self, expr: Expr, alias: &str) -> Self {
        self.push_column(SelectColumn::aliased(expr, alias))
    }

    /// Add an expression whose construction may have failed.
    pub fn try_expr(self, expr: SqlGenResult<Expr>) -> Self {
        self.push_column(expr.map(SelectColumn::new))
    }

    pub fn column_raw(self, sql: &str, alias: Option<&str>, binds: Vec<BindVariable>) -> Self {
        self.push_column(SelectColumn::raw(sql, alias, binds))
    }

    // ==================== WHERE ====================

    /// AND a condition into the `WHERE` clause.
    pub fn where_(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// AND a condition whose construction may have failed.
    pub fn try_where(mut self, condition: SqlGenResult<Condition>) -> Self {
        if let Some(condition) = self.record(condition) {
            self.conditions.push(condition);
        }
        self
    }

    pub fn where_raw(self, sql: &str, binds: Vec<BindVariable>) -> Self {
        self.try_where(Condition::raw(sql, binds))
    }

    // ==================== Build ====================

    pub fn build(self) -> SqlGenResult<Select> {
        if let Some(err) = self.build_error {
            return Err(err);
        }
        let condition = if self.conditions.is_empty() {
            Condition::Empty
        } else {
            Condition::and(self.conditions)
        };
        Select::new(self.columns, self.from, condition)
    }

    /// Build and check the select list against the row type `R`.
    pub fn build_typed<R: RowShape>(self) -> SqlGenResult<TypedSelect<R>> {
        TypedSelect::new(self.build()?)
    }
}

/// A Rust type with a fixed logical SQL type.
pub trait SqlType {
    const TYPE_TAG: TypeTag;
}

macro_rules! sql_type {
    ($($ty:ty => $tag:expr),* $(,)?) => {
        $(impl SqlType for $ty {
            const TYPE_TAG: TypeTag = $tag;
        })*
    };
}

sql_type! {
    bool => TypeTag::Bool,
    i16 => TypeTag::Int,
    i32 => TypeTag::Int,
    i64 => TypeTag::Int,
    f32 => TypeTag::Float,
    f64 => TypeTag::Float,
    Decimal => TypeTag::Decimal,
    String => TypeTag::Text,
    NaiveDate => TypeTag::Date,
    NaiveTime => TypeTag::Time,
    NaiveDateTime => TypeTag::Timestamp,
    Uuid => TypeTag::Uuid,
}

impl<T: SqlType> SqlType for Option<T> {
    const TYPE_TAG: TypeTag = T::TYPE_TAG;
}

/// Column types of a result row, in select-list order.
pub trait RowShape {
    fn column_types() -> Vec<TypeTag>;
}

macro_rules! row_shape {
    ($($name:ident),+) => {
        impl<$($name: SqlType),+> RowShape for ($($name,)+) {
            fn column_types() -> Vec<TypeTag> {
                vec![$($name::TYPE_TAG),+]
            }
        }
    };
}

row_shape!(A);
row_shape!(A, B);
row_shape!(A, B, C);
row_shape!(A, B, C, D);
row_shape!(A, B, C, D, E);
row_shape!(A, B, C, D, E, F);
row_shape!(A, B, C, D, E, F, G);
row_shape!(A, B, C, D, E, F, G, H);

/// A select whose columns were checked against the row type `R`.
#[derive(Debug, Clone)]
pub struct TypedSelect<R> {
    select: Select,
    _row: PhantomData<fn() -> R>,
}

impl<R: RowShape> TypedSelect<R> {
    /// Check `select` against `R`: same number of columns, and each column's
    /// type usable as the row field's type. Untyped columns are accepted.
    pub fn new(select: Select) -> SqlGenResult<Self> {
        let expected = R::column_types();
        let actual = select.column_types();
        if expected.len() != actual.len() {
            return Err(SqlGenError::RowShapeMismatch {
                expected: expected.len(),
                actual: actual.len(),
            });
        }
        for (i, (want, got)) in expected.iter().zip(&actual).enumerate() {
            if *got != TypeTag::Any && !want.is_assignable_from(got) {
                return Err(SqlGenError::TypeConflict {
                    name: format!("column {}", i + 1),
                    existing: *want,
                    incoming: *got,
                });
            }
        }
        Ok(Self {
            select,
            _row: PhantomData,
        })
    }
}

impl<R> TypedSelect<R> {
    pub fn select(&self) -> &Select {
        &self.select
    }

    pub fn into_select(self) -> Select {
        self.select
    }

    pub fn render(&self, renderer: &Renderer) -> SqlGenResult<Statement> {
        renderer.render(&self.select)
    }
}
