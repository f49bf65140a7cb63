use super::condition::Condition;
use super::raw::RawSql;
use crate::bind::BindVariable;
use crate::builtin::{BuiltInFunction, ConditionOperator};
use crate::error::{SqlGenError, SqlGenResult};
use crate::name::{IntoNamePath, NamePath, SimpleName};
use crate::value::{TypeTag, Value};
use std::sync::Arc;

/// Reference to a column, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    table: Option<NamePath>,
    column: SimpleName,
    type_tag: TypeTag,
}

impl ColumnRef {
    /// Parse `column` or `qualifier.column`. The column's type is unknown (`Any`).
    pub fn new(name: impl IntoNamePath) -> SqlGenResult<Self> {
        Self::typed(name, TypeTag::Any)
    }

    pub fn typed(name: impl IntoNamePath, type_tag: TypeTag) -> SqlGenResult<Self> {
        let path = name.into_name_path()?;
        let mut segments = path.segments().to_vec();
        let column = segments
            .pop()
            .ok_or_else(|| SqlGenError::name("column name cannot be empty"))?;
        let table = if segments.is_empty() {
            None
        } else {
            Some(NamePath::from_segments(segments))
        };
        Ok(Self {
            table,
            column,
            type_tag,
        })
    }

    pub fn table(&self) -> Option<&NamePath> {
        self.table.as_ref()
    }

    pub fn column(&self) -> &SimpleName {
        &self.column
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }
}

/// Application of a built-in function to arguments, type-checked on creation.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    builtin: BuiltInFunction,
    args: Vec<Expr>,
    type_tag: TypeTag,
}

impl FunctionCall {
    pub fn new(builtin: BuiltInFunction, args: Vec<Expr>) -> SqlGenResult<Self> {
        let types: Vec<TypeTag> = args.iter().map(Expr::type_tag).collect();
        let type_tag = builtin.validate(&types)?;
        Ok(Self {
            builtin,
            args,
            type_tag,
        })
    }

    pub fn builtin(&self) -> BuiltInFunction {
        self.builtin
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }
}

/// A typed scalar expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Inline literal.
    Literal(Value),
    Column(Arc<ColumnRef>),
    /// Placeholder for a bind variable.
    Bind(BindVariable),
    Function(Arc<FunctionCall>),
    /// Caller-supplied fragment with a declared type.
    Raw { sql: Arc<RawSql>, type_tag: TypeTag },
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn column(name: impl IntoNamePath) -> SqlGenResult<Self> {
        Ok(Expr::Column(Arc::new(ColumnRef::new(name)?)))
    }

    pub fn typed_column(name: impl IntoNamePath, type_tag: TypeTag) -> SqlGenResult<Self> {
        Ok(Expr::Column(Arc::new(ColumnRef::typed(name, type_tag)?)))
    }

    pub fn bind(variable: BindVariable) -> Self {
        Expr::Bind(variable)
    }

    pub fn call(builtin: BuiltInFunction, args: Vec<Expr>) -> SqlGenResult<Self> {
        Ok(Expr::Function(Arc::new(FunctionCall::new(builtin, args)?)))
    }

    /// Raw fragment of unknown type.
    pub fn raw(sql: &str, binds: Vec<BindVariable>) -> SqlGenResult<Self> {
        Self::raw_typed(sql, binds, TypeTag::Any)
    }

    pub fn raw_typed(sql: &str, binds: Vec<BindVariable>, type_tag: TypeTag) -> SqlGenResult<Self> {
        Ok(Expr::Raw {
            sql: Arc::new(RawSql::parse(sql, binds)?),
            type_tag,
        })
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Expr::Literal(value) => value.type_tag(),
            Expr::Column(column) => column.type_tag(),
            Expr::Bind(variable) => variable.type_tag(),
            Expr::Function(call) => call.type_tag(),
            Expr::Raw { type_tag, .. } => *type_tag,
        }
    }

    /// Whether this renders as an infix operator expression.
    pub(crate) fn is_operator(&self) -> bool {
        matches!(self, Expr::Function(call) if call.builtin().spec().is_operator)
    }

    pub fn compare(self, op: ConditionOperator, other: Expr) -> SqlGenResult<Condition> {
        Condition::compare(self, op, other)
    }

    pub fn eq(self, other: Expr) -> SqlGenResult<Condition> {
        self.compare(ConditionOperator::Equal, other)
    }

    pub fn ne(self, other: Expr) -> SqlGenResult<Condition> {
        self.compare(ConditionOperator::NotEqual, other)
    }

    pub fn lt(self, other: Expr) -> SqlGenResult<Condition> {
        self.compare(ConditionOperator::Less, other)
    }

    pub fn le(self, other: Expr) -> SqlGenResult<Condition> {
        self.compare(ConditionOperator::LessOrEqual, other)
    }

    pub fn gt(self, other: Expr) -> SqlGenResult<Condition> {
        self.compare(ConditionOperator::Greater, other)
    }

    pub fn ge(self, other: Expr) -> SqlGenResult<Condition> {
        self.compare(ConditionOperator::GreaterOrEqual, other)
    }

    pub fn like(self, pattern: Expr) -> SqlGenResult<Condition> {
        self.compare(ConditionOperator::Like, pattern)
    }

    pub fn is_null(self) -> Condition {
        Condition::is_null(self)
    }

    pub fn is_not_null(self) -> Condition {
        Condition::is_not_null(self)
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}

impl From<BindVariable> for Expr {
    fn from(variable: BindVariable) -> Self {
        Expr::Bind(variable)
    }
}

impl From<ColumnRef> for Expr {
    fn from(column: ColumnRef) -> Self {
        Expr::Column(Arc::new(column))
    }
}
