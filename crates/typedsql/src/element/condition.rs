use super::expr::Expr;
use super::raw::RawSql;
use crate::bind::BindVariable;
use crate::builtin::ConditionOperator;
use crate::error::SqlGenResult;
use std::sync::Arc;

/// A boolean condition for a `WHERE` clause.
///
/// A condition is *empty* when it is always true and can be left out of the
/// generated SQL: [`Condition::Empty`] itself, `x = x`, an `AND` of empty
/// conditions, or an `OR` with an empty branch. An `OR` without branches is
/// always false and renders as `1=0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Condition {
    Compare {
        left: Expr,
        op: ConditionOperator,
        right: Expr,
    },
    IsNull {
        expr: Expr,
        negated: bool,
    },
    And(Arc<[Condition]>),
    Or(Arc<[Condition]>),
    Not(Arc<Condition>),
    Raw(Arc<RawSql>),
    #[default]
    Empty,
}

impl Condition {
    /// Compare two expressions; operand types are checked against `op`.
    pub fn compare(left: Expr, op: ConditionOperator, right: Expr) -> SqlGenResult<Self> {
        op.validate(left.type_tag(), right.type_tag())?;
        Ok(Condition::Compare { left, op, right })
    }

    pub fn eq(left: Expr, right: Expr) -> SqlGenResult<Self> {
        Self::compare(left, ConditionOperator::Equal, right)
    }

    pub fn is_null(expr: Expr) -> Self {
        Condition::IsNull {
            expr,
            negated: false,
        }
    }

    pub fn is_not_null(expr: Expr) -> Self {
        Condition::IsNull {
            expr,
            negated: true,
        }
    }

    /// Conjunction; nested `AND`s are flattened and `Empty` children dropped.
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        let mut flat = Vec::new();
        for condition in conditions {
            match condition {
                Condition::And(children) => flat.extend(children.iter().cloned()),
                Condition::Empty => {}
                other => flat.push(other),
            }
        }
        Condition::And(flat.into())
    }

    /// Disjunction; nested `OR`s are flattened.
    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        let mut flat = Vec::new();
        for condition in conditions {
            match condition {
                Condition::Or(children) => flat.extend(children.iter().cloned()),
                other => flat.push(other),
            }
        }
        Condition::Or(flat.into())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Condition::Not(Arc::new(condition))
    }

    pub fn raw(sql: &str, binds: Vec<BindVariable>) -> SqlGenResult<Self> {
        Ok(Condition::Raw(Arc::new(RawSql::parse(sql, binds)?)))
    }

    /// Whether this condition is always true and may be omitted.
    ///
    /// `NOT` is never empty: negating an always-true condition yields an
    /// always-false one.
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Compare { left, op, right } => {
                *op == ConditionOperator::Equal && left == right
            }
            Condition::And(children) => children.iter().all(Condition::is_empty),
            Condition::Or(children) => children.iter().any(Condition::is_empty),
            Condition::Empty => true,
            Condition::IsNull { .. } | Condition::Not(_) | Condition::Raw(_) => false,
        }
    }

    /// Items of a `WHERE` list: a top-level `AND` contributes one item per
    /// child, empty conditions are skipped.
    pub(crate) fn where_items(&self) -> Vec<&Condition> {
        match self {
            Condition::And(children) => children.iter().filter(|c| !c.is_empty()).collect(),
            c if c.is_empty() => Vec::new(),
            c => vec![c],
        }
    }

    /// Non-empty children of an `AND`, or the branches of an `OR`.
    pub(crate) fn live_children(&self) -> Vec<&Condition> {
        match self {
            Condition::And(children) => children.iter().filter(|c| !c.is_empty()).collect(),
            Condition::Or(children) => children.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Whether the rendered form is already wrapped in parentheses.
    pub(crate) fn is_parenthesized(&self) -> bool {
        !self.is_empty()
            && matches!(self, Condition::And(_) | Condition::Or(_))
            && self.live_children().len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::BindName;
    use crate::value::TypeTag;

    fn int_bind(name: &str) -> Expr {
        Expr::bind(BindVariable::new(BindName::of(name).unwrap(), TypeTag::Int))
    }

    #[test]
    fn self_equality_is_empty() {
        let x = int_bind("x");
        assert!(Condition::eq(x.clone(), x.clone()).unwrap().is_empty());
        assert!(!Condition::eq(x.clone(), int_bind("y")).unwrap().is_empty());
        assert!(!x.clone().le(x).unwrap().is_empty());
    }

    #[test]
    fn compare_checks_types() {
        let text = Expr::literal("a");
        assert!(Condition::eq(int_bind("x"), text.clone()).is_err());
        assert!(text.clone().like(Expr::literal("a%")).is_ok());
        assert!(Expr::literal(true).lt(Expr::literal(false)).is_err());
    }

    #[test]
    fn and_flattens_and_drops_empty() {
        let a = Condition::is_null(int_bind("a"));
        let b = Condition::is_not_null(int_bind("b"));
        let nested = Condition::and([a.clone(), Condition::and([b.clone(), Condition::Empty])]);
        assert_eq!(nested, Condition::And(vec![a.clone(), b.clone()].into()));
        assert_eq!(nested.where_items(), vec![&a, &b]);
        assert!(Condition::and([]).is_empty());
    }

    #[test]
    fn emptiness_rules() {
        let a = Condition::is_null(int_bind("a"));
        assert!(Condition::or([a.clone(), Condition::Empty]).is_empty());
        assert!(!Condition::or([a.clone()]).is_empty());
        assert!(!Condition::or([]).is_empty());
        assert!(!Condition::and([Condition::or([])]).is_empty());
        assert!(!Condition::not(Condition::Empty).is_empty());
        assert!(Condition::Empty.where_items().is_empty());
        assert_eq!(a.where_items(), vec![&a]);
    }
}
