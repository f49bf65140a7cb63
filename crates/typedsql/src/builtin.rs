//! Built-in functions and comparison operators.
//!
//! Each built-in is a plain enum variant; everything about it (arity, argument
//! types, result type, default SQL template) lives in a behavior table looked up
//! by variant. Templates use `{n}` for the n-th argument and `{*}` for all
//! arguments separated by `, `.

use crate::error::{SqlGenError, SqlGenResult};
use crate::value::TypeTag;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuiltInFunction {
    StringConcat,
    Upper,
    Lower,
    Trim,
    Length,
    Substr,
    /// `INSTR(haystack, needle)`, called as `(needle, haystack)`.
    Instr,
    Coalesce,
    Add,
    Subtract,
    Multiply,
    Divide,
    CurrentTimestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgRule {
    /// Positional supertypes; the last entry repeats for variadic tails.
    Each(&'static [TypeTag]),
    /// Every argument has the same type.
    SameType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReturnRule {
    Fixed(TypeTag),
    FirstArg,
    /// The shared type when all arguments agree, `Number` otherwise.
    CommonNumeric,
}

/// Behavior table entry for one built-in function.
#[derive(Debug, Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: Option<usize>,
    /// Infix operators get parenthesized when nested inside another operator.
    pub is_operator: bool,
    pub template: &'static str,
    args: ArgRule,
    returns: ReturnRule,
}

const TEXT: &[TypeTag] = &[TypeTag::Text];
const NUMBERS: &[TypeTag] = &[TypeTag::Number];

impl BuiltInFunction {
    pub const ALL: [BuiltInFunction; 13] = [
        BuiltInFunction::StringConcat,
        BuiltInFunction::Upper,
        BuiltInFunction::Lower,
        BuiltInFunction::Trim,
        BuiltInFunction::Length,
        BuiltInFunction::Substr,
        BuiltInFunction::Instr,
        BuiltInFunction::Coalesce,
        BuiltInFunction::Add,
        BuiltInFunction::Subtract,
        BuiltInFunction::Multiply,
        BuiltInFunction::Divide,
        BuiltInFunction::CurrentTimestamp,
    ];

    pub fn spec(&self) -> FunctionSpec {
        use BuiltInFunction::*;
        let f = |name, min_args, max_args, template, args, returns| FunctionSpec {
            name,
            min_args,
            max_args,
            is_operator: false,
            template,
            args,
            returns,
        };
        let op = |name, min_args, max_args, template| FunctionSpec {
            name,
            min_args,
            max_args,
            is_operator: true,
            template,
            args: ArgRule::Each(NUMBERS),
            returns: ReturnRule::CommonNumeric,
        };
        match self {
            StringConcat => FunctionSpec {
                is_operator: true,
                ..f("STRING_CONCAT", 2, None, "{0}||{1}", ArgRule::Each(TEXT), ReturnRule::Fixed(TypeTag::Text))
            },
            Upper => f("UPPER", 1, Some(1), "UPPER({0})", ArgRule::Each(TEXT), ReturnRule::Fixed(TypeTag::Text)),
            Lower => f("LOWER", 1, Some(1), "LOWER({0})", ArgRule::Each(TEXT), ReturnRule::Fixed(TypeTag::Text)),
            Trim => f("TRIM", 1, Some(1), "TRIM({0})", ArgRule::Each(TEXT), ReturnRule::Fixed(TypeTag::Text)),
            Length => f("LENGTH", 1, Some(1), "LENGTH({0})", ArgRule::Each(TEXT), ReturnRule::Fixed(TypeTag::Int)),
            Substr => f(
                "SUBSTR",
                2,
                Some(3),
                "SUBSTR({*})",
                ArgRule::Each(&[TypeTag::Text, TypeTag::Int, TypeTag::Int]),
                ReturnRule::Fixed(TypeTag::Text),
            ),
            Instr => f("INSTR", 2, Some(2), "INSTR({1}, {0})", ArgRule::Each(TEXT), ReturnRule::Fixed(TypeTag::Int)),
            Coalesce => f("COALESCE", 2, None, "COALESCE({*})", ArgRule::SameType, ReturnRule::FirstArg),
            Add => op("ADD", 2, None, "{0} + {1}"),
            Subtract => op("SUBTRACT", 2, Some(2), "{0} - {1}"),
            Multiply => op("MULTIPLY", 2, None, "{0} * {1}"),
            Divide => op("DIVIDE", 2, Some(2), "{0} / {1}"),
            CurrentTimestamp => f(
                "CURRENT_TIMESTAMP",
                0,
                Some(0),
                "CURRENT_TIMESTAMP",
                ArgRule::Each(&[]),
                ReturnRule::Fixed(TypeTag::Timestamp),
            ),
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Check arity and argument types, returning the result type.
    pub fn validate(&self, arg_types: &[TypeTag]) -> SqlGenResult<TypeTag> {
        let spec = self.spec();
        let n = arg_types.len();
        if n < spec.min_args || spec.max_args.is_some_and(|max| n > max) {
            let expected = match spec.max_args {
                Some(max) if max == spec.min_args => format!("{max}"),
                Some(max) => format!("{} to {max}", spec.min_args),
                None => format!("at least {}", spec.min_args),
            };
            return Err(SqlGenError::mismatch(
                spec.name,
                format!("expected {expected} argument(s), got {n}"),
            ));
        }

        match spec.args {
            ArgRule::Each(expected) => {
                for (i, actual) in arg_types.iter().enumerate() {
                    let Some(want) = expected.get(i).or(expected.last()) else {
                        break;
                    };
                    if !is_compatible(*want, *actual) {
                        return Err(SqlGenError::mismatch(
                            spec.name,
                            format!("argument {} must be {want}, got {actual}", i + 1),
                        ));
                    }
                }
            }
            ArgRule::SameType => {
                let known = known_type(arg_types);
                if let Some((i, actual)) = arg_types
                    .iter()
                    .enumerate()
                    .find(|(_, t)| **t != TypeTag::Any && Some(**t) != known)
                {
                    return Err(SqlGenError::mismatch(
                        spec.name,
                        format!(
                            "argument {} has type {actual}, expected {}",
                            i + 1,
                            known.unwrap_or(TypeTag::Any)
                        ),
                    ));
                }
            }
        }

        Ok(match spec.returns {
            ReturnRule::Fixed(tag) => tag,
            ReturnRule::FirstArg => known_type(arg_types).unwrap_or(TypeTag::Any),
            ReturnRule::CommonNumeric => {
                if arg_types.iter().all(|t| *t == arg_types[0]) {
                    arg_types[0]
                } else {
                    TypeTag::Number
                }
            }
        })
    }
}

/// `Any` marks an operand whose type is not known (an untyped column or a raw
/// fragment); it is accepted wherever a type is expected.
fn is_compatible(expected: TypeTag, actual: TypeTag) -> bool {
    actual == TypeTag::Any || expected.is_assignable_from(&actual)
}

fn known_type(types: &[TypeTag]) -> Option<TypeTag> {
    types.iter().copied().find(|t| *t != TypeTag::Any)
}

impl fmt::Display for BuiltInFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Binary comparison operators usable in a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Like,
}

impl ConditionOperator {
    pub const ALL: [ConditionOperator; 7] = [
        ConditionOperator::Equal,
        ConditionOperator::NotEqual,
        ConditionOperator::Less,
        ConditionOperator::LessOrEqual,
        ConditionOperator::Greater,
        ConditionOperator::GreaterOrEqual,
        ConditionOperator::Like,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConditionOperator::Equal => "EQUAL",
            ConditionOperator::NotEqual => "NOT_EQUAL",
            ConditionOperator::Less => "LESS",
            ConditionOperator::LessOrEqual => "LESS_OR_EQUAL",
            ConditionOperator::Greater => "GREATER",
            ConditionOperator::GreaterOrEqual => "GREATER_OR_EQUAL",
            ConditionOperator::Like => "LIKE",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            ConditionOperator::Equal => "{0} = {1}",
            ConditionOperator::NotEqual => "{0} <> {1}",
            ConditionOperator::Less => "{0} < {1}",
            ConditionOperator::LessOrEqual => "{0} <= {1}",
            ConditionOperator::Greater => "{0} > {1}",
            ConditionOperator::GreaterOrEqual => "{0} >= {1}",
            ConditionOperator::Like => "{0} LIKE {1}",
        }
    }

    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            ConditionOperator::Less
                | ConditionOperator::LessOrEqual
                | ConditionOperator::Greater
                | ConditionOperator::GreaterOrEqual
        )
    }

    /// Operands must have identical types; ordering operators need an
    /// orderable type and `LIKE` needs text. An `Any` operand takes the type
    /// of the other side.
    pub fn validate(&self, left: TypeTag, right: TypeTag) -> SqlGenResult<()> {
        if left != right && left != TypeTag::Any && right != TypeTag::Any {
            return Err(SqlGenError::mismatch(
                self.name(),
                format!("operand types differ: {left} vs {right}"),
            ));
        }
        let Some(ty) = known_type(&[left, right]) else {
            return Ok(());
        };
        if self.is_ordering() && !ty.is_orderable() {
            return Err(SqlGenError::mismatch(
                self.name(),
                format!("type {ty} is not orderable"),
            ));
        }
        if *self == ConditionOperator::Like && ty != TypeTag::Text {
            return Err(SqlGenError::mismatch(
                self.name(),
                format!("LIKE needs text operands, got {ty}"),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_is_checked() {
        let err = BuiltInFunction::Upper.validate(&[]).unwrap_err();
        assert_eq!(
            err,
            SqlGenError::mismatch("UPPER", "expected 1 argument(s), got 0")
        );
        let err = BuiltInFunction::StringConcat.validate(&[TypeTag::Text]).unwrap_err();
        assert!(err.to_string().contains("at least 2"));
        let err = BuiltInFunction::Substr
            .validate(&[TypeTag::Text, TypeTag::Int, TypeTag::Int, TypeTag::Int])
            .unwrap_err();
        assert!(err.to_string().contains("2 to 3"));
    }

    #[test]
    fn argument_types_are_checked() {
        assert_eq!(
            BuiltInFunction::StringConcat
                .validate(&[TypeTag::Text, TypeTag::Text, TypeTag::Text])
                .unwrap(),
            TypeTag::Text
        );
        let err = BuiltInFunction::StringConcat
            .validate(&[TypeTag::Text, TypeTag::Int])
            .unwrap_err();
        assert!(err.to_string().contains("STRING_CONCAT"));
        assert!(err.to_string().contains("argument 2 must be Text"));

        assert_eq!(
            BuiltInFunction::Substr
                .validate(&[TypeTag::Text, TypeTag::Int])
                .unwrap(),
            TypeTag::Text
        );
        assert!(BuiltInFunction::Substr
            .validate(&[TypeTag::Int, TypeTag::Int])
            .is_err());
    }

    #[test]
    fn return_types() {
        assert_eq!(
            BuiltInFunction::Add.validate(&[TypeTag::Int, TypeTag::Int]).unwrap(),
            TypeTag::Int
        );
        assert_eq!(
            BuiltInFunction::Add.validate(&[TypeTag::Int, TypeTag::Decimal]).unwrap(),
            TypeTag::Number
        );
        assert_eq!(
            BuiltInFunction::Coalesce.validate(&[TypeTag::Date, TypeTag::Date]).unwrap(),
            TypeTag::Date
        );
        assert!(BuiltInFunction::Coalesce
            .validate(&[TypeTag::Date, TypeTag::Text])
            .is_err());
        assert_eq!(
            BuiltInFunction::CurrentTimestamp.validate(&[]).unwrap(),
            TypeTag::Timestamp
        );
    }

    #[test]
    fn comparison_rules() {
        assert!(ConditionOperator::Equal.validate(TypeTag::Bool, TypeTag::Bool).is_ok());
        assert!(ConditionOperator::Equal.validate(TypeTag::Int, TypeTag::Number).is_err());
        assert!(ConditionOperator::Less.validate(TypeTag::Uuid, TypeTag::Uuid).is_err());
        assert!(ConditionOperator::Less.validate(TypeTag::Date, TypeTag::Date).is_ok());
        assert!(ConditionOperator::Like.validate(TypeTag::Int, TypeTag::Int).is_err());
    }

    #[test]
    fn unknown_operand_types_are_accepted() {
        assert!(ConditionOperator::Equal.validate(TypeTag::Any, TypeTag::Int).is_ok());
        assert!(ConditionOperator::Less.validate(TypeTag::Bool, TypeTag::Any).is_err());
        assert!(ConditionOperator::Like.validate(TypeTag::Any, TypeTag::Any).is_ok());
        assert_eq!(
            BuiltInFunction::Upper.validate(&[TypeTag::Any]).unwrap(),
            TypeTag::Text
        );
        assert_eq!(
            BuiltInFunction::Coalesce
                .validate(&[TypeTag::Any, TypeTag::Int])
                .unwrap(),
            TypeTag::Int
        );
    }
}
