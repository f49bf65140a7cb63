//! Error types for typedsql

use crate::value::TypeTag;
use thiserror::Error;

/// Result type alias for typedsql operations
pub type SqlGenResult<T> = Result<T, SqlGenError>;

/// Errors raised while building or rendering a query.
///
/// Every variant is fatal for the operation that produced it: a render either
/// returns a complete [`Statement`](crate::Statement) or one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SqlGenError {
    /// Malformed bind or identifier name
    #[error("Invalid name: {0}")]
    Name(String),

    /// Two references to one bind variable disagree on its type
    #[error("Type conflict for bind variable {name}: {existing} vs {incoming}")]
    TypeConflict {
        name: String,
        existing: TypeTag,
        incoming: TypeTag,
    },

    /// Two references to one bind variable carry different values
    #[error("Value conflict for bind variable {name}: {existing} vs {incoming}")]
    ValueConflict {
        name: String,
        existing: String,
        incoming: String,
    },

    /// A built-in function or operator was applied to the wrong arguments
    #[error("Invalid arguments for {builtin}: {message}")]
    ArityOrTypeMismatch { builtin: String, message: String },

    /// No literal/parameter handler is registered for the type or its supertypes
    #[error("No literal handler registered for type {0}")]
    NoHandlerForType(TypeTag),

    /// A `/* ... */` comment runs past the end of the fragment
    #[error("Unterminated comment starting at {line}:{column}")]
    UnterminatedComment { line: usize, column: usize },

    /// A `'...'` string runs past the end of the fragment
    #[error("Unterminated string literal starting at {line}:{column}")]
    UnterminatedString { line: usize, column: usize },

    /// A character that cannot start any token
    #[error("Invalid character '{ch}' at {line}:{column}")]
    InvalidCharacter { line: usize, column: usize, ch: char },

    /// The fragment produced more tokens than allowed
    #[error("Too many tokens: limit is {0}")]
    TooManyTokens(usize),

    /// A column or table alias is used twice within one select
    #[error("Duplicate alias: {0}")]
    DuplicateAlias(String),

    /// A raw fragment's placeholders do not line up with its bind list
    #[error("Raw SQL has {placeholders} placeholder(s) but {binds} bind variable(s)")]
    BindCountMismatch { placeholders: usize, binds: usize },

    /// A bind variable has no value at execution time
    #[error("No value for bind variable {0}")]
    UnboundVariable(String),

    /// A typed select does not have the number of columns its row type expects
    #[error("Row type expects {expected} column(s), select has {actual}")]
    RowShapeMismatch { expected: usize, actual: usize },

    /// Invalid render configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SqlGenError {
    /// Create a name error
    pub fn name(message: impl Into<String>) -> Self {
        Self::Name(message.into())
    }

    /// Create an arity/type mismatch error for a built-in
    pub fn mismatch(builtin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ArityOrTypeMismatch {
            builtin: builtin.into(),
            message: message.into(),
        }
    }

    /// Check if this is a bind merge conflict (type or value)
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::TypeConflict { .. } | Self::ValueConflict { .. })
    }

    /// Check if this error came from the raw SQL tokenizer
    pub fn is_tokenizer_error(&self) -> bool {
        matches!(
            self,
            Self::UnterminatedComment { .. }
                | Self::UnterminatedString { .. }
                | Self::InvalidCharacter { .. }
                | Self::TooManyTokens(_)
        )
    }
}
