//! # typedsql
//!
//! Typed SQL generation: build a query as an immutable tree of typed nodes,
//! render it into parameterized SQL text plus the bind variables and their
//! placeholder positions.
//!
//! ## Features
//!
//! - **Typed tree**: expressions, conditions and built-in functions are type
//!   checked when they are constructed, not when the database rejects them
//! - **Bind consolidation**: a variable used several times (even across
//!   subselects) is reported once, with every position, after checking the
//!   uses agree on type and value
//! - **Stable layout**: one clause keyword per line, one item per line, so
//!   generated SQL diffs and logs cleanly
//! - **Pluggable literals**: per-type literal and parameter encoding through
//!   [`LiteralRegistry`]
//! - **Raw SQL escape hatch**: fragments are tokenized, their `?` placeholders
//!   matched to bind variables
//!
//! ```ignore
//! use typedsql::{Renderer, select};
//!
//! let query = select().from("Table", "TableAlias").column("Column").build()?;
//! let stmt = Renderer::new().render(&query)?;
//! assert_eq!(stmt.sql(), "SELECT\n    tablealias.column\nFROM\n    table tablealias\n");
//! # Ok::<(), typedsql::SqlGenError>(())
//! ```

pub mod bind;
pub mod builtin;
pub mod code;
pub mod config;
pub mod element;
pub mod error;
pub mod literal;
pub mod name;
pub mod params;
pub mod query;
pub mod render;
pub mod statement;
pub mod tokenizer;
pub mod value;

pub use bind::{BindName, BindVariable, BindWithPosition};
pub use builtin::{BuiltInFunction, ConditionOperator};
pub use code::{CodeBuilder, CodeIdent};
pub use config::{PlaceholderStyle, RenderConfig};
pub use element::{
    ColumnRef, Condition, Expr, FromElement, FunctionCall, RawSql, Select, SelectColumn,
};
pub use error::{SqlGenError, SqlGenResult};
pub use literal::{LiteralHandler, LiteralRegistry, escape_text_literal, unescape_text_literal};
pub use name::{IntoNamePath, NamePath, SimpleName};
pub use params::{Param, ParamSink, PgParams};
pub use query::{RowShape, SelectBuilder, SqlType, TypedSelect, select};
pub use render::Renderer;
pub use statement::Statement;
pub use tokenizer::{Token, TokenKind, tokenize};
pub use value::{DomainTag, TypeTag, Value};
