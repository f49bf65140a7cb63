//! Query tree nodes.
//!
//! Nodes are immutable once built; shared children sit behind `Arc`, so a
//! condition or subselect can be reused in several queries without copying.

mod condition;
mod expr;
mod from;
mod raw;
mod select;

pub use condition::Condition;
pub use expr::{ColumnRef, Expr, FunctionCall};
pub use from::FromElement;
pub(crate) use raw::RawPart;
pub use raw::RawSql;
pub use select::{Select, SelectColumn};
