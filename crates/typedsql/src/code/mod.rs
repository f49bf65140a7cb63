//! Text generation primitives used by the renderer.

mod builder;
mod ident;

pub use builder::{CodeBuilder, normalize_fragment, normalize_fragment_keeping};
pub use ident::CodeIdent;
