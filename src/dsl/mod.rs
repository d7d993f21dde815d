//! The Starlark subset used by WORKSPACE, BUILD and `.bzl` files.
//!
//! Source text is tokenized by [`lexer`], parsed into an [`ast::Module`]
//! by [`parser`], and evaluated by [`eval::Interpreter`], which hands
//! every call to a [`eval::Host`].

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

pub use eval::{Host, Interpreter};
pub use value::{Bindings, Invocation, Location, Value};
