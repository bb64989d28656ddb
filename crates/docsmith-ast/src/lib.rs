//! Docsmith AST - Lossless syntax tree for Python sources
//!
//! This crate defines the tree produced by `docsmith-parser`: statements
//! keep their exact layout (indentation, blank lines, comments, quote
//! style) so the printer can reproduce the input byte for byte. Only the
//! structure needed to find and edit docstrings is modelled: definitions,
//! compound statements and their bodies, and a coarse classification of
//! simple statements.

mod printer;
mod span;
mod tree;

pub use printer::*;
pub use span::*;
pub use tree::*;
