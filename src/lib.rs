//! Docsmith - lossless docstring insertion and removal for Python sources
//!
//! This is the root workspace crate that hosts the integration tests.
//! The implementation lives in the workspace member crates.

pub use docsmith_ast as ast;
pub use docsmith_docstring as docstring;
pub use docsmith_lexer as lexer;
pub use docsmith_parser as parser;
