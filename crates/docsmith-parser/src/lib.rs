//! Docsmith Parser - Indentation-driven block parser for Python
//!
//! Parses Python source into a lossless [`SyntaxTree`]. The tree models
//! block structure only: definitions, compound statements and their
//! suites, with simple statements kept as opaque lines. Every line is still
//! checked against the statement and expression grammar, so text that is
//! not valid Python is rejected.
//! Key parsing challenges:
//! - Logical lines span brackets, continuations and triple-quoted strings
//! - Inline suites (`def f(): return 1`) share the header's line
//! - `match` and `case` are soft keywords

mod error;
mod grammar;
mod lines;
mod parser;

pub use error::*;
pub use lines::*;
pub use parser::*;

use docsmith_ast::SyntaxTree;
use docsmith_lexer::tokenize;

const BOM: char = '\u{feff}';

/// Parse a source string into a SyntaxTree
pub fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
    let (bom, text) = match source.strip_prefix(BOM) {
        Some(rest) => (true, rest),
        None => (false, source),
    };
    let offset = source.len() - text.len();

    let tokens = tokenize(text);
    let lines = split_lines(text, &tokens).map_err(|e| e.shifted(offset))?;
    let parser = Parser::new(text, lines);
    let mut tree = parser.parse_tree().map_err(|e| e.shifted(offset))?;
    tree.module_mut().bom = bom;
    Ok(tree)
}
