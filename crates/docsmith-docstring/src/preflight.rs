//! Pre-flight skip rules
//!
//! Files that cannot gain a docstring are returned untouched before any
//! generator call is made.

use std::fmt;

use docsmith_ast::{walk, SimpleKind, StatementKind, SyntaxTree};
use serde::{Deserialize, Serialize};

/// Why a file was skipped without being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Empty or whitespace only
    Empty,
    /// Nothing but comments and string expressions
    CommentsOnly,
    /// No class or function definition at any depth
    NoDefinitions,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "file is empty"),
            SkipReason::CommentsOnly => write!(f, "file contains only comments"),
            SkipReason::NoDefinitions => {
                write!(f, "file does not contain classes, methods, or functions")
            }
        }
    }
}

/// Check that needs only the raw text.
pub fn check_source(source: &str) -> Option<SkipReason> {
    let text = source.trim_start_matches('\u{feff}');
    text.trim().is_empty().then_some(SkipReason::Empty)
}

/// Checks on the parsed module.
pub fn check_tree(tree: &SyntaxTree) -> Option<SkipReason> {
    let body = &tree.module().body;

    let only_strings = body.iter().all(|stmt| {
        matches!(
            &stmt.kind,
            StatementKind::Simple(simple) if simple.kind == SimpleKind::StringLiteral
        )
    });
    if only_strings {
        return Some(SkipReason::CommentsOnly);
    }

    let mut has_definition = false;
    walk(tree.module(), &mut |stmt, _| {
        has_definition |= stmt.is_definition();
    });
    if !has_definition {
        return Some(SkipReason::NoDefinitions);
    }

    None
}
