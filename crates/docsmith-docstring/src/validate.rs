//! Round-trip validation
//!
//! Two sources are equivalent when they print the same after every
//! docstring has been removed from both.

use docsmith_ast::ToSource;
use docsmith_parser::{parse, ParseError};
use thiserror::Error;

use crate::strip_doc;

#[derive(Debug, Error)]
pub enum ValidationFailure {
    #[error("original source does not parse: {0}")]
    Original(#[source] ParseError),

    #[error("modified source does not parse: {0}")]
    Modified(#[source] ParseError),

    #[error("modified source differs outside docstrings at line {line}: expected {expected:?}, found {found:?}")]
    CodeChanged {
        line: usize,
        expected: String,
        found: String,
    },
}

fn without_docstrings(source: &str) -> Result<String, ParseError> {
    Ok(strip_doc(parse(source)?).to_source())
}

/// `Ok(true)` when `modified` differs from `original` only in docstrings.
pub fn validate(original: &str, modified: &str) -> Result<bool, ParseError> {
    Ok(without_docstrings(original)? == without_docstrings(modified)?)
}

/// Like [`validate`], but reports where the two sources diverge.
pub fn ensure_documentation_only(original: &str, modified: &str) -> Result<(), ValidationFailure> {
    let expected = without_docstrings(original).map_err(ValidationFailure::Original)?;
    let found = without_docstrings(modified).map_err(ValidationFailure::Modified)?;
    if expected == found {
        return Ok(());
    }

    let mut expected_lines = expected.lines();
    let mut found_lines = found.lines();
    let mut line = 1;
    loop {
        match (expected_lines.next(), found_lines.next()) {
            (Some(a), Some(b)) if a == b => line += 1,
            (a, b) => {
                return Err(ValidationFailure::CodeChanged {
                    line,
                    expected: a.unwrap_or_default().to_string(),
                    found: b.unwrap_or_default().to_string(),
                })
            }
        }
    }
}
