//! Parser error types

use docsmith_ast::Span;
use docsmith_lexer::TokenKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid character")]
    InvalidToken { span: Span },

    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unmatched {found}")]
    UnmatchedBracket { found: String, span: Span },

    #[error("bracket is never closed")]
    UnclosedBracket { span: Span },

    #[error("unexpected indent")]
    UnexpectedIndent { span: Span },

    #[error("unindent does not match any outer indentation level")]
    InconsistentDedent { span: Span },

    #[error("expected an indented block")]
    ExpectedIndentedBlock { span: Span },

    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("decorator must be followed by a function or class definition")]
    DanglingDecorator { span: Span },

    #[error("'{keyword}' without a matching block statement")]
    OrphanClause { keyword: String, span: Span },

    #[error("{message}")]
    InvalidSyntax { message: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::InvalidToken { span } => *span,
            ParseError::UnterminatedString { span } => *span,
            ParseError::UnmatchedBracket { span, .. } => *span,
            ParseError::UnclosedBracket { span } => *span,
            ParseError::UnexpectedIndent { span } => *span,
            ParseError::InconsistentDedent { span } => *span,
            ParseError::ExpectedIndentedBlock { span } => *span,
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::DanglingDecorator { span } => *span,
            ParseError::OrphanClause { span, .. } => *span,
            ParseError::InvalidSyntax { span, .. } => *span,
        }
    }

    /// Move the error's span `offset` bytes to the right.
    pub fn shifted(mut self, offset: usize) -> Self {
        let span = match &mut self {
            ParseError::InvalidToken { span }
            | ParseError::UnterminatedString { span }
            | ParseError::UnmatchedBracket { span, .. }
            | ParseError::UnclosedBracket { span }
            | ParseError::UnexpectedIndent { span }
            | ParseError::InconsistentDedent { span }
            | ParseError::ExpectedIndentedBlock { span }
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::DanglingDecorator { span }
            | ParseError::OrphanClause { span, .. }
            | ParseError::InvalidSyntax { span, .. } => span,
        };
        *span = span.shift(offset);
        self
    }

    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.describe().to_string(),
            span,
        }
    }
}
