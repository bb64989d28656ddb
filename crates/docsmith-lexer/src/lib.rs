//! Docsmith Lexer - Lossless Python tokenization using logos
//!
//! Unlike a compiler lexer nothing is thrown away: the concatenated token
//! texts equal the input. Indentation and line structure are recovered
//! later by the parser from `Whitespace` and `Newline` tokens.

mod token;

pub use token::*;

use docsmith_ast::Span;
use logos::Logos;

/// Tokenize a source string into a vector of tokens
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        let kind = match result {
            Ok(kind) => kind,
            Err(_) => TokenKind::Error,
        };
        tokens.push(Token { kind, span });
    }

    // Add EOF token
    let end = source.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
    });

    tokens
}

/// A token with its span
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}

/// The prefix letters of a string token (`r`, `b`, `f`, ...), lowercased.
pub fn string_prefix(text: &str) -> String {
    text.chars()
        .take_while(|c| *c != '"' && *c != '\'')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
