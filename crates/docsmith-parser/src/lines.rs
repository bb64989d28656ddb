//! Logical line splitting
//!
//! Groups the flat token stream into Python logical lines. Newlines inside
//! brackets and backslash continuations stay inside a line; blank and
//! comment-only lines become trivia that the parser attaches to the next
//! statement.

use docsmith_ast::Span;
use docsmith_lexer::{Token, TokenKind};

use crate::ParseError;

/// One physical or logical line of the input.
#[derive(Debug, Clone)]
pub enum RawLine {
    /// Blank or comment-only line, terminating newline included
    Trivia(Span),
    Logical(LogicalLine),
}

/// A logical line: indentation, content and terminating newline, plus the
/// significant tokens of the content with their bracket depth.
#[derive(Debug, Clone)]
pub struct LogicalLine {
    pub indent: Span,
    pub content: Span,
    pub newline: Span,
    pub tokens: Vec<(Token, usize)>,
}

impl LogicalLine {
    pub fn kind_at(&self, index: usize) -> TokenKind {
        self.tokens
            .get(index)
            .map(|(t, _)| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub fn first_kind(&self) -> TokenKind {
        self.kind_at(0)
    }

    /// Index of the first colon outside any brackets.
    pub fn header_colon(&self) -> Option<usize> {
        self.tokens
            .iter()
            .position(|(t, depth)| t.kind == TokenKind::Colon && *depth == 0)
    }
}

/// Split `tokens` (as produced by `tokenize(source)`) into lines.
pub fn split_lines(source: &str, tokens: &[Token]) -> Result<Vec<RawLine>, ParseError> {
    let mut lines = Vec::new();
    let mut i = 0;

    loop {
        let line_start = tokens[i].span.start;
        let mut j = i;
        if tokens[j].kind == TokenKind::Whitespace {
            j += 1;
        }
        let indent = Span::new(line_start, tokens[j].span.start);

        match tokens[j].kind {
            TokenKind::Eof => {
                if line_start < tokens[j].span.start {
                    lines.push(RawLine::Trivia(Span::new(line_start, tokens[j].span.start)));
                }
                break;
            }
            TokenKind::Newline => {
                lines.push(RawLine::Trivia(Span::new(line_start, tokens[j].span.end)));
                i = j + 1;
                continue;
            }
            TokenKind::Comment => {
                let after = &tokens[j + 1];
                let end = if after.kind == TokenKind::Newline {
                    i = j + 2;
                    after.span.end
                } else {
                    i = j + 1;
                    tokens[j].span.end
                };
                lines.push(RawLine::Trivia(Span::new(line_start, end)));
                continue;
            }
            _ => {}
        }

        let content_start = tokens[j].span.start;
        let mut open: Vec<Token> = Vec::new();
        let mut significant = Vec::new();
        let mut k = j;

        let (content_end, newline) = loop {
            let token = tokens[k];
            match token.kind {
                TokenKind::Eof => {
                    if let Some(bracket) = open.last() {
                        return Err(ParseError::UnclosedBracket { span: bracket.span });
                    }
                    break (token.span.start, Span::empty(token.span.start));
                }
                TokenKind::Newline if open.is_empty() => {
                    k += 1;
                    break (token.span.start, token.span);
                }
                TokenKind::Error => return Err(lex_error(source, token)),
                kind if kind.is_trivia() => {}
                kind if kind.is_open_bracket() => {
                    significant.push((token, open.len()));
                    open.push(token);
                }
                kind if kind.is_close_bracket() => match open.pop() {
                    Some(opener) if opener.kind.closing() == Some(kind) => {
                        significant.push((token, open.len()));
                    }
                    _ => {
                        return Err(ParseError::UnmatchedBracket {
                            found: kind.describe().to_string(),
                            span: token.span,
                        })
                    }
                },
                _ => significant.push((token, open.len())),
            }
            k += 1;
        };

        if significant.is_empty() {
            // Nothing but backslash continuations
            lines.push(RawLine::Trivia(Span::new(line_start, newline.end.max(content_end))));
        } else {
            lines.push(RawLine::Logical(LogicalLine {
                indent,
                content: Span::new(content_start, content_end),
                newline,
                tokens: significant,
            }));
        }
        i = k;
    }

    Ok(lines)
}

fn lex_error(source: &str, token: Token) -> ParseError {
    let text = token.text(source);
    let unprefixed = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    if unprefixed.starts_with('"') || unprefixed.starts_with('\'') {
        ParseError::UnterminatedString { span: token.span }
    } else {
        ParseError::InvalidToken { span: token.span }
    }
}
