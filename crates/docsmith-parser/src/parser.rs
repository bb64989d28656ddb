//! Block structure parser
//!
//! Builds the statement tree from logical lines using indentation, the same
//! way the Python tokenizer derives INDENT/DEDENT.

use std::collections::VecDeque;

use docsmith_ast::*;
use docsmith_lexer::{string_prefix, Token, TokenKind};

use crate::grammar::{check_line, LineRole};
use crate::lines::{LogicalLine, RawLine};
use crate::ParseError;

/// What the parser needs to know about the next logical line without
/// consuming it.
#[derive(Debug, Clone, Copy)]
struct Peek {
    indent: Span,
    content: Span,
    first: TokenKind,
}

pub struct Parser<'a> {
    source: &'a str,
    lines: VecDeque<RawLine>,
    next_id: u32,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, lines: Vec<RawLine>) -> Self {
        Self {
            source,
            lines: lines.into(),
            next_id: NodeId::MODULE.0 + 1,
        }
    }

    // === Utilities ===

    fn text(&self, span: Span) -> &'a str {
        span.text(self.source)
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn peek(&self) -> Option<Peek> {
        self.lines.iter().find_map(|raw| match raw {
            RawLine::Logical(line) => Some(Peek {
                indent: line.indent,
                content: line.content,
                first: line.first_kind(),
            }),
            RawLine::Trivia(_) => None,
        })
    }

    /// Consume the next logical line together with the trivia before it.
    fn take_line(&mut self) -> Option<(String, LogicalLine)> {
        let mut leading = String::new();
        while let Some(raw) = self.lines.pop_front() {
            match raw {
                RawLine::Trivia(span) => leading.push_str(self.text(span)),
                RawLine::Logical(line) => return Some((leading, line)),
            }
        }
        None
    }

    fn check(&self, line: &LogicalLine, role: LineRole) -> Result<(), ParseError> {
        check_line(self.source, line, role)
    }

    fn make_line(&self, leading: String, line: &LogicalLine) -> Line {
        Line {
            leading,
            indent: self.text(line.indent).to_string(),
            text: self.text(line.content).to_string(),
            newline: self.text(line.newline).to_string(),
        }
    }

    // === Module ===

    pub fn parse_tree(mut self) -> Result<SyntaxTree, ParseError> {
        let mut body = Vec::new();

        while let Some(peek) = self.peek() {
            if !peek.indent.is_empty() {
                return Err(ParseError::UnexpectedIndent { span: peek.content });
            }
            let Some((leading, line)) = self.take_line() else {
                break;
            };
            body.push(self.parse_statement(leading, line)?);
        }

        let mut footer = String::new();
        for raw in self.lines.drain(..) {
            if let RawLine::Trivia(span) = raw {
                footer.push_str(span.text(self.source));
            }
        }

        let module = Module {
            bom: false,
            body,
            footer,
        };
        Ok(SyntaxTree::new(module, self.next_id))
    }

    // === Blocks ===

    /// Parse the indented block that follows a header at `parent_indent`.
    fn parse_block(&mut self, parent_indent: usize, header: Span) -> Result<Vec<Statement>, ParseError> {
        let Some(first) = self.peek() else {
            return Err(ParseError::ExpectedIndentedBlock {
                span: Span::empty(header.end),
            });
        };
        if first.indent.len() <= parent_indent {
            return Err(ParseError::ExpectedIndentedBlock { span: first.content });
        }
        let indent = self.text(first.indent);

        let mut body = Vec::new();
        while let Some(next) = self.peek() {
            let next_indent = self.text(next.indent);
            if next_indent == indent {
                let Some((leading, line)) = self.take_line() else {
                    break;
                };
                body.push(self.parse_statement(leading, line)?);
            } else if next_indent.len() < indent.len() {
                if next_indent.len() > parent_indent {
                    return Err(ParseError::InconsistentDedent { span: next.indent });
                }
                break;
            } else {
                return Err(ParseError::UnexpectedIndent { span: next.content });
            }
        }

        Ok(body)
    }

    /// Split a block header at its colon and parse the suite after it.
    fn parse_header_and_suite(&mut self, leading: String, line: &LogicalLine) -> Result<(Line, Suite), ParseError> {
        let Some(colon) = line.header_colon() else {
            return Err(ParseError::unexpected(
                "':'",
                TokenKind::Newline,
                Span::empty(line.content.end),
            ));
        };

        if colon + 1 == line.tokens.len() {
            let header = self.make_line(leading, line);
            let body = self.parse_block(line.indent.len(), line.content)?;
            return Ok((header, Suite::Block(body)));
        }

        let colon_end = line.tokens[colon].0.span.end;
        let header = Line {
            leading,
            indent: self.text(line.indent).to_string(),
            text: self.text(Span::new(line.content.start, colon_end)).to_string(),
            newline: String::new(),
        };
        let suite = Suite::Inline {
            text: self.text(Span::new(colon_end, line.content.end)).to_string(),
            newline: self.text(line.newline).to_string(),
        };
        Ok((header, suite))
    }

    // === Statements ===

    fn parse_statement(&mut self, leading: String, line: LogicalLine) -> Result<Statement, ParseError> {
        let id = self.fresh_id();
        let second = line.kind_at(1);

        match line.first_kind() {
            TokenKind::At => self.parse_decorated(id, leading, line),
            TokenKind::Def => self.parse_function(id, Vec::new(), leading, line),
            TokenKind::Async if second == TokenKind::Def => {
                self.parse_function(id, Vec::new(), leading, line)
            }
            TokenKind::Class => self.parse_class(id, Vec::new(), leading, line),
            kind if kind.opens_compound() => self.parse_compound(id, leading, line),
            TokenKind::Async if matches!(second, TokenKind::For | TokenKind::With) => {
                self.parse_compound(id, leading, line)
            }
            kind if kind.continues_compound() => Err(ParseError::OrphanClause {
                keyword: self.text(line.tokens[0].0.span).to_string(),
                span: line.tokens[0].0.span,
            }),
            TokenKind::Name if self.is_soft_keyword_header(&line) => {
                self.parse_compound(id, leading, line)
            }
            _ => {
                self.check(&line, LineRole::Simple)?;
                let kind = self.classify(&line);
                Ok(Statement::simple(id, self.make_line(leading, &line), kind))
            }
        }
    }

    fn parse_decorated(&mut self, id: NodeId, leading: String, line: LogicalLine) -> Result<Statement, ParseError> {
        self.check(&line, LineRole::Decorator)?;
        let indent = self.text(line.indent);
        let mut last = line.content;
        let mut decorators = vec![self.make_line(leading, &line)];

        loop {
            let Some(peek) = self.peek() else {
                return Err(ParseError::DanglingDecorator { span: last });
            };
            if self.text(peek.indent) != indent {
                return Err(ParseError::DanglingDecorator { span: last });
            }
            let Some((leading, next)) = self.take_line() else {
                return Err(ParseError::DanglingDecorator { span: last });
            };
            match (next.first_kind(), next.kind_at(1)) {
                (TokenKind::At, _) => {
                    self.check(&next, LineRole::Decorator)?;
                    last = next.content;
                    decorators.push(self.make_line(leading, &next));
                }
                (TokenKind::Def, _) | (TokenKind::Async, TokenKind::Def) => {
                    return self.parse_function(id, decorators, leading, next);
                }
                (TokenKind::Class, _) => return self.parse_class(id, decorators, leading, next),
                _ => return Err(ParseError::DanglingDecorator { span: last }),
            }
        }
    }

    fn parse_function(
        &mut self,
        id: NodeId,
        decorators: Vec<Line>,
        leading: String,
        line: LogicalLine,
    ) -> Result<Statement, ParseError> {
        let is_async = line.first_kind() == TokenKind::Async;
        let name = self.definition_name(&line, if is_async { 2 } else { 1 })?;
        self.check(&line, LineRole::Function)?;
        let (header, body) = self.parse_header_and_suite(leading, &line)?;

        Ok(Statement {
            id,
            kind: StatementKind::Function(FunctionDef {
                name,
                is_async,
                decorators,
                header,
                body,
            }),
        })
    }

    fn parse_class(
        &mut self,
        id: NodeId,
        decorators: Vec<Line>,
        leading: String,
        line: LogicalLine,
    ) -> Result<Statement, ParseError> {
        let name = self.definition_name(&line, 1)?;
        self.check(&line, LineRole::Class)?;
        let (header, body) = self.parse_header_and_suite(leading, &line)?;

        Ok(Statement {
            id,
            kind: StatementKind::Class(ClassDef {
                name,
                decorators,
                header,
                body,
            }),
        })
    }

    fn definition_name(&self, line: &LogicalLine, index: usize) -> Result<String, ParseError> {
        match line.tokens.get(index) {
            Some((token, _)) if token.kind == TokenKind::Name => Ok(self.text(token.span).to_string()),
            Some((token, _)) => Err(ParseError::unexpected("identifier", token.kind, token.span)),
            None => Err(ParseError::unexpected(
                "identifier",
                TokenKind::Newline,
                Span::empty(line.content.end),
            )),
        }
    }

    fn parse_compound(&mut self, id: NodeId, leading: String, line: LogicalLine) -> Result<Statement, ParseError> {
        let keyword = if line.first_kind() == TokenKind::Async {
            format!("async {}", self.text(line.tokens[1].0.span))
        } else {
            self.text(line.tokens[0].0.span).to_string()
        };
        let indent = self.text(line.indent);

        let role = match keyword.as_str() {
            "match" if line.first_kind() == TokenKind::Name => LineRole::Match,
            "case" if line.first_kind() == TokenKind::Name => LineRole::Case,
            _ => LineRole::Clause,
        };
        self.check(&line, role)?;
        let (header, body) = self.parse_header_and_suite(leading, &line)?;
        let mut clauses = vec![Clause { header, body }];

        while let Some(peek) = self.peek() {
            if self.text(peek.indent) != indent || !peek.first.continues_compound() {
                break;
            }
            let Some((leading, next)) = self.take_line() else {
                break;
            };
            self.check(&next, LineRole::Clause)?;
            let (header, body) = self.parse_header_and_suite(leading, &next)?;
            clauses.push(Clause { header, body });
        }

        Ok(Statement {
            id,
            kind: StatementKind::Compound(CompoundStatement { keyword, clauses }),
        })
    }

    /// `match` and `case` are only keywords at the start of a block header.
    fn is_soft_keyword_header(&self, line: &LogicalLine) -> bool {
        let word = self.text(line.tokens[0].0.span);
        if word != "match" && word != "case" {
            return false;
        }
        let Some(colon) = line.header_colon() else {
            return false;
        };
        if colon < 2 {
            return false;
        }

        let second = line.tokens[1].0;
        let rejected = match second.kind {
            TokenKind::ColonEq
            | TokenKind::Dot
            | TokenKind::Comma
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace
            | TokenKind::Semicolon => true,
            TokenKind::Operator => is_assignment(self.text(second.span)),
            _ => false,
        };
        if rejected {
            return false;
        }

        word == "case" || colon + 1 == line.tokens.len()
    }

    fn classify(&self, line: &LogicalLine) -> SimpleKind {
        match line.tokens.as_slice() {
            _ if self.is_docstring_line(line) => SimpleKind::StringLiteral,
            [(token, _)] if token.kind == TokenKind::Pass => SimpleKind::Pass,
            [(token, _)] if token.kind == TokenKind::Ellipsis => SimpleKind::Ellipsis,
            [(first, _), ..] if matches!(first.kind, TokenKind::Import | TokenKind::From) => {
                SimpleKind::Import
            }
            _ => SimpleKind::Other,
        }
    }

    /// One or more adjacent plain string literals, optionally wrapped in
    /// parentheses and followed by a single `;`.
    fn is_docstring_line(&self, line: &LogicalLine) -> bool {
        let mut inner: &[(Token, usize)] = match line.tokens.as_slice() {
            [rest @ .., (last, _)] if last.kind == TokenKind::Semicolon => rest,
            all => all,
        };
        while let [(open, _), middle @ .., (close, _)] = inner {
            if open.kind != TokenKind::LParen || close.kind != TokenKind::RParen {
                break;
            }
            inner = middle;
        }

        !inner.is_empty()
            && inner.iter().all(|(token, _)| {
                token.kind.is_string()
                    && matches!(string_prefix(self.text(token.span)).as_str(), "" | "r" | "u")
            })
    }
}

fn is_assignment(op: &str) -> bool {
    op.ends_with('=') && !matches!(op, "==" | "<=" | ">=" | "!=")
}
