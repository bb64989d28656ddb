//! Statement grammar check
//!
//! The block parser only needs line structure, so every logical line is
//! checked here against Python's statement, expression and pattern grammar
//! before it is stored. Nothing is built: a line either passes or yields an
//! error at the first token that cannot continue it.

use docsmith_ast::Span;
use docsmith_lexer::TokenKind;

use crate::lines::LogicalLine;
use crate::ParseError;

/// How the block parser uses a logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    /// One or more `;`-separated simple statements
    Simple,
    Decorator,
    Function,
    Class,
    /// `if`, `for`, `while`, `try`, `with` and their continuation clauses
    Clause,
    Match,
    Case,
}

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in",
    "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with",
    "yield",
];

/// Longest first, so splitting is maximal munch.
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "->", "**", "//", ">>", "<<", "<=", ">=", "==", "!=", "+=", "-=",
    "*=", "/=", "%=", "&=", "|=", "^=", "+", "-", "*", "/", "%", "&", "|", "^", "~", "<", ">", "=",
];

const AUGMENTED: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "@=", "&=", "|=", "^=", ">>=", "<<=", "**=",
];

const BINARY: &[&str] = &["|", "^", "&", "<<", ">>", "+", "-", "*", "/", "//", "%", "@", "**"];

const COMPARISON: &[&str] = &["==", "!=", "<", ">", "<=", ">="];

/// Check one logical line in the given role.
pub fn check_line(source: &str, line: &LogicalLine, role: LineRole) -> Result<(), ParseError> {
    let mut checker = Checker::new(source, line)?;
    match role {
        LineRole::Simple => checker.simple_statements(),
        LineRole::Decorator => {
            checker.expect("@")?;
            checker.named_expression()?;
            checker.finish()
        }
        LineRole::Function => checker.function_header(),
        LineRole::Class => checker.class_header(),
        LineRole::Clause => checker.clause_header(),
        LineRole::Match => {
            checker.advance();
            checker.expression_list(Checker::star_named_expression)?;
            checker.suite()
        }
        LineRole::Case => {
            checker.advance();
            checker.case_patterns()?;
            if checker.eat("if") {
                checker.named_expression()?;
            }
            checker.suite()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Word,
    Number,
    Str,
    Op,
}

#[derive(Debug, Clone, Copy)]
struct Tok<'a> {
    kind: Kind,
    text: &'a str,
    span: Span,
}

impl Tok<'_> {
    fn is_identifier(&self) -> bool {
        self.kind == Kind::Word && !KEYWORDS.contains(&self.text)
    }

    fn describe(&self) -> String {
        match self.kind {
            Kind::Word if !self.is_identifier() => format!("'{}'", self.text),
            Kind::Word => "identifier".to_string(),
            Kind::Number => "number".to_string(),
            Kind::Str => "string".to_string(),
            Kind::Op => format!("'{}'", self.text),
        }
    }
}

/// What an expression can be used for on the left of `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Name,
    /// Attribute or subscript
    Member,
    Starred { target: bool },
    /// Tuple or list display
    Sequence { target: bool },
    Other,
}

impl Shape {
    fn is_target(self) -> bool {
        match self {
            Shape::Name | Shape::Member => true,
            Shape::Starred { target } | Shape::Sequence { target } => target,
            Shape::Other => false,
        }
    }

    fn is_single_target(self) -> bool {
        matches!(self, Shape::Name | Shape::Member)
    }
}

type Rule<'a> = fn(&mut Checker<'a>) -> Result<Shape, ParseError>;

struct Checker<'a> {
    toks: Vec<Tok<'a>>,
    pos: usize,
    end: Span,
}

impl<'a> Checker<'a> {
    fn new(source: &'a str, line: &LogicalLine) -> Result<Self, ParseError> {
        let mut toks: Vec<Tok<'a>> = Vec::with_capacity(line.tokens.len());
        for (token, _) in &line.tokens {
            let text = token.text(source);
            let kind = match token.kind {
                TokenKind::Operator => {
                    split_operator(source, token.span, &mut toks)?;
                    continue;
                }
                TokenKind::Number => Kind::Number,
                kind if kind.is_word() => Kind::Word,
                kind if kind.is_string() => Kind::Str,
                _ => Kind::Op,
            };
            toks.push(Tok {
                kind,
                text,
                span: token.span,
            });
        }

        Ok(Self {
            toks,
            pos: 0,
            end: Span::empty(line.content.end),
        })
    }

    // === Cursor ===

    fn peek(&self) -> Option<Tok<'a>> {
        self.toks.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<Tok<'a>> {
        self.toks.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn at(&self, text: &str) -> bool {
        self.peek().is_some_and(|tok| tok.kind != Kind::Str && tok.text == text)
    }

    fn at_any(&self, texts: &[&str]) -> bool {
        texts.iter().any(|text| self.at(text))
    }

    fn eat(&mut self, text: &str) -> bool {
        let found = self.at(text);
        if found {
            self.advance();
        }
        found
    }

    fn expect(&mut self, text: &str) -> Result<(), ParseError> {
        if self.eat(text) {
            Ok(())
        } else {
            Err(self.error(&format!("'{text}'")))
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn finish(&self) -> Result<(), ParseError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("end of line"))
        }
    }

    fn error(&self, expected: &str) -> ParseError {
        let (found, span) = match self.peek() {
            Some(tok) => (tok.describe(), tok.span),
            None => ("end of line".to_string(), self.end),
        };
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found,
            span,
        }
    }

    /// Span from token `start` up to the last consumed token.
    fn since(&self, start: usize) -> Span {
        let first = self.toks.get(start).map_or(self.end, |tok| tok.span);
        let last = self.pos.checked_sub(1).and_then(|i| self.toks.get(i)).map_or(first, |tok| tok.span);
        Span::new(first.start, last.end.max(first.start))
    }

    fn cannot_assign(&self, start: usize) -> ParseError {
        ParseError::InvalidSyntax {
            message: "cannot assign to expression".to_string(),
            span: self.since(start),
        }
    }

    fn name(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Some(tok) if tok.is_identifier() => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn starts_expression(&self) -> bool {
        let Some(tok) = self.peek() else {
            return false;
        };
        match tok.kind {
            Kind::Number | Kind::Str => true,
            Kind::Word => {
                tok.is_identifier()
                    || matches!(tok.text, "True" | "False" | "None" | "not" | "lambda" | "await")
            }
            Kind::Op => matches!(tok.text, "(" | "[" | "{" | "-" | "+" | "~" | "*" | "..."),
        }
    }

    fn at_comprehension(&self) -> bool {
        self.at("for") || (self.at("async") && self.peek_at(1).is_some_and(|tok| tok.text == "for"))
    }

    // === Statements ===

    fn simple_statements(&mut self) -> Result<(), ParseError> {
        loop {
            self.small_statement()?;
            if !self.eat(";") || self.at_end() {
                break;
            }
        }
        self.finish()
    }

    fn small_statement(&mut self) -> Result<(), ParseError> {
        let Some(tok) = self.peek() else {
            return Err(self.error("statement"));
        };
        match tok.text {
            "pass" | "break" | "continue" => {
                self.advance();
                Ok(())
            }
            "return" => {
                self.advance();
                if self.starts_expression() {
                    self.star_expressions()?;
                }
                Ok(())
            }
            "raise" => {
                self.advance();
                if self.starts_expression() {
                    self.expression()?;
                    if self.eat("from") {
                        self.expression()?;
                    }
                }
                Ok(())
            }
            "global" | "nonlocal" => {
                self.advance();
                self.name()?;
                while self.eat(",") {
                    self.name()?;
                }
                Ok(())
            }
            "del" => {
                self.advance();
                let start = self.pos;
                if !self.target_list()?.is_target() {
                    return Err(self.cannot_assign(start));
                }
                Ok(())
            }
            "assert" => {
                self.advance();
                self.expression()?;
                if self.eat(",") {
                    self.expression()?;
                }
                Ok(())
            }
            "import" => {
                self.advance();
                self.import_names()
            }
            "from" => self.import_from(),
            "type" if self.at_type_alias() => self.type_alias(),
            _ => self.expression_statement(),
        }
    }

    fn import_names(&mut self) -> Result<(), ParseError> {
        loop {
            self.dotted_name()?;
            if self.eat("as") {
                self.name()?;
            }
            if !self.eat(",") {
                return Ok(());
            }
        }
    }

    fn dotted_name(&mut self) -> Result<(), ParseError> {
        self.name()?;
        while self.eat(".") {
            self.name()?;
        }
        Ok(())
    }

    fn import_from(&mut self) -> Result<(), ParseError> {
        self.advance();
        let mut relative = false;
        while self.eat(".") || self.eat("...") {
            relative = true;
        }
        if !self.at("import") || !relative {
            self.dotted_name()?;
        }
        self.expect("import")?;
        if self.eat("*") {
            return Ok(());
        }

        let parenthesized = self.eat("(");
        loop {
            self.name()?;
            if self.eat("as") {
                self.name()?;
            }
            if !self.eat(",") || (parenthesized && self.at(")")) {
                break;
            }
        }
        if parenthesized {
            self.expect(")")?;
        }
        Ok(())
    }

    fn at_type_alias(&self) -> bool {
        self.peek_at(1).is_some_and(|tok| tok.is_identifier())
            && self.peek_at(2).is_some_and(|tok| matches!(tok.text, "=" | "["))
    }

    fn type_alias(&mut self) -> Result<(), ParseError> {
        self.advance();
        self.name()?;
        if self.at("[") {
            self.type_params()?;
        }
        self.expect("=")?;
        self.expression().map(|_| ())
    }

    fn expression_statement(&mut self) -> Result<(), ParseError> {
        if self.at("yield") {
            return self.yield_expression().map(|_| ());
        }

        let mut start = self.pos;
        let mut shape = self.star_expressions()?;

        if self.peek().is_some_and(|tok| tok.kind == Kind::Op && AUGMENTED.contains(&tok.text)) {
            if !shape.is_single_target() {
                return Err(self.cannot_assign(start));
            }
            self.advance();
            return self.assigned_value().map(|_| ());
        }

        if self.at(":") {
            if !shape.is_single_target() {
                return Err(self.cannot_assign(start));
            }
            self.advance();
            self.expression()?;
            if self.eat("=") {
                self.assigned_value()?;
            }
            return Ok(());
        }

        if !self.at("=") {
            if let Shape::Starred { .. } = shape {
                return Err(ParseError::InvalidSyntax {
                    message: "cannot use starred expression here".to_string(),
                    span: self.since(start),
                });
            }
            return Ok(());
        }
        while self.at("=") {
            if !shape.is_target() {
                return Err(self.cannot_assign(start));
            }
            self.advance();
            start = self.pos;
            shape = self.assigned_value()?;
        }
        Ok(())
    }

    fn assigned_value(&mut self) -> Result<Shape, ParseError> {
        if self.at("yield") {
            self.yield_expression()
        } else {
            self.star_expressions()
        }
    }

    fn yield_expression(&mut self) -> Result<Shape, ParseError> {
        self.advance();
        if self.eat("from") {
            self.expression()?;
        } else if self.starts_expression() {
            self.star_expressions()?;
        }
        Ok(Shape::Other)
    }

    // === Compound headers ===

    /// `:` followed by nothing (an indented block comes next) or by an
    /// inline body.
    fn suite(&mut self) -> Result<(), ParseError> {
        self.expect(":")?;
        if self.at_end() {
            Ok(())
        } else {
            self.simple_statements()
        }
    }

    fn function_header(&mut self) -> Result<(), ParseError> {
        self.eat("async");
        self.expect("def")?;
        self.name()?;
        if self.at("[") {
            self.type_params()?;
        }
        self.expect("(")?;
        self.parameters(")", true)?;
        self.expect(")")?;
        if self.eat("->") {
            self.expression()?;
        }
        self.suite()
    }

    fn class_header(&mut self) -> Result<(), ParseError> {
        self.expect("class")?;
        self.name()?;
        if self.at("[") {
            self.type_params()?;
        }
        if self.eat("(") {
            self.arguments()?;
            self.expect(")")?;
        }
        self.suite()
    }

    fn clause_header(&mut self) -> Result<(), ParseError> {
        let Some(tok) = self.peek() else {
            return Err(self.error("statement"));
        };
        match tok.text {
            "if" | "elif" | "while" => {
                self.advance();
                self.named_expression()?;
            }
            "else" | "try" | "finally" => self.advance(),
            "except" => self.except_clause()?,
            "with" => self.with_items()?,
            "for" => self.for_header()?,
            "async" => {
                self.advance();
                if self.at("with") {
                    self.with_items()?;
                } else {
                    self.for_header()?;
                }
            }
            _ => return Err(self.error("compound statement")),
        }
        self.suite()
    }

    fn for_header(&mut self) -> Result<(), ParseError> {
        self.expect("for")?;
        let start = self.pos;
        if !self.target_list()?.is_target() {
            return Err(self.cannot_assign(start));
        }
        self.expect("in")?;
        self.star_expressions().map(|_| ())
    }

    fn except_clause(&mut self) -> Result<(), ParseError> {
        self.advance();
        self.eat("*");
        if self.at(":") {
            return Ok(());
        }
        self.expression()?;
        if self.eat("as") {
            self.name()?;
        } else {
            while self.eat(",") {
                self.expression()?;
            }
        }
        Ok(())
    }

    fn with_items(&mut self) -> Result<(), ParseError> {
        self.advance();
        if self.at("(") {
            let saved = self.pos;
            if self.parenthesized_with_items().is_ok() && self.at(":") {
                return Ok(());
            }
            self.pos = saved;
        }
        loop {
            self.with_item()?;
            if !self.eat(",") {
                return Ok(());
            }
        }
    }

    fn parenthesized_with_items(&mut self) -> Result<(), ParseError> {
        self.advance();
        loop {
            self.with_item()?;
            if !self.eat(",") || self.at(")") {
                break;
            }
        }
        self.expect(")")
    }

    fn with_item(&mut self) -> Result<(), ParseError> {
        self.expression()?;
        if self.eat("as") {
            let start = self.pos;
            if !self.target_item()?.is_target() {
                return Err(self.cannot_assign(start));
            }
        }
        Ok(())
    }

    /// Parameter list of a `def` (with annotations) or a `lambda`, up to
    /// but not including `close`.
    fn parameters(&mut self, close: &str, annotations: bool) -> Result<(), ParseError> {
        let mut any = false;
        let mut seen_default = false;
        let mut seen_star = false;
        let mut seen_slash = false;
        let mut bare_star = false;

        while !self.at(close) {
            if self.at("**") {
                if bare_star {
                    return Err(self.error("keyword parameter after bare '*'"));
                }
                self.advance();
                self.parameter(annotations, false)?;
                self.eat(",");
                if !self.at(close) {
                    return Err(self.error(&format!("'{close}' after '**' parameter")));
                }
                return Ok(());
            } else if self.at("*") {
                if seen_star {
                    return Err(self.error("parameter"));
                }
                self.advance();
                seen_star = true;
                if self.at(",") || self.at(close) {
                    bare_star = true;
                } else {
                    self.parameter(annotations, true)?;
                }
            } else if self.at("/") {
                if !any || seen_slash || seen_star {
                    return Err(self.error("parameter"));
                }
                self.advance();
                seen_slash = true;
            } else {
                let start = self.pos;
                self.parameter(annotations, false)?;
                if self.eat("=") {
                    self.expression()?;
                    seen_default = true;
                } else if seen_default && !seen_star {
                    return Err(ParseError::InvalidSyntax {
                        message: "parameter without a default follows parameter with a default".to_string(),
                        span: self.since(start),
                    });
                }
                bare_star = false;
            }
            any = true;
            if !self.eat(",") {
                break;
            }
        }

        if bare_star {
            return Err(self.error("keyword parameter after bare '*'"));
        }
        Ok(())
    }

    fn parameter(&mut self, annotations: bool, starred: bool) -> Result<(), ParseError> {
        self.name()?;
        if annotations && self.eat(":") {
            if starred {
                self.star_expression()?;
            } else {
                self.expression()?;
            }
        }
        Ok(())
    }

    fn type_params(&mut self) -> Result<(), ParseError> {
        self.expect("[")?;
        loop {
            let starred = self.eat("*") || self.eat("**");
            self.name()?;
            if !starred && self.eat(":") {
                self.expression()?;
            }
            if self.eat("=") {
                self.star_expression()?;
            }
            if !self.eat(",") || self.at("]") {
                break;
            }
        }
        self.expect("]")
    }

    // === Expressions ===

    fn star_expressions(&mut self) -> Result<Shape, ParseError> {
        self.expression_list(Self::star_expression)
    }

    /// `item (',' item)* [',']`; a single item without a comma keeps its shape.
    fn expression_list(&mut self, item: Rule<'a>) -> Result<Shape, ParseError> {
        let first = item(self)?;
        if !self.at(",") {
            return Ok(first);
        }
        let mut target = first.is_target();
        while self.eat(",") {
            if !self.starts_expression() {
                break;
            }
            target &= item(self)?.is_target();
        }
        Ok(Shape::Sequence { target })
    }

    fn star_expression(&mut self) -> Result<Shape, ParseError> {
        if self.eat("*") {
            let inner = self.arithmetic()?;
            return Ok(Shape::Starred {
                target: inner.is_target(),
            });
        }
        self.expression()
    }

    fn star_named_expression(&mut self) -> Result<Shape, ParseError> {
        if self.at("*") {
            return self.star_expression();
        }
        self.named_expression()
    }

    fn named_expression(&mut self) -> Result<Shape, ParseError> {
        let walrus = self.peek().is_some_and(|tok| tok.is_identifier())
            && self.peek_at(1).is_some_and(|tok| tok.text == ":=");
        if walrus {
            self.pos += 2;
            self.expression()?;
            return Ok(Shape::Other);
        }
        self.expression()
    }

    fn expression(&mut self) -> Result<Shape, ParseError> {
        if self.at("lambda") {
            return self.lambda();
        }
        let shape = self.disjunction()?;
        if self.eat("if") {
            self.disjunction()?;
            self.expect("else")?;
            self.expression()?;
            return Ok(Shape::Other);
        }
        Ok(shape)
    }

    fn lambda(&mut self) -> Result<Shape, ParseError> {
        self.advance();
        self.parameters(":", false)?;
        self.expect(":")?;
        self.expression()?;
        Ok(Shape::Other)
    }

    fn disjunction(&mut self) -> Result<Shape, ParseError> {
        let mut shape = self.conjunction()?;
        while self.eat("or") {
            self.conjunction()?;
            shape = Shape::Other;
        }
        Ok(shape)
    }

    fn conjunction(&mut self) -> Result<Shape, ParseError> {
        let mut shape = self.inversion()?;
        while self.eat("and") {
            self.inversion()?;
            shape = Shape::Other;
        }
        Ok(shape)
    }

    fn inversion(&mut self) -> Result<Shape, ParseError> {
        if self.eat("not") {
            self.inversion()?;
            return Ok(Shape::Other);
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Shape, ParseError> {
        let mut shape = self.arithmetic()?;
        loop {
            let symbol = self.peek().is_some_and(|tok| tok.kind == Kind::Op && COMPARISON.contains(&tok.text));
            if symbol || self.at("in") {
                self.advance();
            } else if self.at("not") && self.peek_at(1).is_some_and(|tok| tok.text == "in") {
                self.pos += 2;
            } else if self.eat("is") {
                self.eat("not");
            } else {
                return Ok(shape);
            }
            self.arithmetic()?;
            shape = Shape::Other;
        }
    }

    /// Binary operators share one level; precedence does not change which
    /// token sequences are valid.
    fn arithmetic(&mut self) -> Result<Shape, ParseError> {
        let mut shape = self.unary()?;
        while self.peek().is_some_and(|tok| tok.kind == Kind::Op && BINARY.contains(&tok.text)) {
            self.advance();
            self.unary()?;
            shape = Shape::Other;
        }
        Ok(shape)
    }

    fn unary(&mut self) -> Result<Shape, ParseError> {
        if self.at_any(&["+", "-", "~"]) {
            self.advance();
            self.unary()?;
            return Ok(Shape::Other);
        }
        if self.eat("await") {
            self.primary()?;
            return Ok(Shape::Other);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Shape, ParseError> {
        let mut shape = self.atom()?;
        loop {
            if self.eat(".") {
                self.name()?;
                shape = Shape::Member;
            } else if self.eat("(") {
                self.arguments()?;
                self.expect(")")?;
                shape = Shape::Other;
            } else if self.eat("[") {
                self.slices()?;
                self.expect("]")?;
                shape = Shape::Member;
            } else {
                return Ok(shape);
            }
        }
    }

    fn atom(&mut self) -> Result<Shape, ParseError> {
        let Some(tok) = self.peek() else {
            return Err(self.error("expression"));
        };
        match tok.kind {
            Kind::Number => {
                self.advance();
                Ok(Shape::Other)
            }
            Kind::Str => {
                while self.peek().is_some_and(|tok| tok.kind == Kind::Str) {
                    self.advance();
                }
                Ok(Shape::Other)
            }
            Kind::Word if matches!(tok.text, "True" | "False" | "None") => {
                self.advance();
                Ok(Shape::Other)
            }
            Kind::Word if tok.is_identifier() => {
                self.advance();
                Ok(Shape::Name)
            }
            Kind::Op => match tok.text {
                "(" => self.parenthesized(),
                "[" => self.list_display(),
                "{" => self.brace_display(),
                "..." => {
                    self.advance();
                    Ok(Shape::Other)
                }
                _ => Err(self.error("expression")),
            },
            Kind::Word => Err(self.error("expression")),
        }
    }

    fn parenthesized(&mut self) -> Result<Shape, ParseError> {
        let start = self.pos;
        self.advance();
        if self.eat(")") {
            return Ok(Shape::Sequence { target: true });
        }
        if self.at("yield") {
            self.yield_expression()?;
            self.expect(")")?;
            return Ok(Shape::Other);
        }

        let first = self.star_named_expression()?;
        if self.at_comprehension() {
            self.comprehension()?;
            self.expect(")")?;
            return Ok(Shape::Other);
        }
        if self.eat(")") {
            if let Shape::Starred { .. } = first {
                return Err(ParseError::InvalidSyntax {
                    message: "cannot use starred expression here".to_string(),
                    span: self.since(start),
                });
            }
            return Ok(first);
        }

        let mut target = first.is_target();
        while self.eat(",") {
            if self.at(")") {
                break;
            }
            target &= self.star_named_expression()?.is_target();
        }
        self.expect(")")?;
        Ok(Shape::Sequence { target })
    }

    fn list_display(&mut self) -> Result<Shape, ParseError> {
        self.advance();
        if self.eat("]") {
            return Ok(Shape::Sequence { target: true });
        }

        let first = self.star_named_expression()?;
        if self.at_comprehension() {
            self.comprehension()?;
            self.expect("]")?;
            return Ok(Shape::Other);
        }

        let mut target = first.is_target();
        while self.eat(",") {
            if self.at("]") {
                break;
            }
            target &= self.star_named_expression()?.is_target();
        }
        self.expect("]")?;
        Ok(Shape::Sequence { target })
    }

    fn brace_display(&mut self) -> Result<Shape, ParseError> {
        self.advance();
        if self.eat("}") {
            return Ok(Shape::Other);
        }

        let dict = if self.eat("**") {
            self.arithmetic()?;
            true
        } else {
            self.star_named_expression()?;
            if self.eat(":") {
                self.expression()?;
                true
            } else {
                false
            }
        };
        if self.at_comprehension() {
            self.comprehension()?;
            self.expect("}")?;
            return Ok(Shape::Other);
        }

        while self.eat(",") {
            if self.at("}") {
                break;
            }
            if !dict {
                self.star_named_expression()?;
            } else if self.eat("**") {
                self.arithmetic()?;
            } else {
                self.expression()?;
                self.expect(":")?;
                self.expression()?;
            }
        }
        self.expect("}")?;
        Ok(Shape::Other)
    }

    fn comprehension(&mut self) -> Result<(), ParseError> {
        while self.at_comprehension() {
            self.eat("async");
            self.expect("for")?;
            let start = self.pos;
            if !self.target_list()?.is_target() {
                return Err(self.cannot_assign(start));
            }
            self.expect("in")?;
            self.disjunction()?;
            while self.eat("if") {
                self.disjunction()?;
            }
        }
        Ok(())
    }

    /// Targets of `for`, `del` and comprehensions. Items stop below the
    /// comparison level so `in` is left for the caller.
    fn target_list(&mut self) -> Result<Shape, ParseError> {
        self.expression_list(Self::target_item)
    }

    fn target_item(&mut self) -> Result<Shape, ParseError> {
        if self.eat("*") {
            let inner = self.arithmetic()?;
            return Ok(Shape::Starred {
                target: inner.is_target(),
            });
        }
        self.arithmetic()
    }

    /// Call arguments, up to but not including `)`.
    fn arguments(&mut self) -> Result<(), ParseError> {
        while !self.at(")") {
            let keyword = self.peek().is_some_and(|tok| tok.is_identifier())
                && self.peek_at(1).is_some_and(|tok| tok.text == "=");
            if self.eat("*") || self.eat("**") {
                self.expression()?;
            } else if keyword {
                self.pos += 2;
                self.expression()?;
            } else {
                self.named_expression()?;
                if self.at_comprehension() {
                    self.comprehension()?;
                }
            }
            if !self.eat(",") {
                break;
            }
        }
        Ok(())
    }

    fn slices(&mut self) -> Result<(), ParseError> {
        loop {
            self.slice()?;
            if !self.eat(",") || self.at("]") {
                return Ok(());
            }
        }
    }

    fn slice(&mut self) -> Result<(), ParseError> {
        if self.at("*") {
            self.star_expression()?;
            return Ok(());
        }
        if !self.at(":") {
            self.named_expression()?;
            if !self.at(":") {
                return Ok(());
            }
        }
        self.expect(":")?;
        if self.starts_expression() {
            self.expression()?;
        }
        if self.eat(":") && self.starts_expression() {
            self.expression()?;
        }
        Ok(())
    }

    // === Patterns ===

    fn case_patterns(&mut self) -> Result<(), ParseError> {
        if self.at(":") {
            return Err(self.error("pattern"));
        }
        self.pattern_sequence(&[":", "if"])
    }

    fn pattern_sequence(&mut self, stop: &[&str]) -> Result<(), ParseError> {
        while !self.at_any(stop) {
            if self.eat("*") {
                self.name()?;
            } else {
                self.pattern()?;
            }
            if !self.eat(",") {
                break;
            }
        }
        Ok(())
    }

    fn pattern(&mut self) -> Result<(), ParseError> {
        self.closed_pattern()?;
        while self.eat("|") {
            self.closed_pattern()?;
        }
        if self.eat("as") {
            self.name()?;
        }
        Ok(())
    }

    fn closed_pattern(&mut self) -> Result<(), ParseError> {
        let Some(tok) = self.peek() else {
            return Err(self.error("pattern"));
        };
        match (tok.kind, tok.text) {
            (Kind::Number, _) | (Kind::Op, "-") => self.number_pattern(),
            (Kind::Str, _) => {
                while self.peek().is_some_and(|tok| tok.kind == Kind::Str) {
                    self.advance();
                }
                Ok(())
            }
            (Kind::Word, "None" | "True" | "False") => {
                self.advance();
                Ok(())
            }
            (Kind::Word, _) if tok.is_identifier() => {
                self.dotted_name()?;
                if self.eat("(") {
                    self.class_pattern_arguments()?;
                    self.expect(")")?;
                }
                Ok(())
            }
            (Kind::Op, "(") => {
                self.advance();
                self.pattern_sequence(&[")"])?;
                self.expect(")")
            }
            (Kind::Op, "[") => {
                self.advance();
                self.pattern_sequence(&["]"])?;
                self.expect("]")
            }
            (Kind::Op, "{") => {
                self.advance();
                self.mapping_pattern_items()?;
                self.expect("}")
            }
            _ => Err(self.error("pattern")),
        }
    }

    fn number_pattern(&mut self) -> Result<(), ParseError> {
        self.eat("-");
        self.number()?;
        if self.at_any(&["+", "-"]) {
            self.advance();
            self.number()?;
        }
        Ok(())
    }

    fn number(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Some(tok) if tok.kind == Kind::Number => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error("number")),
        }
    }

    fn class_pattern_arguments(&mut self) -> Result<(), ParseError> {
        while !self.at(")") {
            let keyword = self.peek().is_some_and(|tok| tok.is_identifier())
                && self.peek_at(1).is_some_and(|tok| tok.text == "=");
            if keyword {
                self.pos += 2;
            }
            self.pattern()?;
            if !self.eat(",") {
                break;
            }
        }
        Ok(())
    }

    fn mapping_pattern_items(&mut self) -> Result<(), ParseError> {
        while !self.at("}") {
            if self.eat("**") {
                self.name()?;
                self.eat(",");
                return Ok(());
            } else {
                self.closed_pattern()?;
                self.expect(":")?;
                self.pattern()?;
            }
            if !self.eat(",") {
                break;
            }
        }
        Ok(())
    }
}

/// Split a run of operator characters into Python operators.
fn split_operator<'a>(source: &'a str, span: Span, toks: &mut Vec<Tok<'a>>) -> Result<(), ParseError> {
    let mut at = span.start;
    while at < span.end {
        let rest = &source[at..span.end];
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            let width = rest.chars().next().map_or(1, char::len_utf8);
            return Err(ParseError::InvalidToken {
                span: Span::new(at, at + width),
            });
        };
        let piece = Span::new(at, at + op.len());

        // `@` is its own token, so `@=` arrives in two parts
        let after_at = toks.last().is_some_and(|prev| prev.text == "@" && prev.span.end == at);
        match toks.last_mut() {
            Some(prev) if *op == "=" && after_at => {
                prev.span = Span::new(prev.span.start, piece.end);
                prev.text = prev.span.text(source);
            }
            _ => toks.push(Tok {
                kind: Kind::Op,
                text: piece.text(source),
                span: piece,
            }),
        }
        at = piece.end;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::parse;

    fn accepts(source: &str) {
        if let Err(e) = parse(source) {
            panic!("{source:?} should parse, got {e:?}");
        }
    }

    fn rejects(source: &str) {
        assert!(parse(source).is_err(), "{source:?} should not parse");
    }

    #[test]
    fn test_broken_definitions_are_rejected() {
        rejects("def f(:):\n    pass\n");
        rejects("def f(x y):\n    pass\n");
        rejects("def f(a=1, b):\n    pass\n");
        rejects("def f(*):\n    pass\n");
        rejects("def f(**kw, x):\n    pass\n");
        rejects("def (x):\n    pass\n");
        rejects("def f(x) -> :\n    pass\n");
        rejects("class A(:\n    pass\n)\n");
        rejects("class A(metaclass=):\n    pass\n");
    }

    #[test]
    fn test_broken_statements_are_rejected() {
        rejects("def f(x):\n    return return\n");
        rejects("x = = 1\ndef g():\n    pass\n");
        rejects("print 'hello'\n");
        rejects("x = 1 +\n");
        rejects("f() = 3\n");
        rejects("a, b += 1\n");
        rejects("import\n");
        rejects("from x import\n");
        rejects("x = (1, 2\n)\n)\n");
        rejects("lambda x x: 1\n");
        rejects("x := 1\n");
        rejects("x = a !b\n");
        rejects("del f()\n");
    }

    #[test]
    fn test_broken_headers_are_rejected() {
        rejects("if :\n    pass\n");
        rejects("for 1 in x:\n    pass\n");
        rejects("for x y:\n    pass\n");
        rejects("while x y:\n    pass\n");
        rejects("with open(p) as f():\n    pass\n");
        rejects("try:\n    pass\nexcept E as 1:\n    pass\n");
        rejects("if x:\n    pass\nelse x:\n    pass\n");
        rejects("@\ndef f():\n    pass\n");
        rejects("@decorator()\n@)\ndef f():\n    pass\n");
    }

    #[test]
    fn test_statement_forms_are_accepted() {
        accepts("x = y = [i * 2 for i in range(10) if i % 2]\n");
        accepts("a, *rest = b\n(c, d) = e\n[f, g] = h\n");
        accepts("x: int\ny: dict[str, int] = {}\nself.z: float = 0.5\n");
        accepts("count += 1\nm @= n\nx=-1\ny==-1\nz**=-2\n");
        accepts("from . import a\nfrom ..pkg.mod import (b as c, d,)\nimport os.path as p, sys\nfrom m import *\n");
        accepts("global a, b\ndel a[0], b.c\nassert x, 'msg'\nraise E from None\nraise\n");
        accepts("value = yield\nyield from gen()\nx = await fetch(*args, **kwargs)\n");
        accepts("f = lambda a, b=1, *c, d, **e: (a, b, c, d, e)\nkey = lambda: 0\n");
        accepts("y = a if b else c; z = not a or b and c is not d; w = a not in b\n");
        accepts("s = {**a, 'b': 1}\nt = {*a, *b}\nu = {k: v for k, v in items}\nv = (x for x in y)\n");
        accepts("m[1:2, ::3, ...]\nn[*idx]\nprint(f'{x!r}', 'a' 'b', sep='', end=\"\")\n");
        accepts("if (n := len(a)) > 10: pass\n");
        accepts("type Alias[T] = list[T]\ntype = 5\nmatch = re.match(p, s)\n");
        accepts("x = 1e-5 + 0x1F - 1_000j + .5\n...\n");
    }

    #[test]
    fn test_header_forms_are_accepted() {
        accepts("async def f[T](a, /, b: int = 1, *args: *Ts, c, **kw) -> list[T]:\n    pass\n");
        accepts("class A[T](Base, metaclass=Meta):\n    pass\n");
        accepts("@app.route('/x', methods=['GET'])\n@property\ndef f(): pass\n");
        accepts("for i, (a, b) in enumerate(pairs):\n    pass\nelse:\n    pass\n");
        accepts("async def f():\n    async for x in aiter(): pass\n    async with a as b, c: pass\n");
        accepts("with (open(p) as f, open(q) as g):\n    pass\nwith (a, b) as c:\n    pass\n");
        accepts("try:\n    pass\nexcept (A, B) as e:\n    pass\nexcept* C:\n    pass\nexcept:\n    pass\nfinally:\n    pass\n");
        accepts("while chunk := f.read(): pass\n");
    }

    #[test]
    fn test_match_patterns() {
        accepts(
            "match command.split():\n\
             \x20   case [action]: pass\n\
             \x20   case [\"go\", *rest] | (\"walk\", *rest): pass\n\
             \x20   case Point(x=0, y=-1) as p if p: pass\n\
             \x20   case {\"k\": 1, **others}: pass\n\
             \x20   case Color.RED | -1 | 1+2j | None: pass\n\
             \x20   case str() | bytes(): pass\n\
             \x20   case _: pass\n",
        );
        rejects("match x:\n    case 1 +: pass\n");
        rejects("match x:\n    case [a b]: pass\n");
        rejects("match x:\n    case {**rest, \"k\": 1}: pass\n");
    }
}
