//! Token definitions for Python source

use logos::{Lexer, Logos};

/// Python token kinds.
///
/// Nothing is skipped: whitespace, comments, newlines and backslash
/// continuations are tokens too, so the token spans tile the whole input.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // === Layout ===
    #[regex(r"[ \t\x0C]+")]
    Whitespace,
    #[regex(r"\r\n|\n|\r")]
    Newline,
    #[regex(r"\\(\r\n|\n|\r)")]
    Continuation,
    #[regex(r"#[^\r\n]*")]
    Comment,

    // === Keywords ===
    #[token("def")]
    Def,
    #[token("class")]
    Class,
    #[token("async")]
    Async,
    #[token("pass")]
    Pass,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("try")]
    Try,
    #[token("except")]
    Except,
    #[token("finally")]
    Finally,
    #[token("with")]
    With,
    #[token("import")]
    Import,
    #[token("from")]
    From,

    // === Literals ===
    #[regex(r#"([rRuUbBfF]|[bB][rR]|[rR][bB]|[fF][rR]|[rR][fF])?"([^"\\\r\n]|\\.|\\\r?\n)*""#)]
    #[regex(r#"([rRuUbBfF]|[bB][rR]|[rR][bB]|[fF][rR]|[rR][fF])?'([^'\\\r\n]|\\.|\\\r?\n)*'"#)]
    String,
    #[regex(r#"([rRuUbBfF]|[bB][rR]|[rR][bB]|[fF][rR]|[rR][fF])?""""#, |lex| close_triple(lex, b"\"\"\""))]
    #[regex(r#"([rRuUbBfF]|[bB][rR]|[rR][bB]|[fF][rR]|[rR][fF])?'''"#, |lex| close_triple(lex, b"'''"))]
    TripleString,
    #[regex(r"[0-9][0-9a-zA-Z_]*(\.[0-9a-zA-Z_]*)?")]
    #[regex(r"\.[0-9][0-9a-zA-Z_]*")]
    Number,

    // === Identifiers ===
    #[regex(r"[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
    Name,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(":")]
    Colon,
    #[token(":=")]
    ColonEq,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("->")]
    Arrow,
    #[token("@")]
    At,
    #[regex(r"[-+*/%&|^~<>=!]+")]
    Operator,

    // === Special ===
    Error,
    Eof,
}

/// Consume the body of a triple-quoted string up to its closing delimiter.
fn close_triple(lex: &mut Lexer<TokenKind>, delimiter: &[u8]) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut i = 0;
    while i < rest.len() {
        if rest[i] == b'\\' {
            i += 2;
            continue;
        }
        if rest[i..].starts_with(delimiter) {
            lex.bump(i + delimiter.len());
            return true;
        }
        i += 1;
    }
    false
}

impl TokenKind {
    /// Tokens that carry no meaning for the statement structure.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Continuation | TokenKind::Comment
        )
    }

    /// Identifiers and keywords alike.
    pub fn is_word(&self) -> bool {
        matches!(
            self,
            TokenKind::Name
                | TokenKind::Def
                | TokenKind::Class
                | TokenKind::Async
                | TokenKind::Pass
                | TokenKind::If
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Try
                | TokenKind::Except
                | TokenKind::Finally
                | TokenKind::With
                | TokenKind::Import
                | TokenKind::From
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self, TokenKind::String | TokenKind::TripleString)
    }

    pub fn is_open_bracket(&self) -> bool {
        matches!(self, TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace)
    }

    pub fn is_close_bracket(&self) -> bool {
        matches!(self, TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace)
    }

    /// The closing bracket matching an opening one.
    pub fn closing(&self) -> Option<TokenKind> {
        match self {
            TokenKind::LParen => Some(TokenKind::RParen),
            TokenKind::LBracket => Some(TokenKind::RBracket),
            TokenKind::LBrace => Some(TokenKind::RBrace),
            _ => None,
        }
    }

    /// Keywords that open a compound statement.
    pub fn opens_compound(&self) -> bool {
        matches!(
            self,
            TokenKind::If | TokenKind::For | TokenKind::While | TokenKind::Try | TokenKind::With
        )
    }

    /// Keywords that continue the compound statement above them.
    pub fn continues_compound(&self) -> bool {
        matches!(
            self,
            TokenKind::Elif | TokenKind::Else | TokenKind::Except | TokenKind::Finally
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::Newline => "newline",
            TokenKind::Continuation => "line continuation",
            TokenKind::Comment => "comment",
            TokenKind::Def => "'def'",
            TokenKind::Class => "'class'",
            TokenKind::Async => "'async'",
            TokenKind::Pass => "'pass'",
            TokenKind::If => "'if'",
            TokenKind::Elif => "'elif'",
            TokenKind::Else => "'else'",
            TokenKind::For => "'for'",
            TokenKind::While => "'while'",
            TokenKind::Try => "'try'",
            TokenKind::Except => "'except'",
            TokenKind::Finally => "'finally'",
            TokenKind::With => "'with'",
            TokenKind::Import => "'import'",
            TokenKind::From => "'from'",
            TokenKind::String => "string",
            TokenKind::TripleString => "triple-quoted string",
            TokenKind::Number => "number",
            TokenKind::Name => "identifier",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Colon => "':'",
            TokenKind::ColonEq => "':='",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::Arrow => "'->'",
            TokenKind::At => "'@'",
            TokenKind::Operator => "operator",
            TokenKind::Error => "error",
            TokenKind::Eof => "end of file",
        }
    }
}
