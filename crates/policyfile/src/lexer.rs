//! Tokenizer for Policyfile source text.
//!
//! Newlines are significant (they end a directive) except inside brackets,
//! braces and parentheses, or directly after a token that needs a right-hand
//! side (`,`, `=`, `=>`). Those newlines are swallowed here so the parser only
//! ever sees logical lines.

use crate::error::{Error, Result};
use std::iter::Peekable;
use std::str::Chars;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Bare identifier (`name`, `cookbook`, `true`, `nil`, ...).
    Ident(String),
    /// Keyword-argument label (`path:`), stored without the colon.
    Label(String),
    /// Symbol literal (`:supermarket`), stored without the colon.
    Symbol(String),
    /// Quoted string literal with escapes resolved.
    Str(String),
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Float(f64),
    /// `,`
    Comma,
    /// `=`
    Assign,
    /// `=>`
    FatArrow,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// End of a logical line.
    Newline,
}

/// A token with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token kind and payload.
    pub kind: TokenKind,
    /// Source line.
    pub line: usize,
}

/// Splits source text into tokens.
///
/// # Errors
///
/// Returns [`Error::MalformedDocument`] on unterminated strings, string
/// interpolation, unbalanced brackets or characters outside the grammar.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    depth: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            depth: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        while let Some(&c) = self.chars.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.chars.next();
                }
                '\\' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'\n') {
                        self.chars.next();
                        self.line += 1;
                    } else {
                        return Err(Error::malformed(self.line, "stray '\\'"));
                    }
                }
                '#' => {
                    while self.chars.peek().is_some_and(|&c| c != '\n') {
                        self.chars.next();
                    }
                }
                '\n' => {
                    self.chars.next();
                    self.newline();
                    self.line += 1;
                }
                '\'' | '"' => {
                    self.chars.next();
                    let s = self.string(c)?;
                    self.push(TokenKind::Str(s));
                }
                ':' => {
                    self.chars.next();
                    self.symbol()?;
                }
                '0'..='9' | '-' => self.number()?,
                c if c.is_ascii_alphabetic() || c == '_' => self.word(),
                '=' => {
                    self.chars.next();
                    match self.chars.peek() {
                        Some('>') => {
                            self.chars.next();
                            self.push(TokenKind::FatArrow);
                        }
                        Some('=') => {
                            return Err(Error::malformed(
                                self.line,
                                "comparison '==' is not allowed in a policy document",
                            ));
                        }
                        _ => self.push(TokenKind::Assign),
                    }
                }
                ',' => self.single(TokenKind::Comma),
                '[' => self.open(TokenKind::LBracket),
                '{' => self.open(TokenKind::LBrace),
                '(' => self.open(TokenKind::LParen),
                ']' => self.close(TokenKind::RBracket)?,
                '}' => self.close(TokenKind::RBrace)?,
                ')' => self.close(TokenKind::RParen)?,
                other => {
                    return Err(Error::malformed(
                        self.line,
                        format!("unexpected character '{other}'"),
                    ));
                }
            }
        }

        if self.depth > 0 {
            return Err(Error::malformed(self.line, "unclosed bracket at end of input"));
        }
        self.newline();
        Ok(self.tokens)
    }

    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token {
            kind,
            line: self.line,
        });
    }

    fn single(&mut self, kind: TokenKind) {
        self.chars.next();
        self.push(kind);
    }

    fn open(&mut self, kind: TokenKind) {
        self.depth += 1;
        self.single(kind);
    }

    fn close(&mut self, kind: TokenKind) -> Result<()> {
        self.depth = self.depth.checked_sub(1).ok_or_else(|| {
            Error::malformed(self.line, "closing bracket without matching opener")
        })?;
        self.single(kind);
        Ok(())
    }

    fn newline(&mut self) {
        if self.depth > 0 {
            return;
        }
        match self.tokens.last().map(|t| &t.kind) {
            None
            | Some(
                TokenKind::Newline | TokenKind::Comma | TokenKind::Assign | TokenKind::FatArrow,
            ) => {}
            Some(_) => self.push(TokenKind::Newline),
        }
    }

    fn string(&mut self, quote: char) -> Result<String> {
        let start = self.line;
        let mut out = String::new();
        loop {
            let c = self
                .chars
                .next()
                .ok_or_else(|| Error::malformed(start, "unterminated string literal"))?;
            match c {
                c if c == quote => return Ok(out),
                '\n' => {
                    self.line += 1;
                    out.push('\n');
                }
                '\\' => {
                    let escaped = self
                        .chars
                        .next()
                        .ok_or_else(|| Error::malformed(start, "unterminated string literal"))?;
                    match (quote, escaped) {
                        (_, '\\') => out.push('\\'),
                        (_, e) if e == quote => out.push(e),
                        ('"', 'n') => out.push('\n'),
                        ('"', 't') => out.push('\t'),
                        ('"', '#') => out.push('#'),
                        (_, e) => {
                            out.push('\\');
                            out.push(e);
                        }
                    }
                }
                '#' if quote == '"' && self.chars.peek() == Some(&'{') => {
                    return Err(Error::malformed(
                        self.line,
                        "string interpolation is not supported",
                    ));
                }
                c => out.push(c),
            }
        }
    }

    fn symbol(&mut self) -> Result<()> {
        match self.chars.peek() {
            Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
                let name = self.ident_chars();
                self.push(TokenKind::Symbol(name));
                Ok(())
            }
            Some(&q) if q == '\'' || q == '"' => {
                self.chars.next();
                let name = self.string(q)?;
                self.push(TokenKind::Symbol(name));
                Ok(())
            }
            _ => Err(Error::malformed(self.line, "expected symbol name after ':'")),
        }
    }

    fn ident_chars(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        out
    }

    fn word(&mut self) {
        let word = self.ident_chars();
        if self.chars.peek() == Some(&':') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek() != Some(&':') {
                self.chars.next();
                self.push(TokenKind::Label(word));
                return;
            }
        }
        self.push(TokenKind::Ident(word));
    }

    fn digits(&mut self, out: &mut String) {
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                out.push(c);
                self.chars.next();
            } else if c == '_' {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn number(&mut self) -> Result<()> {
        let mut text = String::new();
        if self.chars.peek() == Some(&'-') {
            self.chars.next();
            text.push('-');
            if !self.chars.peek().is_some_and(char::is_ascii_digit) {
                return Err(Error::malformed(self.line, "expected digit after '-'"));
            }
        }
        self.digits(&mut text);

        let mut is_float = false;
        if self.chars.peek() == Some(&'.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(char::is_ascii_digit) {
                self.chars.next();
                text.push('.');
                self.digits(&mut text);
                is_float = true;
            }
        }
        if matches!(self.chars.peek(), Some('e' | 'E')) {
            self.chars.next();
            text.push('e');
            if let Some(&sign) = self.chars.peek().filter(|c| matches!(c, '+' | '-')) {
                self.chars.next();
                text.push(sign);
            }
            self.digits(&mut text);
            is_float = true;
        }

        let kind = if is_float {
            let value: f64 = text.parse().map_err(|_| {
                Error::malformed(self.line, format!("invalid float literal: {text}"))
            })?;
            if !value.is_finite() {
                return Err(Error::malformed(self.line, "float literal out of range"));
            }
            TokenKind::Float(value)
        } else {
            TokenKind::Integer(text.parse().map_err(|_| {
                Error::malformed(self.line, format!("invalid integer literal: {text}"))
            })?)
        };
        self.push(kind);
        Ok(())
    }
}
