//! Lexical scanner turning source text into tokens.
//!
//! The scanner is a single loop over characters. It tracks the current line
//! for diagnostics and stops at the first character it does not recognise.

use std::fmt;

use crate::core::error::{CompileError, CompileResult};
use crate::core::number::Number;

/// Keyword introducing an explicit print statement.
pub const KEYWORD_PRINT: &str = "print";

/// Program source together with the name used in diagnostics.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Build a syntax error located in this file.
    pub fn syntax_error(&self, line: usize, message: impl Into<String>) -> CompileError {
        CompileError::Syntax {
            file: self.name.clone(),
            line,
            message: message.into(),
        }
    }
}

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plus,
    Minus,
    Star,
    Exponent,
    Slash,
    Semicolon,
    IntegerLiteral(Number),
    Print,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Exponent => f.write_str("**"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::IntegerLiteral(n) => f.write_str(&n.literal()),
            TokenKind::Print => f.write_str(KEYWORD_PRINT),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based line the token starts on.
    pub line: usize,
}

/// Character-level scanner over a [`SourceFile`].
pub struct Scanner<'a> {
    source: &'a SourceFile,
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a SourceFile) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.source.text[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            if ch == '\n' {
                self.line += 1;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\n' | '\r' | '\x0c') = self.current_char() {
            self.advance();
        }
    }

    /// Scan the next token, returning `Eof` once input is exhausted.
    pub fn next_token(&mut self) -> CompileResult<Token> {
        self.skip_whitespace();
        let line = self.line;

        let Some(ch) = self.current_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
            });
        };

        let kind = match ch {
            '+' => {
                self.advance();
                TokenKind::Plus
            }
            '-' => {
                self.advance();
                TokenKind::Minus
            }
            '*' => {
                self.advance();
                if self.current_char() == Some('*') {
                    self.advance();
                    TokenKind::Exponent
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                self.advance();
                TokenKind::Slash
            }
            ';' => {
                self.advance();
                TokenKind::Semicolon
            }
            c if c.is_ascii_digit() => self.scan_integer(line)?,
            c if is_identifier_char(c, 0) => self.scan_keyword(line)?,
            c => {
                return Err(self
                    .source
                    .syntax_error(line, format!("Unrecognized token \"{}\"", c)));
            }
        };

        Ok(Token { kind, line })
    }

    fn scan_integer(&mut self, line: usize) -> CompileResult<TokenKind> {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if !c.is_ascii_digit() {
                break;
            }
            self.advance();
        }

        let digits = &self.source.text[start..self.pos];
        let value = digits.parse::<i32>().map_err(|_| {
            self.source.syntax_error(
                line,
                format!("Integer literal \"{}\" does not fit in i32", digits),
            )
        })?;
        Ok(TokenKind::IntegerLiteral(Number::Int32(value)))
    }

    fn scan_keyword(&mut self, line: usize) -> CompileResult<TokenKind> {
        let start = self.pos;
        let mut index = 0;
        while let Some(c) = self.current_char() {
            if !is_identifier_char(c, index) {
                break;
            }
            self.advance();
            index += 1;
        }

        match &self.source.text[start..self.pos] {
            KEYWORD_PRINT => Ok(TokenKind::Print),
            ident => Err(self
                .source
                .syntax_error(line, format!("Unrecognized identifier \"{}\"", ident))),
        }
    }
}

fn is_identifier_char(c: char, index: usize) -> bool {
    (index != 0 && c.is_ascii_digit()) || c.is_ascii_alphabetic() || c == '_' || c == '$'
}

/// Scan the whole file into a token vector terminated by `Eof`.
pub fn tokenize(source: &SourceFile) -> CompileResult<Vec<Token>> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token()?;
        tokens.push(token);
        if token.kind == TokenKind::Eof {
            return Ok(tokens);
        }
    }
}
