//! Tokenizer for the Starlark subset.
//!
//! Newlines are significant only outside brackets; inside `()`, `[]` and
//! `{}` they are skipped, as are comments and backslash continuations.

use crate::util::diagnostic::ParseError;

/// Token kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Equals,
    Plus,
    Minus,
    Dot,
    Newline,
    Eof,
}

impl TokenKind {
    /// Human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{}`", name),
            TokenKind::Str(_) => "string".to_string(),
            TokenKind::Int(_) => "integer".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::LBracket => "`[`".to_string(),
            TokenKind::RBracket => "`]`".to_string(),
            TokenKind::LBrace => "`{`".to_string(),
            TokenKind::RBrace => "`}`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::Equals => "`=`".to_string(),
            TokenKind::Plus => "`+`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}

/// A token with its byte offset and 1-based line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub line: usize,
}

/// Converts source text into tokens.
pub struct Lexer<'a> {
    source: &'a str,
    file: &'a str,
    pos: usize,
    line: usize,
    depth: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `source`; `file` is used in error messages.
    pub fn new(source: &'a str, file: &'a str) -> Self {
        Lexer {
            source,
            file,
            pos: 0,
            line: 1,
            depth: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole input. The result always ends with `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '\\' if self.peek_at(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                '\n' => {
                    self.bump();
                    if self.depth == 0 {
                        self.push_at(TokenKind::Newline, start, self.line - 1);
                    }
                }
                '(' | '[' | '{' => {
                    self.bump();
                    self.depth += 1;
                    let kind = match c {
                        '(' => TokenKind::LParen,
                        '[' => TokenKind::LBracket,
                        _ => TokenKind::LBrace,
                    };
                    self.push(kind, start);
                }
                ')' | ']' | '}' => {
                    self.bump();
                    self.depth = self.depth.saturating_sub(1);
                    let kind = match c {
                        ')' => TokenKind::RParen,
                        ']' => TokenKind::RBracket,
                        _ => TokenKind::RBrace,
                    };
                    self.push(kind, start);
                }
                ',' => self.single(TokenKind::Comma),
                ':' => self.single(TokenKind::Colon),
                '+' => self.single(TokenKind::Plus),
                '-' => self.single(TokenKind::Minus),
                '.' => self.single(TokenKind::Dot),
                '=' => {
                    if self.peek_at(1) == Some('=') {
                        return Err(self.error("comparison operators are not supported", start));
                    }
                    self.single(TokenKind::Equals)
                }
                '"' | '\'' => {
                    let value = self.string(false)?;
                    self.push(TokenKind::Str(value), start);
                }
                'r' | 'R' if matches!(self.peek_at(1), Some('"') | Some('\'')) => {
                    self.bump();
                    let value = self.string(true)?;
                    self.push(TokenKind::Str(value), start);
                }
                c if c.is_ascii_digit() => {
                    let text = self.take_while(|c| c.is_ascii_digit());
                    let value = text
                        .parse::<i64>()
                        .map_err(|_| self.error("integer literal out of range", start))?;
                    self.push(TokenKind::Int(value), start);
                }
                c if c.is_alphabetic() || c == '_' => {
                    let text = self.take_while(|c| c.is_alphanumeric() || c == '_');
                    self.push(TokenKind::Ident(text), start);
                }
                other => {
                    return Err(self.error(format!("unexpected character `{}`", other), start));
                }
            }
        }

        let end = self.source.len();
        self.push_at(TokenKind::Newline, end, self.line);
        self.push_at(TokenKind::Eof, end, self.line);
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        self.source[start..self.pos].to_string()
    }

    fn single(&mut self, kind: TokenKind) {
        let start = self.pos;
        self.bump();
        self.push(kind, start);
    }

    fn push(&mut self, kind: TokenKind, offset: usize) {
        let line = self.line;
        self.push_at(kind, offset, line);
    }

    fn push_at(&mut self, kind: TokenKind, offset: usize, line: usize) {
        self.tokens.push(Token { kind, offset, line });
    }

    fn error(&self, message: impl Into<String>, offset: usize) -> ParseError {
        ParseError::new(message, self.file, self.source, offset)
    }

    /// Lex a string literal starting at the opening quote.
    fn string(&mut self, raw: bool) -> Result<String, ParseError> {
        let start = self.pos;
        let quote = self.bump().unwrap_or('"');
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut value = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error("unterminated string literal", start));
            };

            if c == quote {
                if !triple {
                    return Ok(value);
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.bump();
                    self.bump();
                    return Ok(value);
                }
                value.push(c);
                continue;
            }

            if c == '\n' && !triple {
                return Err(self.error("unterminated string literal", start));
            }

            if c == '\\' && !raw {
                match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('\\') => value.push('\\'),
                    Some('\'') => value.push('\''),
                    Some('"') => value.push('"'),
                    Some('\n') => {}
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(self.error("unterminated string literal", start)),
                }
                continue;
            }

            value.push(c);
        }
    }
}

/// Tokenize `source`.
pub fn tokenize(source: &str, file: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(source, file).tokenize()
}
