//! Recursive-descent parser for WORKSPACE, BUILD and `.bzl` files.
//!
//! Grammar (informal):
//!
//! ```text
//! module    := (stmt NEWLINE)*
//! stmt      := load | IDENT "=" expr | expr
//! load      := "load" "(" STRING ("," (STRING | IDENT "=" STRING))* ","? ")"
//! expr      := unary ("+" unary)*
//! unary     := "-" INT | primary
//! primary   := STRING+ | INT | name | call | list | tuple | dict
//! name      := IDENT ("." IDENT)*
//! call      := name "(" (arg ("," arg)* ","?)? ")"
//! arg       := IDENT "=" expr | expr
//! ```
//!
//! Control flow, function definitions and comprehensions are rejected
//! with a syntax error.

use crate::dsl::ast::{Argument, Call, Expr, LoadSymbol, Module, Stmt};
use crate::dsl::lexer::{tokenize, Token, TokenKind};
use crate::util::diagnostic::ParseError;

const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "def", "if", "elif", "else", "for", "while", "return", "lambda", "class", "import", "with",
    "try", "pass",
];

/// Parse a whole file.
pub fn parse(source: &str, file: &str) -> Result<Module, ParseError> {
    let tokens = tokenize(source, file)?;
    Parser {
        tokens,
        pos: 0,
        source,
        file,
    }
    .module()
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
    file: &'a str,
}

impl<'a> Parser<'a> {
    fn module(mut self) -> Result<Module, ParseError> {
        let mut statements = Vec::new();

        loop {
            while self.at(&TokenKind::Newline) {
                self.advance();
            }
            if self.at(&TokenKind::Eof) {
                break;
            }

            statements.push(self.statement()?);

            if !self.at(&TokenKind::Newline) && !self.at(&TokenKind::Eof) {
                return Err(self.unexpected("end of statement"));
            }
        }

        Ok(Module { statements })
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        let token = self.peek().clone();

        if let TokenKind::Ident(name) = &token.kind {
            if UNSUPPORTED_KEYWORDS.contains(&name.as_str()) {
                return Err(self.error_at(
                    format!("`{}` statements are not supported", name),
                    token.offset,
                ));
            }

            if name == "load" && self.peek_nth(1).kind == TokenKind::LParen {
                return self.load();
            }

            if self.peek_nth(1).kind == TokenKind::Equals {
                let target = name.clone();
                self.advance();
                self.advance();
                let value = self.expr()?;
                return Ok(Stmt::Assign {
                    target,
                    value,
                    line: token.line,
                });
            }
        }

        Ok(Stmt::Expr(self.expr()?))
    }

    fn load(&mut self) -> Result<Stmt, ParseError> {
        let line = self.peek().line;
        self.advance(); // load
        self.expect(&TokenKind::LParen, "`(`")?;

        let module = match self.advance().kind {
            TokenKind::Str(s) => s,
            _ => return Err(self.error_prev("load() expects a label string first")),
        };

        let mut symbols = Vec::new();
        while self.eat(&TokenKind::Comma) {
            if self.at(&TokenKind::RParen) {
                break;
            }

            let token = self.advance();
            match token.kind {
                TokenKind::Str(name) => symbols.push(LoadSymbol {
                    local: name.clone(),
                    exported: name,
                    aliased: false,
                }),
                TokenKind::Ident(local) => {
                    self.expect(&TokenKind::Equals, "`=`")?;
                    match self.advance().kind {
                        TokenKind::Str(exported) => symbols.push(LoadSymbol {
                            local,
                            exported,
                            aliased: true,
                        }),
                        _ => return Err(self.error_prev("load() aliases must be strings")),
                    }
                }
                _ => return Err(self.error_prev("load() expects symbol names as strings")),
            }
        }

        self.expect(&TokenKind::RParen, "`)`")?;
        Ok(Stmt::Load {
            module,
            symbols,
            line,
        })
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        while self.at(&TokenKind::Plus) {
            let line = self.advance().line;
            let rhs = self.unary()?;
            lhs = Expr::Add {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&TokenKind::Minus) {
            return match self.advance().kind {
                TokenKind::Int(n) => Ok(Expr::Int(-n)),
                _ => Err(self.error_prev("unary `-` is only supported on integers")),
            };
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Str(mut s) => {
                // Adjacent literals concatenate
                while let TokenKind::Str(next) = &self.peek().kind {
                    s.push_str(next);
                    self.advance();
                }
                Ok(Expr::Str(s))
            }
            TokenKind::Int(n) => Ok(Expr::Int(n)),
            TokenKind::Ident(name) => self.name_or_call(name, token.line, token.offset),
            TokenKind::LBracket => {
                let items = self.sequence(&TokenKind::RBracket)?;
                Ok(Expr::List(items))
            }
            TokenKind::LParen => {
                let first = if self.at(&TokenKind::RParen) {
                    None
                } else {
                    Some(self.expr()?)
                };
                match first {
                    None => {
                        self.advance();
                        Ok(Expr::List(Vec::new()))
                    }
                    Some(expr) if self.eat(&TokenKind::RParen) => Ok(expr),
                    Some(expr) => {
                        self.expect(&TokenKind::Comma, "`,` or `)`")?;
                        let mut items = vec![expr];
                        items.extend(self.sequence(&TokenKind::RParen)?);
                        Ok(Expr::List(items))
                    }
                }
            }
            TokenKind::LBrace => self.dict(token.line),
            other => Err(self.error_at(
                format!("expected an expression, found {}", other.describe()),
                token.offset,
            )),
        }
    }

    fn name_or_call(&mut self, first: String, line: usize, offset: usize) -> Result<Expr, ParseError> {
        match first.as_str() {
            "True" => return Ok(Expr::Bool(true)),
            "False" => return Ok(Expr::Bool(false)),
            "None" => return Ok(Expr::None),
            kw if UNSUPPORTED_KEYWORDS.contains(&kw) => {
                return Err(self.error_at(format!("`{}` is not supported", kw), offset));
            }
            _ => {}
        }

        let mut name = first;
        while self.eat(&TokenKind::Dot) {
            match self.advance().kind {
                TokenKind::Ident(part) => {
                    name.push('.');
                    name.push_str(&part);
                }
                _ => return Err(self.error_prev("expected a name after `.`")),
            }
        }

        if !self.eat(&TokenKind::LParen) {
            return Ok(Expr::Name { name, line });
        }

        let args = self.arguments()?;
        Ok(match name.as_str() {
            "glob" => Expr::Glob { args, line },
            "select" => Expr::Select { args, line },
            _ => Expr::Call(Call {
                callee: name,
                args,
                line,
            }),
        })
    }

    /// Parse call arguments after the opening `(`, consuming the `)`.
    fn arguments(&mut self) -> Result<Vec<Argument>, ParseError> {
        let mut args = Vec::new();
        let mut seen_keyword = false;

        while !self.eat(&TokenKind::RParen) {
            let is_keyword = matches!(self.peek().kind, TokenKind::Ident(_))
                && self.peek_nth(1).kind == TokenKind::Equals;

            if is_keyword {
                let TokenKind::Ident(key) = self.advance().kind else {
                    unreachable!("checked above");
                };
                self.advance(); // =
                args.push(Argument::Keyword(key, self.expr()?));
                seen_keyword = true;
            } else {
                if seen_keyword {
                    return Err(self.unexpected("a keyword argument"));
                }
                args.push(Argument::Positional(self.expr()?));
            }

            if !self.eat(&TokenKind::Comma) {
                self.expect(&TokenKind::RParen, "`,` or `)`")?;
                break;
            }
        }

        Ok(args)
    }

    /// Parse comma-separated expressions up to and including `close`.
    fn sequence(&mut self, close: &TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expr()?);

            if let TokenKind::Ident(kw) = &self.peek().kind {
                if kw == "for" {
                    return Err(self.unexpected_msg("comprehensions are not supported"));
                }
            }

            if !self.eat(&TokenKind::Comma) {
                self.expect(close, &close.describe())?;
                break;
            }
        }
        Ok(items)
    }

    fn dict(&mut self, line: usize) -> Result<Expr, ParseError> {
        let mut entries = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            let key = self.expr()?;
            self.expect(&TokenKind::Colon, "`:`")?;
            let value = self.expr()?;
            entries.push((key, value));

            if !self.eat(&TokenKind::Comma) {
                self.expect(&TokenKind::RBrace, "`,` or `}`")?;
                break;
            }
        }
        Ok(Expr::Dict { entries, line })
    }

    // -- token helpers --------------------------------------------------

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn error_at(&self, message: impl Into<String>, offset: usize) -> ParseError {
        ParseError::new(message, self.file, self.source, offset)
    }

    fn error_prev(&self, message: &str) -> ParseError {
        let idx = self.pos.saturating_sub(1);
        self.error_at(message, self.tokens[idx].offset)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        self.error_at(
            format!("expected {}, found {}", expected, token.kind.describe()),
            token.offset,
        )
    }

    fn unexpected_msg(&self, message: &str) -> ParseError {
        self.error_at(message, self.peek().offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Module {
        parse(source, "BUILD").unwrap()
    }

    #[test]
    fn test_parse_rule_call() {
        let module = parse_ok(
            r#"
cc_library(
    name = "core",
    srcs = ["a.c"],
    hdrs = ["a.h"],
)
"#,
        );

        assert_eq!(module.statements.len(), 1);
        let Stmt::Expr(Expr::Call(call)) = &module.statements[0] else {
            panic!("expected a call");
        };
        assert_eq!(call.callee, "cc_library");
        assert_eq!(call.line, 2);
        assert_eq!(call.args.len(), 3);
        assert_eq!(
            call.args[0],
            Argument::Keyword("name".into(), Expr::Str("core".into()))
        );
    }

    #[test]
    fn test_parse_load() {
        let module = parse_ok(r#"load("//tools:defs.bzl", "COPTS", local_name = "other")"#);
        assert_eq!(
            module.statements[0],
            Stmt::Load {
                module: "//tools:defs.bzl".into(),
                symbols: vec![
                    LoadSymbol {
                        local: "COPTS".into(),
                        exported: "COPTS".into(),
                        aliased: false,
                    },
                    LoadSymbol {
                        local: "local_name".into(),
                        exported: "other".into(),
                        aliased: true,
                    },
                ],
                line: 1,
            }
        );
    }

    #[test]
    fn test_parse_assignment_and_concat() {
        let module = parse_ok("SRCS = [\"a.c\"] + glob([\"*.c\"], exclude = [\"b.c\"])\n");
        let Stmt::Assign { target, value, .. } = &module.statements[0] else {
            panic!("expected an assignment");
        };
        assert_eq!(target, "SRCS");
        let Expr::Add { rhs, .. } = value else {
            panic!("expected `+`");
        };
        assert!(matches!(**rhs, Expr::Glob { .. }));
    }

    #[test]
    fn test_parse_select_and_dict() {
        let module = parse_ok(r#"x = select({"//conditions:default": [], ":linux": ["-lm"]})"#);
        let Stmt::Assign { value, .. } = &module.statements[0] else {
            panic!("expected an assignment");
        };
        let Expr::Select { args, .. } = value else {
            panic!("expected select");
        };
        assert!(matches!(&args[0], Argument::Positional(Expr::Dict { entries, .. }) if entries.len() == 2));
    }

    #[test]
    fn test_parse_literals() {
        let module = parse_ok("x = (1, -2, True, None, 'a' 'b', ())\n");
        let Stmt::Assign { value, .. } = &module.statements[0] else {
            panic!("expected an assignment");
        };
        assert_eq!(
            *value,
            Expr::List(vec![
                Expr::Int(1),
                Expr::Int(-2),
                Expr::Bool(true),
                Expr::None,
                Expr::Str("ab".into()),
                Expr::List(vec![]),
            ])
        );
    }

    #[test]
    fn test_parse_dotted_callee() {
        let module = parse_ok("native.cc_library(name = \"x\")");
        let Stmt::Expr(Expr::Call(call)) = &module.statements[0] else {
            panic!("expected a call");
        };
        assert_eq!(call.callee, "native.cc_library");
    }

    #[test]
    fn test_reject_def() {
        let err = parse("def macro(name):\n    pass\n", "defs.bzl").unwrap_err();
        assert!(err.message.contains("`def`"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_reject_comprehension() {
        let err = parse("x = [f for f in y]", "BUILD").unwrap_err();
        assert!(err.message.contains("comprehensions"));
    }

    #[test]
    fn test_reject_positional_after_keyword() {
        let err = parse("f(a = 1, 2)", "BUILD").unwrap_err();
        assert!(err.message.contains("keyword argument"));
    }

    #[test]
    fn test_two_statements_on_one_line_is_an_error() {
        let err = parse("f() g()", "BUILD").unwrap_err();
        assert!(err.message.contains("end of statement"));
    }
}
