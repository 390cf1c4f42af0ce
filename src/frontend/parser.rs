//! Precedence-climbing parser for binary expressions.
//!
//! Grammar:
//!
//! ```text
//! program := ['print'] expr [';'] EOF
//! expr    := literal (op expr)*
//! ```
//!
//! `+ -` bind loosest, then `* /`, then `**`, which is right associative.

use bumpalo::Bump;

use super::ast::Expr;
use super::scanner::{tokenize, SourceFile, Token, TokenKind};
use crate::core::error::CompileResult;

/// Parse a whole program, allocating the AST in `arena`.
pub fn parse_program<'a>(source: &SourceFile, arena: &'a Bump) -> CompileResult<&'a Expr<'a>> {
    let tokens = tokenize(source)?;
    let parser = Parser::new(source, arena, tokens);
    parser.parse()
}

/// Binding power of a binary operator, or `None` for anything else.
fn precedence(kind: TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Plus | TokenKind::Minus => Some(10),
        TokenKind::Star | TokenKind::Slash => Some(20),
        TokenKind::Exponent => Some(30),
        _ => None,
    }
}

/// Deepest operator nesting the parser recurses into.
///
/// Only right-associative chains nest; left-associative ones are built by the loop.
pub const MAX_NESTING_DEPTH: usize = 512;

fn is_right_associative(kind: TokenKind) -> bool {
    kind == TokenKind::Exponent
}

struct Parser<'a, 's> {
    source: &'s SourceFile,
    arena: &'a Bump,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a, 's> Parser<'a, 's> {
    fn new(source: &'s SourceFile, arena: &'a Bump, tokens: Vec<Token>) -> Self {
        Self {
            source,
            arena,
            tokens,
            pos: 0,
        }
    }

    fn parse(mut self) -> CompileResult<&'a Expr<'a>> {
        let first = self.peek();
        if first.kind == TokenKind::Eof {
            return Err(self.source.syntax_error(first.line, "Program is empty"));
        }

        self.try_consume(TokenKind::Print);
        let expr = self.parse_binary_expression(0, 0)?;
        self.try_consume(TokenKind::Semicolon);

        let trailing = self.peek();
        if trailing.kind != TokenKind::Eof {
            return Err(self.source.syntax_error(
                trailing.line,
                format!("Unexpected \"{}\" after expression", trailing.kind),
            ));
        }

        Ok(expr)
    }

    /// Current token; the vector always ends with `Eof`, which is never consumed.
    fn peek(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn try_consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_binary_expression(
        &mut self,
        min_precedence: u8,
        depth: usize,
    ) -> CompileResult<&'a Expr<'a>> {
        if depth > MAX_NESTING_DEPTH {
            return Err(self.source.syntax_error(
                self.peek().line,
                format!("Expression nests more than {} operators deep", MAX_NESTING_DEPTH),
            ));
        }

        let mut lhs = self.parse_primary()?;

        loop {
            let op = self.peek().kind;
            let Some(prec) = precedence(op) else {
                break;
            };
            if prec <= min_precedence {
                break;
            }
            self.advance();

            let next_min = if is_right_associative(op) { prec - 1 } else { prec };
            let rhs = self.parse_binary_expression(next_min, depth + 1)?;
            lhs = self.arena.alloc(Expr::Binary { op, lhs, rhs });
        }

        Ok(lhs)
    }

    fn parse_primary(&mut self) -> CompileResult<&'a Expr<'a>> {
        let token = self.advance();
        match token.kind {
            TokenKind::IntegerLiteral(number) => {
                let leaf: &'a Expr<'a> = self.arena.alloc(Expr::Literal(number));
                Ok(leaf)
            }
            other => Err(self.source.syntax_error(
                token.line,
                format!("Expected an integer literal but found \"{}\"", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::number::Number;

    fn lit(v: i32) -> Expr<'static> {
        Expr::Literal(Number::Int32(v))
    }

    /// Render the tree fully parenthesised for easy comparison.
    fn render(expr: &Expr) -> String {
        match expr {
            Expr::Literal(n) => n.literal(),
            Expr::Binary { op, lhs, rhs } => format!("({} {} {})", render(lhs), op, render(rhs)),
        }
    }

    fn parse_str(text: &str) -> String {
        let arena = Bump::new();
        let source = SourceFile::new("test.tl", text);
        let expr = parse_program(&source, &arena).unwrap();
        render(expr)
    }

    #[test]
    fn test_single_literal() {
        let arena = Bump::new();
        let source = SourceFile::new("test.tl", "42");
        let expr = parse_program(&source, &arena).unwrap();
        assert_eq!(*expr, lit(42));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse_str("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(parse_str("1 * 2 - 3 / 4"), "((1 * 2) - (3 / 4))");
    }

    #[test]
    fn test_associativity() {
        assert_eq!(parse_str("1 - 2 - 3"), "((1 - 2) - 3)");
        assert_eq!(parse_str("2 ** 3 ** 2"), "(2 ** (3 ** 2))");
        assert_eq!(parse_str("2 * 3 ** 2"), "(2 * (3 ** 2))");
    }

    #[test]
    fn test_print_and_semicolon() {
        assert_eq!(parse_str("print 2 + 3;"), "(2 + 3)");
    }

    #[test]
    fn test_empty_program() {
        let arena = Bump::new();
        let source = SourceFile::new("empty.tl", "  \n");
        let err = parse_program(&source, &arena).unwrap_err();
        assert_eq!(err.to_string(), "empty.tl:2: syntax error: Program is empty");
    }

    #[test]
    fn test_missing_operand() {
        let arena = Bump::new();
        let source = SourceFile::new("prog.tl", "2 +\n");
        let err = parse_program(&source, &arena).unwrap_err();
        assert!(err
            .to_string()
            .contains("Expected an integer literal but found \"end of input\""));
    }

    #[test]
    fn test_trailing_tokens() {
        let arena = Bump::new();
        let source = SourceFile::new("prog.tl", "2 3");
        let err = parse_program(&source, &arena).unwrap_err();
        assert_eq!(err.to_string(), "prog.tl:1: syntax error: Unexpected \"3\" after expression");
    }

    #[test]
    fn test_long_left_chain() {
        let arena = Bump::new();
        let source = SourceFile::new("chain.tl", format!("1{}", " - 1".repeat(100_000)));
        let expr = parse_program(&source, &arena).unwrap();
        assert_eq!(expr.literal_count(), 100_001);
    }

    #[test]
    fn test_deep_exponent_chain_is_rejected() {
        let arena = Bump::new();
        let source = SourceFile::new("pow.tl", format!("2{}", " ** 2".repeat(10_000)));
        let err = parse_program(&source, &arena).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("nests more than 512 operators deep"));
    }

    #[test]
    fn test_exponent_chain_within_limit() {
        let arena = Bump::new();
        let source = SourceFile::new("pow.tl", format!("2{}", " ** 2".repeat(100)));
        let expr = parse_program(&source, &arena).unwrap();
        assert_eq!(expr.literal_count(), 101);
    }
}
