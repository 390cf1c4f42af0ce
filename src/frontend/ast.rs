//! Binary-expression AST.
//!
//! Nodes live in the compilation session's arena; children are plain
//! references with the arena lifetime.

use crate::core::number::Number;
use crate::frontend::scanner::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expr<'a> {
    /// Literal leaf.
    Literal(Number),
    /// Operator node with two children.
    Binary {
        op: TokenKind,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    },
}

impl<'a> Expr<'a> {
    /// Visit literal leaves left to right, the order emission stores them in.
    ///
    /// Walks with an explicit stack; left-associative chains make the tree as
    /// deep as the program is long.
    pub fn for_each_literal<F: FnMut(&Number)>(&self, f: &mut F) {
        let mut pending = vec![self];
        while let Some(expr) = pending.pop() {
            match expr {
                Expr::Literal(n) => f(n),
                Expr::Binary { lhs, rhs, .. } => {
                    pending.push(*rhs);
                    pending.push(*lhs);
                }
            }
        }
    }

    pub fn literal_count(&self) -> usize {
        let mut count = 0;
        self.for_each_literal(&mut |_| count += 1);
        count
    }
}
