//! Front-end: source text to binary-expression AST.

pub mod ast;
pub mod parser;
pub mod scanner;

pub use ast::Expr;
pub use parser::parse_program;
pub use scanner::{tokenize, SourceFile, Token, TokenKind};
