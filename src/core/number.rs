//! Number types and literals.
//!
//! Every `NumberType` variant describes its own LLVM representation, size and
//! alignment, so allocation, store and load sites cannot disagree.

use std::fmt;

/// Types of numbers the compiler supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberType {
    Int32,
}

impl NumberType {
    /// LLVM type representation.
    pub const fn llvm_repr(self) -> &'static str {
        match self {
            NumberType::Int32 => "i32",
        }
    }

    /// Size in bytes.
    pub const fn byte_size(self) -> u32 {
        match self {
            NumberType::Int32 => 4,
        }
    }

    /// Stack alignment in bytes.
    pub const fn alignment(self) -> u32 {
        match self {
            NumberType::Int32 => 4,
        }
    }
}

impl fmt::Display for NumberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.llvm_repr())
    }
}

/// A literal tagged with its number type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Number {
    Int32(i32),
}

impl Number {
    pub fn number_type(&self) -> NumberType {
        match self {
            Number::Int32(_) => NumberType::Int32,
        }
    }

    /// Literal text as it appears in a store instruction.
    pub fn literal(&self) -> String {
        match self {
            Number::Int32(v) => format!("{}", v),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number_type(), self.literal())
    }
}
