//! Virtual registers and the value/address distinction.
//!
//! A `ValueRef` says what a virtual register holds: the computed number
//! itself, or the address of the stack slot the number lives in. Arithmetic
//! only ever consumes values; stores only ever target addresses.

use std::fmt;

use super::error::{CompileError, CompileResult};

/// Identifier of an LLVM virtual register (`%n`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualRegister(pub u64);

impl fmt::Display for VirtualRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Tagged register reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueRef {
    /// Register directly holds the number.
    Value(VirtualRegister),
    /// Register holds the address of a stack slot containing the number.
    Address(VirtualRegister),
}

impl ValueRef {
    /// Register of a value reference, or an ICE naming `context` if this
    /// is an address.
    pub fn expect_value(&self, context: &str) -> CompileResult<VirtualRegister> {
        match *self {
            ValueRef::Value(reg) => Ok(reg),
            ValueRef::Address(reg) => Err(CompileError::internal(format!(
                "{} received address reference {} where a loaded value was required",
                context, reg
            ))),
        }
    }
}

impl fmt::Display for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Value(reg) => write!(f, "value {}", reg),
            ValueRef::Address(reg) => write!(f, "address {}", reg),
        }
    }
}
