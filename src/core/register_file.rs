// This module implements the RegisterFile that hands out LLVM virtual register identifiers
// during a compilation pass. Identifiers come from a monotonic counter that starts at 1 (the
// unnamed entry block of `main` implicitly owns %0) and are never individually reclaimed. The
// only reuse path is the free-register stack: the stack-allocation pre-pass mints one register
// per literal operand and releases them here, and constant stores later pop them back off in
// the order the literals were first encountered.

//! Virtual register allocation.

use super::error::{CompileError, CompileResult};
use super::value_ref::VirtualRegister;

/// First identifier issued in a function body.
pub const FIRST_VIRTUAL_REGISTER: u64 = 1;

/// Monotonic virtual register counter plus a free-register stack.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    next: u64,
    free: Vec<VirtualRegister>,
    minted: usize,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            next: FIRST_VIRTUAL_REGISTER,
            free: Vec::new(),
            minted: 0,
        }
    }

    /// Return the current counter value, then advance it.
    pub fn next_virtual_register(&mut self) -> CompileResult<VirtualRegister> {
        let reg = VirtualRegister(self.next);
        self.next = self
            .next
            .checked_add(1)
            .ok_or_else(|| CompileError::internal("virtual register space exhausted"))?;
        self.minted += 1;
        Ok(reg)
    }

    /// Release registers so that `pop_free` yields them in the given order.
    pub fn release_in_order<I>(&mut self, regs: I)
    where
        I: IntoIterator<Item = VirtualRegister>,
        I::IntoIter: DoubleEndedIterator,
    {
        self.free.extend(regs.into_iter().rev());
    }

    /// Pop the most recently released register.
    pub fn pop_free(&mut self) -> Option<VirtualRegister> {
        self.free.pop()
    }

    /// Number of identifiers issued so far.
    pub fn minted(&self) -> usize {
        self.minted
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
