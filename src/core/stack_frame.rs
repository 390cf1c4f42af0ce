// This module tracks the stack storage of the single function tallyc emits. Every literal
// operand of the expression gets one StackEntry: a named (by virtual register), statically
// sized local slot whose size and alignment come from its NumberType. Entries are created in
// a pre-pass before any instruction is emitted and kept in creation order, because LLVM needs
// the allocas visible at function entry and the emitted order is observable in the output.

//! Stack slot bookkeeping.

use hashbrown::HashMap;

use super::number::NumberType;
use super::value_ref::VirtualRegister;

/// One statically sized local allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEntry {
    /// Register holding the slot's address.
    pub register: VirtualRegister,
    pub number_type: NumberType,
}

impl StackEntry {
    pub fn align_bytes(&self) -> u32 {
        self.number_type.alignment()
    }
}

/// Ordered list of the function's stack entries, indexed by address register.
#[derive(Debug, Clone, Default)]
pub struct StackFrame {
    entries: Vec<StackEntry>,
    by_register: HashMap<VirtualRegister, usize>,
}

impl StackFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new slot for `number_type` addressed by `register`.
    pub fn allocate_stack_slot(
        &mut self,
        number_type: NumberType,
        register: VirtualRegister,
    ) -> StackEntry {
        let entry = StackEntry {
            register,
            number_type,
        };
        self.by_register.insert(register, self.entries.len());
        self.entries.push(entry);
        entry
    }

    /// Slot whose address is held in `register`.
    pub fn entry_for(&self, register: VirtualRegister) -> Option<&StackEntry> {
        self.by_register
            .get(&register)
            .and_then(|&index| self.entries.get(index))
    }

    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
