//! Memo of stack slots whose value is already materialised in a register.
//!
//! Entries are only ever added. Nothing is invalidated on a later store,
//! which holds up because every literal slot is written exactly once.

use hashbrown::HashMap;

use super::value_ref::VirtualRegister;

/// Append-only mapping from address register to value register.
#[derive(Debug, Clone, Default)]
pub struct LoadCache {
    loaded: HashMap<VirtualRegister, VirtualRegister>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `address` has been loaded into `value`.
    ///
    /// The first mapping recorded for an address wins.
    pub fn record(&mut self, address: VirtualRegister, value: VirtualRegister) {
        if self.loaded.contains_key(&address) {
            log::warn!("{} already loaded, keeping first mapping", address);
            return;
        }
        self.loaded.insert(address, value);
    }

    pub fn lookup(&self, address: VirtualRegister) -> Option<VirtualRegister> {
        self.loaded.get(&address).copied()
    }

    /// Number of registers with a known value, loaded or computed.
    pub fn entry_count(&self) -> usize {
        self.loaded.len()
    }
}
