// This module provides the compilation session: the single context value that owns every piece
// of mutable state for one compilation pass. It holds the bumpalo arena the parser allocates
// AST nodes in, the register file (monotonic counter plus free-register stack), the stack
// frame (ordered literal slots), the load cache, the append-only textual output buffer, and
// statistics. The session is created by the driver and threaded explicitly through the
// emitter, so two compilations never share state and tests can run sessions side by side.
// SessionStats tracks registers minted, stack slots, loads emitted versus elided by the load
// cache, and a per-opcode instruction breakdown.

//! Arena-based compilation session.
//!
//! All AST nodes are allocated in the session arena and share its lifetime;
//! everything else the emitter mutates lives in the session itself.

use bumpalo::Bump;
use std::collections::HashMap;
use std::fmt;

use super::load_cache::LoadCache;
use super::register_file::RegisterFile;
use super::stack_frame::StackFrame;

/// State for one compilation pass.
pub struct CompilationSession<'arena> {
    /// Arena allocator for AST nodes.
    arena: &'arena Bump,

    /// Identifier written into the module header.
    module_id: String,

    registers: RegisterFile,
    frame: StackFrame,
    load_cache: LoadCache,

    /// Textual IR emitted so far.
    output: String,

    stats: SessionStats,
}

impl<'arena> CompilationSession<'arena> {
    /// Create a new compilation session with the given arena.
    pub fn new(arena: &'arena Bump, module_id: impl Into<String>) -> Self {
        Self {
            arena,
            module_id: module_id.into(),
            registers: RegisterFile::new(),
            frame: StackFrame::new(),
            load_cache: LoadCache::new(),
            output: String::new(),
            stats: SessionStats::default(),
        }
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    pub fn frame(&self) -> &StackFrame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut StackFrame {
        &mut self.frame
    }

    pub fn load_cache(&self) -> &LoadCache {
        &self.load_cache
    }

    pub fn load_cache_mut(&mut self) -> &mut LoadCache {
        &mut self.load_cache
    }

    /// Append a raw line to the module.
    pub fn emit_line(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }

    /// Append an indented function-body instruction and count it under `opcode`.
    pub fn emit_instruction(&mut self, opcode: &str, text: &str) {
        log::trace!("emit: {}", text);
        self.output.push('\t');
        self.emit_line(text);
        self.record_instruction(opcode);
    }

    /// IR text emitted so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Consume the session, returning the finished module text.
    pub fn into_output(self) -> String {
        self.output
    }

    fn record_instruction(&mut self, opcode: &str) {
        self.stats.instructions_emitted += 1;
        *self
            .stats
            .instruction_counts
            .entry(opcode.to_string())
            .or_insert(0) += 1;
    }

    /// Record a load the cache made unnecessary.
    pub fn record_load_elided(&mut self) {
        self.stats.loads_elided += 1;
    }

    /// Get compilation statistics.
    pub fn stats(&self) -> SessionStats {
        let mut stats = self.stats.clone();
        stats.registers_minted = self.registers.minted();
        stats.stack_slots = self.frame.len();
        stats.cached_values = self.load_cache.entry_count();
        stats
    }
}

/// Compilation session statistics.
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    /// Virtual registers issued by the counter.
    pub registers_minted: usize,

    /// Stack slots allocated by the pre-pass.
    pub stack_slots: usize,

    /// Function-body instructions emitted.
    pub instructions_emitted: usize,

    /// Loads skipped because the value was already in a register.
    pub loads_elided: usize,

    /// Registers the load cache knows the value of.
    pub cached_values: usize,

    /// Count of each instruction opcode emitted.
    pub instruction_counts: HashMap<String, usize>,
}

impl SessionStats {
    /// Emitted instructions with the given opcode.
    pub fn count(&self, opcode: &str) -> usize {
        self.instruction_counts.get(opcode).copied().unwrap_or(0)
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compilation Session Statistics:")?;
        writeln!(f, "  Registers minted: {}", self.registers_minted)?;
        writeln!(f, "  Stack slots: {}", self.stack_slots)?;
        writeln!(f, "  Instructions emitted: {}", self.instructions_emitted)?;
        writeln!(f, "  Loads elided: {}", self.loads_elided)?;
        writeln!(f, "  Cached values: {}", self.cached_values)?;

        if !self.instruction_counts.is_empty() {
            writeln!(f, "  Instruction breakdown:")?;
            let mut sorted: Vec<_> = self.instruction_counts.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

            for (opcode, count) in sorted {
                writeln!(f, "    {}: {}", opcode, count)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value_ref::VirtualRegister;

    #[test]
    fn test_compilation_session_creation() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena, "prog.tl");

        assert_eq!(session.module_id(), "prog.tl");
        assert!(session.output().is_empty());
        let stats = session.stats();
        assert_eq!(stats.registers_minted, 0);
        assert_eq!(stats.instructions_emitted, 0);
    }

    #[test]
    fn test_emit_instruction_indents_and_counts() {
        let arena = Bump::new();
        let mut session = CompilationSession::new(&arena, "prog.tl");

        session.emit_line("define dso_local i32 @main() #0 {");
        session.emit_instruction("ret", "ret i32 0");

        assert_eq!(
            session.output(),
            "define dso_local i32 @main() #0 {\n\tret i32 0\n"
        );
        assert_eq!(session.stats().count("ret"), 1);
        assert_eq!(session.stats().count("load"), 0);
    }

    #[test]
    fn test_independent_sessions() {
        let arena = Bump::new();
        let mut first = CompilationSession::new(&arena, "a.tl");
        let mut second = CompilationSession::new(&arena, "b.tl");

        first.registers_mut().next_virtual_register().unwrap();
        first.registers_mut().next_virtual_register().unwrap();
        let reg = second.registers_mut().next_virtual_register().unwrap();

        assert_eq!(reg, VirtualRegister(1));
        assert_eq!(first.stats().registers_minted, 2);
        assert_eq!(second.stats().registers_minted, 1);
    }

    #[test]
    fn test_statistics_display() {
        let arena = Bump::new();
        let mut session = CompilationSession::new(&arena, "prog.tl");

        session.emit_instruction("load", "%3 = load i32, ptr %1, align 4");
        session.emit_instruction("add", "%4 = add nsw i32 %3, %3");
        session.record_load_elided();

        let output = format!("{}", session.stats());
        assert!(output.contains("Instructions emitted: 2"));
        assert!(output.contains("Loads elided: 1"));
        assert!(output.contains("add: 1"));
    }
}
