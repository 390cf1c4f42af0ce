// This module emits the textual LLVM IR for one module. IrEmitter borrows the compilation
// session and appends to its output buffer: the fixed preamble (module id, datalayout, triple,
// the printf format string constant, the opening of `main`), one alloca per stack entry,
// constant stores into the literal slots, loads guarded by the load cache so each slot is
// loaded at most once, the four integer arithmetic instructions, the printf call, and the
// fixed postamble (return, printf declaration, attribute groups and module metadata). Every
// operation appends; none is idempotent. Exponentiation and any non-arithmetic operator are
// internal compiler errors, as is handing an address reference to arithmetic or print.

//! LLVM IR emission.

use crate::core::error::{CompileError, CompileResult};
use crate::core::number::{Number, NumberType};
use crate::core::session::CompilationSession;
use crate::core::stack_frame::StackEntry;
use crate::core::value_ref::{ValueRef, VirtualRegister};
use crate::frontend::scanner::TokenKind;

use super::toolchain::PointerSyntax;

/// Global holding the `printf` format used to print results.
pub const PRINT_FORMAT_GLOBAL: &str = "@print_int_fstring";

/// Integer arithmetic instruction selected for an operator token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    UDiv,
}

impl ArithmeticOp {
    /// Select the instruction for `op`, or fail with an ICE.
    pub fn from_token(op: TokenKind) -> CompileResult<Self> {
        match op {
            TokenKind::Plus => Ok(ArithmeticOp::Add),
            TokenKind::Minus => Ok(ArithmeticOp::Sub),
            TokenKind::Star => Ok(ArithmeticOp::Mul),
            TokenKind::Slash => Ok(ArithmeticOp::UDiv),
            TokenKind::Exponent => Err(CompileError::internal(
                "Exponentiation is not supported: the target has no integer power instruction",
            )),
            other => Err(CompileError::internal(format!(
                "emit_binary_arithmetic received non-binary-arithmetic operator \"{}\"",
                other
            ))),
        }
    }

    pub fn opcode(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Mul => "mul",
            ArithmeticOp::UDiv => "udiv",
        }
    }

    /// Opcode plus wrap flags as written in the instruction.
    pub fn mnemonic(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add nsw",
            ArithmeticOp::Sub => "sub nsw",
            ArithmeticOp::Mul => "mul nsw",
            ArithmeticOp::UDiv => "udiv",
        }
    }
}

/// Appends IR for one module to a [`CompilationSession`].
pub struct IrEmitter<'s, 'arena> {
    session: &'s mut CompilationSession<'arena>,
    pointers: PointerSyntax,
}

impl<'s, 'arena> IrEmitter<'s, 'arena> {
    pub fn new(session: &'s mut CompilationSession<'arena>, pointers: PointerSyntax) -> Self {
        Self { session, pointers }
    }

    fn ptr(&self, pointee: &str) -> String {
        self.pointers.pointer_to(pointee)
    }

    /// Type of the stack slot addressed by `address`.
    fn slot_type(&self, address: VirtualRegister) -> CompileResult<NumberType> {
        self.session
            .frame()
            .entry_for(address)
            .map(|entry| entry.number_type)
            .ok_or_else(|| {
                CompileError::internal(format!("no stack slot is addressed by {}", address))
            })
    }

    /// Module header and the opening of `main`.
    pub fn emit_preamble(&mut self, datalayout: &str, triple: &str) {
        let module_id = self.session.module_id().to_string();
        let s = &mut *self.session;
        s.emit_line(&format!("; ModuleID = '{}'", module_id));
        s.emit_line(&format!("target datalayout = \"{}\"", datalayout));
        s.emit_line(&format!("target triple = \"{}\"", triple));
        s.emit_line("");
        s.emit_line(&format!(
            "{} = private unnamed_addr constant [4 x i8] c\"%d\\0A\\00\", align 1",
            PRINT_FORMAT_GLOBAL
        ));
        s.emit_line("");
        s.emit_line("; Function Attrs: noinline nounwind optnone uwtable");
        s.emit_line("define dso_local i32 @main() #0 {");
    }

    /// One `alloca` per entry, in list order.
    pub fn emit_stack_allocations(&mut self, entries: &[StackEntry]) {
        for entry in entries {
            self.session.emit_instruction(
                "alloca",
                &format!(
                    "{} = alloca {}, align {}",
                    entry.register,
                    entry.number_type.llvm_repr(),
                    entry.align_bytes()
                ),
            );
        }
    }

    /// Store a literal into the next free slot and return its address.
    pub fn emit_store_constant(&mut self, number: Number) -> CompileResult<ValueRef> {
        let target = match self.session.registers_mut().pop_free() {
            Some(reg) => reg,
            None => {
                let reg = self.session.registers_mut().next_virtual_register()?;
                log::warn!("No free stack register for {}, minted {}", number, reg);
                reg
            }
        };

        let ty = number.number_type();
        let text = format!(
            "store {} {}, {} {}, align {}",
            ty.llvm_repr(),
            number.literal(),
            self.ptr(ty.llvm_repr()),
            target,
            ty.alignment()
        );
        self.session.emit_instruction("store", &text);
        Ok(ValueRef::Address(target))
    }

    /// Resolve every reference to a value reference, loading addresses not
    /// already in the load cache.
    ///
    /// The result has the same length and order as `refs`.
    pub fn ensure_loaded(&mut self, refs: &[ValueRef]) -> CompileResult<Vec<ValueRef>> {
        let mut resolved = Vec::with_capacity(refs.len());

        for value_ref in refs {
            let address = match *value_ref {
                ValueRef::Value(_) => {
                    resolved.push(*value_ref);
                    continue;
                }
                ValueRef::Address(reg) => reg,
            };

            if let Some(loaded) = self.session.load_cache().lookup(address) {
                log::trace!("{} already loaded into {}", address, loaded);
                self.session.record_load_elided();
                resolved.push(ValueRef::Value(loaded));
                continue;
            }

            let ty = self.slot_type(address)?;
            let loaded = self.session.registers_mut().next_virtual_register()?;
            let text = format!(
                "{} = load {}, {} {}, align {}",
                loaded,
                ty.llvm_repr(),
                self.ptr(ty.llvm_repr()),
                address,
                ty.alignment()
            );
            self.session.emit_instruction("load", &text);
            self.session.load_cache_mut().record(address, loaded);
            resolved.push(ValueRef::Value(loaded));
        }

        Ok(resolved)
    }

    /// Emit `left <op> right` and return the result register.
    pub fn emit_binary_arithmetic(
        &mut self,
        op: TokenKind,
        left: ValueRef,
        right: ValueRef,
    ) -> CompileResult<ValueRef> {
        let arith = ArithmeticOp::from_token(op)?;
        let lhs = left.expect_value(arith.opcode())?;
        let rhs = right.expect_value(arith.opcode())?;

        let out = self.session.registers_mut().next_virtual_register()?;
        let text = format!(
            "{} = {} {} {}, {}",
            out,
            arith.mnemonic(),
            NumberType::Int32.llvm_repr(),
            lhs,
            rhs
        );
        self.session.emit_instruction(arith.opcode(), &text);

        // A computed value never needs re-loading.
        self.session.load_cache_mut().record(out, out);
        Ok(ValueRef::Value(out))
    }

    /// Print `value` followed by a newline through `printf`.
    pub fn emit_print(&mut self, value: ValueRef) -> CompileResult<()> {
        let reg = value.expect_value("print")?;
        let out = self.session.registers_mut().next_virtual_register()?;

        let format_arg = match self.pointers {
            PointerSyntax::Typed => format!(
                "i8* getelementptr inbounds ([4 x i8], [4 x i8]* {}, i32 0, i32 0)",
                PRINT_FORMAT_GLOBAL
            ),
            PointerSyntax::Opaque => format!("ptr {}", PRINT_FORMAT_GLOBAL),
        };
        let text = format!(
            "{} = call i32 ({}, ...) @printf({}, {} {})",
            out,
            self.ptr("i8"),
            format_arg,
            NumberType::Int32.llvm_repr(),
            reg
        );
        self.session.emit_instruction("call", &text);
        Ok(())
    }

    /// Return from `main`, close it, and write the declarations and metadata.
    pub fn emit_postamble(&mut self) {
        self.session.emit_instruction("ret", "ret i32 0");
        let printf_decl = format!("declare i32 @printf({}, ...) #1", self.ptr("i8"));

        let s = &mut *self.session;
        s.emit_line("}");
        s.emit_line("");
        s.emit_line(&printf_decl);
        s.emit_line("");
        s.emit_line(
            "attributes #0 = { noinline nounwind optnone uwtable \"frame-pointer\"=\"all\" \
             \"min-legal-vector-width\"=\"0\" \"no-trapping-math\"=\"true\" \
             \"stack-protector-buffer-size\"=\"8\" }",
        );
        s.emit_line(
            "attributes #1 = { \"frame-pointer\"=\"all\" \"no-trapping-math\"=\"true\" \
             \"stack-protector-buffer-size\"=\"8\" }",
        );
        s.emit_line("");
        s.emit_line("!llvm.module.flags = !{!0, !1, !2, !3, !4}");
        s.emit_line("!llvm.ident = !{!5}");
        s.emit_line("");
        s.emit_line("!0 = !{i32 1, !\"wchar_size\", i32 4}");
        s.emit_line("!1 = !{i32 7, !\"PIC Level\", i32 2}");
        s.emit_line("!2 = !{i32 7, !\"PIE Level\", i32 2}");
        s.emit_line("!3 = !{i32 7, !\"uwtable\", i32 1}");
        s.emit_line("!4 = !{i32 7, !\"frame-pointer\", i32 2}");
        s.emit_line(&format!(
            "!5 = !{{!\"tallyc version {}\"}}",
            env!("CARGO_PKG_VERSION")
        ));
    }
}
