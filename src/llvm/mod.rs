//! LLVM back-end: textual IR emission and the host clang toolchain.

pub mod emitter;
pub mod toolchain;
pub mod translate;

pub use emitter::{ArithmeticOp, IrEmitter, PRINT_FORMAT_GLOBAL};
pub use toolchain::{ClangToolchain, FixedTarget, PointerSyntax, TargetInfo};
pub use translate::{determine_stack_allocation, generate_module, translate};
