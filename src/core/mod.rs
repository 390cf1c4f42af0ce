// This module is the hub for the backend state shared by every compilation pass: number types,
// virtual registers and the value/address reference distinction, the register file with its
// free-register stack, the ordered stack frame, the load cache, the compilation session that
// bundles them, and the error types used across the crate.

//! Core compilation state.
//!
//! # Key Components
//!
//! - [`number`]: self-describing number types and literals
//! - [`value_ref`]: virtual registers tagged as value or address
//! - [`register_file`]: monotonic register counter and free-register stack
//! - [`stack_frame`]: ordered literal stack slots
//! - [`load_cache`]: which slots already have a value in a register
//! - [`session`]: the per-compilation context owning all of the above

pub mod error;
pub mod load_cache;
pub mod number;
pub mod register_file;
pub mod session;
pub mod stack_frame;
pub mod value_ref;

pub use error::{CompileError, CompileResult, USAGE_EXIT_CODE};
pub use load_cache::LoadCache;
pub use number::{Number, NumberType};
pub use register_file::{RegisterFile, FIRST_VIRTUAL_REGISTER};
pub use session::{CompilationSession, SessionStats};
pub use stack_frame::{StackEntry, StackFrame};
pub use value_ref::{ValueRef, VirtualRegister};
