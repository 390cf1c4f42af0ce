//! tallyc - an ahead-of-time compiler for arithmetic expression programs.
//!
//! A program is a single integer expression, optionally introduced by `print`
//! and terminated by `;`. tallyc parses it, emits a textual LLVM IR module
//! whose `main` prints the result, and asks the host clang to build an
//! executable from that module.
//!
//! ```ignore
//! use tallyc::driver::compile_to_ir;
//! use tallyc::frontend::SourceFile;
//! use tallyc::llvm::FixedTarget;
//!
//! let source = SourceFile::new("sum.tl", "print 2 + 3;");
//! let ir = compile_to_ir(&source, &mut FixedTarget::x86_64_linux())?;
//! ```
//!
//! # Architecture
//!
//! - [`frontend`] - scanner, AST and precedence-climbing parser
//! - [`core`] - session state: registers, stack frame, load cache, errors
//! - [`llvm`] - IR emission, translation and the clang toolchain
//! - [`driver`] - the end-to-end compilation pipeline
//! - [`config`] - compiler options

pub mod config;
pub mod core;
pub mod driver;
pub mod frontend;
pub mod llvm;

pub use crate::config::{CompilerConfig, ToolchainFailurePolicy};
pub use crate::core::{CompilationSession, CompileError, CompileResult, SessionStats};
pub use crate::driver::{compile, compile_to_ir};
