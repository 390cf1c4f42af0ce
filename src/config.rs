//! Compiler configuration.
//!
//! The binary fills a [`CompilerConfig`] from its command line; library users
//! can build one directly.

use std::path::PathBuf;

use clap::ValueEnum;

/// What to do when the final assemble-and-link step exits unsuccessfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ToolchainFailurePolicy {
    /// Abort the compilation with a toolchain error.
    #[default]
    #[value(name = "fail")]
    FailFast,
    /// Log the failure and report success.
    Warn,
}

/// Logging verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Verbosity {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    pub fn level_filter(self) -> log::LevelFilter {
        match self {
            Verbosity::Error => log::LevelFilter::Error,
            Verbosity::Warn => log::LevelFilter::Warn,
            Verbosity::Info => log::LevelFilter::Info,
            Verbosity::Debug => log::LevelFilter::Debug,
            Verbosity::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Explicit target description replacing the clang queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOverride {
    pub triple: String,
    pub datalayout: String,
    pub opaque_pointers: bool,
}

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub input: PathBuf,
    /// Where the textual IR module is written.
    pub ir_output: PathBuf,
    /// Where clang writes the executable.
    pub output: PathBuf,
    pub clang: PathBuf,
    /// Stop after writing the IR module.
    pub emit_llvm_only: bool,
    pub toolchain_failure: ToolchainFailurePolicy,
    pub target: Option<TargetOverride>,
    pub verbosity: Verbosity,
}

impl CompilerConfig {
    pub const DEFAULT_IR_OUTPUT: &'static str = "a.ll";
    pub const DEFAULT_OUTPUT: &'static str = "a.out";
    pub const DEFAULT_CLANG: &'static str = "clang";

    /// Configuration with every option at its default.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ir_output: PathBuf::from(Self::DEFAULT_IR_OUTPUT),
            output: PathBuf::from(Self::DEFAULT_OUTPUT),
            clang: PathBuf::from(Self::DEFAULT_CLANG),
            emit_llvm_only: false,
            toolchain_failure: ToolchainFailurePolicy::default(),
            target: None,
            verbosity: Verbosity::default(),
        }
    }
}
