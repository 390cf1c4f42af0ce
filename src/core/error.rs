// This module defines error types for the tallyc compiler using the thiserror crate for
// idiomatic Rust error handling. CompileError is the main error enum covering the fatal
// failure categories of a compilation: file I/O failures, lexical/syntax errors (with the
// source file name and line), internal compiler errors (an unsupported operator reaching the
// emitter, arithmetic on an address reference), failure to spawn a toolchain process, and a
// toolchain process exiting unsuccessfully. Each category maps to a distinct process exit
// code so shell callers can tell them apart. CompileResult<T> is a convenience alias.

//! Error types for the tallyc compiler.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Main error type for a compilation.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Unable to access {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{file}:{line}: syntax error: {message}")]
    Syntax {
        file: String,
        line: usize,
        message: String,
    },

    #[error("internal compiler error: {message}")]
    Internal {
        message: String,
    },

    #[error("Failed to run {program}: {source}")]
    ToolchainSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}{}", render_output(.output))]
    Toolchain {
        program: String,
        status: ExitStatus,
        output: String,
    },
}

fn render_output(output: &str) -> String {
    if output.trim().is_empty() {
        String::new()
    } else {
        format!(":\n{}", output.trim_end())
    }
}

impl CompileError {
    /// Build an internal compiler error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Process exit code for this error category.
    pub fn exit_code(&self) -> u8 {
        match self {
            CompileError::Syntax { .. } => 2,
            CompileError::File { .. } => 3,
            CompileError::Internal { .. } => 4,
            CompileError::ToolchainSpawn { .. } | CompileError::Toolchain { .. } => 5,
        }
    }

    /// Whether this is an internal compiler error.
    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal { .. })
    }
}

/// Exit code for command line usage errors, which never become a `CompileError`.
///
/// clap's own default for these is 2, which would be indistinguishable from a
/// syntax error.
pub const USAGE_EXIT_CODE: u8 = 1;

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
