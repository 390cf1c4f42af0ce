// This module wraps the host clang, which tallyc relies on both to describe the target and to
// turn the emitted module into an executable. Target discovery goes through the TargetInfo
// trait: ClangToolchain compiles a tiny generator C program to LLVM IR once, pattern-matches
// the `target datalayout` line out of it, checks whether that IR spells pointers as `ptr`
// (opaque pointers) or `T*`, and asks `clang -print-target-triple` for the triple.
// FixedTarget answers the same queries from literal strings for tests and command line
// overrides. Every process runs synchronously: the caller blocks on the combined output and
// exit status, with no timeout. Query failures are always fatal; a failing final
// assemble-and-link step is resolved by the configured ToolchainFailurePolicy.

//! Host toolchain probing and invocation.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::ToolchainFailurePolicy;
use crate::core::error::{CompileError, CompileResult};

/// Source of the program compiled only to read the toolchain's target metadata.
///
/// It takes the address of a local so the emitted IR shows the pointer syntax.
pub const GENERATOR_PROGRAM: &str = "int main(void) {
    int value = 0;
    int *slot = &value;
    return *slot;
}
";

/// How pointer types are spelled in textual IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSyntax {
    /// Pre-LLVM-15 typed pointers, e.g. `i32*`.
    Typed,
    /// Opaque `ptr`.
    Opaque,
}

impl PointerSyntax {
    /// Spell a pointer to `pointee`.
    pub fn pointer_to(self, pointee: &str) -> String {
        match self {
            PointerSyntax::Typed => format!("{}*", pointee),
            PointerSyntax::Opaque => "ptr".to_string(),
        }
    }
}

/// Target metadata queries needed by the module preamble.
pub trait TargetInfo {
    fn target_datalayout(&mut self) -> CompileResult<String>;
    fn target_triple(&mut self) -> CompileResult<String>;
    fn pointer_syntax(&mut self) -> CompileResult<PointerSyntax>;
}

/// Target description given up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedTarget {
    pub datalayout: String,
    pub triple: String,
    pub pointer_syntax: PointerSyntax,
}

impl FixedTarget {
    pub fn new(
        datalayout: impl Into<String>,
        triple: impl Into<String>,
        pointer_syntax: PointerSyntax,
    ) -> Self {
        Self {
            datalayout: datalayout.into(),
            triple: triple.into(),
            pointer_syntax,
        }
    }

    /// Linux x86-64 description as printed by recent clang releases.
    pub fn x86_64_linux() -> Self {
        Self::new(
            "e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:128-n8:16:32:64-S128",
            "x86_64-pc-linux-gnu",
            PointerSyntax::Opaque,
        )
    }
}

impl TargetInfo for FixedTarget {
    fn target_datalayout(&mut self) -> CompileResult<String> {
        Ok(self.datalayout.clone())
    }

    fn target_triple(&mut self) -> CompileResult<String> {
        Ok(self.triple.clone())
    }

    fn pointer_syntax(&mut self) -> CompileResult<PointerSyntax> {
        Ok(self.pointer_syntax)
    }
}

/// Captured result of one toolchain process.
struct ToolOutput {
    status: ExitStatus,
    /// stdout followed by stderr.
    text: String,
}

/// The host clang, queried lazily and cached.
pub struct ClangToolchain {
    clang: PathBuf,
    work_dir: PathBuf,
    generator_ir: Option<String>,
    triple: Option<String>,
}

static GENERATOR_SEQ: AtomicUsize = AtomicUsize::new(0);

impl ClangToolchain {
    pub fn new(clang: impl Into<PathBuf>) -> Self {
        Self {
            clang: clang.into(),
            work_dir: temp_dir(),
            generator_ir: None,
            triple: None,
        }
    }

    fn program_name(&self) -> String {
        self.clang.display().to_string()
    }

    fn run<I, S>(&self, args: I) -> CompileResult<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.clang);
        cmd.args(args);
        log::debug!("Running {:?}", cmd);

        let output = cmd.output().map_err(|source| CompileError::ToolchainSpawn {
            program: self.program_name(),
            source,
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        for line in text.lines() {
            log::debug!("[{}] {}", self.program_name(), line);
        }

        Ok(ToolOutput {
            status: output.status,
            text,
        })
    }

    /// Run a target query; any non-zero exit is fatal.
    fn run_query<I, S>(&self, args: I) -> CompileResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let out = self.run(args)?;
        if !out.status.success() {
            return Err(CompileError::Toolchain {
                program: self.program_name(),
                status: out.status,
                output: out.text,
            });
        }
        Ok(out.text)
    }

    fn compile_generator_program(&self) -> CompileResult<String> {
        let seq = GENERATOR_SEQ.fetch_add(1, Ordering::Relaxed);
        let stem = format!("tallyc-generator-{}-{}", std::process::id(), seq);
        let c_path = self.work_dir.join(format!("{}.c", stem));
        let ll_path = self.work_dir.join(format!("{}.ll", stem));

        log::debug!("Writing generator program to {}", c_path.display());
        fs::write(&c_path, GENERATOR_PROGRAM).map_err(|source| CompileError::File {
            path: c_path.clone(),
            source,
        })?;

        let args: [&OsStr; 6] = [
            OsStr::new("-S"),
            OsStr::new("-emit-llvm"),
            OsStr::new("-w"),
            c_path.as_os_str(),
            OsStr::new("-o"),
            ll_path.as_os_str(),
        ];
        let result = self.run_query(args).and_then(|_| {
            fs::read_to_string(&ll_path).map_err(|source| CompileError::File {
                path: ll_path.clone(),
                source,
            })
        });

        let _ = fs::remove_file(&c_path);
        let _ = fs::remove_file(&ll_path);
        result
    }

    fn generator_ir(&mut self) -> CompileResult<&str> {
        if self.generator_ir.is_none() {
            let ir = self.compile_generator_program()?;
            self.generator_ir = Some(ir);
        }
        Ok(self.generator_ir.as_deref().unwrap_or_default())
    }

    /// Assemble and link `ir_path` into `output_path`.
    ///
    /// A non-zero exit is always logged; `policy` decides whether it fails
    /// the compilation.
    pub fn compile(
        &self,
        ir_path: &Path,
        output_path: &Path,
        policy: ToolchainFailurePolicy,
    ) -> CompileResult<()> {
        log::debug!("Compiling {} with {}", ir_path.display(), self.program_name());

        let args: [&OsStr; 3] = [ir_path.as_os_str(), OsStr::new("-o"), output_path.as_os_str()];
        let out = self.run(args)?;
        if out.status.success() {
            return Ok(());
        }

        log::error!("{} exited with {}", self.program_name(), out.status);
        match policy {
            ToolchainFailurePolicy::FailFast => Err(CompileError::Toolchain {
                program: self.program_name(),
                status: out.status,
                output: out.text,
            }),
            ToolchainFailurePolicy::Warn => {
                log::warn!(
                    "Continuing after toolchain failure; {} may be stale or missing",
                    output_path.display()
                );
                Ok(())
            }
        }
    }
}

impl TargetInfo for ClangToolchain {
    fn target_datalayout(&mut self) -> CompileResult<String> {
        log::debug!("Retrieving target datalayout");
        let ir = self.generator_ir()?;
        extract_datalayout(ir)
            .ok_or_else(|| CompileError::internal("Failed to determine target datalayout"))
    }

    fn target_triple(&mut self) -> CompileResult<String> {
        if let Some(triple) = &self.triple {
            return Ok(triple.clone());
        }

        log::debug!("Retrieving target triple");
        let out = self.run_query(["-print-target-triple"])?;
        let triple = out.lines().next().unwrap_or_default().trim().to_string();
        if triple.is_empty() {
            return Err(CompileError::internal("Failed to determine target triple"));
        }
        self.triple = Some(triple.clone());
        Ok(triple)
    }

    fn pointer_syntax(&mut self) -> CompileResult<PointerSyntax> {
        let ir = self.generator_ir()?;
        Ok(detect_pointer_syntax(ir))
    }
}

/// Pull the quoted datalayout string out of a module's text.
pub fn extract_datalayout(ir: &str) -> Option<String> {
    ir.lines().find_map(|line| {
        line.trim()
            .strip_prefix("target datalayout = \"")
            .and_then(|rest| rest.strip_suffix('"'))
            .map(str::to_string)
    })
}

/// Opaque pointers if any word of the module is the bare `ptr` type.
pub fn detect_pointer_syntax(ir: &str) -> PointerSyntax {
    let opaque = ir
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '(' | ')'))
        .any(|word| word == "ptr");
    if opaque {
        PointerSyntax::Opaque
    } else {
        PointerSyntax::Typed
    }
}

/// Directory for scratch files: `TEMP`, `TMP`, `TMPDIR`, then the platform default.
pub fn temp_dir() -> PathBuf {
    ["TEMP", "TMP", "TMPDIR"]
        .iter()
        .filter_map(|var| env::var_os(var))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir)
}
