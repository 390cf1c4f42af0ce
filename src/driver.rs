// This module runs one whole compilation. It reads the source file, parses it into an
// arena-backed AST, picks the target description (a FixedTarget built from a command line
// override, or the queried host clang), translates the AST into a textual IR module, writes
// that module to the configured IR path, and finally hands the module to clang to build the
// executable unless only IR was requested. Nothing is written when any step before the IR
// write fails, so a syntax or internal error never leaves a partial module on disk.

//! Compilation pipeline.

use std::fs;
use std::path::Path;

use bumpalo::Bump;

use crate::config::CompilerConfig;
use crate::core::error::{CompileError, CompileResult};
use crate::core::session::CompilationSession;
use crate::frontend::parser::parse_program;
use crate::frontend::scanner::SourceFile;
use crate::llvm::toolchain::{ClangToolchain, FixedTarget, PointerSyntax, TargetInfo};
use crate::llvm::translate::generate_module;

/// Read `path` as a source file.
pub fn read_source(path: &Path) -> CompileResult<SourceFile> {
    let text = fs::read_to_string(path).map_err(|source| CompileError::File {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SourceFile::new(path.display().to_string(), text))
}

/// Compile `source` to the text of an IR module.
pub fn compile_to_ir(source: &SourceFile, target: &mut dyn TargetInfo) -> CompileResult<String> {
    let arena = Bump::new();
    let session = CompilationSession::new(&arena, source.name.clone());
    let expr = parse_program(source, session.arena())?;
    log::debug!("Parsed {} literals from {}", expr.literal_count(), source.name);

    generate_module(session, expr, target)
}

/// Run the configured compilation end to end.
pub fn compile(config: &CompilerConfig) -> CompileResult<()> {
    log::info!("Compiling {}", config.input.display());
    let source = read_source(&config.input)?;

    let mut toolchain = ClangToolchain::new(&config.clang);
    let ir = match &config.target {
        Some(target) => {
            let pointers = if target.opaque_pointers {
                PointerSyntax::Opaque
            } else {
                PointerSyntax::Typed
            };
            let mut fixed = FixedTarget::new(&target.datalayout, &target.triple, pointers);
            compile_to_ir(&source, &mut fixed)?
        }
        None => compile_to_ir(&source, &mut toolchain)?,
    };

    log::info!("Writing IR to {}", config.ir_output.display());
    fs::write(&config.ir_output, ir).map_err(|source| CompileError::File {
        path: config.ir_output.clone(),
        source,
    })?;

    if config.emit_llvm_only {
        return Ok(());
    }

    log::info!("Building {}", config.output.display());
    toolchain.compile(&config.ir_output, &config.output, config.toolchain_failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetOverride;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        crate::llvm::toolchain::temp_dir().join(format!(
            "tallyc-driver-{}-{}",
            std::process::id(),
            name
        ))
    }

    fn fixed_config(input: &Path, ir_output: &Path) -> CompilerConfig {
        let mut config = CompilerConfig::new(input);
        config.ir_output = ir_output.to_path_buf();
        config.emit_llvm_only = true;
        config.target = Some(TargetOverride {
            triple: "x86_64-pc-linux-gnu".to_string(),
            datalayout: "e-m:e-i64:64-n8:16:32:64-S128".to_string(),
            opaque_pointers: false,
        });
        config
    }

    #[test]
    fn test_missing_input_is_file_error() {
        let config = CompilerConfig::new(scratch("does-not-exist.tl"));
        let err = compile(&config).unwrap_err();
        assert!(matches!(err, CompileError::File { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_emit_llvm_with_override() {
        let input = scratch("override.tl");
        let ir_output = scratch("override.ll");
        fs::write(&input, "print 6 / 2;\n").unwrap();

        compile(&fixed_config(&input, &ir_output)).unwrap();
        let ir = fs::read_to_string(&ir_output).unwrap();

        let _ = fs::remove_file(&input);
        let _ = fs::remove_file(&ir_output);

        assert!(ir.contains("target triple = \"x86_64-pc-linux-gnu\""));
        assert!(ir.contains("%5 = udiv i32 %3, %4"));
        assert!(ir.contains("store i32 6, i32* %1, align 4"));
        assert!(ir.contains("declare i32 @printf(i8*, ...) #1"));
    }

    #[test]
    fn test_syntax_error_writes_nothing() {
        let input = scratch("bad.tl");
        let ir_output = scratch("bad.ll");
        fs::write(&input, "2 & 3").unwrap();

        let err = compile(&fixed_config(&input, &ir_output)).unwrap_err();
        let _ = fs::remove_file(&input);

        assert_eq!(err.exit_code(), 2);
        assert!(!ir_output.exists());
    }
}
