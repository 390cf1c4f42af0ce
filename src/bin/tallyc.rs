//! tallyc command line driver.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tallyc::config::{CompilerConfig, TargetOverride, ToolchainFailurePolicy, Verbosity};
use tallyc::core::USAGE_EXIT_CODE;

#[derive(Parser)]
#[command(name = "tallyc")]
#[command(
    author,
    version,
    about = "Compile an arithmetic expression program to a native executable",
    long_about = None
)]
struct Cli {
    /// Source file to compile
    input: PathBuf,

    /// Executable produced by clang
    #[arg(short, long, default_value = CompilerConfig::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Where to write the LLVM IR module
    #[arg(long, default_value = CompilerConfig::DEFAULT_IR_OUTPUT)]
    ir_output: PathBuf,

    /// Stop after writing the LLVM IR module
    #[arg(long)]
    emit_llvm: bool,

    /// clang executable used for probing and linking
    #[arg(long, env = "TALLYC_CLANG", default_value = CompilerConfig::DEFAULT_CLANG)]
    clang: PathBuf,

    /// What to do when clang fails to build the executable
    #[arg(long, value_enum, default_value_t = ToolchainFailurePolicy::FailFast)]
    on_toolchain_failure: ToolchainFailurePolicy,

    /// Log level; RUST_LOG overrides it
    #[arg(long, value_enum, default_value_t = Verbosity::Warn)]
    logging: Verbosity,

    /// Target triple to use instead of asking clang
    #[arg(long, requires = "target_datalayout")]
    target_triple: Option<String>,

    /// Target datalayout to use instead of asking clang
    #[arg(long, requires = "target_triple")]
    target_datalayout: Option<String>,

    /// Spell pointers as typed (`i32*`) when the target is given explicitly
    #[arg(long)]
    typed_pointers: bool,
}

impl Cli {
    fn into_config(self) -> CompilerConfig {
        let target = match (self.target_triple, self.target_datalayout) {
            (Some(triple), Some(datalayout)) => Some(TargetOverride {
                triple,
                datalayout,
                opaque_pointers: !self.typed_pointers,
            }),
            _ => None,
        };

        CompilerConfig {
            input: self.input,
            ir_output: self.ir_output,
            output: self.output,
            clang: self.clang,
            emit_llvm_only: self.emit_llvm,
            toolchain_failure: self.on_toolchain_failure,
            target,
            verbosity: self.logging,
        }
    }
}

fn main() -> ExitCode {
    let config = match Cli::try_parse() {
        Ok(cli) => cli.into_config(),
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(USAGE_EXIT_CODE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    env_logger::Builder::new()
        .filter_level(config.verbosity.level_filter())
        .parse_default_env()
        .init();

    match tallyc::driver::compile(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("Compilation failed: {:?}", err);
            eprintln!("tallyc: {}", err);
            if err.is_internal() {
                eprintln!("tallyc: this is a compiler bug; rerun with --logging debug for details");
            }
            ExitCode::from(err.exit_code())
        }
    }
}
