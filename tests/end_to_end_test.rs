//! End-to-end tests: compile with the host clang and run the executable.
//!
//! Each test is skipped with a note on stderr when clang cannot be found.
//! Set `TALLYC_REQUIRE_CLANG` to turn a missing clang into a failure instead.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use tallyc::config::CompilerConfig;
use tallyc::driver::compile;
use tallyc::ToolchainFailurePolicy;

fn clang() -> PathBuf {
    std::env::var_os("TALLYC_CLANG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CompilerConfig::DEFAULT_CLANG))
}

fn clang_available() -> bool {
    Command::new(clang())
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Compile and run `program`, returning its stdout and exit code.
fn compile_and_run(name: &str, program: &str) -> Option<(String, Option<i32>)> {
    let _ = env_logger::builder().is_test(true).try_init();
    if !clang_available() {
        assert!(
            std::env::var_os("TALLYC_REQUIRE_CLANG").is_none(),
            "clang not found at {} but TALLYC_REQUIRE_CLANG is set",
            clang().display()
        );
        // Written straight to the stderr handle so the test harness doesn't capture it.
        let _ = writeln!(std::io::stderr(), "skipping {}: clang not found", name);
        return None;
    }

    let dir = std::env::temp_dir();
    let stem = format!("tallyc-e2e-{}-{}", std::process::id(), name);
    let input = dir.join(format!("{}.tl", stem));
    let exe = dir.join(&stem);
    fs::write(&input, program).unwrap();

    let mut config = CompilerConfig::new(&input);
    config.ir_output = dir.join(format!("{}.ll", stem));
    config.output = exe.clone();
    config.clang = clang();
    config.toolchain_failure = ToolchainFailurePolicy::FailFast;

    let result = compile(&config);
    let run = result.as_ref().ok().map(|_| Command::new(&exe).output().unwrap());

    let _ = fs::remove_file(&input);
    let _ = fs::remove_file(&config.ir_output);
    let _ = fs::remove_file(&exe);

    if let Err(err) = result {
        panic!("compilation of {} failed: {}", name, err);
    }
    let run = run?;
    Some((String::from_utf8_lossy(&run.stdout).into_owned(), run.status.code()))
}

#[test]
fn test_addition_prints_five() {
    if let Some((stdout, code)) = compile_and_run("add", "2 + 3") {
        assert_eq!(stdout, "5\n");
        assert_eq!(code, Some(0));
    }
}

#[test]
fn test_division_is_unsigned_and_truncates() {
    if let Some((stdout, code)) = compile_and_run("div", "10 / 3") {
        assert_eq!(stdout, "3\n");
        assert_eq!(code, Some(0));
    }
}

#[test]
fn test_precedence_at_runtime() {
    if let Some((stdout, _)) = compile_and_run("prec", "print 2 + 3 * 4 - 6 / 2;") {
        assert_eq!(stdout, "11\n");
    }
}
