//! AST to IR translation.
//!
//! Translation runs in two passes over the expression tree. The stack pre-pass
//! gives every literal its own `alloca` slot and queues the slot registers so
//! that constant stores consume them in the order literals are met. The
//! emission pass then walks the tree post-order: both children first, then the
//! loads the operator needs, then the arithmetic instruction.

use crate::core::error::{CompileError, CompileResult};
use crate::core::session::CompilationSession;
use crate::core::value_ref::ValueRef;
use crate::frontend::ast::Expr;
use crate::frontend::scanner::TokenKind;

use super::emitter::IrEmitter;
use super::toolchain::TargetInfo;

/// Allocate one stack slot per literal in `expr`, left to right.
///
/// Must run before any instruction is emitted: the slot registers are the
/// first ones minted in the function.
pub fn determine_stack_allocation(
    session: &mut CompilationSession<'_>,
    expr: &Expr<'_>,
) -> CompileResult<()> {
    let mut literal_types = Vec::with_capacity(expr.literal_count());
    expr.for_each_literal(&mut |number| literal_types.push(number.number_type()));

    let mut slots = Vec::with_capacity(literal_types.len());
    for number_type in literal_types {
        let reg = session.registers_mut().next_virtual_register()?;
        let entry = session.frame_mut().allocate_stack_slot(number_type, reg);
        log::trace!(
            "Stack slot {} for {} ({} bytes)",
            entry.register,
            number_type,
            number_type.byte_size()
        );
        slots.push(reg);
    }

    log::debug!("Allocated {} stack slots", slots.len());
    session.registers_mut().release_in_order(slots);
    Ok(())
}

/// Translate `expr` into a complete module in `session`'s output buffer.
pub fn translate(
    session: &mut CompilationSession<'_>,
    expr: &Expr<'_>,
    target: &mut dyn TargetInfo,
) -> CompileResult<()> {
    let datalayout = target.target_datalayout()?;
    let triple = target.target_triple()?;
    let pointers = target.pointer_syntax()?;
    log::debug!("Target {} ({:?} pointers)", triple, pointers);

    determine_stack_allocation(session, expr)?;
    let entries = session.frame().entries().to_vec();

    let mut emitter = IrEmitter::new(session, pointers);
    emitter.emit_preamble(&datalayout, &triple);
    emitter.emit_stack_allocations(&entries);

    let result = translate_expr(&mut emitter, expr)?;
    match emitter.ensure_loaded(&[result])?.as_slice() {
        [value] => emitter.emit_print(*value)?,
        other => {
            return Err(CompileError::internal(format!(
                "expected one loaded result, got {}",
                other.len()
            )))
        }
    }

    emitter.emit_postamble();
    Ok(())
}

/// Translate `expr` in a fresh `session` and return the module text.
pub fn generate_module(
    mut session: CompilationSession<'_>,
    expr: &Expr<'_>,
    target: &mut dyn TargetInfo,
) -> CompileResult<String> {
    translate(&mut session, expr, target)?;

    log::debug!("{}", session.stats());
    Ok(session.into_output())
}

/// Pending step of the post-order walk.
enum Step<'e, 'a> {
    Visit(&'e Expr<'a>),
    Apply(TokenKind),
}

/// Emit `expr` post-order with an explicit work stack.
fn translate_expr(emitter: &mut IrEmitter<'_, '_>, expr: &Expr<'_>) -> CompileResult<ValueRef> {
    let mut work = vec![Step::Visit(expr)];
    let mut results: Vec<ValueRef> = Vec::new();

    while let Some(step) = work.pop() {
        match step {
            Step::Visit(Expr::Literal(number)) => {
                results.push(emitter.emit_store_constant(*number)?);
            }
            Step::Visit(Expr::Binary { op, lhs, rhs }) => {
                work.push(Step::Apply(*op));
                work.push(Step::Visit(*rhs));
                work.push(Step::Visit(*lhs));
            }
            Step::Apply(op) => {
                let (Some(right), Some(left)) = (results.pop(), results.pop()) else {
                    return Err(CompileError::internal(format!(
                        "operator \"{}\" is missing an operand",
                        op
                    )));
                };
                let value = match emitter.ensure_loaded(&[left, right])?.as_slice() {
                    [left, right] => emitter.emit_binary_arithmetic(op, *left, *right)?,
                    other => {
                        return Err(CompileError::internal(format!(
                            "expected two loaded operands, got {}",
                            other.len()
                        )))
                    }
                };
                results.push(value);
            }
        }
    }

    match results.as_slice() {
        [value] => Ok(*value),
        other => Err(CompileError::internal(format!(
            "expression left {} results",
            other.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::number::NumberType;
    use crate::core::value_ref::VirtualRegister;
    use crate::frontend::parser::parse_program;
    use crate::frontend::scanner::SourceFile;
    use crate::llvm::toolchain::{FixedTarget, PointerSyntax};
    use bumpalo::Bump;

    fn body_lines(ir: &str) -> Vec<&str> {
        ir.lines()
            .filter_map(|line| line.strip_prefix('\t'))
            .collect()
    }

    #[test]
    fn test_stack_allocation_per_literal() {
        let arena = Bump::new();
        let source = SourceFile::new("t.tl", "1 + 2 * 3");
        let expr = parse_program(&source, &arena).unwrap();
        let mut session = CompilationSession::new(&arena, "t.tl");

        determine_stack_allocation(&mut session, expr).unwrap();

        let regs: Vec<_> = session.frame().entries().iter().map(|e| e.register).collect();
        assert_eq!(
            regs,
            vec![VirtualRegister(1), VirtualRegister(2), VirtualRegister(3)]
        );
        assert!(session
            .frame()
            .entries()
            .iter()
            .all(|e| e.number_type == NumberType::Int32));
        assert_eq!(session.registers_mut().pop_free(), Some(VirtualRegister(1)));
        assert!(session.output().is_empty());
    }

    #[test]
    fn test_translate_addition() {
        let _ = env_logger::builder().is_test(true).try_init();

        let arena = Bump::new();
        let source = SourceFile::new("add.tl", "2 + 3");
        let expr = parse_program(&source, &arena).unwrap();
        let mut session = CompilationSession::new(&arena, "add.tl");
        let mut target = FixedTarget::x86_64_linux();

        translate(&mut session, expr, &mut target).unwrap();

        assert_eq!(
            body_lines(session.output()),
            vec![
                "%1 = alloca i32, align 4",
                "%2 = alloca i32, align 4",
                "store i32 2, ptr %1, align 4",
                "store i32 3, ptr %2, align 4",
                "%3 = load i32, ptr %1, align 4",
                "%4 = load i32, ptr %2, align 4",
                "%5 = add nsw i32 %3, %4",
                "%6 = call i32 (ptr, ...) @printf(ptr @print_int_fstring, i32 %5)",
                "ret i32 0",
            ]
        );
    }

    #[test]
    fn test_translate_nested_expression() {
        let arena = Bump::new();
        let source = SourceFile::new("nested.tl", "1 + 2 * 3");
        let expr = parse_program(&source, &arena).unwrap();
        let mut session = CompilationSession::new(&arena, "nested.tl");
        let mut target = FixedTarget::x86_64_linux();

        translate(&mut session, expr, &mut target).unwrap();

        let body = body_lines(session.output());
        assert_eq!(
            &body[3..],
            &[
                "store i32 1, ptr %1, align 4",
                "store i32 2, ptr %2, align 4",
                "store i32 3, ptr %3, align 4",
                "%4 = load i32, ptr %2, align 4",
                "%5 = load i32, ptr %3, align 4",
                "%6 = mul nsw i32 %4, %5",
                "%7 = load i32, ptr %1, align 4",
                "%8 = add nsw i32 %7, %6",
                "%9 = call i32 (ptr, ...) @printf(ptr @print_int_fstring, i32 %8)",
                "ret i32 0",
            ]
        );
    }

    #[test]
    fn test_translate_single_literal() {
        let arena = Bump::new();
        let source = SourceFile::new("one.tl", "print 7;");
        let expr = parse_program(&source, &arena).unwrap();
        let mut session = CompilationSession::new(&arena, "one.tl");
        let mut target = FixedTarget::x86_64_linux();

        translate(&mut session, expr, &mut target).unwrap();

        let stats = session.stats();
        assert_eq!(stats.count("alloca"), 1);
        assert_eq!(stats.count("load"), 1);
        assert!(session
            .output()
            .contains("%3 = call i32 (ptr, ...) @printf(ptr @print_int_fstring, i32 %2)"));
    }

    #[test]
    fn test_translate_exponent_fails() {
        let arena = Bump::new();
        let source = SourceFile::new("pow.tl", "2 ** 3");
        let expr = parse_program(&source, &arena).unwrap();
        let mut session = CompilationSession::new(&arena, "pow.tl");
        let mut target = FixedTarget::x86_64_linux();

        let err = translate(&mut session, expr, &mut target).unwrap_err();
        assert!(err.is_internal());
        assert!(!session.output().contains("call i32"));
    }

    #[test]
    fn test_generate_module_typed_pointers() {
        let arena = Bump::new();
        let source = SourceFile::new("sub.tl", "9 - 4");
        let expr = parse_program(&source, &arena).unwrap();
        let mut target = FixedTarget::new("e", "i686-pc-linux-gnu", PointerSyntax::Typed);

        let session = CompilationSession::new(&arena, "sub.tl");
        let ir = generate_module(session, expr, &mut target).unwrap();

        assert!(ir.starts_with("; ModuleID = 'sub.tl'\n"));
        assert!(ir.contains("\t%3 = load i32, i32* %1, align 4\n"));
        assert!(ir.contains("\t%5 = sub nsw i32 %3, %4\n"));
        assert!(ir.trim_end().ends_with("!5 = !{!\"tallyc version 0.1.0\"}"));
    }

    #[test]
    fn test_translate_deep_left_chain() {
        let terms = 50_000;
        let text = format!("1{}", " + 1".repeat(terms - 1));
        let arena = Bump::new();
        let source = SourceFile::new("chain.tl", text);
        let expr = parse_program(&source, &arena).unwrap();
        let mut session = CompilationSession::new(&arena, "chain.tl");
        let mut target = FixedTarget::x86_64_linux();

        translate(&mut session, expr, &mut target).unwrap();

        let stats = session.stats();
        assert_eq!(stats.count("alloca"), terms);
        assert_eq!(stats.count("load"), terms);
        assert_eq!(stats.count("add"), terms - 1);
    }
}
