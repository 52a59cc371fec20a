//! Peephole constant folding.
//!
//! Rewrites `PUSH a, PUSH b, <arith-op>` into `PUSH result, NOP, NOP`, so
//! instruction indices (and therefore jump targets) never move. Triples
//! whose tail instructions are jump targets are left alone: a branch may
//! land between the pushes and the operator, and folding there would change
//! what the landing site executes.

use crate::ir::{CodeBuffer, Op};
use rustc_hash::FxHashSet;

/// Fold constant arithmetic in place; returns the number of instructions
/// replaced with `NOP`.
///
/// The window slides over the *non-NOP* subsequence and the whole pass
/// repeats until nothing folds, so `PUSH 1, PUSH 2, PUSH 3, MUL, ADD`
/// collapses all the way down to a single `PUSH 7`.
pub fn fold_constants(code: &mut CodeBuffer) -> usize {
    let jump_targets: FxHashSet<usize> = code
        .iter()
        .filter_map(|instr| match instr.op {
            Op::Jmp(t) | Op::JmpIfFalse(t) => Some(t),
            _ => None,
        })
        .collect();

    let mut folded = 0;
    loop {
        let start = folded;
        let live: Vec<usize> = code
            .iter()
            .enumerate()
            .filter(|(_, instr)| instr.op != Op::Nop)
            .map(|(i, _)| i)
            .collect();

        'scan: for w in live.windows(3) {
            let (ia, ib, iop) = (w[0], w[1], w[2]);
            // A branch landing after the first push would skip part of the
            // pattern; such windows must survive untouched.
            if (ia + 1..=iop).any(|t| jump_targets.contains(&t)) {
                continue;
            }
            let (a, b) = match (&code.code[ia].op, &code.code[ib].op) {
                (Op::Push(a), Op::Push(b)) => (*a, *b),
                _ => continue,
            };
            let result = match code.code[iop].op {
                Op::Add => a + b,
                Op::Sub => a - b,
                Op::Mul => a * b,
                // Division by zero must stay a runtime error.
                Op::Div if b != 0.0 => a / b,
                _ => continue,
            };
            code.code[ia].op = Op::Push(result);
            code.code[ib].op = Op::Nop;
            code.code[iop].op = Op::Nop;
            folded += 2;
            // The live index list is stale now; rescan from scratch.
            break 'scan;
        }

        if folded == start {
            break;
        }
    }

    if folded > 0 {
        tracing::debug!(folded, "constant folding pass complete");
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::generate;
    use crate::symtab::SymbolTable;
    use crate::vm::Vm;
    use cellang_common::Value;
    use cellang_parse::parse;

    fn body_ops(code: &CodeBuffer) -> Vec<&Op> {
        code.iter()
            .map(|i| &i.op)
            .filter(|op| !matches!(op, Op::Nop | Op::Halt))
            .collect()
    }

    #[test]
    fn pure_constant_expression_folds_to_one_push() {
        let mut code = generate(&parse("1+2*3").unwrap());
        let folded = fold_constants(&mut code);
        assert_eq!(folded, 4);
        assert_eq!(body_ops(&code), vec![&Op::Push(7.0)]);
        // NOPs keep the buffer length (and jump indexing) stable.
        assert_eq!(code.len(), 6);
    }

    #[test]
    fn division_by_zero_is_not_folded() {
        let mut code = generate(&parse("4/0").unwrap());
        assert_eq!(fold_constants(&mut code), 0);
        assert!(code.iter().any(|i| i.op == Op::Div));
    }

    #[test]
    fn non_constant_operands_are_untouched() {
        let mut code = generate(&parse("A1+2").unwrap());
        assert_eq!(fold_constants(&mut code), 0);
    }

    #[test]
    fn comparison_operators_are_not_folded() {
        let mut code = generate(&parse("1>2").unwrap());
        assert_eq!(fold_constants(&mut code), 0);
    }

    #[test]
    fn folding_preserves_vm_results() {
        let st = SymbolTable::new();
        for src in ["1+2*3", "2*3+4*5", "10-2-3", "8/2+1", "IF(1, 2+3, 4+5)"] {
            let plain = generate(&parse(src).unwrap());
            let mut optimized = plain.clone();
            fold_constants(&mut optimized);
            let before = Vm::new(&plain, &st).run();
            let after = Vm::new(&optimized, &st).run();
            assert_eq!(before, after, "optimizer changed semantics of {src}");
        }
    }

    #[test]
    fn jump_targets_inside_a_triple_block_folding() {
        // The else-branch of the inner IF ends in a PUSH that is followed by
        // the parent's PUSH and ADD; the IF's end-jump lands between them.
        let src = "IF(A1, 1, 2)+3";
        let mut code = generate(&parse(src).unwrap());
        fold_constants(&mut code);
        let st = SymbolTable::new(); // A1 undefined → falsy → else branch
        let result = Vm::new(&code, &st).run();
        assert_eq!(result, Value::Number(5.0));

        let mut st2 = SymbolTable::new();
        st2.define("A1", 1.0, None, 1);
        let result = Vm::new(&code, &st2).run();
        assert_eq!(result, Value::Number(4.0));
    }
}
