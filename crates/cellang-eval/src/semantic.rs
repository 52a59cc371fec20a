//! Semantic analysis for one formula against the shared cell table.
//!
//! Errors are collected into the sink, never thrown, so one pass can
//! surface every problem in the formula. Dependency edges are registered
//! here and only here; after a clean traversal the target's direct
//! dependencies are checked for cycles.

use crate::symtab::SymbolTable;
use cellang_common::key::parse_range;
use cellang_common::{DiagKind, DiagSink, Diagnostic};
use cellang_parse::{Expr, ExprKind, Func};

/// Analyze `root` as the formula being assigned to `target`. Returns the
/// total error count observed: locally found errors plus whatever the sink
/// already held.
pub fn analyze(root: &Expr, symtab: &mut SymbolTable, sink: &mut DiagSink, target: &str) -> usize {
    tracing::debug!(target, "semantic analysis");
    symtab.ensure_defined(target, root.line);

    let mut pass = Pass {
        symtab,
        sink,
        target,
        local_errors: 0,
    };
    pass.traverse(root);

    // Cycle detection runs only on an otherwise-clean formula: a broken
    // reference has no registered edge to follow anyway.
    if pass.local_errors == 0 {
        let deps: Vec<String> = pass
            .symtab
            .get(target)
            .map(|cell| cell.deps.iter().cloned().collect())
            .unwrap_or_default();
        for dep in deps {
            if pass.symtab.cycle_check(target, &dep, pass.sink) {
                pass.local_errors += 1;
                break;
            }
        }
    }

    pass.local_errors + pass.sink.count()
}

struct Pass<'a> {
    symtab: &'a mut SymbolTable,
    sink: &'a mut DiagSink,
    target: &'a str,
    local_errors: usize,
}

impl Pass<'_> {
    fn report(&mut self, line: u32, message: String, suggestion: &str) {
        self.sink.report(
            Diagnostic::new(DiagKind::Semantic, line, 0, message).with_suggestion(suggestion),
        );
        self.local_errors += 1;
    }

    fn traverse(&mut self, node: &Expr) {
        // Children first; the node's own checks follow.
        match &node.kind {
            ExprKind::UnaryOp { expr, .. } => self.traverse(expr),
            ExprKind::BinaryOp { left, right, .. } => {
                self.traverse(left);
                self.traverse(right);
            }
            ExprKind::FunctionCall { args, .. } => {
                for arg in args {
                    self.traverse(arg);
                }
            }
            _ => {}
        }

        match &node.kind {
            ExprKind::CellRef(key) => self.check_cell_ref(key, node.line),
            ExprKind::Range(text) => self.check_range(text, node.line),
            ExprKind::FunctionCall { func, args } => {
                self.check_arity(*func, args.len(), node.line)
            }
            _ => {}
        }
    }

    fn check_cell_ref(&mut self, key: &str, line: u32) {
        match self.symtab.get(key) {
            Some(cell) if cell.defined => {
                self.symtab.add_dependency(self.target, key);
            }
            _ => {
                self.report(
                    line,
                    format!("Undefined cell reference: '{key}'"),
                    "Ensure this cell has a value.",
                );
            }
        }
    }

    fn check_range(&mut self, text: &str, line: u32) {
        match parse_range(text) {
            None => self.report(
                line,
                format!("Invalid range format: '{text}'"),
                "Expected format like A1:B10.",
            ),
            Some(bounds) if !bounds.is_ordered() => self.report(
                line,
                format!("Invalid range: '{text}'"),
                "Start of range must be top-left of end of range.",
            ),
            Some(_) => {}
        }
    }

    fn check_arity(&mut self, func: Func, argc: usize, line: u32) {
        match func {
            Func::If => {
                if argc != 3 {
                    self.report(
                        line,
                        format!("Function 'IF' expects exactly 3 arguments, but got {argc}"),
                        "The format is IF(condition, value_if_true, value_if_false).",
                    );
                }
            }
            Func::Sum | Func::Average | Func::Min | Func::Max => {
                if argc == 0 {
                    self.report(
                        line,
                        format!(
                            "Function '{}' expects at least 1 argument, but got 0",
                            func.name()
                        ),
                        "Provide a cell, range, or number.",
                    );
                }
            }
            // NOT's arity is a runtime rule; AND/OR never reach this stage
            // as calls (the parser lowers them to operators).
            Func::Not | Func::And | Func::Or => {}
        }
    }
}
