//! The compile driver: one formula at a time, front to back.
//!
//! Each definition is parsed, analyzed against the shared table, and (when
//! clean) evaluated by the selected backend; the result is written back to
//! the target cell. Cells compile in presentation order, so a reference to
//! a cell defined later is an undefined reference; dependency edges exist
//! only once their owner has been analyzed.

use crate::loader::Definition;
use cellang_common::{DiagKind, DiagSink, Diagnostic, Value};
use cellang_eval::{Interpreter, SymbolTable, Vm, analyze, fold_constants, generate};
use cellang_parse::{AstFormat, Expr, parse_at, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Compile to bytecode and run the stack VM.
    Vm,
    /// Walk the AST directly.
    Interp,
    /// Run both and verify they agree.
    Both,
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub backend: Backend,
    pub optimize: bool,
    pub trace: bool,
    pub dump_bytecode: bool,
    pub ast: Option<AstFormat>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            backend: Backend::Vm,
            optimize: true,
            trace: false,
            dump_bytecode: false,
            ast: None,
        }
    }
}

/// Compile and evaluate one `target = formula` definition. On success the
/// cell is updated and the value returned; on any diagnostic the cell's
/// value is left alone and `None` comes back.
pub fn compile_cell(
    target: &str,
    formula: &str,
    line: u32,
    symtab: &mut SymbolTable,
    sink: &mut DiagSink,
    opts: &CompileOptions,
) -> Option<Value> {
    tracing::debug!(target, formula, "compiling cell");

    let ast = match parse_at(formula, line) {
        Ok(ast) => ast,
        Err(e) => {
            sink.report(Diagnostic::new(DiagKind::Syntax, e.line, e.col, e.message));
            return None;
        }
    };
    if let Some(format) = opts.ast {
        print!("{}", render(&ast, format));
    }

    // The old edges described the formula being replaced.
    symtab.clear_dependencies(target);

    let before = sink.count();
    analyze(&ast, symtab, sink, target);
    if sink.count() > before {
        return None;
    }

    let value = match opts.backend {
        Backend::Vm => run_vm(&ast, symtab, opts),
        Backend::Interp => Interpreter::new(symtab).with_trace(opts.trace).evaluate(&ast),
        Backend::Both => {
            let vm_value = run_vm(&ast, symtab, opts);
            let walked = Interpreter::new(symtab).evaluate(&ast);
            if !values_agree(&vm_value, &walked) {
                sink.report(Diagnostic::new(
                    DiagKind::Runtime,
                    line,
                    0,
                    format!("Backend mismatch: VM produced {vm_value}, interpreter produced {walked}"),
                ));
                return None;
            }
            vm_value
        }
    };

    if let Value::Error(msg) = &value {
        sink.report(Diagnostic::new(DiagKind::Runtime, line, 0, msg.clone()));
        return None;
    }

    symtab.define(target, value.as_number(), Some(formula), line);
    Some(value)
}

/// Compile a whole sheet in order; returns the per-definition results
/// (`None` where diagnostics were reported).
pub fn run_sheet(
    defs: &[Definition],
    symtab: &mut SymbolTable,
    sink: &mut DiagSink,
    opts: &CompileOptions,
) -> Vec<(String, Option<Value>)> {
    defs.iter()
        .map(|def| {
            let value = compile_cell(&def.target, &def.formula, def.line, symtab, sink, opts);
            (def.target.clone(), value)
        })
        .collect()
}

fn run_vm(ast: &Expr, symtab: &SymbolTable, opts: &CompileOptions) -> Value {
    let mut code = generate(ast);
    if opts.optimize {
        fold_constants(&mut code);
    }
    if opts.dump_bytecode {
        println!("--- Bytecode ---");
        print!("{code}");
        println!("----------------");
    }
    Vm::new(&code, symtab).with_trace(opts.trace).run()
}

fn values_agree(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(backend: Backend) -> CompileOptions {
        CompileOptions {
            backend,
            ..CompileOptions::default()
        }
    }

    #[test]
    fn success_updates_the_cell() {
        let mut st = SymbolTable::new();
        st.define("A1", 2.0, None, 1);
        let mut sink = DiagSink::new();
        let value = compile_cell("B1", "A1*3", 1, &mut st, &mut sink, &opts(Backend::Vm));
        assert_eq!(value, Some(Value::Number(6.0)));
        assert_eq!(st.value_of("B1"), 6.0);
        assert_eq!(st.get("B1").unwrap().formula.as_deref(), Some("A1*3"));
        assert!(sink.is_empty());
    }

    #[test]
    fn syntax_error_reports_and_skips() {
        let mut st = SymbolTable::new();
        let mut sink = DiagSink::new();
        let value = compile_cell("B1", "1 +", 1, &mut st, &mut sink, &opts(Backend::Vm));
        assert!(value.is_none());
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.iter().next().unwrap().kind, DiagKind::Syntax);
    }

    #[test]
    fn semantic_error_stops_before_codegen() {
        let mut st = SymbolTable::new();
        let mut sink = DiagSink::new();
        let value = compile_cell("B1", "Z9+1", 1, &mut st, &mut sink, &opts(Backend::Vm));
        assert!(value.is_none());
        assert_eq!(sink.iter().next().unwrap().kind, DiagKind::Semantic);
        // The cell exists (analysis defines it) but holds the default 0.
        assert_eq!(st.value_of("B1"), 0.0);
    }

    #[test]
    fn runtime_error_becomes_a_diagnostic() {
        let mut st = SymbolTable::new();
        st.define("A1", 4.0, None, 1);
        let mut sink = DiagSink::new();
        let value = compile_cell("B1", "A1/0", 2, &mut st, &mut sink, &opts(Backend::Vm));
        assert!(value.is_none());
        let diag = sink.iter().next().unwrap();
        assert_eq!(diag.kind, DiagKind::Runtime);
        assert_eq!(diag.message, "Division by zero");
        assert_eq!(diag.line, 2);
    }

    #[test]
    fn interpreter_backend_matches_vm() {
        for backend in [Backend::Vm, Backend::Interp, Backend::Both] {
            let mut st = SymbolTable::new();
            st.define("A1", 10.0, None, 1);
            let mut sink = DiagSink::new();
            let value = compile_cell(
                "B1",
                "IF(A1>5, A1*2, 0)",
                1,
                &mut st,
                &mut sink,
                &opts(backend),
            );
            assert_eq!(value, Some(Value::Number(20.0)));
        }
    }

    #[test]
    fn redefinition_rebuilds_dependencies() {
        let mut st = SymbolTable::new();
        st.define("A1", 1.0, None, 1);
        st.define("A2", 2.0, None, 1);
        let mut sink = DiagSink::new();
        compile_cell("B1", "A1", 1, &mut st, &mut sink, &opts(Backend::Vm));
        assert_eq!(st.get("B1").unwrap().deps.as_slice(), ["A1".to_string()]);
        compile_cell("B1", "A2", 2, &mut st, &mut sink, &opts(Backend::Vm));
        assert_eq!(st.get("B1").unwrap().deps.as_slice(), ["A2".to_string()]);
    }

    #[test]
    fn forward_references_are_undefined() {
        // One-pass policy: C1 is defined later, so B1 cannot see it.
        let mut st = SymbolTable::new();
        let mut sink = DiagSink::new();
        let defs = vec![
            Definition {
                target: "B1".into(),
                formula: "C1+1".into(),
                line: 1,
            },
            Definition {
                target: "C1".into(),
                formula: "2".into(),
                line: 2,
            },
        ];
        let results = run_sheet(&defs, &mut st, &mut sink, &opts(Backend::Vm));
        assert!(results[0].1.is_none());
        assert_eq!(results[1].1, Some(Value::Number(2.0)));
        assert!(
            sink.iter()
                .next()
                .unwrap()
                .message
                .contains("Undefined cell reference: 'C1'")
        );
    }
}
