//! Direct AST evaluation.
//!
//! Must produce exactly the value the VM produces for the same formula;
//! everything value-shaped is delegated to `runtime`. The one intentional
//! difference in *mechanics*: `IF` here is lazy by construction (only the
//! selected branch is walked), where the VM gets the same effect from
//! conditional jumps.

use crate::runtime;
use crate::symtab::SymbolTable;
use cellang_common::Value;
use cellang_parse::{Expr, ExprKind, Func};

pub struct Interpreter<'a> {
    symtab: &'a SymbolTable,
    trace: bool,
}

impl<'a> Interpreter<'a> {
    pub fn new(symtab: &'a SymbolTable) -> Self {
        Interpreter {
            symtab,
            trace: false,
        }
    }

    /// Print indented evaluation steps and intermediate results.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn evaluate(&self, root: &Expr) -> Value {
        let result = self.eval(root, 1);
        if self.trace {
            println!("Result: {result}");
        }
        result
    }

    fn trace_step(&self, depth: usize, msg: &str) {
        if self.trace {
            println!("{:indent$}{msg}", "", indent = (depth - 1) * 2);
        }
    }

    fn eval(&self, node: &Expr, depth: usize) -> Value {
        match &node.kind {
            ExprKind::Number(n) => {
                self.trace_step(depth, &format!("NUMBER = {n}"));
                Value::Number(*n)
            }
            ExprKind::Text(s) => {
                self.trace_step(depth, &format!("STRING = \"{s}\""));
                Value::Text(s.clone())
            }
            ExprKind::CellRef(key) => {
                let value = self.symtab.value_of(key);
                self.trace_step(depth, &format!("CELL {key} = {value}"));
                Value::Number(value)
            }
            // A range outside a call argument is just its text; argument
            // flattening is where it becomes a list.
            ExprKind::Range(text) => {
                self.trace_step(depth, &format!("RANGE {text}"));
                Value::Text(text.clone())
            }
            ExprKind::UnaryOp { op, expr } => {
                self.trace_step(depth, &format!("UNARY {op}"));
                let v = self.eval(expr, depth + 1);
                if v.is_error() {
                    return v;
                }
                runtime::unary_op(*op, &v)
            }
            ExprKind::BinaryOp { op, left, right } => {
                self.trace_step(depth, &format!("BINARY {op}"));
                // First error wins, left before right.
                let l = self.eval(left, depth + 1);
                if l.is_error() {
                    return l;
                }
                let r = self.eval(right, depth + 1);
                if r.is_error() {
                    return r;
                }
                runtime::binary_op(*op, &l, &r)
            }
            ExprKind::FunctionCall { func: Func::If, args } => {
                self.trace_step(depth, "IF");
                if args.len() != 3 {
                    return Value::error("IF requires 3 arguments");
                }
                let cond = self.eval(&args[0], depth + 1);
                if cond.is_error() {
                    return cond;
                }
                // Lazy: only the selected branch is evaluated.
                if cond.is_truthy() {
                    self.eval(&args[1], depth + 1)
                } else {
                    self.eval(&args[2], depth + 1)
                }
            }
            ExprKind::FunctionCall { func, args } => {
                self.trace_step(depth, &format!("CALL {func}"));
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    let v = self.eval(arg, depth + 1);
                    if v.is_error() {
                        return v;
                    }
                    runtime::flatten_arg(v, self.symtab, &mut values);
                }
                runtime::dispatch(*func, &values)
            }
        }
    }
}
