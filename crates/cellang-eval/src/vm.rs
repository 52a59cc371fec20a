//! The stack virtual machine: fetch, decode, execute.
//!
//! Value-level semantics live in `runtime`, shared with the interpreter.
//! Formula failures (division by zero, bad arity) travel as `Value::Error`
//! and become the final result; stack overflow or underflow means the code
//! generator produced garbage and panics instead.

use crate::ir::{CodeBuffer, Op};
use crate::runtime;
use crate::symtab::SymbolTable;
use cellang_common::Value;
use cellang_parse::BinOp;
use smallvec::SmallVec;

/// Fixed bound on the value stack.
pub const STACK_MAX: usize = 256;

pub struct Vm<'a> {
    code: &'a CodeBuffer,
    symtab: &'a SymbolTable,
    pc: usize,
    stack: Vec<Value>,
    trace: bool,
}

impl<'a> Vm<'a> {
    pub fn new(code: &'a CodeBuffer, symtab: &'a SymbolTable) -> Self {
        Vm {
            code,
            symtab,
            pc: 0,
            stack: Vec::new(),
            trace: false,
        }
    }

    /// Print each instruction before executing it and the stack after.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    fn push(&mut self, value: Value) {
        if self.stack.len() >= STACK_MAX {
            panic!("VM stack overflow (code generator bug)");
        }
        self.stack.push(value);
    }

    fn pop(&mut self) -> Value {
        match self.stack.pop() {
            Some(v) => v,
            None => panic!("VM stack underflow (code generator bug)"),
        }
    }

    /// Run to `HALT` (or to the first propagated error) and return the
    /// final value.
    pub fn run(&mut self) -> Value {
        loop {
            let Some(instr) = self.code.get(self.pc) else {
                return Value::error("VM error: program counter out of bounds");
            };
            if self.trace {
                println!("{:04}: {}", self.pc, instr);
            }
            self.pc += 1;

            match &instr.op {
                Op::Halt => {
                    if self.stack.is_empty() {
                        return Value::error("VM halted on empty stack");
                    }
                    return self.pop();
                }
                Op::Push(n) => self.push(Value::Number(*n)),
                Op::PushCell(key) => self.push(Value::Number(self.symtab.value_of(key))),
                Op::PushRange(text) => self.push(Value::Text(text.clone())),

                Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Pow | Op::Eq | Op::Neq | Op::Gt
                | Op::Lt | Op::Gte | Op::Lte | Op::And | Op::Or => {
                    let op = binop_for(&instr.op);
                    let b = self.pop();
                    let a = self.pop();
                    let result = runtime::binary_op(op, &a, &b);
                    if result.is_error() {
                        return result;
                    }
                    self.push(result);
                }

                Op::Neg | Op::Not => {
                    let op = if instr.op == Op::Neg {
                        cellang_parse::UnaryOp::Neg
                    } else {
                        cellang_parse::UnaryOp::Not
                    };
                    let v = self.pop();
                    let result = runtime::unary_op(op, &v);
                    if result.is_error() {
                        return result;
                    }
                    self.push(result);
                }

                Op::Jmp(target) => self.pc = *target,
                Op::JmpIfFalse(target) => {
                    let cond = self.pop();
                    if cond.is_error() {
                        return cond;
                    }
                    if !cond.is_truthy() {
                        self.pc = *target;
                    }
                }

                Op::Call { func, argc } => {
                    // Args were pushed left-to-right, so they pop off reversed.
                    let mut staged: SmallVec<[Value; 8]> = SmallVec::new();
                    for _ in 0..*argc {
                        staged.push(self.pop());
                    }
                    let mut args = Vec::with_capacity(*argc);
                    for value in staged.into_iter().rev() {
                        runtime::flatten_arg(value, self.symtab, &mut args);
                    }
                    let result = runtime::dispatch(*func, &args);
                    if result.is_error() {
                        return result;
                    }
                    self.push(result);
                }

                Op::Nop => {}
            }

            if self.trace {
                let rendered: Vec<String> = self.stack.iter().map(Value::compact).collect();
                println!("    STACK: [ {} ]", rendered.join(" "));
            }
        }
    }
}

fn binop_for(op: &Op) -> BinOp {
    match op {
        Op::Add => BinOp::Add,
        Op::Sub => BinOp::Sub,
        Op::Mul => BinOp::Mul,
        Op::Div => BinOp::Div,
        Op::Pow => BinOp::Pow,
        Op::Eq => BinOp::Eq,
        Op::Neq => BinOp::Ne,
        Op::Gt => BinOp::Gt,
        Op::Lt => BinOp::Lt,
        Op::Gte => BinOp::Gte,
        Op::Lte => BinOp::Lte,
        Op::And => BinOp::And,
        Op::Or => BinOp::Or,
        other => unreachable!("not a binary opcode: {other:?}"),
    }
}
