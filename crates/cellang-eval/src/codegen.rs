//! Bytecode generation: a post-order walk of the AST.
//!
//! `IF` is the one construct that does not become a `CALL`: it compiles to
//! a conditional jump over the then-branch and an unconditional jump over
//! the else-branch, both back-patched once the skipped code has been
//! emitted. Everything else maps 1:1 onto an opcode.

use crate::ir::{CodeBuffer, Op};
use cellang_parse::{BinOp, Expr, ExprKind, Func, UnaryOp};

/// Compile an analyzed AST into bytecode ending in `HALT`.
pub fn generate(root: &Expr) -> CodeBuffer {
    let mut code = CodeBuffer::new();
    gen_expr(root, &mut code);
    code.emit_op(Op::Halt, root.line);
    code
}

fn gen_expr(node: &Expr, code: &mut CodeBuffer) {
    let line = node.line;
    match &node.kind {
        ExprKind::Number(n) => {
            code.emit_push(*n, line);
        }
        // String literals ride the text-push instruction; the VM treats the
        // operand as opaque text either way and range flattening decides at
        // call time whether it names cells.
        ExprKind::Text(s) => {
            code.emit_push_range(s, line);
        }
        ExprKind::CellRef(key) => {
            code.emit_push_cell(key, line);
        }
        ExprKind::Range(text) => {
            code.emit_push_range(text, line);
        }
        ExprKind::UnaryOp { op, expr } => {
            gen_expr(expr, code);
            code.emit_op(
                match op {
                    UnaryOp::Neg => Op::Neg,
                    UnaryOp::Not => Op::Not,
                },
                line,
            );
        }
        ExprKind::BinaryOp { op, left, right } => {
            gen_expr(left, code);
            gen_expr(right, code);
            code.emit_op(binop_opcode(*op), line);
        }
        ExprKind::FunctionCall { func: Func::If, args } => {
            assert!(
                args.len() == 3,
                "IF arity must be validated before code generation"
            );
            gen_expr(&args[0], code);
            let skip_then = code.emit_jump_if_false(line);
            gen_expr(&args[1], code);
            let skip_else = code.emit_jump(line);
            code.patch_jump(skip_then);
            gen_expr(&args[2], code);
            code.patch_jump(skip_else);
        }
        ExprKind::FunctionCall { func, args } => {
            // Arguments left-to-right: arg1 ends up deepest on the stack.
            for arg in args {
                gen_expr(arg, code);
            }
            code.emit_call(*func, args.len(), line);
        }
    }
}

fn binop_opcode(op: BinOp) -> Op {
    match op {
        BinOp::Add => Op::Add,
        BinOp::Sub => Op::Sub,
        BinOp::Mul => Op::Mul,
        BinOp::Div => Op::Div,
        BinOp::Pow => Op::Pow,
        BinOp::Gt => Op::Gt,
        BinOp::Lt => Op::Lt,
        BinOp::Gte => Op::Gte,
        BinOp::Lte => Op::Lte,
        BinOp::Eq => Op::Eq,
        BinOp::Ne => Op::Neq,
        BinOp::And => Op::And,
        BinOp::Or => Op::Or,
    }
}
