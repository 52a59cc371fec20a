//! AST renderings for inspection: box-drawing tree, Graphviz DOT, and Lisp
//! s-expressions. Selected by the CLI's `--ast` flag.

use crate::parser::{Expr, ExprKind};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstFormat {
    Tree,
    Dot,
    Lisp,
}

/// Render an AST in the requested format.
pub fn render(expr: &Expr, format: AstFormat) -> String {
    let mut out = String::new();
    match format {
        AstFormat::Tree => render_tree(expr, "", true, &mut out),
        AstFormat::Dot => {
            out.push_str("digraph AST {\n  node [fontname=\"Arial\"];\n");
            let mut next_id = 0usize;
            render_dot(expr, &mut next_id, &mut out);
            out.push_str("}\n");
        }
        AstFormat::Lisp => {
            render_lisp(expr, &mut out);
            out.push('\n');
        }
    }
    out
}

fn label(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Number(n) => format!("NUMBER ({n})"),
        ExprKind::Text(s) => format!("STRING (\"{s}\")"),
        ExprKind::CellRef(key) => format!("CELL_REF ({key})"),
        ExprKind::Range(text) => format!("RANGE ({text})"),
        ExprKind::UnaryOp { op, .. } => format!("UNARY_OP ({op})"),
        ExprKind::BinaryOp { op, .. } => format!("BINARY_OP ({op})"),
        ExprKind::FunctionCall { func, .. } => format!("FUNCTION_CALL ({func})"),
    }
}

fn children(expr: &Expr) -> Vec<&Expr> {
    match &expr.kind {
        ExprKind::UnaryOp { expr, .. } => vec![expr.as_ref()],
        ExprKind::BinaryOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
        ExprKind::FunctionCall { args, .. } => args.iter().collect(),
        _ => Vec::new(),
    }
}

fn render_tree(expr: &Expr, prefix: &str, is_last: bool, out: &mut String) {
    let connector = if is_last { "└── " } else { "├── " };
    let _ = writeln!(out, "{prefix}{connector}{}", label(expr));

    let kids = children(expr);
    let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
    for (i, child) in kids.iter().enumerate() {
        render_tree(child, &child_prefix, i + 1 == kids.len(), out);
    }
}

fn render_dot(expr: &Expr, next_id: &mut usize, out: &mut String) -> usize {
    let id = *next_id;
    *next_id += 1;
    let _ = writeln!(
        out,
        "  n{id} [label=\"{}\"];",
        label(expr).replace('"', "\\\"")
    );
    for child in children(expr) {
        let child_id = render_dot(child, next_id, out);
        let _ = writeln!(out, "  n{id} -> n{child_id};");
    }
    id
}

fn render_lisp(expr: &Expr, out: &mut String) {
    match &expr.kind {
        ExprKind::Number(n) => {
            let _ = write!(out, "{n}");
        }
        ExprKind::Text(s) => {
            let _ = write!(out, "\"{s}\"");
        }
        ExprKind::CellRef(key) => {
            let _ = write!(out, "{key}");
        }
        ExprKind::Range(text) => {
            let _ = write!(out, "{text}");
        }
        ExprKind::UnaryOp { op, expr } => {
            let _ = write!(out, "({op} ");
            render_lisp(expr, out);
            out.push(')');
        }
        ExprKind::BinaryOp { op, left, right } => {
            let _ = write!(out, "({op} ");
            render_lisp(left, out);
            out.push(' ');
            render_lisp(right, out);
            out.push(')');
        }
        ExprKind::FunctionCall { func, args } => {
            let _ = write!(out, "({func}");
            for arg in args {
                out.push(' ');
                render_lisp(arg, out);
            }
            out.push(')');
        }
    }
}
