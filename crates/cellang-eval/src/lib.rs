pub mod codegen;
pub mod interpreter;
pub mod ir;
pub mod optimizer;
pub mod runtime;
pub mod semantic;
pub mod symtab;
pub mod vm;

pub use codegen::generate;
pub use interpreter::Interpreter;
pub use ir::{CodeBuffer, Instruction, Op, UNPATCHED};
pub use optimizer::fold_constants;
pub use semantic::analyze;
pub use symtab::{Cell, SymbolTable};
pub use vm::{STACK_MAX, Vm};

// Re-export the shared surface so downstream code rarely needs the
// lower crates directly.
pub use cellang_common::{DiagKind, Diagnostic, DiagSink, Value};
pub use cellang_parse::{BinOp, Expr, ExprKind, Func, UnaryOp};
