pub mod driver;
pub mod loader;
pub mod report;

pub use driver::{Backend, CompileOptions, compile_cell, run_sheet};
pub use loader::{Definition, LoadError, load_cells, load_sheet, parse_cells, parse_sheet};
pub use report::{print_diagnostics, print_table};

// One-stop surface over the stack.
pub use cellang_common::{DiagKind, DiagSink, Diagnostic, Value};
pub use cellang_eval::{
    CodeBuffer, Interpreter, SymbolTable, Vm, analyze, fold_constants, generate,
};
pub use cellang_parse::{AstFormat, Expr, ExprKind, parse, parse_at, render};
