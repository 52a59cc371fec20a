//! Colored diagnostic output and the cell-table dump.

use cellang_common::{DiagKind, DiagSink};
use cellang_eval::SymbolTable;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print every collected diagnostic to stderr: yellow for syntax, red for
/// semantic/runtime, cyan for suggestions.
pub fn print_diagnostics(sink: &DiagSink) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    for diag in sink.iter() {
        let color = match diag.kind {
            DiagKind::Syntax => Color::Yellow,
            DiagKind::Semantic | DiagKind::Runtime => Color::Red,
        };
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(color)));
        let _ = writeln!(
            stderr,
            "[Line {}] {}: {}",
            diag.line, diag.kind, diag.message
        );
        if let Some(suggestion) = &diag.suggestion {
            let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
            let _ = writeln!(stderr, "    Suggestion: {suggestion}");
        }
        let _ = stderr.reset();
    }
}

/// Dump the defined, formula-bearing cells as a small table, sorted by key.
pub fn print_table(symtab: &SymbolTable) {
    println!("Cell | Value   | Status");
    println!("-----|---------|----------");
    let mut cells: Vec<_> = symtab
        .iter_defined()
        .filter(|cell| cell.formula.is_some())
        .collect();
    cells.sort_by(|a, b| a.key.cmp(&b.key));
    for cell in cells {
        println!("{:<4} | {:<7.2} | DEFINED", cell.key, cell.value);
    }
}
