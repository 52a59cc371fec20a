//! CLI entry point: load cells, compile the sheet, print results and
//! diagnostics. Exit code 0 only when no diagnostic was reported.

use anyhow::Result;
use cellang::driver::{Backend, CompileOptions, run_sheet};
use cellang::loader::{load_cells, load_sheet};
use cellang::report::{print_diagnostics, print_table};
use cellang_common::DiagSink;
use cellang_eval::SymbolTable;
use cellang_parse::AstFormat;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Compile and evaluate spreadsheet formulas over a shared cell table.
#[derive(Parser)]
#[command(name = "cellang", version, about)]
struct Cli {
    /// Sheet file with one `CELL = formula` definition per line.
    sheet: PathBuf,

    /// Preload cell values from a `CELL = number` file.
    #[arg(long)]
    cells: Option<PathBuf>,

    /// Evaluation backend.
    #[arg(long, value_enum, default_value_t = BackendArg::Vm)]
    backend: BackendArg,

    /// Disable the constant-folding pass.
    #[arg(long)]
    no_optimize: bool,

    /// Trace execution (VM instructions or interpreter steps).
    #[arg(long)]
    trace: bool,

    /// Print compiled bytecode before execution.
    #[arg(long)]
    dump_bytecode: bool,

    /// Print each formula's AST in the given format.
    #[arg(long, value_enum)]
    ast: Option<AstFormatArg>,

    /// Print the final cell table.
    #[arg(long)]
    print_table: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Vm,
    Interp,
    Both,
}

#[derive(Clone, Copy, ValueEnum)]
enum AstFormatArg {
    Tree,
    Dot,
    Lisp,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("cellang: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let mut symtab = SymbolTable::new();
    let mut sink = DiagSink::new();

    if let Some(cells_path) = &cli.cells {
        for (key, value, line) in load_cells(cells_path)? {
            symtab.define(&key, value, None, line);
        }
    }

    let defs = load_sheet(&cli.sheet)?;
    let opts = CompileOptions {
        backend: match cli.backend {
            BackendArg::Vm => Backend::Vm,
            BackendArg::Interp => Backend::Interp,
            BackendArg::Both => Backend::Both,
        },
        optimize: !cli.no_optimize,
        trace: cli.trace,
        dump_bytecode: cli.dump_bytecode,
        ast: cli.ast.map(|f| match f {
            AstFormatArg::Tree => AstFormat::Tree,
            AstFormatArg::Dot => AstFormat::Dot,
            AstFormatArg::Lisp => AstFormat::Lisp,
        }),
    };

    for (target, value) in run_sheet(&defs, &mut symtab, &mut sink, &opts) {
        if let Some(value) = value {
            println!("{target} = {value}");
        }
    }

    print_diagnostics(&sink);
    if cli.print_table {
        print_table(&symtab);
    }
    Ok(sink.is_empty())
}
