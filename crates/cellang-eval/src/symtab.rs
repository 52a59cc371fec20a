//! The shared cell table.
//!
//! One table spans every formula in a compilation session so dependency
//! edges registered by earlier cells are visible while later cells are
//! analyzed. Dependencies are stored as owned key strings, never pointers
//! into other cells.

use cellang_common::{DiagKind, DiagSink, Diagnostic};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// A single cell and its metadata. When `defined` is false every reader
/// treats `value` as 0.
#[derive(Debug, Clone)]
pub struct Cell {
    pub key: String,
    pub formula: Option<String>,
    pub value: f64,
    pub defined: bool,
    pub line: u32,
    pub deps: SmallVec<[String; 4]>,
}

impl Cell {
    fn new(key: &str) -> Self {
        Cell {
            key: key.to_string(),
            formula: None,
            value: 0.0,
            defined: false,
            line: 0,
            deps: SmallVec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    cells: FxHashMap<String, Cell>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.cells.get(key)
    }

    /// The value readers observe: the stored number for defined cells, 0
    /// otherwise. Late-binding policy for reads that skipped analysis.
    pub fn value_of(&self, key: &str) -> f64 {
        match self.cells.get(key) {
            Some(cell) if cell.defined => cell.value,
            _ => 0.0,
        }
    }

    /// Insert or overwrite a cell's value/formula and mark it defined.
    /// Existing dependencies are preserved: they describe the current
    /// formula and are cleared by the driver before re-analysis.
    pub fn define(&mut self, key: &str, value: f64, formula: Option<&str>, line: u32) {
        let cell = self
            .cells
            .entry(key.to_string())
            .or_insert_with(|| Cell::new(key));
        cell.value = value;
        cell.formula = formula.map(str::to_string);
        cell.line = line;
        cell.defined = true;
    }

    /// Create the cell if absent (value 0) and mark it defined, without
    /// touching an existing cell's value. Used by the analyzer for the
    /// target cell before its formula has been evaluated.
    pub fn ensure_defined(&mut self, key: &str, line: u32) {
        let cell = self
            .cells
            .entry(key.to_string())
            .or_insert_with(|| Cell::new(key));
        if !cell.defined {
            cell.line = line;
        }
        cell.defined = true;
    }

    /// Record that `from` reads `to`. Idempotent: a repeated edge leaves
    /// the dependency list unchanged.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let cell = self
            .cells
            .entry(from.to_string())
            .or_insert_with(|| Cell::new(from));
        if !cell.deps.iter().any(|d| d == to) {
            cell.deps.push(to.to_string());
        }
    }

    /// Drop all dependency edges owned by `key` (the driver calls this
    /// before re-analyzing a redefinition).
    pub fn clear_dependencies(&mut self, key: &str) {
        if let Some(cell) = self.cells.get_mut(key) {
            cell.deps.clear();
        }
    }

    /// True iff following dependency edges from `via` reaches `origin`
    /// (`origin == via` is a self-cycle). On detection a single semantic
    /// diagnostic naming the full path is reported; the path fragments are
    /// assembled through the sink's scratch buffer.
    pub fn cycle_check(&self, origin: &str, via: &str, sink: &mut DiagSink) -> bool {
        let mut visited = FxHashSet::default();
        let mut path = Vec::new();
        if !self.reaches(origin, via, &mut visited, &mut path) {
            return false;
        }

        // `path` was filled while unwinding, deepest node first.
        path.reverse();
        sink.scratch_clear();
        for node in &path {
            sink.scratch_append(&format!(" -> {node}"));
        }
        let message = format!("Circular dependency detected: {origin}{}", sink.scratch());
        sink.scratch_clear();
        sink.report(
            Diagnostic::new(DiagKind::Semantic, 0, 0, message)
                .with_suggestion("Remove the dependency."),
        );
        true
    }

    /// Depth-first walk with a visited set, so diamonds and dense graphs
    /// are traversed once per node rather than once per path.
    fn reaches(
        &self,
        origin: &str,
        node: &str,
        visited: &mut FxHashSet<String>,
        path: &mut Vec<String>,
    ) -> bool {
        if node == origin {
            path.push(node.to_string());
            return true;
        }
        if !visited.insert(node.to_string()) {
            return false;
        }
        if let Some(cell) = self.cells.get(node) {
            for dep in &cell.deps {
                if self.reaches(origin, dep, visited, path) {
                    path.push(node.to_string());
                    return true;
                }
            }
        }
        false
    }

    pub fn iter_defined(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values().filter(|c| c.defined)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
