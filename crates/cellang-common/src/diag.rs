//! Diagnostic collection shared by every compilation stage.
//!
//! Diagnostics are collected, never thrown: the semantic analyzer keeps
//! walking sibling subtrees so a single pass can surface several problems.
//! The sink also carries a scratch string used by the cycle detector to
//! assemble dependency-path fragments before the final message is reported.

use std::fmt::{self, Display};

/// Which stage produced the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagKind {
    Syntax,
    Semantic,
    Runtime,
}

impl Display for DiagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagKind::Syntax => "Syntax Error",
            DiagKind::Semantic => "Semantic Error",
            DiagKind::Runtime => "Runtime Error",
        })
    }
}

/// A single reported problem. `col` is 0 when no column is available.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagKind,
    pub line: u32,
    pub col: u32,
    pub message: String,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new<S: Into<String>>(kind: DiagKind, line: u32, col: u32, message: S) -> Self {
        Diagnostic {
            kind,
            line,
            col,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion<S: Into<String>>(mut self, suggestion: S) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Line {}] {}: {}", self.line, self.kind, self.message)
    }
}

/// Ordered diagnostic list plus the cycle-path scratch buffer.
#[derive(Debug, Default)]
pub struct DiagSink {
    diags: Vec<Diagnostic>,
    scratch: String,
}

impl DiagSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    pub fn count(&self) -> usize {
        self.diags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diags.iter()
    }

    /* ---- cycle-path scratch buffer ---- */

    pub fn scratch_append(&mut self, fragment: &str) {
        self.scratch.push_str(fragment);
    }

    pub fn scratch(&self) -> &str {
        &self.scratch
    }

    pub fn scratch_clear(&mut self) {
        self.scratch.clear();
    }
}
