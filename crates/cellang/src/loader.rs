//! Sheet and cell file loading.
//!
//! Both file kinds share one line shape: `KEY = right-hand-side`, with `#`
//! comments and blank lines ignored. A cells file restricts the right-hand
//! side to a numeric literal; a sheet file treats it as formula text to be
//! compiled in presentation order.

use cellang_common::key::is_cell_key;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected 'KEY = ...', got '{content}'")]
    MalformedLine { line: u32, content: String },
    #[error("line {line}: '{key}' is not a valid cell key")]
    InvalidKey { line: u32, key: String },
    #[error("line {line}: '{value}' is not a number")]
    InvalidNumber { line: u32, value: String },
}

/// One `KEY = formula` entry from a sheet file.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub target: String,
    pub formula: String,
    pub line: u32,
}

fn split_lines(source: &str) -> impl Iterator<Item = (u32, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(i, raw)| (i as u32 + 1, raw.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn split_definition(line_no: u32, line: &str) -> Result<(String, String), LoadError> {
    let (key, rhs) = line.split_once('=').ok_or_else(|| LoadError::MalformedLine {
        line: line_no,
        content: line.to_string(),
    })?;
    let key = key.trim();
    let rhs = rhs.trim();
    if !is_cell_key(key) {
        return Err(LoadError::InvalidKey {
            line: line_no,
            key: key.to_string(),
        });
    }
    if rhs.is_empty() {
        return Err(LoadError::MalformedLine {
            line: line_no,
            content: line.to_string(),
        });
    }
    Ok((key.to_string(), rhs.to_string()))
}

/// Parse sheet text into definitions, in presentation order.
pub fn parse_sheet(source: &str) -> Result<Vec<Definition>, LoadError> {
    split_lines(source)
        .map(|(line, text)| {
            let (target, formula) = split_definition(line, text)?;
            Ok(Definition {
                target,
                formula,
                line,
            })
        })
        .collect()
}

/// Parse cells text into `(key, value, line)` preload triples.
pub fn parse_cells(source: &str) -> Result<Vec<(String, f64, u32)>, LoadError> {
    split_lines(source)
        .map(|(line, text)| {
            let (key, rhs) = split_definition(line, text)?;
            let value: f64 = rhs.parse().map_err(|_| LoadError::InvalidNumber {
                line,
                value: rhs.clone(),
            })?;
            Ok((key, value, line))
        })
        .collect()
}

pub fn load_sheet(path: &Path) -> Result<Vec<Definition>, LoadError> {
    parse_sheet(&read(path)?)
}

pub fn load_cells(path: &Path) -> Result<Vec<(String, f64, u32)>, LoadError> {
    parse_cells(&read(path)?)
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}
