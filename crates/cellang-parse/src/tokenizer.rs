//! Hand-written scanner for formula source.
//!
//! Produces a flat token stream with line/column positions. Cell references
//! and ranges are recognized here (a range like `A1:B10` is a single token),
//! function keywords are resolved case-insensitively through a lazy name
//! table, and anything unrecognized is a typed `LexError`.

use cellang_common::key::is_cell_key;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Display};

/// Built-in function selectors. `And`/`Or` exist only at the token level;
/// the parser lowers their call syntax to binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    Sum,
    Average,
    Min,
    Max,
    If,
    And,
    Or,
    Not,
}

impl Func {
    pub fn name(&self) -> &'static str {
        match self {
            Func::Sum => "SUM",
            Func::Average => "AVERAGE",
            Func::Min => "MIN",
            Func::Max => "MAX",
            Func::If => "IF",
            Func::And => "AND",
            Func::Or => "OR",
            Func::Not => "NOT",
        }
    }
}

impl Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static FUNCTIONS: Lazy<HashMap<&'static str, Func>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for func in [
        Func::Sum,
        Func::Average,
        Func::Min,
        Func::Max,
        Func::If,
        Func::And,
        Func::Or,
        Func::Not,
    ] {
        m.insert(func.name(), func);
    }
    m
});

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    CellRef(String),
    Range(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Ne,
    LParen,
    RParen,
    Comma,
    Func(Func),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub col: u32,
}

/// A lexical error with the position of the offending character.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub line: u32,
    pub col: u32,
}

impl Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}", self.message, self.line, self.col)
    }
}

impl Error for LexError {}

struct Lexer<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
    line: u32,
    col: u32,
}

/// Tokenize a formula. Lines start at 1.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    tokenize_at(src, 1)
}

/// Tokenize a formula whose first line is `start_line` in the enclosing
/// file, so diagnostics point at the sheet rather than the fragment.
pub fn tokenize_at(src: &str, start_line: u32) -> Result<Vec<Token>, LexError> {
    Lexer {
        src: src.as_bytes(),
        text: src,
        pos: 0,
        line: start_line,
        col: 1,
    }
    .run()
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let Some(&b) = self.src.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\r' => self.advance(1),
                b'\n' => {
                    self.pos += 1;
                    self.line += 1;
                    self.col = 1;
                }
                b'0'..=b'9' => tokens.push(self.number()?),
                b'"' => tokens.push(self.string()?),
                b'A'..=b'Z' | b'a'..=b'z' => tokens.push(self.word()?),
                _ => tokens.push(self.operator()?),
            }
        }
        Ok(tokens)
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
        self.col += n as u32;
    }

    fn token(&self, kind: TokenKind, col: u32) -> Token {
        Token {
            kind,
            line: self.line,
            col,
        }
    }

    fn error<S: Into<String>>(&self, message: S) -> LexError {
        LexError {
            message: message.into(),
            line: self.line,
            col: self.col,
        }
    }

    fn number(&mut self) -> Result<Token, LexError> {
        let (start, col) = (self.pos, self.col);
        let mut end = self.pos;
        while self.src.get(end).is_some_and(|b| b.is_ascii_digit()) {
            end += 1;
        }
        if self.src.get(end) == Some(&b'.')
            && self.src.get(end + 1).is_some_and(|b| b.is_ascii_digit())
        {
            end += 1;
            while self.src.get(end).is_some_and(|b| b.is_ascii_digit()) {
                end += 1;
            }
        }
        let text = &self.text[start..end];
        let value: f64 = text
            .parse()
            .map_err(|_| self.error(format!("Invalid number literal '{text}'")))?;
        self.advance(end - start);
        Ok(self.token(TokenKind::Number(value), col))
    }

    fn string(&mut self) -> Result<Token, LexError> {
        let col = self.col;
        let start = self.pos + 1;
        let mut end = start;
        loop {
            match self.src.get(end) {
                Some(b'"') => break,
                Some(b'\n') | None => return Err(self.error("Unterminated string literal")),
                Some(_) => end += 1,
            }
        }
        let text = self.text[start..end].to_string();
        self.advance(end + 1 - self.pos);
        Ok(self.token(TokenKind::Str(text), col))
    }

    /// A word is a cell reference, a range, or a function keyword.
    fn word(&mut self) -> Result<Token, LexError> {
        let (start, col) = (self.pos, self.col);
        let end = self.scan_ref_shape(start);
        let text = &self.text[start..end];

        if is_cell_key(text) {
            // Possibly the left half of a range.
            if self.src.get(end) == Some(&b':') {
                let rhs_end = self.scan_ref_shape(end + 1);
                let rhs = &self.text[end + 1..rhs_end];
                if is_cell_key(rhs) {
                    let range = self.text[start..rhs_end].to_string();
                    self.advance(rhs_end - start);
                    return Ok(self.token(TokenKind::Range(range), col));
                }
            }
            let key = text.to_string();
            self.advance(end - start);
            return Ok(self.token(TokenKind::CellRef(key), col));
        }

        let upper = text.to_ascii_uppercase();
        if let Some(&func) = FUNCTIONS.get(upper.as_str()) {
            self.advance(end - start);
            return Ok(self.token(TokenKind::Func(func), col));
        }

        Err(self.error(format!("Unknown identifier '{text}'")))
    }

    /// Scan letters then digits starting at `from`; returns the end offset.
    fn scan_ref_shape(&self, from: usize) -> usize {
        let mut end = from;
        while self.src.get(end).is_some_and(|b| b.is_ascii_alphabetic()) {
            end += 1;
        }
        while self.src.get(end).is_some_and(|b| b.is_ascii_digit()) {
            end += 1;
        }
        end
    }

    fn operator(&mut self) -> Result<Token, LexError> {
        let col = self.col;
        let kind = match self.src.get(self.pos..self.pos + 2) {
            Some([b'>', b'=']) => Some((TokenKind::Gte, 2)),
            Some([b'<', b'=']) => Some((TokenKind::Lte, 2)),
            Some([b'<', b'>']) => Some((TokenKind::Ne, 2)),
            _ => None,
        };
        let (kind, len) = match kind {
            Some(pair) => pair,
            None => {
                let kind = match self.src[self.pos] {
                    b'+' => TokenKind::Plus,
                    b'-' => TokenKind::Minus,
                    b'*' => TokenKind::Star,
                    b'/' => TokenKind::Slash,
                    b'^' => TokenKind::Caret,
                    b'>' => TokenKind::Gt,
                    b'<' => TokenKind::Lt,
                    b'=' => TokenKind::Eq,
                    b'(' => TokenKind::LParen,
                    b')' => TokenKind::RParen,
                    b',' => TokenKind::Comma,
                    other => {
                        return Err(
                            self.error(format!("Unexpected character '{}'", other as char))
                        );
                    }
                };
                (kind, 1)
            }
        };
        self.advance(len);
        Ok(self.token(kind, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn numbers_and_operators() {
        assert_eq!(
            kinds("1+2.5*3"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Plus,
                TokenKind::Number(2.5),
                TokenKind::Star,
                TokenKind::Number(3.0),
            ]
        );
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(
            kinds("A1>=2"),
            vec![
                TokenKind::CellRef("A1".into()),
                TokenKind::Gte,
                TokenKind::Number(2.0),
            ]
        );
        assert_eq!(kinds("1<>2")[1], TokenKind::Ne);
        assert_eq!(kinds("1<=2")[1], TokenKind::Lte);
        assert_eq!(kinds("1=2")[1], TokenKind::Eq);
    }

    #[test]
    fn cell_refs_and_ranges() {
        assert_eq!(kinds("A1"), vec![TokenKind::CellRef("A1".into())]);
        assert_eq!(kinds("A1:B10"), vec![TokenKind::Range("A1:B10".into())]);
        // A colon with no valid right half falls out of the range shape and
        // the dangling ':' is rejected.
        assert!(tokenize("A1:").is_err());
    }

    #[test]
    fn function_keywords_are_case_insensitive() {
        assert_eq!(kinds("SUM"), vec![TokenKind::Func(Func::Sum)]);
        assert_eq!(kinds("average"), vec![TokenKind::Func(Func::Average)]);
        assert_eq!(kinds("If"), vec![TokenKind::Func(Func::If)]);
    }

    #[test]
    fn string_literals() {
        assert_eq!(kinds("\"hello\""), vec![TokenKind::Str("hello".into())]);
        assert!(tokenize("\"oops").is_err());
    }

    #[test]
    fn positions_track_lines() {
        let tokens = tokenize("1\n+ 2").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[1].col, 1);
        assert_eq!(tokens[2].col, 3);
    }

    #[test]
    fn start_line_offsets_positions() {
        let tokens = tokenize_at("A1+1", 7).unwrap();
        assert!(tokens.iter().all(|t| t.line == 7));
    }

    #[test]
    fn unknown_identifier_is_an_error() {
        let err = tokenize("frobnicate(1)").unwrap_err();
        assert!(err.message.contains("frobnicate"));
    }

    #[test]
    fn lowercase_cell_ref_is_rejected() {
        // `a1` scans as a word, fails the key check, and is not a function.
        assert!(tokenize("a1").is_err());
    }

    #[test]
    fn multi_letter_range_still_lexes_as_one_token() {
        // The analyzer owns the single-letter-column rule; the scanner only
        // recognizes the ref:ref shape.
        assert_eq!(kinds("AA1:B2"), vec![TokenKind::Range("AA1:B2".into())]);
    }
}
