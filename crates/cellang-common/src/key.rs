//! Cell-key and range text parsing.
//!
//! Keys are uppercase column letters followed by a 1-based row (`A1`, `Z42`).
//! Range text is `<col><row>:<col><row>` with single-letter columns; the
//! expansion order contract (columns outer, rows inner) lives here so the
//! analyzer, the runtime, and the lexer all agree on what a range *is*.

/// True if `s` is a well-formed cell key: one or more uppercase letters
/// followed by a positive integer row.
pub fn is_cell_key(s: &str) -> bool {
    let letters = s.chars().take_while(|c| c.is_ascii_uppercase()).count();
    if letters == 0 || letters == s.len() {
        return false;
    }
    let row = &s[letters..];
    row.bytes().all(|b| b.is_ascii_digit()) && !row.starts_with('0')
}

/// Inclusive bounds of a rectangular range with single-letter columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBounds {
    pub col_start: char,
    pub row_start: u32,
    pub col_end: char,
    pub row_end: u32,
}

impl RangeBounds {
    /// Start must be the top-left corner: column-wise and row-wise ≤ end.
    pub fn is_ordered(&self) -> bool {
        self.col_start <= self.col_end && self.row_start <= self.row_end
    }

    /// Cell keys in column-major order: `A1:B2` → A1, A2, B1, B2.
    pub fn cells(&self) -> impl Iterator<Item = String> + '_ {
        let rows = self.row_start..=self.row_end;
        (self.col_start..=self.col_end)
            .flat_map(move |col| rows.clone().map(move |row| format!("{col}{row}")))
    }
}

/// Parse range text like `A1:B10`. Returns `None` when the text is not a
/// range at all (callers then treat it as a plain string); ordering is NOT
/// checked here, that is `RangeBounds::is_ordered` and the analyzer's job.
pub fn parse_range(text: &str) -> Option<RangeBounds> {
    let (start, end) = text.split_once(':')?;
    let (col_start, row_start) = parse_single_col_ref(start)?;
    let (col_end, row_end) = parse_single_col_ref(end)?;
    Some(RangeBounds {
        col_start,
        row_start,
        col_end,
        row_end,
    })
}

/// Parse a single-letter-column reference (`B10` → ('B', 10)).
fn parse_single_col_ref(s: &str) -> Option<(char, u32)> {
    let mut chars = s.chars();
    let col = chars.next()?;
    if !col.is_ascii_uppercase() {
        return None;
    }
    let row = chars.as_str();
    if row.is_empty() || !row.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((col, row.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_key_validation() {
        assert!(is_cell_key("A1"));
        assert!(is_cell_key("Z42"));
        assert!(is_cell_key("AA10"));
        assert!(!is_cell_key("a1"));
        assert!(!is_cell_key("A"));
        assert!(!is_cell_key("12"));
        assert!(!is_cell_key("A0"));
        assert!(!is_cell_key(""));
        assert!(!is_cell_key("A1B"));
    }

    #[test]
    fn range_parsing() {
        let r = parse_range("A1:B10").unwrap();
        assert_eq!(r.col_start, 'A');
        assert_eq!(r.row_start, 1);
        assert_eq!(r.col_end, 'B');
        assert_eq!(r.row_end, 10);

        assert!(parse_range("A1").is_none());
        assert!(parse_range("A1:").is_none());
        assert!(parse_range("AA1:B2").is_none()); // multi-letter columns
        assert!(parse_range("a1:b2").is_none());
        assert!(parse_range("hello").is_none());
    }

    #[test]
    fn misordered_range_parses_but_reports_unordered() {
        let r = parse_range("A3:A1").unwrap();
        assert!(!r.is_ordered());
        let r = parse_range("B1:A1").unwrap();
        assert!(!r.is_ordered());
    }

    #[test]
    fn column_major_expansion_order() {
        let r = parse_range("A1:B2").unwrap();
        let keys: Vec<_> = r.cells().collect();
        assert_eq!(keys, ["A1", "A2", "B1", "B2"]);
    }

    #[test]
    fn degenerate_range_is_single_cell() {
        let r = parse_range("A1:A1").unwrap();
        assert!(r.is_ordered());
        assert_eq!(r.cells().count(), 1);
    }
}
