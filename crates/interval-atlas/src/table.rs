//! Delimited-table ingestion and the typed parsing boundary shared by the
//! lookup-table and statistics loaders.

use std::path::Path;

use crate::types::{AtlasError, AtlasResult};

/// A parsed delimited table: one header row plus string cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse delimited text. A leading BOM is stripped, blank lines are
    /// dropped, and quoted fields may contain the delimiter.
    pub fn parse(text: &str) -> Self {
        let clean = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = clean.lines().filter(|l| !l.trim().is_empty());

        let headers = match lines.next() {
            Some(line) => split_line(line),
            None => return Self::default(),
        };
        let rows = lines.map(split_line).collect();

        Self { headers, rows }
    }

    /// Read and parse a table file.
    pub fn read_from_file(path: &Path) -> AtlasResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AtlasError::source_unavailable(path, e))?;
        Ok(Self::parse(&text))
    }

    /// Index of the first column whose normalized header matches one of
    /// `aliases`, falling back to a column literally named `default`.
    pub fn column(&self, aliases: &[&str], default: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| aliases.contains(&normalize_header(h).as_str()))
            .or_else(|| self.headers.iter().position(|h| h.as_str() == default))
    }

    /// Read one cell of a row; missing columns and cells read as empty.
    pub fn cell<'a>(&self, row: &'a [String], column: Option<usize>) -> &'a str {
        column
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Collapse case and whitespace for header matching, so `" Bin Low "`,
/// `"BinLow"`, and `"binlow"` are the same column.
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Split one delimited line, honoring double-quoted fields.
fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    cells.push(current);

    cells.iter().map(|c| c.trim().to_string()).collect()
}

/// Optional numeric field: empty or unparseable reads as `None`.
pub fn parse_optional_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Integer key field. Accepts integral-valued decimals (`"12.0"` is 12);
/// anything else reads as `None` so callers can skip the row.
pub fn parse_required_int(raw: &str) -> Option<i64> {
    let n = parse_optional_number(raw)?;
    if n.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&n) {
        Some(n as i64)
    } else {
        None
    }
}
