//! Row/cell access shared by every input format.
//!
//! The engine never touches files: it reads through [`Sheet`], which is implemented by
//! [`TextTable`] (tokenized text lines) and, with the `excel` feature, by
//! `ingestion::excel::RangeSheet`.

use chrono::NaiveDateTime;

use crate::tokenizer::{TokenizeAnomaly, Tokenizer};

/// A decoded cell with its discriminated kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    /// Spreadsheet error value such as `#DIV/0!`.
    Error(String),
    /// A cell kind the decoder does not understand.
    Unsupported(String),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Blank)
    }

    /// Text usable as a header caption.
    ///
    /// Numbers and booleans are accepted so that a header such as `2024` still binds; integral
    /// floats render without a fractional part. Timestamps, errors and unsupported kinds have no
    /// caption.
    pub fn caption(&self) -> Option<String> {
        match self {
            Cell::Text(s) => Some(s.clone()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(format!("{}", *f as i64)),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Blank | Cell::Timestamp(_) | Cell::Error(_) | Cell::Unsupported(_) => None,
        }
    }
}

/// Random-access view of one table.
///
/// Row and column positions are 0-based and absolute: `row_bounds` may start after 0 when the
/// leading rows of a sheet are unused.
pub trait Sheet {
    fn name(&self) -> &str;

    /// Inclusive `(first, last)` row positions, `None` for a sheet without rows.
    fn row_bounds(&self) -> Option<(usize, usize)>;

    /// Number of column positions to scan in `row`.
    fn row_width(&self, row: usize) -> usize;

    /// Cell at `(row, column)`; positions outside the data are [`Cell::Blank`].
    fn cell(&self, row: usize, column: usize) -> Cell;

    /// Quoting problems met while building the table, keyed by 0-based row.
    fn tokenize_anomalies(&self) -> &[(usize, TokenizeAnomaly)] {
        &[]
    }
}

/// Delimited text lines split into cells.
///
/// Empty fields are [`Cell::Blank`]; every other field is [`Cell::Text`] exactly as tokenized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextTable {
    name: String,
    rows: Vec<Vec<String>>,
    anomalies: Vec<(usize, TokenizeAnomaly)>,
}

impl TextTable {
    /// Tokenize every line. Each line becomes one row, blank lines included.
    pub fn from_lines<I, S>(name: impl Into<String>, lines: I, tokenizer: &Tokenizer) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rows = Vec::new();
        let mut anomalies = Vec::new();
        for (row, line) in lines.into_iter().enumerate() {
            let tokenized = tokenizer.tokenize_checked(line.as_ref());
            if let Some(anomaly) = tokenized.anomaly {
                anomalies.push((row, anomaly));
            }
            rows.push(tokenized.fields);
        }
        Self {
            name: name.into(),
            rows,
            anomalies,
        }
    }

    /// Tokenize a whole document, one row per line.
    pub fn parse(name: impl Into<String>, text: &str, tokenizer: &Tokenizer) -> Self {
        Self::from_lines(name, text.lines(), tokenizer)
    }

    /// Wrap already split rows.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
            anomalies: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

impl Sheet for TextTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn row_bounds(&self) -> Option<(usize, usize)> {
        match self.rows.len() {
            0 => None,
            n => Some((0, n - 1)),
        }
    }

    fn row_width(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, Vec::len)
    }

    fn cell(&self, row: usize, column: usize) -> Cell {
        match self.rows.get(row).and_then(|r| r.get(column)) {
            Some(field) if !field.is_empty() => Cell::Text(field.clone()),
            _ => Cell::Blank,
        }
    }

    fn tokenize_anomalies(&self) -> &[(usize, TokenizeAnomaly)] {
        &self.anomalies
    }
}
