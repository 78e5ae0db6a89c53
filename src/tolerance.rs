//! Tolerance policy: the single decision point for recoverable conditions.
//!
//! Under [`Tolerance::Strict`] every recoverable condition aborts the run with its
//! [`IngestionError`]. Otherwise the condition is logged with `tracing::warn!`, recorded as a
//! [`Diagnostic`], and the engine substitutes a safe default (null value, skipped cell, empty
//! result).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};
use crate::tokenizer::TokenizeAnomaly;

/// How strictly an ingestion run treats malformed input. Selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// Fail on the first recoverable condition; no header probing.
    Strict,
    /// Log and continue; only mapped captions bind.
    Tolerant,
    /// Like `Tolerant`, and dynamic records also bind unmapped captions under their derived key.
    #[default]
    AggressiveRead,
}

impl Tolerance {
    pub fn is_strict(self) -> bool {
        self == Tolerance::Strict
    }

    /// Dynamic targets bind captions that have no explicit mapping.
    pub fn binds_unmapped(self) -> bool {
        self == Tolerance::AggressiveRead
    }

    /// Decide the fate of a recoverable `error`.
    ///
    /// Returns the error under `Strict`; otherwise records it and returns `Ok(())`.
    pub fn recover(self, error: IngestionError, diagnostics: &mut Diagnostics) -> IngestionResult<()> {
        if self.is_strict() {
            return Err(error);
        }
        diagnostics.push(Diagnostic::from_error(&error));
        Ok(())
    }
}

/// Category of a recorded condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    TokenizeAnomaly,
    SchemaResolution,
    HeaderLocation,
    Encoding,
    CellDecode,
    PropertyAssignment,
    Other,
}

/// One recovered condition with its location. Rows and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub sheet: Option<String>,
    pub row: Option<usize>,
    pub column: Option<usize>,
}

impl Diagnostic {
    pub fn from_error(error: &IngestionError) -> Self {
        let (kind, sheet, row, column) = match error {
            IngestionError::SchemaResolution { .. } => {
                (DiagnosticKind::SchemaResolution, None, None, None)
            }
            IngestionError::HeaderLocation { sheet, row, .. } => {
                (DiagnosticKind::HeaderLocation, Some(sheet.clone()), *row, None)
            }
            IngestionError::Encoding { sheet, row, .. } => {
                (DiagnosticKind::Encoding, Some(sheet.clone()), Some(*row), None)
            }
            IngestionError::CellDecode {
                sheet, row, column, ..
            } => (
                DiagnosticKind::CellDecode,
                Some(sheet.clone()),
                Some(*row),
                Some(*column),
            ),
            IngestionError::PropertyAssignment {
                sheet, row, column, ..
            } => (
                DiagnosticKind::PropertyAssignment,
                Some(sheet.clone()),
                Some(*row),
                Some(*column),
            ),
            _ => (DiagnosticKind::Other, None, None, None),
        };
        Self {
            kind,
            message: error.to_string(),
            sheet,
            row,
            column,
        }
    }

    /// `row` is the 0-based row the anomaly was found on.
    pub fn from_anomaly(sheet: &str, row: usize, anomaly: &TokenizeAnomaly) -> Self {
        Self {
            kind: DiagnosticKind::TokenizeAnomaly,
            message: anomaly.to_string(),
            sheet: Some(sheet.to_string()),
            row: Some(row + 1),
            column: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}]", self.kind)?;
        if let Some(sheet) = &self.sheet {
            write!(f, " sheet={sheet}")?;
        }
        if let Some(row) = self.row {
            write!(f, " row={row}")?;
        }
        if let Some(column) = self.column {
            write!(f, " column={column}")?;
        }
        write!(f, " {}", self.message)
    }
}

/// Diagnostics collected during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Log `diagnostic` at warn level and keep it.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = ?diagnostic.kind,
            sheet = diagnostic.sheet.as_deref(),
            row = diagnostic.row,
            column = diagnostic.column,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_error() -> IngestionError {
        IngestionError::CellDecode {
            sheet: "Sheet1".to_string(),
            row: 4,
            column: 2,
            message: "error cell value encountered: #DIV/0!".to_string(),
        }
    }

    #[test]
    fn strict_returns_the_error() {
        let mut diagnostics = Diagnostics::default();
        let out = Tolerance::Strict.recover(decode_error(), &mut diagnostics);
        assert!(matches!(out, Err(IngestionError::CellDecode { row: 4, .. })));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn lenient_levels_record_a_diagnostic() {
        for level in [Tolerance::Tolerant, Tolerance::AggressiveRead] {
            let mut diagnostics = Diagnostics::default();
            level.recover(decode_error(), &mut diagnostics).unwrap();
            let recorded: Vec<_> = diagnostics.iter().collect();
            assert_eq!(recorded.len(), 1);
            assert_eq!(recorded[0].kind, DiagnosticKind::CellDecode);
            assert_eq!(recorded[0].sheet.as_deref(), Some("Sheet1"));
            assert_eq!((recorded[0].row, recorded[0].column), (Some(4), Some(2)));
        }
    }

    #[test]
    fn default_is_aggressive_read() {
        assert_eq!(Tolerance::default(), Tolerance::AggressiveRead);
        assert!(Tolerance::AggressiveRead.binds_unmapped());
        assert!(!Tolerance::Tolerant.binds_unmapped());
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&Tolerance::AggressiveRead).unwrap();
        assert_eq!(json, "\"aggressive_read\"");
        let level: Tolerance = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(level, Tolerance::Strict);
    }

    #[test]
    fn anomaly_rows_are_reported_one_based() {
        let d = Diagnostic::from_anomaly("csv", 0, &TokenizeAnomaly::UnbalancedQuote { field: 3 });
        assert_eq!(d.row, Some(1));
        assert_eq!(d.kind, DiagnosticKind::TokenizeAnomaly);
        assert!(d.to_string().starts_with("[TokenizeAnomaly] sheet=csv row=1"));
    }
}
