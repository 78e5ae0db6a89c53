//! The ingestion engine: schema resolution, header location and row materialization over any
//! [`Sheet`].
//!
//! The engine performs no I/O. Callers hand it already opened tables (see
//! [`crate::ingestion::csv`] and `crate::ingestion::excel`).
//!
//! ```
//! use tabular_ingest::engine::TableReader;
//! use tabular_ingest::ingestion::IngestionOptions;
//! use tabular_ingest::record::DynamicRecord;
//! use tabular_ingest::sheet::TextTable;
//! use tabular_ingest::tokenizer::Tokenizer;
//!
//! let table = TextTable::parse("countries", "no,code,country\n10,AU,Australia", &Tokenizer::default());
//! let options = IngestionOptions::default();
//! let records: Vec<DynamicRecord> = TableReader::new(&options).read(&[table]).unwrap();
//! assert_eq!(records[0].get_str("country"), Some("Australia"));
//! ```

mod header;
mod materialize;

pub use header::{build_column_index, locate_header, ColumnIndex, HeaderLocation};
pub use materialize::{decode, materialize, MaterializeOptions, Materialized};

use serde::Serialize;

use crate::error::{IngestionError, IngestionResult};
use crate::ingestion::IngestionOptions;
use crate::record::RecordTarget;
use crate::schema::{ResolvedSchema, SchemaResolver};
use crate::sheet::Sheet;
use crate::tolerance::{Diagnostic, Diagnostics};

/// Per-sheet outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub sheet: String,
    /// 1-based header row, `None` when no header was found.
    pub header_row: Option<usize>,
    pub columns_bound: usize,
    pub records: usize,
    pub terminated: bool,
}

/// What happened during a run besides the records themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub tables: Vec<TableSummary>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Records plus report of a successful run.
#[derive(Debug)]
pub struct Ingestion<T> {
    pub records: Vec<T>,
    pub report: IngestionReport,
}

impl<T> Ingestion<T> {
    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}

/// Reads records out of sheets with one set of options.
#[derive(Debug, Clone, Copy)]
pub struct TableReader<'a> {
    options: &'a IngestionOptions,
}

impl<'a> TableReader<'a> {
    pub fn new(options: &'a IngestionOptions) -> Self {
        Self { options }
    }

    /// Records of every sheet, concatenated in sheet order.
    pub fn read<T, S>(&self, sheets: &[S]) -> IngestionResult<Vec<T>>
    where
        T: RecordTarget,
        S: Sheet,
    {
        Ok(self.read_with_report(sheets)?.records)
    }

    pub fn read_with_report<T, S>(&self, sheets: &[S]) -> IngestionResult<Ingestion<T>>
    where
        T: RecordTarget,
        S: Sheet,
    {
        let options = self.options;
        let mut diagnostics = Diagnostics::default();
        let schema = SchemaResolver::new(
            &options.caption_mapping,
            &options.caption_transform,
            options.tolerance,
        )
        .resolve::<T>(&mut diagnostics)?;

        let mut records = Vec::new();
        let mut tables = Vec::with_capacity(sheets.len());
        for sheet in sheets {
            for (row, anomaly) in sheet.tokenize_anomalies() {
                diagnostics.push(Diagnostic::from_anomaly(sheet.name(), *row, anomaly));
            }
            let summary = self.read_sheet(sheet, &schema, &mut records, &mut diagnostics)?;
            tables.push(summary);
        }

        Ok(Ingestion {
            records,
            report: IngestionReport {
                tables,
                diagnostics: diagnostics.into_vec(),
            },
        })
    }

    fn read_sheet<T, S>(
        &self,
        sheet: &S,
        schema: &ResolvedSchema<T>,
        records: &mut Vec<T>,
        diagnostics: &mut Diagnostics,
    ) -> IngestionResult<TableSummary>
    where
        T: RecordTarget,
        S: Sheet,
    {
        let options = self.options;
        let tolerance = options.tolerance;
        let location = locate_header(
            sheet,
            schema,
            options.header_row,
            tolerance,
            options.header_probe_limit,
            diagnostics,
        )?;

        let mut summary = TableSummary {
            sheet: sheet.name().to_string(),
            header_row: None,
            columns_bound: location.columns.len(),
            records: 0,
            terminated: false,
        };
        if sheet.row_bounds().is_none() {
            return Ok(summary);
        }

        let header_row = location.header_row.saturating_add(1);
        if location.columns.is_empty() {
            tolerance.recover(
                IngestionError::HeaderLocation {
                    sheet: sheet.name().to_string(),
                    row: Some(header_row),
                    message: "no recognizable caption row".to_string(),
                },
                diagnostics,
            )?;
            return Ok(summary);
        }
        summary.header_row = Some(header_row);

        if !schema.binds_on_the_fly() || !schema.is_empty() {
            let bound = location.columns.bound_keys();
            let missing: Vec<String> = schema.expected_keys().difference(&bound).cloned().collect();
            if !missing.is_empty() {
                tolerance.recover(
                    IngestionError::HeaderLocation {
                        sheet: sheet.name().to_string(),
                        row: Some(header_row),
                        message: format!("column index not fully built; unbound fields: {}", missing.join(", ")),
                    },
                    diagnostics,
                )?;
            }
        }

        let materialized = materialize(
            sheet,
            &location.columns,
            header_row,
            MaterializeOptions {
                ignore_empty_rows: options.ignore_empty_rows,
                terminator: options.terminator.as_ref(),
                tolerance,
            },
            diagnostics,
        )?;

        summary.records = materialized.records.len();
        summary.terminated = materialized.terminated;
        tracing::debug!(
            sheet = sheet.name(),
            header_row,
            columns = summary.columns_bound,
            records = summary.records,
            "read sheet"
        );
        records.extend(materialized.records);
        Ok(summary)
    }
}
