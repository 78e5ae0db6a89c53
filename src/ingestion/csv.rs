//! Delimited text ingestion.
//!
//! Lines are split with [`crate::tokenizer::Tokenizer`] (configured from
//! [`IngestionOptions::separator`] and [`IngestionOptions::quote`]) and read through the engine as
//! a single [`TextTable`]. One physical line is one row; quoted fields cannot span lines.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::engine::{Ingestion, TableReader};
use crate::error::{IngestionError, IngestionResult};
use crate::record::RecordTarget;
use crate::sheet::TextTable;
use crate::tolerance::Diagnostics;

use super::unified::IngestionOptions;

const BOM: char = '\u{feff}';

/// Ingest a delimited text file.
///
/// The table is named after the file name, which is what diagnostics report as the sheet.
pub fn ingest_csv_from_path<T: RecordTarget>(
    path: impl AsRef<Path>,
    options: &IngestionOptions,
) -> IngestionResult<Vec<T>> {
    ingest_csv_from_path_with_report(path, options).map(Ingestion::into_records)
}

pub fn ingest_csv_from_path_with_report<T: RecordTarget>(
    path: impl AsRef<Path>,
    options: &IngestionOptions,
) -> IngestionResult<Ingestion<T>> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file = File::open(path)?;
    ingest_csv_from_reader(name, BufReader::new(file), options)
}

/// Ingest delimited text from any buffered reader. A leading UTF-8 BOM is dropped.
///
/// A line that is not valid UTF-8 fails a `Strict` run. Other levels decode it lossily and record
/// an [`IngestionError::Encoding`] diagnostic.
pub fn ingest_csv_from_reader<T, R>(
    name: impl Into<String>,
    mut reader: R,
    options: &IngestionOptions,
) -> IngestionResult<Ingestion<T>>
where
    T: RecordTarget,
    R: BufRead,
{
    let name = name.into();
    let mut diagnostics = Diagnostics::default();
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(text) => text.to_string(),
            Err(e) => {
                options.tolerance.recover(
                    IngestionError::Encoding {
                        sheet: name.clone(),
                        row: lines.len() + 1,
                        message: e.to_string(),
                    },
                    &mut diagnostics,
                )?;
                String::from_utf8_lossy(&buf).into_owned()
            }
        };
        if lines.is_empty() {
            lines.push(line.strip_prefix(BOM).map(str::to_string).unwrap_or(line));
        } else {
            lines.push(line);
        }
    }
    let table = TextTable::from_lines(name, &lines, &options.tokenizer());
    let mut out = TableReader::new(options).read_with_report(std::slice::from_ref(&table))?;
    if !diagnostics.is_empty() {
        let mut merged = diagnostics.into_vec();
        merged.append(&mut out.report.diagnostics);
        out.report.diagnostics = merged;
    }
    Ok(out)
}

/// Ingest delimited text held in memory.
pub fn ingest_csv_from_str<T: RecordTarget>(
    name: impl Into<String>,
    text: &str,
    options: &IngestionOptions,
) -> IngestionResult<Ingestion<T>> {
    ingest_csv_from_reader(name, text.as_bytes(), options)
}

/// Read records from lines whose header is located as configured (row `options.header_row`,
/// probing when lenient).
///
/// ```
/// use tabular_ingest::ingestion::{csv::parse_lines, IngestionOptions};
/// use tabular_ingest::record::DynamicRecord;
///
/// let lines = ["no,code,country", "10,AU,Australia"];
/// let records: Vec<DynamicRecord> = parse_lines(&lines, &IngestionOptions::default()).unwrap();
/// assert_eq!(records[0].get_str("country"), Some("Australia"));
/// ```
pub fn parse_lines<T, S>(lines: &[S], options: &IngestionOptions) -> IngestionResult<Vec<T>>
where
    T: RecordTarget,
    S: AsRef<str>,
{
    let table = TextTable::from_lines("lines", lines, &options.tokenizer());
    TableReader::new(options).read(std::slice::from_ref(&table))
}

/// Read records from data lines described by a separate header line.
pub fn parse_with_header<T, S>(header: &str, lines: &[S], options: &IngestionOptions) -> IngestionResult<Vec<T>>
where
    T: RecordTarget,
    S: AsRef<str>,
{
    let all = std::iter::once(header).chain(lines.iter().map(|line| line.as_ref()));
    let table = TextTable::from_lines("lines", all, &options.tokenizer());
    let options = IngestionOptions {
        header_row: 0,
        header_probe_limit: Some(1),
        ..options.clone()
    };
    TableReader::new(&options).read(std::slice::from_ref(&table))
}

/// Read a single data line described by `header`. `None` when the line holds no bound value.
pub fn parse_data_line<T: RecordTarget>(
    header: &str,
    line: &str,
    options: &IngestionOptions,
) -> IngestionResult<Option<T>> {
    Ok(parse_with_header(header, &[line], options)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DynamicRecord;
    use crate::tolerance::{DiagnosticKind, Tolerance};

    const LATIN1_ROW: &[u8] = b"no,country\n10,Australia\n11,Caf\xe9\n12,NZ\n";

    #[test]
    fn bom_is_stripped_from_first_line() {
        let text = "\u{feff}no,code\n10,AU\n";
        let out = ingest_csv_from_str::<DynamicRecord>("bom.csv", text, &IngestionOptions::default()).unwrap();
        assert_eq!(out.records[0].get_str("no"), Some("10"));
    }

    #[test]
    fn invalid_utf8_line_is_decoded_lossily_and_reported() {
        let options = IngestionOptions::default();
        let out = ingest_csv_from_reader::<DynamicRecord, _>("cafe.csv", LATIN1_ROW, &options).unwrap();

        assert_eq!(out.records.len(), 3);
        assert_eq!(out.records[1].get_str("country"), Some("Caf\u{fffd}"));
        assert_eq!(out.records[2].get_str("country"), Some("NZ"));
        assert_eq!(out.report.diagnostics.len(), 1);
        let diagnostic = &out.report.diagnostics[0];
        assert_eq!(diagnostic.kind, DiagnosticKind::Encoding);
        assert_eq!(diagnostic.row, Some(3));
    }

    #[test]
    fn invalid_utf8_line_fails_strict_run() {
        let options = IngestionOptions {
            tolerance: Tolerance::Strict,
            ..IngestionOptions::default()
        };
        let err = ingest_csv_from_reader::<DynamicRecord, _>("cafe.csv", LATIN1_ROW, &options).unwrap_err();
        assert!(matches!(err, IngestionError::Encoding { row: 3, .. }));
    }

    #[test]
    fn parse_data_line_returns_single_record() {
        let record: Option<DynamicRecord> =
            parse_data_line("no,code,country", r#"10,AU,"Aus,tralia""#, &IngestionOptions::default()).unwrap();
        assert_eq!(record.and_then(|r| r.get_str("country").map(str::to_string)).as_deref(), Some("Aus,tralia"));
    }

    #[test]
    fn parse_data_line_with_blank_line_is_none() {
        let record: Option<DynamicRecord> =
            parse_data_line("no,code", ",", &IngestionOptions::default()).unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn parse_with_header_ignores_configured_header_row() {
        let options = IngestionOptions {
            header_row: 5,
            ..IngestionOptions::default()
        };
        let records: Vec<DynamicRecord> =
            parse_with_header("no,code", &["1,AU", "2,NZ"], &options).unwrap();
        assert_eq!(records.len(), 2);
    }
}
