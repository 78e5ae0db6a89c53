#![cfg(feature = "excel")]

//! Workbook ingestion (`.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`) through `calamine`.

use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};

use crate::engine::{Ingestion, TableReader};
use crate::error::IngestionResult;
use crate::record::RecordTarget;
use crate::sheet::{Cell, Sheet};

use super::unified::{IngestionOptions, SheetSelection};

/// One worksheet as a [`Sheet`]. Row and column positions are absolute worksheet positions.
#[derive(Debug, Clone)]
pub struct RangeSheet {
    name: String,
    range: Range<Data>,
}

impl RangeSheet {
    pub fn new(name: impl Into<String>, range: Range<Data>) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    pub fn range(&self) -> &Range<Data> {
        &self.range
    }
}

impl Sheet for RangeSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn row_bounds(&self) -> Option<(usize, usize)> {
        let (start, end) = (self.range.start()?, self.range.end()?);
        Some((start.0 as usize, end.0 as usize))
    }

    fn row_width(&self, _row: usize) -> usize {
        self.range.end().map_or(0, |(_, col)| col as usize + 1)
    }

    fn cell(&self, row: usize, column: usize) -> Cell {
        let (Ok(row), Ok(column)) = (u32::try_from(row), u32::try_from(column)) else {
            return Cell::Blank;
        };
        self.range
            .get_value((row, column))
            .map_or(Cell::Blank, cell_from_data)
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Blank,
        Data::String(s) if s.is_empty() => Cell::Blank,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Cell::Int(*f as i64),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => match data.as_datetime() {
            Some(ts) => Cell::Timestamp(ts),
            None => Cell::Unsupported(format!("date/time {data}")),
        },
        Data::DurationIso(s) => Cell::Unsupported(format!("duration {s}")),
        Data::Error(e) => Cell::Error(format!("{e:?}")),
    }
}

/// Open a workbook and load the sheets picked by `selection`, in workbook order.
pub fn load_sheets(path: impl AsRef<Path>, selection: &SheetSelection) -> IngestionResult<Vec<RangeSheet>> {
    let path = path.as_ref();
    let started = Instant::now();
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();

    let mut sheets = Vec::new();
    for (position, name) in names.iter().enumerate() {
        if !selection.matches(name, position) {
            tracing::trace!(sheet = %name, position, "sheet not selected");
            continue;
        }
        let range = workbook.worksheet_range(name)?;
        sheets.push(RangeSheet::new(name.clone(), range));
    }
    tracing::trace!(
        path = %path.display(),
        sheets = sheets.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "loaded workbook"
    );
    Ok(sheets)
}

/// Ingest every selected sheet of a workbook, concatenating records in sheet order.
pub fn ingest_excel_from_path<T: RecordTarget>(
    path: impl AsRef<Path>,
    options: &IngestionOptions,
) -> IngestionResult<Vec<T>> {
    ingest_excel_from_path_with_report(path, options).map(Ingestion::into_records)
}

pub fn ingest_excel_from_path_with_report<T: RecordTarget>(
    path: impl AsRef<Path>,
    options: &IngestionOptions,
) -> IngestionResult<Ingestion<T>> {
    let sheets = load_sheets(path, &options.sheet_selection)?;
    TableReader::new(options).read_with_report(&sheets)
}
