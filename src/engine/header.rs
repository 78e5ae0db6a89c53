use std::collections::BTreeSet;

use crate::error::{IngestionError, IngestionResult};
use crate::record::Setter;
use crate::schema::ResolvedSchema;
use crate::sheet::{Cell, Sheet};
use crate::tolerance::{Diagnostics, Tolerance};

/// Column position → setter bindings, in build order.
#[derive(Debug)]
pub struct ColumnIndex<T> {
    bindings: Vec<(usize, Setter<T>)>,
}

impl<T> Default for ColumnIndex<T> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<T> ColumnIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `column`; a column bound twice keeps its first position with the new setter.
    pub fn bind(&mut self, column: usize, setter: Setter<T>) {
        match self.bindings.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = setter,
            None => self.bindings.push((column, setter)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Setter<T>)> {
        self.bindings.iter().map(|(c, s)| (*c, s))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bound_keys(&self) -> BTreeSet<String> {
        self.bindings.iter().map(|(_, s)| s.key()).collect()
    }
}

/// Header row actually used for a sheet and its column bindings.
#[derive(Debug)]
pub struct HeaderLocation<T> {
    /// 0-based row position.
    pub header_row: usize,
    pub columns: ColumnIndex<T>,
}

/// Find the header row of `sheet` and bind its captions.
///
/// `Strict` uses exactly `configured_row`. Other levels probe forward from it (or from the first
/// row when it is out of bounds) and stop at the first row yielding a non-empty index. The probe
/// covers at most `probe_limit` rows when given. When nothing binds, the returned index is empty.
pub fn locate_header<T, S>(
    sheet: &S,
    schema: &ResolvedSchema<T>,
    configured_row: usize,
    tolerance: Tolerance,
    probe_limit: Option<usize>,
    diagnostics: &mut Diagnostics,
) -> IngestionResult<HeaderLocation<T>>
where
    S: Sheet + ?Sized,
{
    let reported_row = configured_row.saturating_add(1);
    let Some((first, last)) = sheet.row_bounds() else {
        tolerance.recover(
            IngestionError::HeaderLocation {
                sheet: sheet.name().to_string(),
                row: Some(reported_row),
                message: "sheet has no rows".to_string(),
            },
            diagnostics,
        )?;
        return Ok(HeaderLocation {
            header_row: configured_row,
            columns: ColumnIndex::new(),
        });
    };

    let mut start = configured_row;
    if configured_row < first || configured_row > last {
        tolerance.recover(
            IngestionError::HeaderLocation {
                sheet: sheet.name().to_string(),
                row: Some(reported_row),
                message: format!(
                    "header row {} is outside rows {}..={}; probing from the first row",
                    reported_row,
                    first + 1,
                    last + 1
                ),
            },
            diagnostics,
        )?;
        start = first;
    }

    if tolerance.is_strict() {
        return Ok(HeaderLocation {
            header_row: start,
            columns: build_column_index(sheet, start, schema),
        });
    }

    let end = match probe_limit {
        Some(limit) => last.min(start.saturating_add(limit.max(1) - 1)),
        None => last,
    };
    for row in start..=end {
        let columns = build_column_index(sheet, row, schema);
        if !columns.is_empty() {
            if row != configured_row {
                tracing::debug!(sheet = sheet.name(), row = row + 1, "probed header row");
            }
            return Ok(HeaderLocation {
                header_row: row,
                columns,
            });
        }
    }

    Ok(HeaderLocation {
        header_row: start,
        columns: ColumnIndex::new(),
    })
}

/// Bind every caption of `row` the schema recognizes. Cells without a caption are skipped.
pub fn build_column_index<T, S>(sheet: &S, row: usize, schema: &ResolvedSchema<T>) -> ColumnIndex<T>
where
    S: Sheet + ?Sized,
{
    let mut index = ColumnIndex::new();
    for column in 0..sheet.row_width(row) {
        let cell = sheet.cell(row, column);
        if cell.is_blank() {
            continue;
        }
        let Some(caption) = cell.caption() else {
            tracing::debug!(
                sheet = sheet.name(),
                row = row + 1,
                column = column + 1,
                cell = ?cell_kind(&cell),
                "skipping header cell without a caption"
            );
            continue;
        };
        if let Some(setter) = schema.lookup(&caption) {
            index.bind(column, setter);
        }
    }
    index
}

fn cell_kind(cell: &Cell) -> &'static str {
    match cell {
        Cell::Timestamp(_) => "timestamp",
        Cell::Error(_) => "error",
        Cell::Unsupported(_) => "unsupported",
        _ => "value",
    }
}
