use crate::engine::header::ColumnIndex;
use crate::error::{IngestionError, IngestionResult};
use crate::record::RecordTarget;
use crate::sheet::{Cell, Sheet};
use crate::tolerance::{Diagnostics, Tolerance};
use crate::types::Value;

/// Row materialization settings.
#[derive(Debug, Clone, Copy)]
pub struct MaterializeOptions<'a> {
    pub ignore_empty_rows: bool,
    /// A bound cell equal to this value stops the table.
    pub terminator: Option<&'a Value>,
    pub tolerance: Tolerance,
}

/// Records built from one sheet.
#[derive(Debug)]
pub struct Materialized<T> {
    pub records: Vec<T>,
    /// The terminator was met.
    pub terminated: bool,
}

/// Build one record per row from `start_row` to the last row of `sheet`.
///
/// Columns are visited in index build order. Decode failures become null after the tolerance
/// policy accepts them; assignment failures skip the cell. A bound cell equal to the terminator
/// stops materialization, the current row included.
pub fn materialize<T, S>(
    sheet: &S,
    columns: &ColumnIndex<T>,
    start_row: usize,
    options: MaterializeOptions<'_>,
    diagnostics: &mut Diagnostics,
) -> IngestionResult<Materialized<T>>
where
    T: RecordTarget,
    S: Sheet + ?Sized,
{
    let mut out = Materialized {
        records: Vec::new(),
        terminated: false,
    };
    let Some((_, last)) = sheet.row_bounds() else {
        return Ok(out);
    };

    'rows: for row in start_row..=last {
        let mut record = T::create();
        let mut empty = true;

        for (column, setter) in columns.iter() {
            let value = match decode(sheet.cell(row, column)) {
                Ok(value) => value,
                Err(message) => {
                    options.tolerance.recover(
                        IngestionError::CellDecode {
                            sheet: sheet.name().to_string(),
                            row: row + 1,
                            column: column + 1,
                            message,
                        },
                        diagnostics,
                    )?;
                    Value::Null
                }
            };
            if value.is_null() {
                continue;
            }
            if options.terminator.is_some_and(|t| *t == value) {
                tracing::debug!(sheet = sheet.name(), row = row + 1, "terminator reached");
                out.terminated = true;
                break 'rows;
            }
            empty = false;
            if let Err(source) = record.apply(setter, value.clone()) {
                options.tolerance.recover(
                    IngestionError::PropertyAssignment {
                        sheet: sheet.name().to_string(),
                        row: row + 1,
                        column: column + 1,
                        field: setter.key(),
                        value: value.to_string(),
                        source,
                    },
                    diagnostics,
                )?;
            }
        }

        if empty && options.ignore_empty_rows {
            continue;
        }
        out.records.push(record);
    }
    Ok(out)
}

/// Cell → value. Error and unsupported cells fail with a message.
pub fn decode(cell: Cell) -> Result<Value, String> {
    match cell {
        Cell::Blank => Ok(Value::Null),
        Cell::Text(s) => Ok(Value::Utf8(s)),
        Cell::Int(i) => Ok(Value::Int64(i)),
        Cell::Float(f) => Ok(Value::Float64(f)),
        Cell::Bool(b) => Ok(Value::Bool(b)),
        Cell::Timestamp(ts) => Ok(Value::Timestamp(ts)),
        Cell::Error(e) => Err(format!("error cell value encountered: {e}")),
        Cell::Unsupported(kind) => Err(format!("unknown cell type encountered: {kind}")),
    }
}
