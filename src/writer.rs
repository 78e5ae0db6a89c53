//! Delimited text output for dynamic records, using the `csv` crate with minimal quoting.
//!
//! Output written here reads back through [`crate::tokenizer::Tokenizer`] with the same separator
//! and quote into the same fields.

use std::io::{self, Write};

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{IngestionError, IngestionResult};
use crate::record::DynamicRecord;

fn ascii_byte(c: char, what: &str) -> IngestionResult<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(IngestionError::Configuration {
            message: format!("{what} must be an ASCII character, got {c:?}"),
        })
    }
}

fn builder(separator: char, quote: char) -> IngestionResult<WriterBuilder> {
    let mut builder = WriterBuilder::new();
    builder
        .delimiter(ascii_byte(separator, "separator")?)
        .quote(ascii_byte(quote, "quote")?)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'));
    Ok(builder)
}

/// Encode one field sequence as a line (without the trailing newline).
///
/// ```
/// use tabular_ingest::writer::encode_line;
///
/// let line = encode_line(&["10", "AU", "Aus,tralia"], ',', '"').unwrap();
/// assert_eq!(line, r#"10,AU,"Aus,tralia""#);
/// ```
pub fn encode_line<S: AsRef<str>>(fields: &[S], separator: char, quote: char) -> IngestionResult<String> {
    let mut wtr = builder(separator, quote)?.from_writer(Vec::new());
    wtr.write_record(fields.iter().map(|f| f.as_ref()))?;
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    let mut line = String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}

/// Write `records` with a header made of every key in first-seen order.
///
/// Missing keys and null values are written as empty fields.
pub fn write_records<W: Write>(
    writer: W,
    records: &[DynamicRecord],
    separator: char,
    quote: char,
) -> IngestionResult<()> {
    let mut header: Vec<&str> = Vec::new();
    for key in records.iter().flat_map(DynamicRecord::keys) {
        if !header.contains(&key) {
            header.push(key);
        }
    }

    let mut wtr = builder(separator, quote)?.from_writer(writer);
    wtr.write_record(&header)?;
    for record in records {
        let row: Vec<String> = header
            .iter()
            .map(|key| record.get(key).map(ToString::to_string).unwrap_or_default())
            .collect();
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    tracing::debug!(records = records.len(), columns = header.len(), "wrote records");
    Ok(())
}
