//! `tabular-ingest` reads loosely structured tables (delimited text and spreadsheets) into
//! records, matching header captions to fields instead of relying on column positions.
//!
//! The primary entrypoint is [`ingestion::ingest_from_path`], which auto-detects the input format
//! from the file extension (or you can force a format via [`ingestion::IngestionOptions`]).
//!
//! ## What you can ingest
//!
//! **File formats (auto-detected by extension):**
//!
//! - **Delimited text**: `.csv`, `.tsv`, `.txt` (separator and quote are configurable)
//! - **Excel/workbooks** (requires the Cargo feature `excel`): `.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`
//!
//! **Record shapes:**
//!
//! - [`record::DynamicRecord`]: ordered key → [`types::Value`] map; keys come from the caption
//!   mapping or are derived from captions (`First Name` → `firstName` by default).
//! - Any struct implementing [`record::TypedRecord`], including nested children addressed with
//!   dotted keys such as `address.street`.
//!
//! Empty cells map to [`types::Value::Null`] and are never assigned.
//!
//! ## How a table is read
//!
//! 1. The [`schema::SchemaResolver`] turns the caption mapping into setters for the target.
//! 2. The header locator finds the caption row, probing forward from
//!    [`ingestion::IngestionOptions::header_row`] unless the run is [`tolerance::Tolerance::Strict`].
//! 3. The row materializer builds one record per row until the last row or the terminator value.
//!
//! Malformed input is handled by the [`tolerance::Tolerance`] policy: `Strict` fails with an
//! [`IngestionError`], the lenient levels log through `tracing` and keep going, recording each
//! condition as a [`tolerance::Diagnostic`].
//!
//! ## Quick examples
//!
//! ```
//! use tabular_ingest::ingestion::{csv::ingest_csv_from_str, IngestionOptions};
//! use tabular_ingest::record::{Accessors, TypedRecord};
//!
//! #[derive(Debug, Default)]
//! struct Country {
//!     no: i64,
//!     name: String,
//! }
//!
//! impl TypedRecord for Country {
//!     fn accessors() -> Accessors<Self> {
//!         Accessors::<Self>::new()
//!             .field("no", |c, v| {
//!                 c.no = v.to_i64()?;
//!                 Ok(())
//!             })
//!             .field("name", |c, v| {
//!                 c.name = v.into_text();
//!                 Ok(())
//!             })
//!     }
//! }
//!
//! # fn main() -> Result<(), tabular_ingest::IngestionError> {
//! let text = "Countries\nno,code,country\n10,AU,Australia\n";
//! let options = IngestionOptions::builder().map("country").to("name").build();
//! let countries = ingest_csv_from_str::<Country>("countries.csv", text, &options)?.records;
//! assert_eq!(countries[0].no, 10);
//! assert_eq!(countries[0].name, "Australia");
//! # Ok(())
//! # }
//! ```
//!
//! ```no_run
//! use tabular_ingest::ingestion::{ingest_from_path, IngestionOptions};
//! use tabular_ingest::record::DynamicRecord;
//!
//! # fn main() -> Result<(), tabular_ingest::IngestionError> {
//! // Auto-detects by extension (.csv/.tsv/.xlsx/...).
//! let records: Vec<DynamicRecord> = ingest_from_path("data.csv", &IngestionOptions::default())?;
//! for r in &records {
//!     println!("{}", r.to_json());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: unified ingestion entrypoints, options, observers and format-specific readers
//! - [`engine`]: header location and row materialization over any [`sheet::Sheet`]
//! - [`tokenizer`], [`caption`], [`schema`], [`record`], [`tolerance`]: the building blocks
//! - [`writer`]: delimited text output for dynamic records
//! - [`error`]: error types used across ingestion

pub mod caption;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod record;
pub mod schema;
pub mod sheet;
pub mod tokenizer;
pub mod tolerance;
pub mod types;
pub mod writer;

pub use error::{AssignError, IngestionError, IngestionResult};
