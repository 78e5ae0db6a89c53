//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can override via [`IngestionOptions`])
//! - reads every selected table through the [`crate::engine`] into records
//! - optionally reports success/failure/alerts/diagnostics to an [`IngestionObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - `excel` (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod observability;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    StdErrObserver, TracingObserver,
};
pub use unified::{
    ingest_from_path, ingest_from_path_with_report, CaptionMapper, IngestionFormat, IngestionOptions,
    IngestionOptionsBuilder, SheetSelection,
};
