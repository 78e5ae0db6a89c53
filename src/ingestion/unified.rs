//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which reads a delimited text file or a workbook
//! into records of any [`RecordTarget`] (a [`crate::record::DynamicRecord`] or a typed struct).
//!
//! - If [`IngestionOptions::format`] is `None`, the ingestion format is inferred from the file
//!   extension.
//! - If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts and
//!   every recovered diagnostic are reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::caption::{CaptionMapping, CaptionTransform};
use crate::engine::Ingestion;
use crate::error::{IngestionError, IngestionResult};
use crate::record::RecordTarget;
use crate::tokenizer::Tokenizer;
use crate::tolerance::Tolerance;
use crate::types::Value;

use super::csv;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Delimited text (comma, tab, ...).
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Which sheets of a workbook to read. Names match case-insensitively; positions are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SheetSelection {
    /// Every sheet, in workbook order (default).
    #[default]
    All,
    ByName(Vec<String>),
    ExcludeByName(Vec<String>),
    ByPosition(Vec<usize>),
    ExcludeByPosition(Vec<usize>),
}

impl SheetSelection {
    /// Select sheets by name. Each entry may hold several comma-separated names.
    pub fn by_name<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::ByName(split_names(names))
    }

    pub fn exclude_by_name<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::ExcludeByName(split_names(names))
    }

    pub fn matches(&self, name: &str, position: usize) -> bool {
        let lower = name.trim().to_lowercase();
        match self {
            Self::All => true,
            Self::ByName(names) => names.contains(&lower),
            Self::ExcludeByName(names) => !names.contains(&lower),
            Self::ByPosition(positions) => positions.contains(&position),
            Self::ExcludeByPosition(positions) => !positions.contains(&position),
        }
    }
}

fn split_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .flat_map(|entry| {
            entry
                .as_ref()
                .split(',')
                .map(|n| n.trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Options controlling ingestion behavior.
///
/// Use [`Default`] for common cases, struct-update syntax for a few tweaks, or
/// [`IngestionOptions::builder`] for caption mappings.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Field separator for delimited text.
    pub separator: char,
    /// Quote character for delimited text.
    pub quote: char,
    /// Explicit caption → field key entries.
    pub caption_mapping: CaptionMapping,
    /// Key derivation for captions without a mapping entry.
    pub caption_transform: CaptionTransform,
    pub tolerance: Tolerance,
    /// 0-based header row to start from.
    pub header_row: usize,
    /// Maximum number of rows probed for a header; `None` probes the whole sheet.
    pub header_probe_limit: Option<usize>,
    /// Drop rows where no bound cell has a value.
    pub ignore_empty_rows: bool,
    /// A bound cell equal to this value ends the current table.
    pub terminator: Option<Value>,
    /// Workbook sheets to read.
    pub sheet_selection: SheetSelection,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("separator", &self.separator)
            .field("quote", &self.quote)
            .field("caption_mapping", &self.caption_mapping)
            .field("caption_transform", &self.caption_transform)
            .field("tolerance", &self.tolerance)
            .field("header_row", &self.header_row)
            .field("header_probe_limit", &self.header_probe_limit)
            .field("ignore_empty_rows", &self.ignore_empty_rows)
            .field("terminator", &self.terminator)
            .field("sheet_selection", &self.sheet_selection)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            separator: ',',
            quote: '"',
            caption_mapping: CaptionMapping::default(),
            caption_transform: CaptionTransform::default(),
            tolerance: Tolerance::default(),
            header_row: 0,
            header_probe_limit: None,
            ignore_empty_rows: true,
            terminator: None,
            sheet_selection: SheetSelection::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl IngestionOptions {
    pub fn builder() -> IngestionOptionsBuilder {
        IngestionOptionsBuilder::default()
    }

    /// Tokenizer for the configured separator and quote.
    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new(self.separator, self.quote)
    }
}

/// Fluent construction of [`IngestionOptions`].
///
/// ```
/// use tabular_ingest::ingestion::IngestionOptions;
/// use tabular_ingest::tolerance::Tolerance;
///
/// let options = IngestionOptions::builder()
///     .map("姓").to("lastName")
///     .map("Street #").to("address.streetNo")
///     .header_row(1)
///     .terminator("END")
///     .tolerance(Tolerance::Tolerant)
///     .build();
/// assert_eq!(options.caption_mapping.get("street #"), Some("address.streetNo"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct IngestionOptionsBuilder {
    options: IngestionOptions,
}

/// Pending caption of [`IngestionOptionsBuilder::map`].
#[derive(Debug)]
pub struct CaptionMapper {
    builder: IngestionOptionsBuilder,
    caption: String,
}

impl CaptionMapper {
    /// Map the pending caption to `key`. A dotted key addresses a nested field.
    pub fn to(mut self, key: impl Into<String>) -> IngestionOptionsBuilder {
        self.builder.options.caption_mapping.insert(&self.caption, key);
        self.builder
    }
}

impl IngestionOptionsBuilder {
    pub fn map(self, caption: impl Into<String>) -> CaptionMapper {
        CaptionMapper {
            builder: self,
            caption: caption.into(),
        }
    }

    pub fn caption_mapping(mut self, mapping: CaptionMapping) -> Self {
        self.options.caption_mapping = mapping;
        self
    }

    pub fn transform(mut self, transform: CaptionTransform) -> Self {
        self.options.caption_transform = transform;
        self
    }

    /// Read only the listed captions, each under its transform-derived key, and switch to
    /// [`Tolerance::Tolerant`] so no other caption binds.
    pub fn read_columns<I, S>(mut self, captions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for caption in captions {
            let caption = caption.as_ref().trim();
            match self.options.caption_transform.apply(caption) {
                Some(key) => self.options.caption_mapping.insert(caption, key),
                None => tracing::debug!(caption, "no key derived for requested column"),
            }
        }
        self.options.tolerance = Tolerance::Tolerant;
        self
    }

    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.options.tolerance = tolerance;
        self
    }

    pub fn strict(self) -> Self {
        self.tolerance(Tolerance::Strict)
    }

    pub fn header_row(mut self, row: usize) -> Self {
        self.options.header_row = row;
        self
    }

    pub fn header_probe_limit(mut self, rows: usize) -> Self {
        self.options.header_probe_limit = Some(rows);
        self
    }

    pub fn ignore_empty_rows(mut self, ignore: bool) -> Self {
        self.options.ignore_empty_rows = ignore;
        self
    }

    pub fn terminator(mut self, value: impl Into<Value>) -> Self {
        self.options.terminator = Some(value.into());
        self
    }

    pub fn separator(mut self, separator: char) -> Self {
        self.options.separator = separator;
        self
    }

    pub fn quote(mut self, quote: char) -> Self {
        self.options.quote = quote;
        self
    }

    pub fn format(mut self, format: IngestionFormat) -> Self {
        self.options.format = Some(format);
        self
    }

    pub fn sheets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.options.sheet_selection = SheetSelection::by_name(names);
        self
    }

    pub fn exclude_sheets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.options.sheet_selection = SheetSelection::exclude_by_name(names);
        self
    }

    pub fn sheet_positions(mut self, positions: impl IntoIterator<Item = usize>) -> Self {
        self.options.sheet_selection = SheetSelection::ByPosition(positions.into_iter().collect());
        self
    }

    pub fn exclude_sheet_positions(mut self, positions: impl IntoIterator<Item = usize>) -> Self {
        self.options.sheet_selection = SheetSelection::ExcludeByPosition(positions.into_iter().collect());
        self
    }

    pub fn observer(mut self, observer: Arc<dyn IngestionObserver>) -> Self {
        self.options.observer = Some(observer);
        self
    }

    pub fn alert_at_or_above(mut self, severity: IngestionSeverity) -> Self {
        self.options.alert_at_or_above = severity;
        self
    }

    pub fn build(self) -> IngestionOptions {
        self.options
    }
}

/// Unified ingestion entry point for path-based sources.
///
/// - If `options.format` is `None`, format is inferred from the file extension.
/// - Use `options.sheet_selection` for workbook multi-sheet behavior.
///
/// When an observer is configured, this function reports:
///
/// - `on_diagnostic` for every recovered condition, then `on_success` with row/diagnostic counts
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ## Delimited text into dynamic records
///
/// ```no_run
/// use tabular_ingest::ingestion::{ingest_from_path, IngestionOptions};
/// use tabular_ingest::record::DynamicRecord;
///
/// # fn main() -> Result<(), tabular_ingest::IngestionError> {
/// let records: Vec<DynamicRecord> = ingest_from_path("countries.csv", &IngestionOptions::default())?;
/// println!("rows={}", records.len());
/// # Ok(())
/// # }
/// ```
///
/// ## Force a format explicitly (override extension inference)
///
/// ```no_run
/// use tabular_ingest::ingestion::{ingest_from_path, IngestionFormat, IngestionOptions};
/// use tabular_ingest::record::DynamicRecord;
///
/// # fn main() -> Result<(), tabular_ingest::IngestionError> {
/// let opts = IngestionOptions {
///     format: Some(IngestionFormat::Csv),
///     separator: '\t',
///     ..Default::default()
/// };
/// let records: Vec<DynamicRecord> = ingest_from_path("export_without_extension", &opts)?;
/// println!("rows={}", records.len());
/// # Ok(())
/// # }
/// ```
///
/// ## Observability (stderr logging + alert threshold)
///
/// ```no_run
/// use std::sync::Arc;
///
/// use tabular_ingest::ingestion::{
///     ingest_from_path, IngestionOptions, IngestionSeverity, StdErrObserver,
/// };
/// use tabular_ingest::record::DynamicRecord;
///
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(StdErrObserver::default())),
///     alert_at_or_above: IngestionSeverity::Critical,
///     ..Default::default()
/// };
///
/// // Missing files are treated as Critical and will trigger `on_alert` at this threshold.
/// let _err = ingest_from_path::<DynamicRecord>("does_not_exist.csv", &opts).unwrap_err();
/// ```
///
/// ## Excel (feature-gated)
///
/// To ingest workbooks, enable the `excel` feature in your `Cargo.toml`:
///
/// ```toml
/// tabular-ingest = { path = ".", features = ["excel"] }
/// ```
///
/// ```no_run
/// use tabular_ingest::ingestion::{ingest_from_path, IngestionOptions};
/// use tabular_ingest::record::DynamicRecord;
///
/// # fn main() -> Result<(), tabular_ingest::IngestionError> {
/// let opts = IngestionOptions::builder()
///     .sheets(["Students"])
///     .map("First Name").to("firstName")
///     .build();
/// let records: Vec<DynamicRecord> = ingest_from_path("workbook.xlsx", &opts)?;
/// println!("rows={}", records.len());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path<T: RecordTarget>(
    path: impl AsRef<Path>,
    options: &IngestionOptions,
) -> IngestionResult<Vec<T>> {
    ingest_from_path_with_report(path, options).map(Ingestion::into_records)
}

/// Like [`ingest_from_path`], also returning the [`crate::engine::IngestionReport`].
pub fn ingest_from_path_with_report<T: RecordTarget>(
    path: impl AsRef<Path>,
    options: &IngestionOptions,
) -> IngestionResult<Ingestion<T>> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let ctx = IngestionContext {
        path: path.to_path_buf(),
        format: fmt,
    };

    let result = match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path_with_report(path, options),
        IngestionFormat::Excel => ingest_excel_dispatch(path, options),
    };

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(ingestion) => {
                for diagnostic in &ingestion.report.diagnostics {
                    obs.on_diagnostic(&ctx, diagnostic);
                }
                obs.on_success(
                    &ctx,
                    IngestionStats {
                        rows: ingestion.records.len(),
                        diagnostics: ingestion.report.diagnostics.len(),
                    },
                );
            }
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) => IngestionSeverity::Critical,
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        #[cfg(feature = "excel")]
        IngestionError::Excel(calamine::Error::Io(_)) => IngestionSeverity::Critical,
        #[cfg(feature = "excel")]
        IngestionError::Excel(_) => IngestionSeverity::Error,
        IngestionError::UnsupportedFormat { .. } | IngestionError::Configuration { .. } => {
            IngestionSeverity::Error
        }
        IngestionError::SchemaResolution { .. }
        | IngestionError::HeaderLocation { .. }
        | IngestionError::Encoding { .. }
        | IngestionError::CellDecode { .. }
        | IngestionError::PropertyAssignment { .. } => IngestionSeverity::Error,
    }
}

fn infer_format_from_path(path: &Path) -> IngestionResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::UnsupportedFormat {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| IngestionError::UnsupportedFormat {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

fn ingest_excel_dispatch<T: RecordTarget>(
    path: &Path,
    options: &IngestionOptions,
) -> IngestionResult<Ingestion<T>> {
    #[cfg(feature = "excel")]
    {
        super::excel::ingest_excel_from_path_with_report(path, options)
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = (path, options);
        Err(IngestionError::UnsupportedFormat {
            message: "excel ingestion not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
