use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// This is a single error enum shared by the text and spreadsheet paths. Every variant that
/// describes a problem with the input carries enough context (sheet, 1-based row and column) to
/// locate the offending cell.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook decoding error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Delimited-text writer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The input format could not be determined or is not enabled.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// An option value cannot be used (e.g. a non-ASCII separator for the writer).
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// No usable caption-to-field mapping could be resolved for the target record.
    #[error("schema resolution failed: {message}")]
    SchemaResolution { message: String },

    /// The configured or probed header row cannot be used.
    #[error("header location failed in sheet '{sheet}': {message}")]
    HeaderLocation {
        sheet: String,
        row: Option<usize>,
        message: String,
    },

    /// A text line is not valid UTF-8.
    #[error("invalid text encoding in sheet '{sheet}' row {row}: {message}")]
    Encoding {
        sheet: String,
        row: usize,
        message: String,
    },

    /// A cell could not be decoded into a value.
    #[error("failed to decode cell at sheet '{sheet}' row {row} column {column}: {message}")]
    CellDecode {
        sheet: String,
        row: usize,
        column: usize,
        message: String,
    },

    /// A decoded value could not be assigned to the target record.
    #[error(
        "failed to assign value '{value}' to field '{field}' at sheet '{sheet}' row {row} column {column}: {source}"
    )]
    PropertyAssignment {
        sheet: String,
        row: usize,
        column: usize,
        field: String,
        value: String,
        #[source]
        source: AssignError,
    },
}

/// Failure raised by a setter while assigning a value into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    /// The value kind cannot be used for the field at all.
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: String },

    /// The value has the right kind but its content does not convert.
    #[error("cannot convert '{value}': {message}")]
    Conversion { value: String, message: String },

    /// The record has no assignable field with this key.
    #[error("no assignable field '{key}'")]
    UnknownField { key: String },

    /// An intermediate segment of a nested path cannot be walked.
    #[error("cannot walk nested path '{path}'")]
    UnknownPath { path: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_decode_display_carries_location() {
        let err = IngestionError::CellDecode {
            sheet: "Sheet1".to_string(),
            row: 3,
            column: 2,
            message: "error cell value encountered".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to decode cell at sheet 'Sheet1' row 3 column 2: error cell value encountered"
        );
    }

    #[test]
    fn property_assignment_exposes_source() {
        let err = IngestionError::PropertyAssignment {
            sheet: "csv".to_string(),
            row: 2,
            column: 1,
            field: "no".to_string(),
            value: "ten".to_string(),
            source: AssignError::Conversion {
                value: "ten".to_string(),
                message: "invalid digit found in string".to_string(),
            },
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("cannot convert 'ten': invalid digit found in string")
        );
        assert!(err.to_string().contains("field 'no'"));
    }
}
