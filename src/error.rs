use crate::config::SheetSpec;
use thiserror::Error;

/// Failure while reading a worksheet from a sheet source.
/// Never carries partial data: the whole fetch is discarded.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Cannot reach sheet source '{source_id}': {message}")]
    Unreachable { source_id: String, message: String },

    #[error("Access to '{source_id}' denied: {message}")]
    Unauthorized { source_id: String, message: String },

    #[error("Worksheet '{worksheet}' not found in '{source_id}'")]
    NotFound { source_id: String, worksheet: String },

    #[error("Rate limited while reading '{source_id}'")]
    RateLimited { source_id: String },

    #[error("Worksheet '{worksheet}' in '{source_id}' has no rows")]
    EmptyWorksheet { source_id: String, worksheet: String },

    #[error("Malformed data from '{source_id}': {message}")]
    Malformed { source_id: String, message: String },
}

/// Classification of a table store failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StoreErrorKind {
    Unreachable,
    PermissionDenied,
    InvalidIdentifier,
    Constraint,
    Other,
}

/// Raw failure reported by a table store, before table context is attached.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        StoreError {
            kind,
            message: message.into(),
        }
    }
}

impl From<duckdb::Error> for StoreError {
    /// DuckDB reports most failures through one error variant, so the kind is
    /// recovered from the message prefix DuckDB puts on every exception.
    fn from(error: duckdb::Error) -> Self {
        let message = error.to_string();
        let lower = message.to_ascii_lowercase();
        let kind = if lower.contains("permission denied") || lower.contains("read-only") {
            StoreErrorKind::PermissionDenied
        } else if lower.starts_with("io error") || lower.contains("could not set lock") || lower.contains("cannot open") {
            StoreErrorKind::Unreachable
        } else if lower.starts_with("parser error")
            || lower.starts_with("catalog error")
            || lower.starts_with("binder error") {
            StoreErrorKind::InvalidIdentifier
        } else if lower.starts_with("constraint error") {
            StoreErrorKind::Constraint
        } else {
            StoreErrorKind::Other
        };
        StoreError { kind, message }
    }
}

/// Failure while making the target table match a normalized schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Cannot reach table store while preparing '{table}': {message}")]
    Unreachable { table: String, message: String },

    #[error("Permission denied on table '{table}': {message}")]
    PermissionDenied { table: String, message: String },

    #[error("Invalid identifier '{identifier}' for table '{table}': {message}")]
    InvalidIdentifier {
        table: String,
        identifier: String,
        message: String,
    },

    /// The store refused a name in the definition of `table` without saying which.
    #[error("Table store rejected an identifier of table '{table}': {message}")]
    IdentifierRejected { table: String, message: String },

    #[error("Cannot define table '{table}': {message}")]
    Rejected { table: String, message: String },
}

impl SchemaError {
    pub(crate) fn from_store(table: &str, error: StoreError) -> Self {
        let table = table.to_owned();
        let message = error.message;
        match error.kind {
            StoreErrorKind::Unreachable => SchemaError::Unreachable { table, message },
            StoreErrorKind::PermissionDenied => SchemaError::PermissionDenied { table, message },
            StoreErrorKind::InvalidIdentifier => SchemaError::IdentifierRejected { table, message },
            StoreErrorKind::Constraint | StoreErrorKind::Other => SchemaError::Rejected { table, message },
        }
    }
}

/// Failure while replacing the contents of a target table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot reach table store while loading '{table}': {message}")]
    Unreachable { table: String, message: String },

    #[error("Constraint violated while loading '{table}': {message}")]
    Constraint { table: String, message: String },

    #[error("Write to '{table}' failed: {message}")]
    Write { table: String, message: String },
}

impl LoadError {
    pub(crate) fn from_store(table: &str, error: StoreError) -> Self {
        let table = table.to_owned();
        let message = error.message;
        match error.kind {
            StoreErrorKind::Unreachable => LoadError::Unreachable { table, message },
            StoreErrorKind::Constraint => LoadError::Constraint { table, message },
            _ => LoadError::Write { table, message },
        }
    }
}

/// Invalid or incomplete run configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No sheets to load: set SHEETS_TO_LOAD_FILE or SHEETS_TO_LOAD")]
    NoSheets,

    #[error("Invalid sheet entry '{entry}': {message}")]
    InvalidEntry { entry: String, message: String },

    #[error("Cannot read manifest '{path}': {source}")]
    Manifest { path: String, source: csv::Error },

    #[error("Invalid database target '{0}'")]
    InvalidDatabase(String),

    #[error("Cannot load credentials from '{path}': {message}")]
    Credentials { path: String, message: String },

    #[error("Invalid Sheets API URL '{url}': {message}")]
    InvalidApiUrl { url: String, message: String },

    #[error("Cannot start HTTP runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Low-level failure while reading a workbook archive.
#[derive(Error, Debug)]
pub(crate) enum WorkbookError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("Read remote file failed: {0}")]
    Remote(#[from] duckdb::Error),

    #[error("No data from remote file '{0}'")]
    RemoteEmpty(String),

    #[error("Missing part '{0}'")]
    MissingPart(String),

    #[error("Unknown XML entity '{0}'")]
    UnknownEntity(String),

    #[error("Invalid attribute value '{0}'")]
    AttributeValue(String),

    #[error("Shared string {0} out of range")]
    SharedStringOutOfRange(usize),

    #[error("Worksheet not found")]
    WorksheetNotFound,
}

impl WorkbookError {
    /// Attaches the workbook and worksheet the failure happened in.
    pub(crate) fn into_fetch_error(self, source_id: &str, worksheet: &str) -> FetchError {
        let source_id = source_id.to_owned();
        match self {
            WorkbookError::WorksheetNotFound => FetchError::NotFound {
                source_id,
                worksheet: worksheet.to_owned(),
            },
            WorkbookError::Io(error) if error.kind() == std::io::ErrorKind::PermissionDenied => {
                FetchError::Unauthorized {
                    source_id,
                    message: error.to_string(),
                }
            }
            WorkbookError::Io(error) => FetchError::Unreachable {
                source_id,
                message: error.to_string(),
            },
            error @ (WorkbookError::Remote(_) | WorkbookError::RemoteEmpty(_)) => FetchError::Unreachable {
                source_id,
                message: error.to_string(),
            },
            error => FetchError::Malformed {
                source_id,
                message: error.to_string(),
            },
        }
    }
}

/// Stage-specific failure of one pipeline pass.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// A sheet entry whose pipeline pass failed.
#[derive(Error, Debug)]
#[error("{spec}: {error}")]
pub struct SyncError {
    pub spec: SheetSpec,
    #[source]
    pub error: StageError,
}
