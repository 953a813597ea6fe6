//! # Run Configuration
//!
//! Sheet manifests, credentials and the database target. The binary fills these
//! from command-line flags and environment variables; library users build them
//! directly.
use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// One synchronization unit: which worksheet goes into which table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SheetSpec {
    /// Spreadsheet id, or path/URL of a workbook file
    #[serde(rename = "sheet_id")]
    pub source_id: String,
    /// Worksheet (tab) name inside the spreadsheet
    pub worksheet_name: String,
    /// Target table in the store
    pub table_name: String,
}

impl SheetSpec {
    pub fn new(source_id: impl Into<String>, worksheet_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        SheetSpec {
            source_id: source_id.into(),
            worksheet_name: worksheet_name.into(),
            table_name: table_name.into(),
        }
    }

    fn validate(self, entry: &str) -> Result<Self, ConfigError> {
        let blank = [
            ("sheet_id", &self.source_id),
            ("worksheet_name", &self.worksheet_name),
            ("table_name", &self.table_name),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());
        match blank {
            Some((field, _)) => Err(ConfigError::InvalidEntry {
                entry: entry.to_owned(),
                message: format!("{field} is blank"),
            }),
            None => Ok(SheetSpec {
                source_id: self.source_id.trim().to_owned(),
                worksheet_name: self.worksheet_name.trim().to_owned(),
                table_name: self.table_name.trim().to_owned(),
            }),
        }
    }
}

impl fmt::Display for SheetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] -> {}", self.source_id, self.worksheet_name, self.table_name)
    }
}

/// Parses the inline manifest form `id:worksheet:table[,id:worksheet:table...]`.
///
/// Items are split on their last two colons, so workbook URLs and drive paths
/// work as ids.
pub fn parse_inline_manifest(value: &str) -> Result<Vec<SheetSpec>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let parts: Vec<&str> = item.rsplitn(3, ':').collect();
            match parts.as_slice() {
                [table_name, worksheet_name, source_id] => {
                    SheetSpec::new(*source_id, *worksheet_name, *table_name).validate(item)
                }
                _ => Err(ConfigError::InvalidEntry {
                    entry: item.to_owned(),
                    message: "expected 'sheet_id:worksheet_name:table_name'".to_owned(),
                }),
            }
        })
        .collect()
}

/// Gathers the entries of a run: manifest file entries first, then inline ones.
pub fn collect_specs(manifest_file: Option<&Path>, inline: Option<&str>) -> Result<Vec<SheetSpec>, ConfigError> {
    let mut specs = Vec::new();
    if let Some(path) = manifest_file {
        specs.extend(read_manifest_file(path)?);
    }
    if let Some(inline) = inline {
        specs.extend(parse_inline_manifest(inline)?);
    }
    if specs.is_empty() {
        return Err(ConfigError::NoSheets);
    }
    Ok(specs)
}

/// Reads a CSV manifest with the header `sheet_id,worksheet_name,table_name`.
pub fn read_manifest_file(path: impl AsRef<Path>) -> Result<Vec<SheetSpec>, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| ConfigError::Manifest { path: display.to_owned(), source })?;
    read_manifest(reader, &display)
}

/// Reads a CSV manifest from any reader; `origin` names it in error messages.
pub fn read_manifest_from_reader<R: Read>(reader: R, origin: &str) -> Result<Vec<SheetSpec>, ConfigError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    read_manifest(reader, origin)
}

fn read_manifest<R: Read>(mut reader: csv::Reader<R>, origin: &str) -> Result<Vec<SheetSpec>, ConfigError> {
    let mut specs = Vec::new();
    for (index, record) in reader.deserialize::<SheetSpec>().enumerate() {
        let spec = record.map_err(|source| ConfigError::Manifest {
            path: origin.to_owned(),
            source,
        })?;
        // +2: 1-based, and the header is line 1
        specs.push(spec.validate(&format!("{origin}:{}", index + 2))?);
    }
    Ok(specs)
}

/// Credentials handed to the Google Sheets source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Credentials {
    /// Service-account JSON key file
    ServiceAccount(PathBuf),
    /// API key for publicly shared spreadsheets
    ApiKey(String),
    /// No credentials at all
    #[default]
    Anonymous,
}

/// Where the table store lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseTarget {
    InMemory,
    File(PathBuf),
}

impl DatabaseTarget {
    /// Accepts `:memory:`, `duckdb://<path>` or a plain file path.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let value = value.trim();
        let path = value.strip_prefix("duckdb://").unwrap_or(value);
        if path.is_empty() {
            Err(ConfigError::InvalidDatabase(value.to_owned()))
        } else if path == ":memory:" || path == "memory" {
            Ok(DatabaseTarget::InMemory)
        } else if path.contains("://") {
            // postgres://, mysql:// and friends are not DuckDB targets
            Err(ConfigError::InvalidDatabase(value.to_owned()))
        } else {
            Ok(DatabaseTarget::File(PathBuf::from(path)))
        }
    }
}

impl fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseTarget::InMemory => f.write_str(":memory:"),
            DatabaseTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}
