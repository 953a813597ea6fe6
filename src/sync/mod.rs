//! # Synchronization Pipeline
//!
//! One pass per sheet entry: fetch the worksheet, normalize its header row,
//! reconcile the target table's schema, then replace the table's contents.
//!
//! A pass either completes or leaves the target table with its previous rows.
//! Entries are processed in order, one at a time.
use crate::config::SheetSpec;
use crate::database::Row;
use crate::database::TableStore;
use crate::error::FetchError;
use crate::error::StageError;
use crate::error::SyncError;
use crate::spreadsheet::RawTable;
use crate::spreadsheet::SheetSource;
use crate::sync::load::load;
use crate::sync::normalize::normalize;
use crate::sync::reconcile::reconcile;
use log::error;
use log::info;
use log::warn;

pub mod load;
pub mod normalize;
pub mod reconcile;

/// What to do with the remaining entries once one of them fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OnError {
    /// Stop at the first failure
    #[default]
    Abort,
    /// Record the failure and carry on with the next entry
    Continue,
}

/// Result of a successful pass over one sheet entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetOutcome {
    pub spec: SheetSpec,
    /// Normalized column names of the target table
    pub columns: Vec<String>,
    /// Number of data rows written
    pub rows: usize,
}

/// Outcome of a whole run, in entry order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub loaded: Vec<SheetOutcome>,
    pub failed: Vec<SyncError>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives sheet entries from a [`SheetSource`] into a [`TableStore`].
pub struct Synchronizer<S: SheetSource, T: TableStore> {
    source: S,
    store: T,
}

impl<S: SheetSource, T: TableStore> Synchronizer<S, T> {
    pub fn new(source: S, store: T) -> Self {
        Synchronizer { source, store }
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    pub fn into_parts(self) -> (S, T) {
        (self.source, self.store)
    }

    /// Runs the full pipeline for one entry.
    pub fn sync_sheet(&self, spec: &SheetSpec) -> Result<SheetOutcome, SyncError> {
        let fail = |error: StageError| SyncError {
            spec: spec.to_owned(),
            error,
        };

        let raw = self
            .source
            .fetch(&spec.source_id, &spec.worksheet_name)
            .map_err(|error| fail(error.into()))?;
        if raw.is_empty() {
            return Err(fail(StageError::Fetch(FetchError::EmptyWorksheet {
                source_id: spec.source_id.to_owned(),
                worksheet: spec.worksheet_name.to_owned(),
            })));
        }

        let (headers, body) = split_header(raw);
        let columns = normalize(&headers);
        let table = reconcile(&self.store, &spec.table_name, &columns).map_err(|error| fail(error.into()))?;
        let rows = load(&self.store, &table, &columns, body).map_err(|error| fail(error.into()))?;

        info!("Synchronized {spec}: {rows} rows, {} columns", columns.len());
        Ok(SheetOutcome {
            spec: spec.to_owned(),
            columns,
            rows,
        })
    }

    /// Runs every entry in order. With [`OnError::Abort`] the first failure
    /// ends the run and later entries are not attempted.
    pub fn run(&self, specs: &[SheetSpec], on_error: OnError) -> SyncReport {
        let mut report = SyncReport::default();
        for spec in specs {
            match self.sync_sheet(spec) {
                Ok(outcome) => report.loaded.push(outcome),
                Err(error) if on_error == OnError::Continue => {
                    warn!("{error}");
                    report.failed.push(error);
                }
                Err(error) => {
                    error!("{error}");
                    report.failed.push(error);
                    break;
                }
            }
        }
        info!(
            "Run finished: {} loaded, {} failed, {} skipped",
            report.loaded.len(),
            report.failed.len(),
            specs.len() - report.loaded.len() - report.failed.len()
        );
        report
    }
}

/// Splits off the header row. The header is padded with empty names up to the
/// widest row so no data column is dropped.
pub fn split_header(raw: RawTable) -> (Vec<String>, Vec<Row>) {
    let width = raw.iter().map(Vec::len).max().unwrap_or(0);
    let mut rows = raw.into_iter();
    let mut headers = rows.next().unwrap_or_default();
    headers.resize(width, String::new());
    (headers, rows.collect())
}
