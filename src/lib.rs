//! # Sheet Sync
//!
//! Replicates worksheets into relational tables. Each configured entry names a
//! spreadsheet, one of its worksheets and a target table; a run reads the
//! worksheet, turns its header row into column names and replaces the table's
//! contents with the remaining rows.
//!
//! ## Pipeline
//!
//! - **Fetch**: a [`SheetSource`] returns the worksheet as a grid of strings.
//!   Google Sheets and `.xlsx`/`.xlsm` workbooks (local or remote) are supported.
//! - **Normalize**: [`normalize`] maps header cells to unique SQL-safe names.
//! - **Reconcile**: [`reconcile`] creates or redefines the target table so its
//!   columns are exactly the normalized names, all text.
//! - **Load**: [`load`] deletes the old rows and inserts the new ones in one
//!   transaction.
//!
//! Every value is stored as text; no type inference is attempted. A failed entry
//! leaves its table untouched.
//!
//! ## Example
//!
//! ```no_run
//! use sheet_sync::{DuckDbStore, OnError, SheetSpec, Synchronizer, WorkbookSource};
//!
//! let store = DuckDbStore::open_in_memory()?;
//! let synchronizer = Synchronizer::new(WorkbookSource, store);
//! let report = synchronizer.run(&[SheetSpec::new("budget.xlsx", "Q1", "budget_q1")], OnError::Abort);
//! assert!(report.is_success());
//! # Ok::<(), sheet_sync::error::StoreError>(())
//! ```

pub mod config;
pub mod database;
pub mod error;
mod helpers;
pub mod spreadsheet;
pub mod sync;

pub use crate::config::Credentials;
pub use crate::config::DatabaseTarget;
pub use crate::config::SheetSpec;
pub use crate::database::store::DuckDbStore;
pub use crate::database::TableStore;
pub use crate::spreadsheet::google::GoogleSheetsSource;
pub use crate::spreadsheet::xlsx::WorkbookSource;
pub use crate::spreadsheet::SheetSource;
pub use crate::spreadsheet::SourceRouter;
pub use crate::sync::load::load;
pub use crate::sync::normalize::normalize;
pub use crate::sync::reconcile::reconcile;
pub use crate::sync::OnError;
pub use crate::sync::SyncReport;
pub use crate::sync::Synchronizer;
