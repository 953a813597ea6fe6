//! # Table Store
//!
//! The relational side of a sync: column descriptions, table handles and the
//! [`TableStore`] seam with its DuckDB implementation.
use crate::database::column::Column;
use crate::error::StoreError;

pub mod column;
pub mod store;
pub mod table;

pub type Row = Vec<String>;

/// Relational store that synchronized tables are written to.
///
/// Implementations acquire whatever connection they need inside each call and
/// release it before returning, on success and on error.
pub trait TableStore {
    /// Returns true if a table called `name` exists.
    fn table_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Returns the columns of an existing table in definition order.
    fn table_columns(&self, name: &str) -> Result<Vec<Column>, StoreError>;

    /// Creates a new table with the given columns.
    fn create_table(&self, name: &str, columns: &[Column]) -> Result<(), StoreError>;

    /// Replaces the existing table `name` with one holding exactly `columns`
    /// and `rows`. The table is redefined first if its columns differ.
    ///
    /// Redefinition, delete and inserts commit together: on error the table
    /// keeps its previous columns and rows. Every row must have exactly
    /// `columns.len()` cells.
    fn replace_table(&self, name: &str, columns: &[Column], rows: &[Row]) -> Result<usize, StoreError>;

    /// Reads all rows of `name`, projected onto `columns`, in insertion order.
    /// NULL cells read as empty strings.
    fn read_contents(&self, name: &str, columns: &[Column]) -> Result<Vec<Row>, StoreError>;
}

impl<T: TableStore + ?Sized> TableStore for &T {
    fn table_exists(&self, name: &str) -> Result<bool, StoreError> {
        (**self).table_exists(name)
    }

    fn table_columns(&self, name: &str) -> Result<Vec<Column>, StoreError> {
        (**self).table_columns(name)
    }

    fn create_table(&self, name: &str, columns: &[Column]) -> Result<(), StoreError> {
        (**self).create_table(name, columns)
    }

    fn replace_table(&self, name: &str, columns: &[Column], rows: &[Row]) -> Result<usize, StoreError> {
        (**self).replace_table(name, columns, rows)
    }

    fn read_contents(&self, name: &str, columns: &[Column]) -> Result<Vec<Row>, StoreError> {
        (**self).read_contents(name, columns)
    }
}
