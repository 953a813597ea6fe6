use crate::database::column::same_text_columns;
use crate::database::column::text_columns;
use crate::database::table::TableHandle;
use crate::database::TableStore;
use crate::error::SchemaError;
use crate::sync::normalize::is_valid_identifier;
use log::debug;
use log::info;
use std::collections::HashSet;

/// Makes `table_name` exist in `store` for the columns of `schema`, all text.
///
/// Absent tables are created. A present table with other columns is left as it
/// is here: [`load`](crate::sync::load::load) redefines it in the same
/// transaction that replaces its rows, so a failed load keeps the old table.
/// Invalid names are rejected before the store is touched.
pub fn reconcile<T: TableStore + ?Sized, S: AsRef<str>>(
    store: &T,
    table_name: &str,
    schema: &[S],
) -> Result<TableHandle, SchemaError> {
    let handle = TableHandle::new(table_name)?;
    if schema.is_empty() {
        return Err(SchemaError::Rejected {
            table: table_name.to_owned(),
            message: "schema has no columns".to_owned(),
        });
    }
    if let Some(column) = schema.iter().map(|name| name.as_ref()).find(|name: &&str| !is_valid_identifier(name)) {
        return Err(SchemaError::InvalidIdentifier {
            table: table_name.to_owned(),
            identifier: column.to_owned(),
            message: "column names must match [A-Za-z][A-Za-z0-9_]*".to_owned(),
        });
    }
    let mut seen = HashSet::new();
    if let Some(column) = schema.iter().map(|name| name.as_ref()).find(|name: &&str| !seen.insert(name.to_ascii_lowercase())) {
        return Err(SchemaError::InvalidIdentifier {
            table: table_name.to_owned(),
            identifier: column.to_owned(),
            message: "column names must differ regardless of case".to_owned(),
        });
    }

    let columns = text_columns(schema);
    let store_error = |error| SchemaError::from_store(table_name, error);
    if !store.table_exists(table_name).map_err(store_error)? {
        store.create_table(table_name, &columns).map_err(store_error)?;
        info!("Created table '{table_name}' with {} columns", columns.len());
        return Ok(handle);
    }

    let existing = store.table_columns(table_name).map_err(store_error)?;
    if same_text_columns(&existing, &columns) {
        debug!("Table '{table_name}' already matches its schema");
    } else {
        info!(
            "Table '{table_name}' will be redefined on load: {} -> {} columns",
            existing.len(),
            columns.len()
        );
    }
    Ok(handle)
}
