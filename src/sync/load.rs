use crate::database::column::text_columns;
use crate::database::table::TableHandle;
use crate::database::Row;
use crate::database::TableStore;
use crate::error::LoadError;
use log::info;

/// Replaces the whole contents of `table` with `rows` and returns the row count.
///
/// Rows are first fitted to the schema width: short rows are padded with empty
/// cells, long rows lose their trailing cells. If the table's columns differ from
/// `schema` it is redefined in the same store transaction as the delete and the
/// inserts, so a failed load leaves the old columns and rows in place.
pub fn load<T: TableStore + ?Sized, S: AsRef<str>>(
    store: &T,
    table: &TableHandle,
    schema: &[S],
    rows: Vec<Row>,
) -> Result<usize, LoadError> {
    let columns = text_columns(schema);
    let rows = fit_rows(rows, columns.len());
    let count = store
        .replace_table(table.name(), &columns, &rows)
        .map_err(|error| LoadError::from_store(table.name(), error))?;
    info!("Loaded {count} rows into '{}'", table.name());
    Ok(count)
}

/// Pads or truncates every row to exactly `width` cells.
pub fn fit_rows(mut rows: Vec<Row>, width: usize) -> Vec<Row> {
    for row in rows.iter_mut() {
        row.resize(width, String::new());
    }
    rows
}
