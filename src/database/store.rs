//! DuckDB-backed [`TableStore`].

use crate::config::DatabaseTarget;
use crate::database::column::same_text_columns;
use crate::database::column::Column;
use crate::database::column::ColumnType;
use crate::database::table::quote_identifier;
use crate::database::Row;
use crate::database::TableStore;
use crate::error::StoreError;
use crate::error::StoreErrorKind;
use duckdb::appender_params_from_iter;
use duckdb::Connection;
use log::debug;

/// Table store on a DuckDB database.
///
/// The database is opened once; every operation works on its own cloned
/// connection, which is closed when the operation returns.
pub struct DuckDbStore {
    database: Connection,
}

impl DuckDbStore {
    /// Opens (or creates) the database described by `target`.
    pub fn open(target: &DatabaseTarget) -> Result<DuckDbStore, StoreError> {
        let database = match target {
            DatabaseTarget::InMemory => Connection::open_in_memory()?,
            DatabaseTarget::File(path) => Connection::open(path)?,
        };
        Ok(DuckDbStore { database })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<DuckDbStore, StoreError> {
        Self::open(&DatabaseTarget::InMemory)
    }

    /// Closes the database handle, reporting any error DuckDB raises on shutdown.
    pub fn close(self) -> Result<(), StoreError> {
        self.database.close().map_err(|(_, error)| StoreError::from(error))
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        self.database
            .try_clone()
            .map_err(|error| StoreError::new(StoreErrorKind::Unreachable, error.to_string()))
    }
}

impl TableStore for DuckDbStore {
    fn table_exists(&self, name: &str) -> Result<bool, StoreError> {
        let connection = self.connect()?;
        let count: i64 = connection.query_row(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_catalog = current_database() AND table_schema = current_schema() AND table_type = 'BASE TABLE' AND lower(table_name) = lower(?)",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn table_columns(&self, name: &str) -> Result<Vec<Column>, StoreError> {
        let connection = self.connect()?;
        load_columns(&connection, name)
    }

    fn create_table(&self, name: &str, columns: &[Column]) -> Result<(), StoreError> {
        let sql = create_table_sql(name, columns)?;
        debug!("{sql}");
        let connection = self.connect()?;
        connection.execute_batch(&sql)?;
        Ok(())
    }

    fn replace_table(&self, name: &str, columns: &[Column], rows: &[Row]) -> Result<usize, StoreError> {
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != columns.len()) {
            return Err(StoreError::new(
                StoreErrorKind::Constraint,
                format!("row {index} has {} cells, table '{name}' has {} columns", row.len(), columns.len()),
            ));
        }

        let mut connection = self.connect()?;
        let transaction = connection.transaction()?;
        let existing = load_columns(&transaction, name)?;
        if existing.is_empty() {
            return Err(StoreError::new(
                StoreErrorKind::Other,
                format!("table '{name}' does not exist"),
            ));
        }
        let table = quote_identifier(name);
        if same_text_columns(&existing, columns) {
            transaction.execute_batch(&format!("DELETE FROM {table};"))?;
        } else {
            let sql = format!("DROP TABLE {table};\n{}", create_table_sql(name, columns)?);
            debug!("{sql}");
            transaction.execute_batch(&sql)?;
        }
        {
            let mut appender = transaction.appender(name)?;
            for row in rows {
                appender.append_row(appender_params_from_iter(row))?;
            }
            appender.flush()?;
        }
        transaction.commit()?;
        debug!("Replaced contents of '{name}' with {} rows", rows.len());
        Ok(rows.len())
    }

    fn read_contents(&self, name: &str, columns: &[Column]) -> Result<Vec<Row>, StoreError> {
        let projection = columns
            .iter()
            .map(|column| quote_identifier(&column.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {projection} FROM {} ORDER BY rowid", quote_identifier(name));
        let width = columns.len();

        let connection = self.connect()?;
        let mut statement = connection.prepare(&sql)?;
        let rows = statement
            .query_map([], |row| {
                (0..width)
                    .map(|index| Ok(row.get::<_, Option<String>>(index)?.unwrap_or_default()))
                    .collect::<duckdb::Result<Row>>()
            })?
            .collect::<duckdb::Result<Vec<Row>>>()?;
        Ok(rows)
    }
}

fn load_columns(connection: &Connection, name: &str) -> Result<Vec<Column>, StoreError> {
    let mut statement = connection.prepare(
        "SELECT column_name, data_type FROM information_schema.columns \
         WHERE table_catalog = current_database() AND table_schema = current_schema() \
         AND lower(table_name) = lower(?) \
         ORDER BY ordinal_position",
    )?;
    let columns = statement
        .query_map([name], |row| {
            Ok(Column {
                name: row.get(0)?,
                kind: ColumnType::parse(&row.get::<_, String>(1)?),
            })
        })?
        .collect::<duckdb::Result<Vec<Column>>>()?;
    Ok(columns)
}

fn create_table_sql(name: &str, columns: &[Column]) -> Result<String, StoreError> {
    if columns.is_empty() {
        return Err(StoreError::new(
            StoreErrorKind::InvalidIdentifier,
            format!("table '{name}' needs at least one column"),
        ));
    }
    let definitions = columns
        .iter()
        .map(|column| format!("{} {}", quote_identifier(&column.name), column.kind))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("CREATE TABLE {} ({definitions});", quote_identifier(name)))
}
