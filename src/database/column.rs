use std::fmt;

/// Column data types as reported by the table store.
///
/// Synchronized tables only ever use [`ColumnType::Varchar`]; the other variants
/// describe tables that were created or altered outside this tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Boolean values (true/false)
    Boolean,
    /// 64-bit signed integers
    BigInt,
    /// Double-precision floating point numbers
    Double,
    /// Variable-length strings
    Varchar,
    /// Date and time with microsecond precision
    Timestamp,
    /// Date without time component
    Date,
    /// Time without date component
    Time,
    /// Anything else, kept verbatim
    Other(String),
}

/// A named, typed column of a target table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    /// Normalized column name
    pub name: String,
    /// Column data type
    pub kind: ColumnType,
}

impl ColumnType {
    /// Returns the SQL spelling of the column type.
    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Date => "DATE",
            ColumnType::Time => "TIME",
            ColumnType::Other(name) => name.as_str(),
        }
    }

    /// Parses a column type from a store type name.
    /// Supports the usual aliases for each type.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "BOOL" | "BOOLEAN" => ColumnType::Boolean,
            "INT8" | "BIGINT" | "LONG" => ColumnType::BigInt,
            "FLOAT8" | "DOUBLE" => ColumnType::Double,
            "TEXT" | "STRING" | "VARCHAR" | "BPCHAR" | "CHAR" => ColumnType::Varchar,
            "DATETIME" | "TIMESTAMP" => ColumnType::Timestamp,
            "DATE" => ColumnType::Date,
            "TIME" => ColumnType::Time,
            other => ColumnType::Other(other.to_owned()),
        }
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, ColumnType::Varchar)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Column {
    /// A text column, the only kind synchronized tables contain.
    pub fn text(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            kind: ColumnType::Varchar,
        }
    }
}

/// Builds the all-text column list for a normalized schema.
pub fn text_columns<S: AsRef<str>>(names: &[S]) -> Vec<Column> {
    names
        .iter()
        .map(|name| {
            let name: &str = name.as_ref();
            Column::text(name)
        })
        .collect()
}

/// True if `existing` has exactly the names of `wanted`, in order, all typed as text.
pub fn same_text_columns(existing: &[Column], wanted: &[Column]) -> bool {
    existing.len() == wanted.len()
        && existing
            .iter()
            .zip(wanted)
            .all(|(left, right)| left.kind.is_text() && left.name == right.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_type() {
        assert_eq!(ColumnType::parse("varchar"), ColumnType::Varchar);
        assert_eq!(ColumnType::parse("TEXT"), ColumnType::Varchar);
        assert_eq!(ColumnType::parse("BIGINT"), ColumnType::BigInt);
        assert_eq!(ColumnType::parse("DECIMAL(18,3)"), ColumnType::Other("DECIMAL(18,3)".to_owned()));
        assert_eq!(ColumnType::parse("decimal(18,3)").as_str(), "DECIMAL(18,3)");
    }

    #[test]
    fn test_same_text_columns() {
        let wanted = text_columns(&["a", "b"]);
        assert!(same_text_columns(&text_columns(&["a", "b"]), &wanted));
        assert!(!same_text_columns(&text_columns(&["b", "a"]), &wanted));
        assert!(!same_text_columns(&text_columns(&["a"]), &wanted));
        let typed = vec![Column::text("a"), Column { name: "b".to_owned(), kind: ColumnType::BigInt }];
        assert!(!same_text_columns(&typed, &wanted));
    }
}
