use crate::error::SchemaError;
use regex::Regex;
use std::sync::LazyLock;

static TABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Hardcode regex pattern"));

/// Longest table name accepted.
pub const MAX_TABLE_NAME_LENGTH: usize = 63;

/// Addresses a reconciled table in the store. Carries no schema and no connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableHandle {
    name: String,
}

impl TableHandle {
    /// Validates `name` and wraps it in a handle.
    pub fn new(name: &str) -> Result<Self, SchemaError> {
        validate_table_name(name)?;
        Ok(TableHandle { name: name.to_owned() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Rejects table names that cannot be used as a plain SQL identifier.
pub fn validate_table_name(name: &str) -> Result<(), SchemaError> {
    let invalid = |message: &str| SchemaError::InvalidIdentifier {
        table: name.to_owned(),
        identifier: name.to_owned(),
        message: message.to_owned(),
    };
    if name.len() > MAX_TABLE_NAME_LENGTH {
        Err(invalid("longer than 63 characters"))
    } else if !TABLE_NAME.is_match(name) {
        Err(invalid("only letters, digits and underscore are allowed and it must not start with a digit"))
    } else {
        Ok(())
    }
}

/// Double-quotes an identifier for use in SQL text.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
