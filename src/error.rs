//! Error types for rowbridge-rs.
//!
//! Each stage of the execute pipeline has its own error enum. Driver and
//! conversion failures propagate unchanged into [`QueryError`]; failures of
//! the derived result accessors are reported as [`AccessError`].

use thiserror::Error;

use crate::types::SqlType;

/// Errors raised by a driver implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The database rejected the statement.
    #[error("SQL error: {message}")]
    Sql { message: String },

    /// The connection was lost mid-operation.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The statement handle was already closed.
    #[error("Statement is closed")]
    StatementClosed,

    /// A column position outside the cursor's column count was requested.
    #[error("Column {position} out of range (column count: {count})")]
    ColumnOutOfRange { position: usize, count: usize },

    /// A cell was read before the first row or after the last one.
    #[error("Cursor is not positioned on a row")]
    NoCurrentRow,

    /// The driver does not know how to prepare the statement text.
    #[error("Unknown statement: {0}")]
    UnknownStatement(String),
}

/// Errors converting driver cells into application values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// A cell could not be interpreted as the column's declared type.
    #[error("Invalid value in column {column} (type {type_code}): {message}")]
    InvalidValue {
        column: usize,
        type_code: SqlType,
        message: String,
    },

    /// The type code has no mapping for the requested target.
    #[error("Unsupported type: {type_code}")]
    UnsupportedType { type_code: SqlType },

    /// Building Arrow arrays failed.
    #[error("Arrow error: {0}")]
    ArrowError(String),
}

/// Errors returned by query execution.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Driver failure while preparing, describing or fetching.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A cell could not be converted.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The vendor type resolver failed for a column.
    #[error("Type resolution failed for column '{column}': {message}")]
    TypeResolution { column: String, message: String },
}

/// Out-of-range access on a materialized result.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// Row index passed to a cell accessor is out of range.
    #[error("invalid tuple number {0}")]
    InvalidTuple(usize),

    /// Column index passed to a cell accessor is out of range.
    #[error("invalid field number {0}")]
    InvalidField(usize),

    /// Row index passed to a keyed-row accessor is out of range.
    #[error("Index {0} is out of range")]
    OutOfRange(usize),
}

/// Errors parsing a session configuration string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A pair was not of the form `key=value`.
    #[error("Malformed option '{0}' (expected key=value)")]
    Malformed(String),

    /// The option name is not recognized.
    #[error("Unknown option '{0}'")]
    UnknownOption(String),

    /// The option value could not be parsed.
    #[error("Invalid value '{value}' for option '{key}'")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_error_messages_name_the_index() {
        assert_eq!(AccessError::InvalidTuple(2).to_string(), "invalid tuple number 2");
        assert_eq!(AccessError::InvalidField(7).to_string(), "invalid field number 7");
        assert_eq!(AccessError::OutOfRange(3).to_string(), "Index 3 is out of range");
    }

    #[test]
    fn test_driver_error_converts_into_query_error() {
        let err: QueryError = DriverError::ConnectionLost("reset by peer".to_string()).into();
        assert!(matches!(err, QueryError::Driver(DriverError::ConnectionLost(_))));
        assert_eq!(err.to_string(), "Connection lost: reset by peer");
    }

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError::InvalidValue {
            column: 1,
            type_code: SqlType::INTEGER,
            message: "not a number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value in column 1 (type INTEGER): not a number"
        );
    }
}
