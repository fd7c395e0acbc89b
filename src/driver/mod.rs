//! Driver-side interfaces.
//!
//! These traits are the seam to the database driver that actually prepares
//! and executes statements. The crate only ever reads through them:
//!
//! - [`Driver`] - prepares statement text into a [`PreparedHandle`]
//! - [`PreparedHandle`] - executes with bound values and must be released with `close`
//! - [`ResultCursor`] - a forward-only cursor with column descriptors and native cells
//!
//! [`memory`] holds an in-memory implementation used by tests and benchmarks.

pub mod memory;

use crate::error::DriverError;
use crate::types::{SqlType, Value};

pub use memory::{DriverStats, MemoryCursor, MemoryDriver, MemoryStatement, MemoryTable};

/// Descriptor of one result column as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column label (alias if present, otherwise the column name).
    pub label: String,
    /// Driver type code.
    pub type_code: SqlType,
    /// Vendor type name, e.g. `numeric` or `int4`.
    pub type_name: String,
    /// Reported precision; 0 when the column has none.
    pub precision: i32,
    /// Reported scale; 0 when the column has none.
    pub scale: i32,
}

impl ColumnDescriptor {
    pub fn new(label: impl Into<String>, type_code: SqlType, type_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            type_code,
            type_name: type_name.into(),
            precision: 0,
            scale: 0,
        }
    }

    #[must_use]
    pub fn with_precision_scale(mut self, precision: i32, scale: i32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }
}

/// A driver-native cell value, before conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Cell {
    /// Short name of the cell's shape, for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Bool(_) => "bool",
            Cell::Int(_) => "int",
            Cell::Double(_) => "double",
            Cell::Text(_) => "text",
            Cell::Bytes(_) => "bytes",
        }
    }
}

/// A forward-only result cursor.
///
/// Cursors are not rewindable; the crate walks each one exactly once.
pub trait ResultCursor {
    /// Column descriptors in driver order.
    ///
    /// This is the expensive metadata round trip that cached statements skip.
    fn columns(&self) -> Result<Vec<ColumnDescriptor>, DriverError>;

    /// Advance to the next row. Returns `false` once the cursor is exhausted.
    fn next_row(&mut self) -> Result<bool, DriverError>;

    /// Read the cell at 0-based `position` of the current row.
    fn cell(&self, position: usize) -> Result<Cell, DriverError>;
}

/// A prepared statement owned by whoever holds it.
pub trait PreparedHandle {
    type Cursor<'a>: ResultCursor
    where
        Self: 'a;

    /// Execute with the given bound values.
    fn execute(&mut self, params: &[Value]) -> Result<Self::Cursor<'_>, DriverError>;

    /// Release the underlying driver resource.
    fn close(&mut self) -> Result<(), DriverError>;

    /// Whether `close` has already run.
    fn is_closed(&self) -> bool;
}

/// Prepares statement text on a live connection.
pub trait Driver {
    type Statement: PreparedHandle;

    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_descriptor_builder() {
        let col = ColumnDescriptor::new("price", SqlType::NUMERIC, "numeric").with_precision_scale(10, 2);
        assert_eq!(col.label, "price");
        assert_eq!(col.precision, 10);
        assert_eq!(col.scale, 2);
    }

    #[test]
    fn test_cell_kind() {
        assert_eq!(Cell::Null.kind(), "null");
        assert_eq!(Cell::Text("x".into()).kind(), "text");
        assert_eq!(Cell::Bytes(vec![]).kind(), "bytes");
    }
}
