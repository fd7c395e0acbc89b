//! Shared fixtures for integration tests.
//!
//! All tests run against the in-memory driver, so no database is needed.

#![allow(dead_code)]

use std::sync::Arc;

use rowbridge_rs::driver::{DriverStats, MemoryDriver, MemoryTable};
use rowbridge_rs::{Cell, ColumnDescriptor, Session, SessionConfig, SqlType};

pub const USERS_SQL: &str = "SELECT id, name FROM users";
pub const FILES_SQL: &str = "SELECT id, data FROM files";
pub const PRICES_SQL: &str = "SELECT total, price FROM prices";
pub const EMPTY_SQL: &str = "SELECT id FROM users WHERE 1 = 0";

/// Columns `["id", "name"]` with rows `(1, "a")` and `(2, "b")`.
pub fn users_table() -> MemoryTable {
    MemoryTable::new(vec![
        ColumnDescriptor::new("id", SqlType::INTEGER, "int4"),
        ColumnDescriptor::new("name", SqlType::VARCHAR, "varchar"),
    ])
    .with_row(vec![Cell::Int(1), Cell::Text("a".into())])
    .with_row(vec![Cell::Int(2), Cell::Text("b".into())])
}

/// A binary column with one non-null and one null payload.
pub fn files_table() -> MemoryTable {
    MemoryTable::new(vec![
        ColumnDescriptor::new("id", SqlType::INTEGER, "int4"),
        ColumnDescriptor::new("data", SqlType::BINARY, "bytea"),
    ])
    .with_row(vec![Cell::Int(1), Cell::Bytes(vec![0xca, 0xfe])])
    .with_row(vec![Cell::Int(2), Cell::Null])
}

/// Numeric columns without and with a declared scale.
pub fn prices_table() -> MemoryTable {
    MemoryTable::new(vec![
        ColumnDescriptor::new("total", SqlType::NUMERIC, "numeric"),
        ColumnDescriptor::new("price", SqlType::NUMERIC, "numeric").with_precision_scale(12, 4),
    ])
    .with_row(vec![Cell::Text("10".into()), Cell::Text("1.2500".into())])
}

pub fn empty_table() -> MemoryTable {
    MemoryTable::new(vec![ColumnDescriptor::new("id", SqlType::INTEGER, "int4")])
}

/// Driver serving every fixture table plus `extra` numbered statements
/// `SELECT <n>`.
pub fn test_driver(extra: usize) -> MemoryDriver {
    let mut driver = MemoryDriver::new()
        .with_table(USERS_SQL, users_table())
        .with_table(FILES_SQL, files_table())
        .with_table(PRICES_SQL, prices_table())
        .with_table(EMPTY_SQL, empty_table());
    for n in 0..extra {
        driver.register(
            numbered_sql(n),
            MemoryTable::new(vec![ColumnDescriptor::new("n", SqlType::BIGINT, "int8")])
                .with_row(vec![Cell::Int(n as i64)]),
        );
    }
    driver
}

pub fn numbered_sql(n: usize) -> String {
    format!("SELECT {n}")
}

/// Session over [`test_driver`] with a statement cache of `limit`.
pub fn session_with_limit(limit: i64, extra: usize) -> (Session<MemoryDriver>, Arc<DriverStats>) {
    let driver = test_driver(extra);
    let stats = driver.stats();
    let config = SessionConfig::default().with_statement_limit(limit);
    (Session::new(driver, config), stats)
}
