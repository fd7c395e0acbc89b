//! In-memory driver.
//!
//! Serves canned result tables keyed by statement text and counts every
//! driver call, so callers can observe prepares, metadata round trips and
//! releases.
//!
//! # Example
//!
//! ```
//! use rowbridge_rs::driver::{Cell, ColumnDescriptor, MemoryDriver, MemoryTable};
//! use rowbridge_rs::types::SqlType;
//!
//! let table = MemoryTable::new(vec![ColumnDescriptor::new("id", SqlType::INTEGER, "int4")])
//!     .with_row(vec![Cell::Int(1)]);
//! let driver = MemoryDriver::new().with_table("SELECT id FROM t", table);
//! assert_eq!(driver.stats().prepared(), 0);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::{Cell, ColumnDescriptor, Driver, PreparedHandle, ResultCursor};
use crate::error::DriverError;
use crate::types::Value;

/// A canned result: column descriptors plus rows of native cells.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<Cell>>,
    /// Fetching the row at this index fails with `ConnectionLost`.
    fail_at_row: Option<usize>,
}

impl MemoryTable {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            fail_at_row: None,
        }
    }

    #[must_use]
    pub fn with_row(mut self, row: Vec<Cell>) -> Self {
        self.rows.push(row);
        self
    }

    #[must_use]
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Vec<Cell>>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Make the fetch of row `index` fail.
    #[must_use]
    pub fn failing_at_row(mut self, index: usize) -> Self {
        self.fail_at_row = Some(index);
        self
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Call counters shared by a driver and every handle it prepared.
#[derive(Debug, Default)]
pub struct DriverStats {
    prepared: AtomicUsize,
    described: AtomicUsize,
    executed: AtomicUsize,
    rows_fetched: AtomicUsize,
    closed_ids: Mutex<Vec<u64>>,
}

impl DriverStats {
    /// Number of `prepare` calls.
    pub fn prepared(&self) -> usize {
        self.prepared.load(Ordering::Relaxed)
    }

    /// Number of column-metadata round trips.
    pub fn described(&self) -> usize {
        self.described.load(Ordering::Relaxed)
    }

    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::Relaxed)
    }

    pub fn rows_fetched(&self) -> usize {
        self.rows_fetched.load(Ordering::Relaxed)
    }

    /// Ids of released handles, one entry per `close` that did work.
    pub fn closed_ids(&self) -> Vec<u64> {
        self.closed_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn closed(&self) -> usize {
        self.closed_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn record_close(&self, id: u64) {
        self.closed_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);
    }
}

/// Driver over a fixed set of statement texts.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    tables: HashMap<String, Arc<MemoryTable>>,
    stats: Arc<DriverStats>,
    fail_close: Arc<AtomicBool>,
    next_id: AtomicU64,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, sql: impl Into<String>, table: MemoryTable) -> Self {
        self.register(sql, table);
        self
    }

    /// Serve `table` for statement text `sql`.
    pub fn register(&mut self, sql: impl Into<String>, table: MemoryTable) {
        self.tables.insert(sql.into(), Arc::new(table));
    }

    pub fn stats(&self) -> Arc<DriverStats> {
        Arc::clone(&self.stats)
    }

    /// Make every subsequent `close` report an error (after releasing).
    pub fn set_fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::Relaxed);
    }
}

impl Driver for MemoryDriver {
    type Statement = MemoryStatement;

    fn prepare(&mut self, sql: &str) -> Result<MemoryStatement, DriverError> {
        let table = self
            .tables
            .get(sql)
            .cloned()
            .ok_or_else(|| DriverError::UnknownStatement(sql.to_string()))?;
        self.stats.prepared.fetch_add(1, Ordering::Relaxed);

        Ok(MemoryStatement {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            sql: sql.to_string(),
            table,
            stats: Arc::clone(&self.stats),
            fail_close: Arc::clone(&self.fail_close),
            closed: false,
        })
    }
}

/// Statement handle prepared by [`MemoryDriver`].
#[derive(Debug)]
pub struct MemoryStatement {
    id: u64,
    sql: String,
    table: Arc<MemoryTable>,
    stats: Arc<DriverStats>,
    fail_close: Arc<AtomicBool>,
    closed: bool,
}

impl MemoryStatement {
    /// Unique id of this handle within its driver.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl PreparedHandle for MemoryStatement {
    type Cursor<'a> = MemoryCursor<'a>;

    fn execute(&mut self, _params: &[Value]) -> Result<MemoryCursor<'_>, DriverError> {
        if self.closed {
            return Err(DriverError::StatementClosed);
        }
        self.stats.executed.fetch_add(1, Ordering::Relaxed);
        Ok(MemoryCursor {
            table: &self.table,
            stats: &self.stats,
            current: None,
            next: 0,
        })
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stats.record_close(self.id);
        if self.fail_close.load(Ordering::Relaxed) {
            return Err(DriverError::Sql {
                message: format!("failed to close statement {}", self.id),
            });
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Cursor over a [`MemoryTable`].
#[derive(Debug)]
pub struct MemoryCursor<'a> {
    table: &'a MemoryTable,
    stats: &'a DriverStats,
    current: Option<usize>,
    next: usize,
}

impl ResultCursor for MemoryCursor<'_> {
    fn columns(&self) -> Result<Vec<ColumnDescriptor>, DriverError> {
        self.stats.described.fetch_add(1, Ordering::Relaxed);
        Ok(self.table.columns.clone())
    }

    fn next_row(&mut self) -> Result<bool, DriverError> {
        if self.table.fail_at_row == Some(self.next) {
            return Err(DriverError::ConnectionLost(format!(
                "connection dropped while fetching row {}",
                self.next
            )));
        }
        if self.next < self.table.rows.len() {
            self.current = Some(self.next);
            self.next += 1;
            self.stats.rows_fetched.fetch_add(1, Ordering::Relaxed);
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn cell(&self, position: usize) -> Result<Cell, DriverError> {
        let row = self
            .current
            .and_then(|idx| self.table.rows.get(idx))
            .ok_or(DriverError::NoCurrentRow)?;
        row.get(position)
            .cloned()
            .ok_or(DriverError::ColumnOutOfRange {
                position,
                count: row.len(),
            })
    }
}
