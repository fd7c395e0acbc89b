//! Statement execution session.
//!
//! A [`Session`] owns one driver connection and the statement cache for it.
//! Every execution goes through the same pipeline:
//!
//! 1. Look the statement up by text and schema; prepare and cache it on a miss.
//! 2. On the first execution of a cached statement, build its [`ResultMeta`]
//!    from the driver's column descriptors and attach it to the cache entry.
//!    Later executions reuse that metadata without asking the driver again.
//! 3. Materialize every row of the cursor using the metadata.
//!
//! With the cache disabled each execution prepares, runs and closes its own
//! statement.

use std::fmt;
use std::sync::Arc;

use crate::cache::{CacheEntry, MetricsSnapshot, StatementCache, StatementKey};
use crate::connection::params::SessionConfig;
use crate::driver::{Driver, PreparedHandle, ResultCursor};
use crate::error::QueryError;
use crate::query::{materialize, QueryResult, ResultMeta, ResultMode};
use crate::types::Value;
use crate::vendor::{PlainTypeMap, TypeMapBuilder};

/// A single statement-execution session over a driver connection.
///
/// Not synchronized: share a session across threads only behind your own
/// lock.
///
/// # Example
///
/// ```
/// use rowbridge_rs::driver::{Cell, ColumnDescriptor, MemoryDriver, MemoryTable};
/// use rowbridge_rs::types::{SqlType, Value};
/// use rowbridge_rs::{Session, SessionConfig};
///
/// let table = MemoryTable::new(vec![ColumnDescriptor::new("id", SqlType::INTEGER, "int4")])
///     .with_row(vec![Cell::Int(7)]);
/// let driver = MemoryDriver::new().with_table("SELECT id FROM t", table);
///
/// let mut session = Session::new(driver, SessionConfig::default());
/// let result = session.query("SELECT id FROM t", &[]).unwrap();
/// assert_eq!(result.get_value(0, 0).unwrap(), &Value::Integer(7));
/// ```
pub struct Session<D: Driver> {
    driver: D,
    statements: StatementCache<D::Statement>,
    type_maps: Box<dyn TypeMapBuilder>,
    config: SessionConfig,
}

impl<D: Driver> Session<D> {
    /// Create a session over `driver`.
    ///
    /// The statement cache is sized by [`SessionConfig::effective_capacity`].
    /// Results get no vendor type map until a builder is set with
    /// [`Session::with_type_map_builder`].
    pub fn new(driver: D, config: SessionConfig) -> Self {
        Self {
            statements: StatementCache::new(config.effective_capacity()),
            driver,
            type_maps: Box::new(PlainTypeMap),
            config,
        }
    }

    /// Use `builder` to enrich the metadata of typed results.
    #[must_use]
    pub fn with_type_map_builder(mut self, builder: impl TypeMapBuilder + 'static) -> Self {
        self.type_maps = Box::new(builder);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn statement_cache(&self) -> &StatementCache<D::Statement> {
        &self.statements
    }

    pub fn cache_metrics(&self) -> MetricsSnapshot {
        self.statements.metrics()
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Execute `sql` under `schema` and materialize the full result.
    ///
    /// # Arguments
    ///
    /// * `sql` - Statement text, also the cache key
    /// * `schema` - Schema the statement resolves against; part of the cache key
    /// * `params` - Bound parameter values
    /// * `mode` - Representation the result is built for. Only consulted
    ///   when metadata is built; a cached statement keeps the mode of its
    ///   first execution.
    ///
    /// # Errors
    ///
    /// Returns the first driver, type resolution or conversion failure. No
    /// partial result is returned.
    pub fn exec_query(
        &mut self,
        sql: &str,
        schema: Option<&str>,
        params: &[Value],
        mode: ResultMode,
    ) -> Result<QueryResult, QueryError> {
        let key = StatementKey::new(sql, schema);

        if let Some(entry) = self.statements.entry_mut(&key) {
            return execute_entry(entry, self.type_maps.as_ref(), params, mode);
        }

        let statement = self.driver.prepare(sql)?;
        match self.statements.put_entry(key, statement) {
            Ok(entry) => execute_entry(entry, self.type_maps.as_ref(), params, mode),
            Err(statement) => execute_uncached(statement, self.type_maps.as_ref(), params, mode),
        }
    }

    /// Execute and build a typed result.
    ///
    /// # Errors
    ///
    /// See [`Session::exec_query`].
    pub fn query(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult, QueryError> {
        self.exec_query(sql, None, params, ResultMode::Typed)
    }

    /// Execute and build a plain result.
    ///
    /// # Errors
    ///
    /// See [`Session::exec_query`].
    pub fn query_plain(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult, QueryError> {
        self.exec_query(sql, None, params, ResultMode::Plain)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Close and drop every cached statement.
    pub fn clear_statement_cache(&mut self) {
        self.statements.clear();
    }

    /// Close the session, releasing every cached statement.
    ///
    /// Dropping a session releases them as well.
    pub fn close(mut self) {
        let cached = self.statements.len();
        self.statements.clear();
        tracing::debug!(released = cached, "Session closed");
    }
}

impl<D: Driver> fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("statements", &self.statements)
            .finish_non_exhaustive()
    }
}

/// Run a cached statement, reusing or attaching its metadata.
fn execute_entry<S: PreparedHandle>(
    entry: &mut CacheEntry<S>,
    builder: &dyn TypeMapBuilder,
    params: &[Value],
    mode: ResultMode,
) -> Result<QueryResult, QueryError> {
    let CacheEntry {
        statement,
        meta: slot,
    } = entry;
    let mut cursor = statement.execute(params)?;

    let meta = match slot.get() {
        Some(meta) => {
            tracing::trace!("Reusing cached result metadata");
            Arc::clone(meta)
        }
        None => {
            let built = Arc::new(ResultMeta::build(&cursor.columns()?, mode, builder)?);
            tracing::trace!(columns = built.column_count(), "Attached result metadata");
            Arc::clone(slot.get_or_init(|| built))
        }
    };

    let rows = materialize(&mut cursor, &meta)?;
    Ok(QueryResult::new(meta, rows))
}

/// Run a statement the cache did not take, then close it.
fn execute_uncached<S: PreparedHandle>(
    mut statement: S,
    builder: &dyn TypeMapBuilder,
    params: &[Value],
    mode: ResultMode,
) -> Result<QueryResult, QueryError> {
    let result = execute_fresh(&mut statement, builder, params, mode);
    if let Err(e) = statement.close() {
        tracing::warn!(error = %e, "Failed to release uncached statement");
    }
    result
}

fn execute_fresh<S: PreparedHandle>(
    statement: &mut S,
    builder: &dyn TypeMapBuilder,
    params: &[Value],
    mode: ResultMode,
) -> Result<QueryResult, QueryError> {
    let mut cursor = statement.execute(params)?;
    let meta = Arc::new(ResultMeta::build(&cursor.columns()?, mode, builder)?);
    let rows = materialize(&mut cursor, &meta)?;
    Ok(QueryResult::new(meta, rows))
}
