//! # rowbridge-rs
//!
//! Prepared statement caching and row materialization between a database
//! driver and an application.
//!
//! A [`Session`] keeps a bounded LRU cache of prepared statement handles keyed
//! by statement text and schema. The first execution of a cached statement
//! derives its column metadata (names, type codes, binary flag and an optional
//! vendor type map) and attaches it to the cache entry; every later execution
//! reuses the same metadata instance instead of asking the driver again. Rows
//! are converted column by column into [`Value`]s using that metadata.
//!
//! ## Features
//!
//! - **Statement Cache**: access-ordered LRU with guaranteed release of evicted handles
//! - **Metadata Reuse**: one metadata build per distinct statement and schema
//! - **Vendor Typing**: pluggable type map builders, with PostgreSQL numeric modifier decoding
//! - **Materialization**: type-code driven cell conversion with binary payload marking
//! - **Arrow Export**: materialized results as Arrow `RecordBatch`es
//!
//! ## Example
//!
//! ```
//! use rowbridge_rs::driver::{Cell, ColumnDescriptor, MemoryDriver, MemoryTable};
//! use rowbridge_rs::types::{SqlType, Value};
//! use rowbridge_rs::{PostgresTypeMap, ResultMode, Session, SessionConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let users = MemoryTable::new(vec![
//!     ColumnDescriptor::new("id", SqlType::INTEGER, "int4"),
//!     ColumnDescriptor::new("name", SqlType::VARCHAR, "varchar"),
//! ])
//! .with_row(vec![Cell::Int(1), Cell::Text("a".into())]);
//! let driver = MemoryDriver::new().with_table("SELECT id, name FROM users", users);
//!
//! let config: SessionConfig = "statement_limit=100".parse()?;
//! let mut session =
//!     Session::new(driver, config).with_type_map_builder(PostgresTypeMap::standard());
//!
//! let result = session.exec_query("SELECT id, name FROM users", Some("public"), &[], ResultMode::Typed)?;
//! assert_eq!(result.row(0)?["name"], Value::from("a"));
//!
//! let batch = rowbridge_rs::ArrowConverter::to_record_batch(&result)?;
//! assert_eq!(batch.num_rows(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// Module declarations
pub mod arrow_conversion;
pub mod cache;
pub mod connection;
pub mod driver;
pub mod error;
pub mod query;
pub mod types;
pub mod vendor;

// =============================================================================
// Session
// =============================================================================

/// Re-export the session and its configuration.
pub use connection::{Session, SessionConfig, DEFAULT_STATEMENT_LIMIT};

// =============================================================================
// Statement Cache
// =============================================================================

pub use cache::{CacheEntry, CacheMetrics, MetricsSnapshot, StatementCache, StatementKey};

// =============================================================================
// Driver Interface
// =============================================================================

pub use driver::{Cell, ColumnDescriptor, Driver, PreparedHandle, ResultCursor};

// =============================================================================
// Query Results
// =============================================================================

pub use query::{materialize, CommandTuples, QueryResult, ResultMeta, ResultMode, Row, Table, Tuple};

// =============================================================================
// Vendor Typing
// =============================================================================

pub use vendor::{
    NumericModifier, NumericScale, PgTypeResolver, PlainTypeMap, PostgresTypeMap, TypeMapBuilder,
    TypeResolver,
};

// =============================================================================
// Arrow Conversion
// =============================================================================

/// Re-export Arrow conversion utilities.
pub use arrow_conversion::ArrowConverter;

// =============================================================================
// Error Types
// =============================================================================

/// Re-export error types for convenient error handling.
pub use error::{AccessError, ConfigError, ConversionError, DriverError, QueryError};

// =============================================================================
// Type System
// =============================================================================

pub use types::{BinaryData, ColumnType, Decimal, SqlType, TypeMap, TypeMapper, Value};
