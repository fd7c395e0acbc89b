//! Prepared statement caching.
//!
//! A [`StatementCache`] owns the prepared handles of one session, keyed by
//! statement text and schema. Each [`CacheEntry`] also carries a write-once
//! slot for the result metadata of that statement, so repeated executions
//! skip the column-metadata round trip.

mod metrics;
mod statement_cache;

pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use statement_cache::{CacheEntry, StatementCache, StatementKey};
