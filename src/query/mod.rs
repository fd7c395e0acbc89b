//! Query results.
//!
//! The query module is organized into:
//! - `meta` - per-statement result metadata, built once and reused on cache hits
//! - `materialize` - one-pass conversion of a driver cursor into row tuples
//! - `results` - the materialized result value and its derived accessors

mod materialize;
mod meta;
mod results;

pub use materialize::{materialize, Row};
pub use meta::{ResultMeta, ResultMode};
pub use results::{CommandTuples, QueryResult, Table, Tuple};
