//! Materialized query results.
//!
//! [`QueryResult`] is what a session execution returns: the shared
//! [`ResultMeta`] plus every converted row. On top of that it exposes a
//! driver-result style surface (`ntuples`, `get_value`, keyed rows) and
//! converts into the column/rows/type-map [`Table`] consumed by callers that
//! want the plain tabular value.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

use super::materialize::Row;
use super::meta::ResultMeta;
use crate::error::AccessError;
use crate::types::{SqlType, TypeMap, Value};

/// A row keyed by column name, in column order.
pub type Tuple = IndexMap<String, Value>;

/// Answer of [`QueryResult::cmd_tuples`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommandTuples {
    /// The result has no rows.
    Zero,
    /// The first row of the result.
    FirstRow(Tuple),
}

/// Column names, rows and optional type map of a result.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub type_map: Option<TypeMap>,
}

/// Fully materialized result of one execution.
#[derive(Debug)]
pub struct QueryResult {
    meta: Arc<ResultMeta>,
    rows: Vec<Row>,
    tuples: OnceLock<Vec<Tuple>>,
}

impl QueryResult {
    pub fn new(meta: Arc<ResultMeta>, rows: Vec<Row>) -> Self {
        Self {
            meta,
            rows,
            tuples: OnceLock::new(),
        }
    }

    /// Metadata shared with the cached statement, if it was cached.
    pub fn meta(&self) -> &Arc<ResultMeta> {
        &self.meta
    }

    /// Column names in column order.
    pub fn fields(&self) -> &[String] {
        self.meta.column_names()
    }

    pub fn column_types(&self) -> &[SqlType] {
        self.meta.column_types()
    }

    pub fn type_map(&self) -> Option<&TypeMap> {
        self.meta.type_map()
    }

    pub fn nfields(&self) -> usize {
        self.meta.column_count()
    }

    /// Number of rows.
    pub fn ntuples(&self) -> usize {
        self.rows.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row arrays in result order.
    pub fn values(&self) -> &[Row] {
        &self.rows
    }

    /// Cell at 0-based `row` and `column`.
    ///
    /// # Errors
    /// `InvalidTuple` when `row` is out of range, otherwise `InvalidField`
    /// when `column` is.
    pub fn get_value(&self, row: usize, column: usize) -> Result<&Value, AccessError> {
        let values = self.rows.get(row).ok_or(AccessError::InvalidTuple(row))?;
        values.get(column).ok_or(AccessError::InvalidField(column))
    }

    /// Row `index` as a freshly built keyed map.
    ///
    /// # Errors
    /// `OutOfRange` when `index` is not a row of this result.
    pub fn row(&self, index: usize) -> Result<Tuple, AccessError> {
        self.rows
            .get(index)
            .map(|values| self.keyed(values))
            .ok_or(AccessError::OutOfRange(index))
    }

    /// Every row as a keyed map. Built on first call and kept for the
    /// lifetime of the result.
    pub fn tuples(&self) -> &[Tuple] {
        self.tuples
            .get_or_init(|| self.rows.iter().map(|values| self.keyed(values)).collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tuple> {
        self.tuples().iter()
    }

    /// Affected-row proxy: [`CommandTuples::Zero`] for an empty result,
    /// otherwise the first row.
    ///
    /// This only approximates a command's affected-row count. It reads the
    /// first row of whatever the statement returned and is not a command tag.
    pub fn cmd_tuples(&self) -> CommandTuples {
        match self.rows.first() {
            None => CommandTuples::Zero,
            Some(values) => CommandTuples::FirstRow(self.keyed(values)),
        }
    }

    /// Split into the plain tabular value.
    pub fn into_table(self) -> Table {
        Table {
            columns: self.meta.column_names().to_vec(),
            type_map: self.meta.type_map().cloned(),
            rows: self.rows,
        }
    }

    fn keyed(&self, values: &[Value]) -> Tuple {
        self.meta
            .column_names()
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Tuple;
    type IntoIter = std::slice::Iter<'a, Tuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
