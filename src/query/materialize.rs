//! Row materialization.

use crate::driver::ResultCursor;
use crate::error::QueryError;
use crate::types::{convert_cell, BinaryData, Value};

use super::meta::{ResultMeta, ResultMode};

/// One converted row, in column order.
pub type Row = Vec<Value>;

/// Walk `cursor` to exhaustion and convert every row.
///
/// Each cell is converted with its column's type code from `meta`. For typed
/// results whose metadata has a binary column, non-null values of binary
/// columns are wrapped in [`BinaryData`].
///
/// # Errors
/// Returns the first driver or conversion error; rows read before it are
/// discarded.
pub fn materialize<C>(cursor: &mut C, meta: &ResultMeta) -> Result<Vec<Row>, QueryError>
where
    C: ResultCursor + ?Sized,
{
    let wrap_binary = meta.has_binary() && meta.mode() == ResultMode::Typed;
    let column_types = meta.column_types();
    let mut rows = Vec::new();

    while cursor.next_row()? {
        let mut row = Vec::with_capacity(column_types.len());
        for (position, &sql_type) in column_types.iter().enumerate() {
            let mut value = convert_cell(position, sql_type, cursor.cell(position)?)?;
            if wrap_binary && sql_type.is_binary() && !value.is_null() {
                value = BinaryData::wrap(value);
            }
            row.push(value);
        }
        rows.push(row);
    }

    Ok(rows)
}
