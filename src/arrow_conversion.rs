//! Arrow export of materialized results.
//!
//! Converts a [`QueryResult`] into an Arrow [`RecordBatch`], one field per
//! column. Each field carries the column's driver type code and, for typed
//! results, its JSON-encoded [`ColumnType`] as field metadata.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array, Float64Array, Int64Array,
    NullArray, StringArray, Time64MicrosecondArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;

use crate::error::ConversionError;
use crate::query::{QueryResult, Row};
use crate::types::{ColumnType, Decimal, SqlType, TypeMapper, Value};

/// Largest scale a Decimal128 column can carry.
const MAX_DECIMAL_SCALE: i8 = 38;

static NULL_VALUE: Value = Value::Null;

/// Converts query results to Arrow record batches.
pub struct ArrowConverter;

impl ArrowConverter {
    /// Arrow schema of `result`.
    ///
    /// Decimal columns use the largest of the declared scale (from the type
    /// map) and the scales of the values present.
    ///
    /// # Errors
    /// Returns `ConversionError::UnsupportedType` for columns with no flat
    /// Arrow type.
    pub fn schema(result: &QueryResult) -> Result<SchemaRef, ConversionError> {
        let fields = result
            .fields()
            .iter()
            .zip(result.column_types())
            .enumerate()
            .map(|(position, (name, &sql_type))| {
                let column_type = result.type_map().and_then(|m| m.get(name));
                let scale = decimal_scale(result.values(), position, column_type);
                let data_type = TypeMapper::sql_to_arrow(sql_type, scale)?;
                Ok(Field::new(name, data_type, true)
                    .with_metadata(TypeMapper::create_field_metadata(sql_type, column_type)))
            })
            .collect::<Result<Vec<_>, ConversionError>>()?;

        Ok(Arc::new(Schema::new(fields)))
    }

    /// Convert `result` into a single record batch.
    ///
    /// # Errors
    /// Returns `ConversionError::InvalidValue` when a value does not fit its
    /// column's Arrow type, or `ConversionError::ArrowError` when Arrow
    /// rejects the batch.
    pub fn to_record_batch(result: &QueryResult) -> Result<RecordBatch, ConversionError> {
        let schema = Self::schema(result)?;
        let rows = result.values();

        let arrays = schema
            .fields()
            .iter()
            .zip(result.column_types())
            .enumerate()
            .map(|(position, (field, &sql_type))| {
                build_array(rows, position, sql_type, field.data_type())
            })
            .collect::<Result<Vec<_>, ConversionError>>()?;

        RecordBatch::try_new(schema, arrays).map_err(|e| ConversionError::ArrowError(e.to_string()))
    }
}

fn decimal_scale(rows: &[Row], position: usize, column_type: Option<&ColumnType>) -> i8 {
    let declared = match column_type {
        Some(ColumnType::Decimal { scale }) => i8::try_from(*scale).unwrap_or(MAX_DECIMAL_SCALE),
        _ => 0,
    };
    rows.iter()
        .filter_map(|row| match row.get(position) {
            Some(Value::Decimal(d)) => Some(d.scale),
            _ => None,
        })
        .fold(declared, i8::max)
        .clamp(0, MAX_DECIMAL_SCALE)
}

fn column<'a>(rows: &'a [Row], position: usize) -> impl Iterator<Item = &'a Value> + 'a {
    rows.iter().map(move |row| row.get(position).unwrap_or(&NULL_VALUE))
}

fn build_array(
    rows: &[Row],
    position: usize,
    sql_type: SqlType,
    data_type: &DataType,
) -> Result<ArrayRef, ConversionError> {
    let mismatch = |expected: &str, value: &Value| ConversionError::InvalidValue {
        column: position,
        type_code: sql_type,
        message: format!("expected {expected}, found {value}"),
    };

    let array: ArrayRef = match data_type {
        DataType::Null => Arc::new(NullArray::new(rows.len())),
        DataType::Boolean => {
            let values = column(rows, position)
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Boolean(b) => Ok(Some(*b)),
                    other => Err(mismatch("boolean", other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(BooleanArray::from(values))
        }
        DataType::Int64 => {
            let values = column(rows, position)
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Integer(i) => Ok(Some(*i)),
                    other => Err(mismatch("integer", other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(Int64Array::from(values))
        }
        DataType::Float64 => {
            let values = column(rows, position)
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Float(f) => Ok(Some(*f)),
                    Value::Integer(i) => Ok(Some(*i as f64)),
                    other => Err(mismatch("float", other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(Float64Array::from(values))
        }
        DataType::Decimal128(precision, scale) => {
            let values = column(rows, position)
                .map(|v| {
                    let decimal = match v {
                        Value::Null => return Ok(None),
                        Value::Decimal(d) => *d,
                        Value::Integer(i) => Decimal::new(i128::from(*i), 0),
                        other => return Err(mismatch("decimal", other)),
                    };
                    decimal
                        .rescale(*scale)
                        .map(Some)
                        .ok_or_else(|| mismatch(&format!("decimal with scale {scale}"), v))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(
                Decimal128Array::from(values)
                    .with_precision_and_scale(*precision, *scale)
                    .map_err(|e| ConversionError::ArrowError(e.to_string()))?,
            )
        }
        DataType::Binary => {
            let values = column(rows, position)
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Bytes(b) => Ok(Some(b.as_slice())),
                    Value::Binary(b) => Ok(Some(b.as_bytes())),
                    Value::Text(s) => Ok(Some(s.as_bytes())),
                    other => Err(mismatch("binary", other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(BinaryArray::from_opt_vec(values))
        }
        DataType::Date32 => {
            let values = column(rows, position)
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Date(days) => Ok(Some(*days)),
                    other => Err(mismatch("date", other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(Date32Array::from(values))
        }
        DataType::Time64(TimeUnit::Microsecond) => {
            let values = column(rows, position)
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Time(micros) => Ok(Some(*micros)),
                    other => Err(mismatch("time", other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(Time64MicrosecondArray::from(values))
        }
        DataType::Timestamp(TimeUnit::Microsecond, tz) => {
            let values = column(rows, position)
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Timestamp(micros) => Ok(Some(*micros)),
                    other => Err(mismatch("timestamp", other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(TimestampMicrosecondArray::from(values).with_timezone_opt(tz.clone()))
        }
        DataType::Utf8 => {
            let values: Vec<Option<String>> = column(rows, position)
                .map(|v| match v {
                    Value::Null => None,
                    Value::Text(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            Arc::new(StringArray::from(values))
        }
        other => {
            return Err(ConversionError::ArrowError(format!(
                "no array builder for {other}"
            )))
        }
    };

    Ok(array)
}
