//! Rich column type descriptors and Arrow type mapping.

use std::collections::HashMap;

use arrow::datatypes::{DataType, TimeUnit};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConversionError;
use crate::types::SqlType;

/// Field metadata key holding the JSON-encoded [`ColumnType`].
pub const TYPE_METADATA_KEY: &str = "rowbridge:type";

/// Column name to rich type descriptor, in column order.
pub type TypeMap = IndexMap<String, ColumnType>;

/// Adapter-defined rich type of a result column.
///
/// Produced by a [`TypeResolver`](crate::vendor::TypeResolver) from the
/// vendor type name and modifier, when the result is built for typed
/// consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    /// Numeric column with a declared scale.
    Decimal { scale: u16 },
    /// Numeric column declared without precision or scale.
    DecimalWithoutScale,
    Money,
    Char { limit: Option<u32> },
    Varchar { limit: Option<u32> },
    Text,
    Bytea,
    Date,
    Time,
    Timestamp { with_time_zone: bool },
    Interval,
    Uuid,
    Json,
    Jsonb,
    Inet,
    Array { element: Box<ColumnType> },
    /// A type name the resolver recognizes but has no dedicated variant for.
    Other { name: String },
}

impl ColumnType {
    /// Serialized form stored in Arrow field metadata.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    #[must_use]
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

/// Maps driver type codes to Arrow types.
pub struct TypeMapper;

impl TypeMapper {
    /// Arrow type for a column with the given driver type code.
    ///
    /// `decimal_scale` is the scale that decimal columns are exported at.
    ///
    /// # Errors
    /// Returns `ConversionError::UnsupportedType` for structured codes
    /// (ARRAY, STRUCT, REF) that have no flat Arrow representation here.
    pub fn sql_to_arrow(sql_type: SqlType, decimal_scale: i8) -> Result<DataType, ConversionError> {
        if sql_type.is_boolean() {
            return Ok(DataType::Boolean);
        }
        if sql_type.is_integer() {
            return Ok(DataType::Int64);
        }
        if sql_type.is_floating() {
            return Ok(DataType::Float64);
        }
        if sql_type.is_decimal() {
            // Decimal128 holds up to 38 digits.
            return Ok(DataType::Decimal128(38, decimal_scale));
        }
        if sql_type.is_binary() {
            return Ok(DataType::Binary);
        }
        if sql_type == SqlType::DATE {
            return Ok(DataType::Date32);
        }
        if sql_type.is_time() {
            return Ok(DataType::Time64(TimeUnit::Microsecond));
        }
        if sql_type == SqlType::TIMESTAMP_WITH_TIMEZONE {
            return Ok(DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())));
        }
        if sql_type == SqlType::TIMESTAMP {
            return Ok(DataType::Timestamp(TimeUnit::Microsecond, None));
        }
        if sql_type == SqlType::NULL {
            return Ok(DataType::Null);
        }
        if matches!(sql_type, SqlType::ARRAY | SqlType::STRUCT | SqlType::REF) {
            return Err(ConversionError::UnsupportedType { type_code: sql_type });
        }
        // Character types and unknown vendor codes export as text.
        Ok(DataType::Utf8)
    }

    /// Create Arrow field metadata preserving the column's type information.
    pub fn create_field_metadata(
        sql_type: SqlType,
        column_type: Option<&ColumnType>,
    ) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("rowbridge:type_code".to_string(), sql_type.code().to_string());
        if let Some(column_type) = column_type {
            metadata.insert(TYPE_METADATA_KEY.to_string(), column_type.to_json());
        }
        metadata
    }

    /// Extract the rich type from Arrow field metadata.
    pub fn from_field_metadata(metadata: &HashMap<String, String>) -> Option<ColumnType> {
        metadata
            .get(TYPE_METADATA_KEY)
            .and_then(|s| ColumnType::from_json(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_mappings() {
        assert_eq!(TypeMapper::sql_to_arrow(SqlType::BOOLEAN, 0).unwrap(), DataType::Boolean);
        assert_eq!(TypeMapper::sql_to_arrow(SqlType::SMALLINT, 0).unwrap(), DataType::Int64);
        assert_eq!(TypeMapper::sql_to_arrow(SqlType::REAL, 0).unwrap(), DataType::Float64);
        assert_eq!(TypeMapper::sql_to_arrow(SqlType::DATE, 0).unwrap(), DataType::Date32);
        assert_eq!(TypeMapper::sql_to_arrow(SqlType::BLOB, 0).unwrap(), DataType::Binary);
        assert_eq!(TypeMapper::sql_to_arrow(SqlType::NVARCHAR, 0).unwrap(), DataType::Utf8);
    }

    #[test]
    fn test_decimal_mapping_uses_scale() {
        assert_eq!(
            TypeMapper::sql_to_arrow(SqlType::NUMERIC, 2).unwrap(),
            DataType::Decimal128(38, 2)
        );
    }

    #[test]
    fn test_timestamp_mapping() {
        assert_eq!(
            TypeMapper::sql_to_arrow(SqlType::TIMESTAMP, 0).unwrap(),
            DataType::Timestamp(TimeUnit::Microsecond, None)
        );
        assert_eq!(
            TypeMapper::sql_to_arrow(SqlType::TIMESTAMP_WITH_TIMEZONE, 0).unwrap(),
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
        );
    }

    #[test]
    fn test_structured_types_unsupported() {
        assert!(matches!(
            TypeMapper::sql_to_arrow(SqlType::ARRAY, 0),
            Err(ConversionError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_field_metadata_roundtrip() {
        let column_type = ColumnType::Decimal { scale: 4 };
        let metadata = TypeMapper::create_field_metadata(SqlType::NUMERIC, Some(&column_type));
        assert_eq!(metadata.get("rowbridge:type_code"), Some(&"2".to_string()));
        assert_eq!(TypeMapper::from_field_metadata(&metadata), Some(column_type));
    }

    #[test]
    fn test_field_metadata_without_rich_type() {
        let metadata = TypeMapper::create_field_metadata(SqlType::VARCHAR, None);
        assert!(!metadata.contains_key(TYPE_METADATA_KEY));
        assert_eq!(TypeMapper::from_field_metadata(&metadata), None);
    }

    #[test]
    fn test_column_type_json_is_tagged() {
        let json = ColumnType::Timestamp { with_time_zone: true }.to_json();
        assert_eq!(json, r#"{"type":"timestamp","with_time_zone":true}"#);
        let nested = ColumnType::Array {
            element: Box::new(ColumnType::Integer),
        };
        assert_eq!(ColumnType::from_json(&nested.to_json()), Some(nested));
    }
}
