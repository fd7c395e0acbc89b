//! Type codes, values and type mapping.

pub mod conversion;
mod mapping;
mod sql_type;
mod value;

pub use conversion::convert_cell;
pub use mapping::{ColumnType, TypeMap, TypeMapper, TYPE_METADATA_KEY};
pub use sql_type::SqlType;
pub use value::{BinaryData, Decimal, Value};
