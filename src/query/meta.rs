//! Per-statement result metadata.

use crate::driver::ColumnDescriptor;
use crate::error::QueryError;
use crate::types::{SqlType, TypeMap};
use crate::vendor::TypeMapBuilder;

/// Which representation a result is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultMode {
    /// Raw driver-result surface: no type map, binary values left as bytes.
    #[default]
    Plain,
    /// Richly typed tabular value: vendor type map populated, binary values
    /// wrapped in [`BinaryData`](crate::types::BinaryData).
    Typed,
}

/// Column names, type codes and vendor types of one result shape.
///
/// Built once per distinct statement and shared through an `Arc` by every
/// later execution of the same cached statement. Never mutated after
/// [`ResultMeta::build`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMeta {
    column_names: Vec<String>,
    column_types: Vec<SqlType>,
    has_binary: bool,
    type_map: Option<TypeMap>,
    mode: ResultMode,
}

impl ResultMeta {
    /// Derive metadata from the driver's column descriptors.
    ///
    /// # Arguments
    /// * `columns` - Descriptors in driver order
    /// * `mode` - Representation the result is built for
    /// * `builder` - Vendor strategy that fills the type map
    ///
    /// # Errors
    /// Propagates any failure of the vendor type resolver.
    pub fn build(
        columns: &[ColumnDescriptor],
        mode: ResultMode,
        builder: &dyn TypeMapBuilder,
    ) -> Result<Self, QueryError> {
        let mut type_map = builder.init_type_map(mode);
        let mut column_names = Vec::with_capacity(columns.len());
        let mut column_types = Vec::with_capacity(columns.len());
        let mut has_binary = false;

        for (position, column) in columns.iter().enumerate() {
            column_names.push(column.label.clone());
            column_types.push(column.type_code);
            if !has_binary && column.type_code.is_binary() {
                has_binary = true;
            }
            if let Some(map) = type_map.as_mut() {
                builder.add_column(map, position, column)?;
            }
        }

        Ok(Self {
            column_names,
            column_types,
            has_binary,
            type_map,
            mode,
        })
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_types(&self) -> &[SqlType] {
        &self.column_types
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// Whether any column has a binary type code.
    pub fn has_binary(&self) -> bool {
        self.has_binary
    }

    pub fn type_map(&self) -> Option<&TypeMap> {
        self.type_map.as_ref()
    }

    pub fn mode(&self) -> ResultMode {
        self.mode
    }

    /// Position of the column labelled `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }
}
