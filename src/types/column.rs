//! Column definitions for page schemas.
//!
//! A `Column` binds an ordinal position, a display name, and a `ColumnType`.
//! Columns are immutable once part of a schema; the ordinal must equal the
//! column's position in its schema, which `Schema::new` enforces. Names need
//! not be unique at this layer.

use serde::{Deserialize, Serialize};

use crate::types::ColumnType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    index: usize,
    name: String,
    column_type: ColumnType,
}

impl Column {
    pub fn new(index: usize, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            index,
            name: name.into(),
            column_type,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
}
