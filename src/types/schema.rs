//! # Schema Definition
//!
//! A `Schema` is an ordered, immutable sequence of columns describing one
//! row shape. The page builder and the page reader must be constructed from
//! structurally equal schemas for their layouts to agree, so `Schema`
//! derives `PartialEq` and serde traits for shipping inside task
//! configuration.
//!
//! ## Invariants
//!
//! - `columns[i].index() == i` for every column (validated by `new`).
//! - Column names need not be unique; uniqueness is a caller concern.
//!
//! ## Construction
//!
//! ```ignore
//! let schema = Schema::builder()
//!     .add("id", ColumnType::Long)
//!     .add("name", ColumnType::String)
//!     .build();
//! ```

use eyre::Result;
use serde::{Deserialize, Serialize};

use crate::types::{Column, ColumnType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema from pre-built columns, validating that each
    /// column's ordinal matches its position.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        for (position, column) in columns.iter().enumerate() {
            eyre::ensure!(
                column.index() == position,
                "column '{}' has index {} but sits at position {}",
                column.name(),
                column.index(),
                position
            );
        }
        Ok(Self { columns })
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

/// Incrementally assembles a schema, assigning ordinals in call order.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    columns: Vec<Column>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        let index = self.columns.len();
        self.columns.push(Column::new(index, name, column_type));
        self
    }

    pub fn build(self) -> Schema {
        // Ordinals were assigned sequentially, so validation cannot fail.
        Schema {
            columns: self.columns,
        }
    }
}
