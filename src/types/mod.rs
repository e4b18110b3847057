//! # Row Shape Descriptions
//!
//! This module provides the static description of a row shape shared by
//! producers and consumers of pages: the closed `ColumnType` set, `Column`
//! and `Schema` definitions, the `Value` tagged union, and the `Timestamp`
//! scalar.
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `ColumnType` | Closed type enum with fixed slot footprints |
//! | `Column` | Ordinal + name + type, immutable |
//! | `Schema` | Ordered column list, structural equality |
//! | `SchemaBuilder` | Assigns ordinals in insertion order |
//! | `Value<'a>` | Tagged union over all supported values |
//! | `Timestamp` | Epoch seconds + normalized nanosecond fraction |
//!
//! A builder and a reader working on the same page must be constructed from
//! structurally equal schemas; `Schema` is serde-serializable so engines can
//! ship it between processes inside task configuration.

mod column;
mod data_type;
mod schema;
mod timestamp;
mod value;

pub use column::Column;
pub use data_type::ColumnType;
pub use schema::{Schema, SchemaBuilder};
pub use timestamp::{Timestamp, NANOS_PER_SECOND};
pub use value::Value;
