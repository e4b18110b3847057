//! # Column Type System
//!
//! This module provides the closed `ColumnType` enum shared by every stage of
//! a data-movement pipeline. A page schema is a flat list of these types;
//! both the page builder and the page reader derive their binary layout from
//! them, so the set is intentionally small and fixed.
//!
//! ## Fixed Slot Footprints
//!
//! Every type occupies a fixed number of bytes inside a record's fixed
//! region. Variable-length values (strings, JSON) do not inline their
//! payload; their slot holds a 4-byte index into a page-scoped reference
//! list instead.
//!
//! | Type | Slot size (bytes) | Contents |
//! |------|-------------------|----------|
//! | Boolean | 1 | 0 or 1 |
//! | Long | 8 | signed 64-bit integer |
//! | Double | 8 | IEEE-754 binary64 |
//! | String | 4 | index into the page's string reference list |
//! | Json | 4 | index into the page's JSON reference list |
//! | Timestamp | 12 | 8-byte epoch seconds + 4-byte nanosecond fraction |
//!
//! ## Storage Encoding
//!
//! `#[repr(u8)]` keeps the discriminant in a single byte, and the serde
//! representation is the lowercase type name so schemas serialize compactly
//! inside task configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of column types understood by the page codec.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Boolean = 0,
    Long = 1,
    Double = 2,
    String = 3,
    Json = 4,
    Timestamp = 5,
}

impl ColumnType {
    /// Returns the byte footprint of this type's slot in a record's fixed
    /// region. Reference types (String, Json) count the 4-byte index, not
    /// the referenced payload.
    pub fn slot_size(&self) -> usize {
        match self {
            ColumnType::Boolean => 1,
            ColumnType::Long => 8,
            ColumnType::Double => 8,
            ColumnType::String => 4,
            ColumnType::Json => 4,
            ColumnType::Timestamp => 12,
        }
    }

    /// Returns true if values of this type are stored out-of-band in a
    /// page reference list rather than inline in the fixed region.
    pub fn is_reference(&self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Json)
    }

    /// Lowercase type name as it appears in serialized schemas.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Long => "long",
            ColumnType::Double => "double",
            ColumnType::String => "string",
            ColumnType::Json => "json",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for ColumnType {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ColumnType::Boolean),
            1 => Ok(ColumnType::Long),
            2 => Ok(ColumnType::Double),
            3 => Ok(ColumnType::String),
            4 => Ok(ColumnType::Json),
            5 => Ok(ColumnType::Timestamp),
            _ => eyre::bail!("invalid ColumnType discriminant: {}", value),
        }
    }
}
