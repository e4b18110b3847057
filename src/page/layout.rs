//! # Page Binary Layout
//!
//! Layout math for the page wire shape, derived once per schema and cached.
//!
//! ```text
//! +-------------------+--------------------------------------------+
//! | Page Header       | Records                                    |
//! | (i32 record count)| record, record, ...                        |
//! +-------------------+--------------------------------------------+
//!
//! record:
//! +-------------------+------------------+-------------------------+
//! | Record Length     | Null Bitmap      | Fixed Column Slots      |
//! | (i32)             | [u8; (N+7)/8]    | one slot per column     |
//! +-------------------+------------------+-------------------------+
//! ```
//!
//! Every record in a page has the same byte length: the record header plus
//! the sum of per-type slot sizes. String and JSON slots hold 4-byte
//! indices into the page's out-of-band reference lists, so the fixed region
//! never grows with value size and slot offsets are knowable up front.
//!
//! All multi-byte fields are little-endian.

use crate::types::Schema;

/// Bytes reserved at the front of a page for the record count.
pub const PAGE_HEADER_SIZE: usize = 4;

/// Bytes of the per-record length field.
pub const RECORD_LENGTH_SIZE: usize = 4;

/// Per-schema layout: byte offsets of each column slot relative to the
/// start of a record, plus derived sizes.
#[derive(Debug, Clone)]
pub struct PageLayout {
    column_offsets: Vec<usize>,
    null_bitmap_size: usize,
    fixed_record_size: usize,
}

impl PageLayout {
    pub fn new(schema: &Schema) -> Self {
        let null_bitmap_size = Self::null_bitmap_size_for(schema.column_count());
        let mut column_offsets = Vec::with_capacity(schema.column_count());
        let mut offset = RECORD_LENGTH_SIZE + null_bitmap_size;
        for column in schema.columns() {
            column_offsets.push(offset);
            offset += column.column_type().slot_size();
        }
        Self {
            column_offsets,
            null_bitmap_size,
            fixed_record_size: offset,
        }
    }

    pub fn null_bitmap_size_for(column_count: usize) -> usize {
        column_count.div_ceil(8)
    }

    /// Offset of column `index`'s slot from the start of a record.
    pub fn column_offset(&self, index: usize) -> usize {
        self.column_offsets[index]
    }

    pub fn null_bitmap_size(&self) -> usize {
        self.null_bitmap_size
    }

    pub fn record_header_size(&self) -> usize {
        RECORD_LENGTH_SIZE + self.null_bitmap_size
    }

    /// Full byte length of one record: header plus every column slot.
    pub fn fixed_record_size(&self) -> usize {
        self.fixed_record_size
    }
}
