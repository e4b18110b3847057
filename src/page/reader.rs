//! # PageReader - Symmetric Page Decoding
//!
//! `PageReader` walks a flushed page record-by-record, exposing each one as
//! a `RecordView` with typed getters mirroring the builder's setters. The
//! sequence is lazy, finite, and single-pass; re-reading a page means
//! wrapping it in a new reader.
//!
//! ## Usage
//!
//! ```ignore
//! let mut reader = PageReader::new(&schema, &page)?;
//! while let Some(record) = reader.next_record()? {
//!     let id = record.get_long(0)?;
//!     let name = record.get_string(1)?;
//! }
//! ```
//!
//! ## Schema Agreement
//!
//! The reader must be built from a schema structurally equal to the one the
//! page was built with. Construction cross-checks the page length against
//! the schema-derived layout and every record's stored length field, so a
//! mismatched schema faults instead of silently misreading bytes.

use eyre::Result;
use serde_json::Value as JsonValue;
use std::borrow::Cow;

use crate::page::layout::{PageLayout, PAGE_HEADER_SIZE, RECORD_LENGTH_SIZE};
use crate::page::Page;
use crate::types::{ColumnType, Schema, Timestamp, Value};

pub struct PageReader<'a> {
    schema: &'a Schema,
    layout: PageLayout,
    page: &'a Page,
    remaining: usize,
    position: usize,
}

impl<'a> PageReader<'a> {
    pub fn new(schema: &'a Schema, page: &'a Page) -> Result<Self> {
        let layout = PageLayout::new(schema);
        let bytes = page.bytes();
        eyre::ensure!(
            bytes.len() >= PAGE_HEADER_SIZE,
            "page too small for header: {} bytes",
            bytes.len()
        );
        let record_count = page.record_count();
        let expected = PAGE_HEADER_SIZE + record_count * layout.fixed_record_size();
        eyre::ensure!(
            bytes.len() == expected,
            "page length {} does not match layout for {} records of {} bytes; was the page \
             built with a different schema?",
            bytes.len(),
            record_count,
            layout.fixed_record_size()
        );
        Ok(Self {
            schema,
            layout,
            page,
            remaining: record_count,
            position: PAGE_HEADER_SIZE,
        })
    }

    /// Advances to the next record, or returns `None` once every record in
    /// the page has been visited.
    pub fn next_record(&mut self) -> Result<Option<RecordView<'_>>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let bytes = self.page.bytes();
        let record_length = read_i32(bytes, self.position)? as usize;
        eyre::ensure!(
            record_length == self.layout.fixed_record_size(),
            "record length {} does not match schema layout {}",
            record_length,
            self.layout.fixed_record_size()
        );
        let position = self.position;
        self.position += record_length;
        self.remaining -= 1;
        Ok(Some(RecordView {
            schema: self.schema,
            layout: &self.layout,
            page: self.page,
            position,
        }))
    }
}

/// One decoded record position inside a page. Getters check the null bit
/// first; a set bit reads as `None` regardless of the slot bytes beneath.
pub struct RecordView<'r> {
    schema: &'r Schema,
    layout: &'r PageLayout,
    page: &'r Page,
    position: usize,
}

impl<'r> RecordView<'r> {
    fn column_checked(&self, column_index: usize, expected: ColumnType) -> Result<()> {
        let column = self.schema.column(column_index).ok_or_else(|| {
            eyre::eyre!(
                "column index {} out of range for schema with {} columns",
                column_index,
                self.schema.column_count()
            )
        })?;
        eyre::ensure!(
            column.column_type() == expected,
            "type mismatch on column {} '{}': declared {}, requested {}",
            column_index,
            column.name(),
            column.column_type(),
            expected
        );
        Ok(())
    }

    fn null_bit(&self, column_index: usize) -> bool {
        let bitmap_offset = self.position + RECORD_LENGTH_SIZE + (column_index >> 3);
        let byte = self.page.bytes()[bitmap_offset];
        byte & (1 << (column_index & 7)) != 0
    }

    fn slot_offset(&self, column_index: usize) -> usize {
        self.position + self.layout.column_offset(column_index)
    }

    pub fn is_null(&self, column_index: usize) -> Result<bool> {
        eyre::ensure!(
            column_index < self.schema.column_count(),
            "column index {} out of range for schema with {} columns",
            column_index,
            self.schema.column_count()
        );
        Ok(self.null_bit(column_index))
    }

    pub fn get_boolean(&self, column_index: usize) -> Result<Option<bool>> {
        self.column_checked(column_index, ColumnType::Boolean)?;
        if self.null_bit(column_index) {
            return Ok(None);
        }
        let offset = self.slot_offset(column_index);
        Ok(Some(self.page.bytes()[offset] != 0))
    }

    pub fn get_long(&self, column_index: usize) -> Result<Option<i64>> {
        self.column_checked(column_index, ColumnType::Long)?;
        if self.null_bit(column_index) {
            return Ok(None);
        }
        let offset = self.slot_offset(column_index);
        Ok(Some(i64::from_le_bytes(read_array(
            self.page.bytes(),
            offset,
        )?)))
    }

    pub fn get_double(&self, column_index: usize) -> Result<Option<f64>> {
        self.column_checked(column_index, ColumnType::Double)?;
        if self.null_bit(column_index) {
            return Ok(None);
        }
        let offset = self.slot_offset(column_index);
        Ok(Some(f64::from_le_bytes(read_array(
            self.page.bytes(),
            offset,
        )?)))
    }

    pub fn get_string(&self, column_index: usize) -> Result<Option<&'r str>> {
        self.column_checked(column_index, ColumnType::String)?;
        if self.null_bit(column_index) {
            return Ok(None);
        }
        let offset = self.slot_offset(column_index);
        let reference = u32::from_le_bytes(read_array(self.page.bytes(), offset)?);
        self.page.string_reference(reference).map(Some)
    }

    pub fn get_json(&self, column_index: usize) -> Result<Option<&'r JsonValue>> {
        self.column_checked(column_index, ColumnType::Json)?;
        if self.null_bit(column_index) {
            return Ok(None);
        }
        let offset = self.slot_offset(column_index);
        let reference = u32::from_le_bytes(read_array(self.page.bytes(), offset)?);
        self.page.json_reference(reference).map(Some)
    }

    pub fn get_timestamp(&self, column_index: usize) -> Result<Option<Timestamp>> {
        self.column_checked(column_index, ColumnType::Timestamp)?;
        if self.null_bit(column_index) {
            return Ok(None);
        }
        let offset = self.slot_offset(column_index);
        let bytes = self.page.bytes();
        let seconds = i64::from_le_bytes(read_array(bytes, offset)?);
        let nanos = u32::from_le_bytes(read_array(bytes, offset + 8)?);
        Ok(Some(Timestamp::new(seconds, nanos)))
    }

    /// Decodes any column into the tagged union, borrowing reference
    /// payloads from the page.
    pub fn get_value(&self, column_index: usize) -> Result<Value<'r>> {
        let column = self.schema.column(column_index).ok_or_else(|| {
            eyre::eyre!(
                "column index {} out of range for schema with {} columns",
                column_index,
                self.schema.column_count()
            )
        })?;
        if self.null_bit(column_index) {
            return Ok(Value::Null);
        }
        let value = match column.column_type() {
            ColumnType::Boolean => {
                Value::Boolean(self.page.bytes()[self.slot_offset(column_index)] != 0)
            }
            ColumnType::Long => Value::Long(i64::from_le_bytes(read_array(
                self.page.bytes(),
                self.slot_offset(column_index),
            )?)),
            ColumnType::Double => Value::Double(f64::from_le_bytes(read_array(
                self.page.bytes(),
                self.slot_offset(column_index),
            )?)),
            ColumnType::String => {
                let reference = u32::from_le_bytes(read_array(
                    self.page.bytes(),
                    self.slot_offset(column_index),
                )?);
                Value::String(Cow::Borrowed(self.page.string_reference(reference)?))
            }
            ColumnType::Json => {
                let reference = u32::from_le_bytes(read_array(
                    self.page.bytes(),
                    self.slot_offset(column_index),
                )?);
                Value::Json(Cow::Borrowed(self.page.json_reference(reference)?))
            }
            ColumnType::Timestamp => {
                let offset = self.slot_offset(column_index);
                let bytes = self.page.bytes();
                let seconds = i64::from_le_bytes(read_array(bytes, offset)?);
                let nanos = u32::from_le_bytes(read_array(bytes, offset + 8)?);
                Value::Timestamp(Timestamp::new(seconds, nanos))
            }
        };
        Ok(value)
    }
}

fn read_i32(bytes: &[u8], offset: usize) -> Result<i32> {
    Ok(i32::from_le_bytes(read_array(bytes, offset)?))
}

fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N]> {
    bytes
        .get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| eyre::eyre!("read of {} bytes at offset {} runs past page end", N, offset))
}
