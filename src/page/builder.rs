//! # PageBuilder - Incremental Page Construction
//!
//! `PageBuilder` is the producer-side half of the codec. Plugin code stages
//! one row at a time through typed setters, then commits it with
//! `add_record`, which serializes the staged values into the current buffer.
//! When the buffer cannot hold another worst-case record plus the
//! accumulated reference payload, the builder flushes it into an immutable
//! `Page`, hands the page to the output sink, and starts a fresh buffer.
//!
//! ## Usage
//!
//! ```ignore
//! let mut builder = PageBuilder::new(allocator, schema, Box::new(output));
//! builder.set_long(0, 42)?;
//! builder.set_string(1, "hello")?;
//! builder.add_record()?;
//! builder.finish()?;
//! ```
//!
//! ## Ownership
//!
//! The accumulating buffer lives in an `Option`; flushing `take`s it into
//! the page, so writing into a buffer that was already handed off is
//! unrepresentable. A new buffer is always allocated after a flush - pages
//! never share memory with the builder.
//!
//! ## Thread Safety
//!
//! A builder is a single-writer object. Run one builder per worker; the
//! shared allocator is the only cross-worker component.

use std::sync::Arc;

use eyre::Result;
use serde_json::Value as JsonValue;
use smallvec::SmallVec;

use crate::memory::{Buffer, BufferAllocator};
use crate::output::PageOutput;
use crate::page::layout::{PageLayout, PAGE_HEADER_SIZE, RECORD_LENGTH_SIZE};
use crate::page::Page;
use crate::types::{ColumnType, Schema, Timestamp, Value};

/// Flat size estimate for a staged JSON value; its real footprint is not
/// known until the consumer serializes it.
const JSON_REFERENCE_SIZE_ESTIMATE: usize = 256;

pub struct PageBuilder {
    allocator: Arc<dyn BufferAllocator>,
    output: Box<dyn PageOutput>,
    schema: Schema,
    layout: PageLayout,

    buffer: Option<Buffer>,
    record_count: usize,
    position: usize,
    null_bits: SmallVec<[u8; 8]>,
    row: Row,
    string_references: Vec<String>,
    json_references: Vec<JsonValue>,
    reference_size: usize,
    finished: bool,
}

impl PageBuilder {
    pub fn new(
        allocator: Arc<dyn BufferAllocator>,
        schema: Schema,
        output: Box<dyn PageOutput>,
    ) -> Self {
        let layout = PageLayout::new(&schema);
        let row = Row::new(schema.column_count());
        let null_bits = SmallVec::from_elem(0xff, layout.null_bitmap_size());
        let mut builder = Self {
            allocator,
            output,
            schema,
            layout,
            buffer: None,
            record_count: 0,
            position: PAGE_HEADER_SIZE,
            null_bits,
            row,
            string_references: Vec::new(),
            json_references: Vec::new(),
            reference_size: 0,
            finished: false,
        };
        builder.new_buffer();
        builder
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn new_buffer(&mut self) {
        let min_capacity = PAGE_HEADER_SIZE + self.layout.fixed_record_size();
        self.buffer = Some(self.allocator.allocate(min_capacity));
        self.record_count = 0;
        self.position = PAGE_HEADER_SIZE;
        self.string_references = Vec::new();
        self.json_references = Vec::new();
        self.reference_size = 0;
    }

    fn staging_checked(&self, column_index: usize, staged: ColumnType) -> Result<()> {
        eyre::ensure!(!self.finished, "page builder is already finished");
        let column = self.schema.column(column_index).ok_or_else(|| {
            eyre::eyre!(
                "column index {} out of range for schema with {} columns",
                column_index,
                self.schema.column_count()
            )
        })?;
        eyre::ensure!(
            column.column_type() == staged,
            "type mismatch on column {} '{}': declared {}, staged {}",
            column_index,
            column.name(),
            column.column_type(),
            staged
        );
        Ok(())
    }

    pub fn set_null(&mut self, column_index: usize) -> Result<()> {
        eyre::ensure!(!self.finished, "page builder is already finished");
        eyre::ensure!(
            column_index < self.schema.column_count(),
            "column index {} out of range for schema with {} columns",
            column_index,
            self.schema.column_count()
        );
        self.row.set(column_index, Value::Null);
        Ok(())
    }

    pub fn set_boolean(&mut self, column_index: usize, value: bool) -> Result<()> {
        self.staging_checked(column_index, ColumnType::Boolean)?;
        self.row.set(column_index, Value::Boolean(value));
        Ok(())
    }

    pub fn set_long(&mut self, column_index: usize, value: i64) -> Result<()> {
        self.staging_checked(column_index, ColumnType::Long)?;
        self.row.set(column_index, Value::Long(value));
        Ok(())
    }

    pub fn set_double(&mut self, column_index: usize, value: f64) -> Result<()> {
        self.staging_checked(column_index, ColumnType::Double)?;
        self.row.set(column_index, Value::Double(value));
        Ok(())
    }

    pub fn set_string(&mut self, column_index: usize, value: impl Into<String>) -> Result<()> {
        self.staging_checked(column_index, ColumnType::String)?;
        self.row.set(column_index, Value::from(value.into()));
        Ok(())
    }

    pub fn set_json(&mut self, column_index: usize, value: JsonValue) -> Result<()> {
        self.staging_checked(column_index, ColumnType::Json)?;
        self.row.set(column_index, Value::from(value));
        Ok(())
    }

    pub fn set_timestamp(&mut self, column_index: usize, value: Timestamp) -> Result<()> {
        self.staging_checked(column_index, ColumnType::Timestamp)?;
        self.row.set(column_index, Value::Timestamp(value));
        Ok(())
    }

    /// Stages any value through one exhaustive dispatch. `Value::Null` is
    /// accepted for every column.
    pub fn set_value(&mut self, column_index: usize, value: Value<'_>) -> Result<()> {
        match value {
            Value::Null => self.set_null(column_index),
            Value::Boolean(v) => self.set_boolean(column_index, v),
            Value::Long(v) => self.set_long(column_index, v),
            Value::Double(v) => self.set_double(column_index, v),
            Value::String(v) => self.set_string(column_index, v),
            Value::Json(v) => self.set_json(column_index, v.into_owned()),
            Value::Timestamp(v) => self.set_timestamp(column_index, v),
        }
    }

    /// Commits the staged row into the current buffer and resets the
    /// staging area. Flushes first if the buffer could not hold a further
    /// worst-case record on top of this one.
    pub fn add_record(&mut self) -> Result<()> {
        eyre::ensure!(!self.finished, "page builder is already finished");
        let buffer = self
            .buffer
            .as_mut()
            .ok_or_else(|| eyre::eyre!("page builder is closed"))?;
        let capacity = buffer.capacity();
        let position = self.position;

        for index in 0..self.row.slots.len() {
            let value = self.row.take(index);
            let offset = position + self.layout.column_offset(index);
            match value {
                Value::Null => continue,
                Value::Boolean(v) => buffer.put_u8(offset, v as u8),
                Value::Long(v) => buffer.put_i64(offset, v),
                Value::Double(v) => buffer.put_f64(offset, v),
                Value::String(v) => {
                    let reference = self.string_references.len() as u32;
                    let v = v.into_owned();
                    // Reference payload is estimated, not measured: two
                    // bytes per byte of text plus a length word. Only the
                    // rotation decision consumes this number.
                    self.reference_size += v.len() * 2 + 4;
                    self.string_references.push(v);
                    buffer.put_u32(offset, reference);
                }
                Value::Json(v) => {
                    let reference = self.json_references.len() as u32;
                    self.json_references.push(v.into_owned());
                    self.reference_size += JSON_REFERENCE_SIZE_ESTIMATE;
                    buffer.put_u32(offset, reference);
                }
                Value::Timestamp(v) => {
                    buffer.put_i64(offset, v.epoch_seconds());
                    buffer.put_u32(offset + 8, v.nanos());
                }
            }
            self.null_bits[index >> 3] &= !(1 << (index & 7));
        }

        let record_size = self.layout.fixed_record_size();
        buffer.put_i32(position, record_size as i32);
        buffer.put_slice(position + RECORD_LENGTH_SIZE, &self.null_bits);

        self.record_count += 1;
        self.position += record_size;
        self.null_bits.fill(0xff);

        // Rotate early: the next record is assumed worst-case, and the
        // accumulated reference estimate counts against the same budget.
        if capacity < self.position + record_size + self.reference_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush_page(&mut self) -> Result<()> {
        if self.record_count == 0 {
            return Ok(());
        }
        if let Some(mut buffer) = self.buffer.take() {
            buffer.put_i32(0, self.record_count as i32);
            buffer.set_limit(self.position);
            tracing::debug!(
                records = self.record_count,
                bytes = self.position,
                strings = self.string_references.len(),
                "page flushed to output"
            );
            let page = Page::new(
                buffer,
                std::mem::take(&mut self.string_references),
                std::mem::take(&mut self.json_references),
            );
            self.output.add(page)?;
        }
        Ok(())
    }

    /// Emits the current buffer as a page if it holds at least one record,
    /// then ensures a fresh buffer. Flushing an empty buffer is a no-op.
    pub fn flush(&mut self) -> Result<()> {
        eyre::ensure!(!self.finished, "page builder is already finished");
        self.flush_page()?;
        if self.buffer.is_none() {
            self.new_buffer();
        }
        Ok(())
    }

    /// Flushes pending records and signals completion to the output sink.
    /// No further staging or commits are valid afterwards.
    pub fn finish(&mut self) -> Result<()> {
        eyre::ensure!(!self.finished, "page builder is already finished");
        self.flush_page()?;
        self.finished = true;
        self.output.finish()
    }

    /// Abort path: releases the accumulating buffer without flushing -
    /// uncommitted rows and committed-but-unflushed records are discarded -
    /// then closes the output sink. Safe to call after `finish`.
    pub fn close(&mut self) -> Result<()> {
        if let Some(buffer) = self.buffer.take() {
            if self.record_count > 0 {
                tracing::debug!(
                    discarded = self.record_count,
                    "releasing buffer without flush"
                );
            }
            buffer.release();
        }
        self.output.close()
    }
}

/// Staging area between setter calls and `add_record`.
///
/// Holds exactly one value per column; setting a column twice before a
/// commit overwrites the earlier value. Committing drains every slot back
/// to `Null`, so the row is reused across records without reallocation.
struct Row {
    slots: Vec<Value<'static>>,
}

impl Row {
    fn new(column_count: usize) -> Self {
        Self {
            slots: vec![Value::Null; column_count],
        }
    }

    fn set(&mut self, index: usize, value: Value<'static>) {
        self.slots[index] = value;
    }

    fn take(&mut self, index: usize) -> Value<'static> {
        std::mem::replace(&mut self.slots[index], Value::Null)
    }
}
