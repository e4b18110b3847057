//! # Immutable Flushed Pages
//!
//! A `Page` is one flushed unit of the exchange format: a buffer truncated
//! to its written length plus the two reference lists its fixed region
//! indexes into. Pages are created only by a builder's flush, are never
//! mutated, and are consumed once - either read by a `PageReader` or
//! forwarded by an output to a later stage. Dropping the page releases the
//! buffer back to its allocator.
//!
//! The reference lists are page-scoped: a 4-byte index stored in a record
//! slot addresses this page's list only and is meaningless anywhere else.

use eyre::Result;
use serde_json::Value as JsonValue;

use crate::memory::Buffer;
use crate::page::layout::PAGE_HEADER_SIZE;

#[derive(Debug)]
pub struct Page {
    buffer: Buffer,
    string_references: Vec<String>,
    json_references: Vec<JsonValue>,
}

impl Page {
    pub(crate) fn new(
        buffer: Buffer,
        string_references: Vec<String>,
        json_references: Vec<JsonValue>,
    ) -> Self {
        debug_assert!(buffer.limit() >= PAGE_HEADER_SIZE);
        Self {
            buffer,
            string_references,
            json_references,
        }
    }

    /// Number of whole records in this page, as written in the page header.
    pub fn record_count(&self) -> usize {
        let bytes = self.buffer.as_slice();
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
    }

    /// The written portion of the page buffer.
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub fn string_reference(&self, index: u32) -> Result<&str> {
        self.string_references
            .get(index as usize)
            .map(String::as_str)
            .ok_or_else(|| {
                eyre::eyre!(
                    "string reference {} out of range ({} in page)",
                    index,
                    self.string_references.len()
                )
            })
    }

    pub fn json_reference(&self, index: u32) -> Result<&JsonValue> {
        self.json_references.get(index as usize).ok_or_else(|| {
            eyre::eyre!(
                "json reference {} out of range ({} in page)",
                index,
                self.json_references.len()
            )
        })
    }

    pub fn string_reference_count(&self) -> usize {
        self.string_references.len()
    }

    pub fn json_reference_count(&self) -> usize {
        self.json_references.len()
    }

    /// Returns the page's buffer to its allocator. Equivalent to dropping
    /// the page.
    pub fn release(self) {}
}
