//! # Capacity-Bounded Byte Buffers
//!
//! A `Buffer` is the byte region a page builder accumulates records into.
//! It is exclusively owned: the builder holds it while accumulating, then
//! moves it into a `Page` at flush, which moves it onward to whatever
//! consumes the page. Dropping a buffer releases its memory; buffers that
//! came from a pooled allocator return to the pool's free list instead of
//! the heap.
//!
//! The `limit` marks the logical end of written data. While accumulating it
//! equals the capacity; flushing truncates it to the bytes actually written
//! so readers never walk past the last committed record.
//!
//! `ManuallyDrop` keeps the backing allocation always-valid until `Drop`
//! runs, where it is either handed back to the owning free list or freed.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use crate::memory::allocator::FreeList;

pub struct Buffer {
    bytes: ManuallyDrop<Box<[u8]>>,
    limit: usize,
    pool: Option<Arc<FreeList>>,
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("capacity", &self.bytes.len())
            .field("limit", &self.limit)
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}

impl Buffer {
    /// Wraps a plain heap allocation of exactly `capacity` zeroed bytes.
    pub(crate) fn heap(capacity: usize) -> Self {
        Self {
            bytes: ManuallyDrop::new(vec![0u8; capacity].into_boxed_slice()),
            limit: capacity,
            pool: None,
        }
    }

    /// Wraps bytes drawn from a pooled allocator; the allocation returns to
    /// `pool` when this buffer (or the page that inherits it) is dropped.
    pub(crate) fn pooled(bytes: Box<[u8]>, pool: Arc<FreeList>) -> Self {
        let limit = bytes.len();
        Self {
            bytes: ManuallyDrop::new(bytes),
            limit,
            pool: Some(pool),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Logical end of written data; `as_slice` stops here.
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub(crate) fn set_limit(&mut self, limit: usize) {
        debug_assert!(limit <= self.bytes.len());
        self.limit = limit;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.limit]
    }

    /// Returns the memory to its allocator. Equivalent to dropping the
    /// buffer; named so abort paths read as an explicit release.
    pub fn release(self) {}

    pub(crate) fn put_u8(&mut self, offset: usize, value: u8) {
        self.bytes[offset] = value;
    }

    pub(crate) fn put_i32(&mut self, offset: usize, value: i32) {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_u32(&mut self, offset: usize, value: u32) {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_i64(&mut self, offset: usize, value: i64) {
        self.bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_f64(&mut self, offset: usize, value: f64) {
        self.bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_slice(&mut self, offset: usize, data: &[u8]) {
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // SAFETY: drop runs exactly once and the allocation is valid until
        // this point; after take() the field is never touched again.
        let bytes = unsafe { ManuallyDrop::take(&mut self.bytes) };
        if let Some(pool) = self.pool.take() {
            pool.lock().push(bytes);
        }
    }
}
