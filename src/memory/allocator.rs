//! # Buffer Allocators
//!
//! Page builders obtain their buffers through the `BufferAllocator` trait so
//! an engine can decide the pooling strategy per execution plan. Allocators
//! are the one shared component that must tolerate concurrent use: every
//! parallel worker owns its own builder, but all builders draw from the same
//! allocator.
//!
//! Two implementations are provided:
//!
//! - `HeapBufferAllocator`: every allocation is a fresh zeroed heap block.
//! - `PooledBufferAllocator`: page-sized allocations are recycled through
//!   lock-sharded free lists; buffers return to their shard when dropped,
//!   so a steady-state pipeline stops allocating entirely.
//!
//! Requests larger than the allocator's page size are served exactly-sized
//! from the heap and are not pooled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::memory::Buffer;

/// Default buffer capacity handed to page builders.
pub const DEFAULT_PAGE_SIZE: usize = 32 * 1024;

/// Number of free-list shards; spreads lock traffic when many workers
/// allocate and release concurrently.
const POOL_SHARD_COUNT: usize = 8;

pub(crate) type FreeList = Mutex<Vec<Box<[u8]>>>;

/// Source of buffers for page builders. Implementations must be safe to
/// share across worker threads.
pub trait BufferAllocator: Send + Sync {
    /// Returns a buffer with capacity of at least `min_capacity`, typically
    /// the allocator's page size.
    fn allocate(&self, min_capacity: usize) -> Buffer;

    fn page_size(&self) -> usize;
}

/// Allocates a fresh heap buffer per request. No reuse.
#[derive(Debug, Clone)]
pub struct HeapBufferAllocator {
    page_size: usize,
}

impl HeapBufferAllocator {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self { page_size }
    }
}

impl Default for HeapBufferAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferAllocator for HeapBufferAllocator {
    fn allocate(&self, min_capacity: usize) -> Buffer {
        Buffer::heap(min_capacity.max(self.page_size))
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}

/// Recycles page-sized buffers through sharded free lists.
///
/// Cloning shares the underlying pool. Released buffers return to the shard
/// they were drawn from.
pub struct PooledBufferAllocator {
    page_size: usize,
    shards: Vec<Arc<FreeList>>,
    next_shard: AtomicUsize,
}

impl PooledBufferAllocator {
    /// Creates a pool with `initial_capacity` buffers of `page_size` bytes
    /// pre-allocated, distributed evenly across shards.
    pub fn new(page_size: usize, initial_capacity: usize) -> Self {
        let shards: Vec<Arc<FreeList>> = (0..POOL_SHARD_COUNT)
            .map(|_| Arc::new(Mutex::new(Vec::new())))
            .collect();

        let per_shard = initial_capacity / POOL_SHARD_COUNT;
        let remainder = initial_capacity % POOL_SHARD_COUNT;
        for (i, shard) in shards.iter().enumerate() {
            let count = per_shard + usize::from(i < remainder);
            let mut guard = shard.lock();
            for _ in 0..count {
                guard.push(vec![0u8; page_size].into_boxed_slice());
            }
        }

        Self {
            page_size,
            shards,
            next_shard: AtomicUsize::new(0),
        }
    }

    /// Buffers currently idle in the pool, across all shards.
    pub fn available(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }
}

impl BufferAllocator for PooledBufferAllocator {
    fn allocate(&self, min_capacity: usize) -> Buffer {
        if min_capacity > self.page_size {
            // Oversized requests bypass the pool; a record wider than the
            // page size needs its own exactly-sized allocation.
            tracing::debug!(min_capacity, page_size = self.page_size, "oversized buffer request");
            return Buffer::heap(min_capacity);
        }

        let shard_idx = self.next_shard.fetch_add(1, Ordering::Relaxed) % POOL_SHARD_COUNT;
        let shard = &self.shards[shard_idx];
        let bytes = shard.lock().pop();
        let bytes = bytes.unwrap_or_else(|| {
            tracing::debug!(page_size = self.page_size, "pool empty, growing");
            vec![0u8; self.page_size].into_boxed_slice()
        });
        Buffer::pooled(bytes, Arc::clone(shard))
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}
