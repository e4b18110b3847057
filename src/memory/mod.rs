//! # Buffer Memory Management
//!
//! Buffers are the capacity-bounded byte regions pages are built into. A
//! builder owns exactly one accumulating buffer at a time; flushing moves it
//! into an immutable page, and a fresh buffer is allocated for the next
//! batch of records. Ownership is always exclusive, so the transfer chain
//! is `allocator -> builder -> page -> consumer -> (drop) -> allocator`.
//!
//! The `BufferAllocator` trait is the injection point for pooling policy:
//! `HeapBufferAllocator` for one-shot tools, `PooledBufferAllocator` for
//! long-running pipelines where buffer recycling keeps steady-state
//! allocation at zero.

mod allocator;
mod buffer;

pub use allocator::{BufferAllocator, HeapBufferAllocator, PooledBufferAllocator, DEFAULT_PAGE_SIZE};
pub use buffer::Buffer;
