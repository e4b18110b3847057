//! # datapage - In-Memory Columnar Page Exchange
//!
//! `datapage` is the record exchange format of a pluggable ETL
//! data-movement engine: input plugins write typed rows into fixed-capacity
//! buffers through a `PageBuilder`, and downstream filter/output plugins
//! read the same buffers back through a `PageReader`. Pages are transient,
//! in-memory, single-pass artifacts - this is deliberately not a storage
//! engine and not a general serialization library.
//!
//! ## Quick Start
//!
//! ```ignore
//! use datapage::{ColumnType, HeapBufferAllocator, PageBuilder, PageCollector,
//!                PageReader, Schema};
//! use std::sync::Arc;
//!
//! let schema = Schema::builder()
//!     .add("id", ColumnType::Long)
//!     .add("name", ColumnType::String)
//!     .build();
//!
//! let collector = PageCollector::new();
//! let mut builder = PageBuilder::new(
//!     Arc::new(HeapBufferAllocator::new()),
//!     schema.clone(),
//!     Box::new(collector.clone()),
//! );
//!
//! builder.set_long(0, 1)?;
//! builder.set_string(1, "alice")?;
//! builder.add_record()?;
//! builder.finish()?;
//!
//! for page in collector.take_pages() {
//!     let mut reader = PageReader::new(&schema, &page)?;
//!     while let Some(record) = reader.next_record()? {
//!         println!("{:?} {:?}", record.get_long(0)?, record.get_string(1)?);
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------+
//! |        Producer plugin (one per worker)           |
//! +--------------------------------------------------+
//! |   PageBuilder  (staging row, null bitmap,         |
//! |                 rotation policy)                  |
//! +-------------------+------------------------------+
//! |  BufferAllocator  |  PageOutput sink              |
//! |  (shared, pooled) |  (collector / channel / ...)  |
//! +-------------------+------------------------------+
//! |   Page (immutable buffer + reference lists)       |
//! +--------------------------------------------------+
//! |   PageReader / RecordView (consumer side)         |
//! +--------------------------------------------------+
//! ```
//!
//! ## Module Overview
//!
//! - [`types`]: schema, column types, values, timestamps
//! - [`memory`]: buffers and allocators
//! - [`page`]: the codec - builder, layout, page, reader
//! - [`output`]: sink trait and stock sinks

pub mod memory;
pub mod output;
pub mod page;
pub mod types;

pub use memory::{Buffer, BufferAllocator, HeapBufferAllocator, PooledBufferAllocator};
pub use output::{ChannelPageOutput, PageCollector, PageOutput};
pub use page::{Page, PageBuilder, PageReader, RecordView};
pub use types::{Column, ColumnType, Schema, SchemaBuilder, Timestamp, Value};
