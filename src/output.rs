//! # Page Output Sinks
//!
//! `PageOutput` is the hand-off seam between a page builder and whatever
//! consumes its pages: a filter stage, an output plugin, or a queue into
//! another worker thread. Ownership of each page's buffer passes to the
//! sink with `add`; `finish` signals a clean end of stream and `close`
//! signals an abort.
//!
//! Two sinks are provided:
//!
//! - `PageCollector`: in-process accumulator with a cloneable handle, for
//!   direct consumers and tests.
//! - `ChannelPageOutput`: bounded cross-thread hand-off over a standard
//!   sync channel; the receiving stage drains `Page`s at its own pace and
//!   sees end-of-stream when the sender side is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use eyre::Result;
use parking_lot::Mutex;

use crate::page::Page;

/// Consumer of finished pages. `add` transfers buffer ownership; the
/// builder treats all three calls as opaque and synchronous, so a sink may
/// block on I/O or on a bounded queue.
pub trait PageOutput: Send {
    fn add(&mut self, page: Page) -> Result<()>;

    /// No more pages will arrive; the stream completed normally.
    fn finish(&mut self) -> Result<()>;

    /// Abort signal. May arrive without a prior `finish`.
    fn close(&mut self) -> Result<()>;
}

/// Collects pages in memory behind a cloneable handle.
///
/// The handle half survives the builder taking the sink half, so a test or
/// an in-process consumer can inspect what arrived:
///
/// ```ignore
/// let collector = PageCollector::new();
/// let mut builder = PageBuilder::new(allocator, schema, Box::new(collector.clone()));
/// // ... build ...
/// builder.finish()?;
/// let pages = collector.take_pages();
/// ```
#[derive(Clone, Default)]
pub struct PageCollector {
    inner: Arc<CollectorInner>,
}

#[derive(Default)]
struct CollectorInner {
    pages: Mutex<Vec<Page>>,
    finished: AtomicBool,
    closed: AtomicBool,
}

impl PageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains every collected page out of the sink.
    pub fn take_pages(&self) -> Vec<Page> {
        std::mem::take(&mut *self.inner.pages.lock())
    }

    pub fn page_count(&self) -> usize {
        self.inner.pages.lock().len()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl PageOutput for PageCollector {
    fn add(&mut self, page: Page) -> Result<()> {
        self.inner.pages.lock().push(page);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.finished.store(true, Ordering::Release);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.inner.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Forwards pages into a bounded channel feeding another pipeline stage.
///
/// `finish` and `close` both drop the sender, which the receiving stage
/// observes as channel disconnection - its signal that no more pages will
/// ever arrive.
pub struct ChannelPageOutput {
    sender: Option<mpsc::SyncSender<Page>>,
}

impl ChannelPageOutput {
    pub fn new(sender: mpsc::SyncSender<Page>) -> Self {
        Self {
            sender: Some(sender),
        }
    }
}

impl PageOutput for ChannelPageOutput {
    fn add(&mut self, page: Page) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| eyre::eyre!("page channel is already closed"))?;
        sender
            .send(page)
            .map_err(|_| eyre::eyre!("page channel receiver disconnected"))
    }

    fn finish(&mut self) -> Result<()> {
        self.sender = None;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.sender = None;
        Ok(())
    }
}
