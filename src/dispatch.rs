//! Delivery of callbacks onto the owning context.
//!
//! Reader threads never run user callbacks themselves; they submit an
//! action to a [`Dispatcher`]. The shipped dispatcher is the sending half
//! of an unbounded queue whose receiving half, [`OwningContext`], is pumped
//! by whoever owns the scanner: a UI loop calling [`OwningContext::run_pending`],
//! an async task awaiting [`OwningContext::run_next`], or a dedicated
//! [`ContextThread`]. Actions run one at a time in submission order.
//!
//! Once the owning context is dropped, submitted actions are discarded.

use std::io;
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::mpsc;
use tracing::trace;

/// A unit of work for the owning context.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Accepts actions to run later on the owning context.
///
/// `submit` is called from a port's listener thread and should hand the
/// action off rather than run it. An implementation that runs actions inline
/// blocks that listener for as long as the callback takes, and a `close`
/// issued from such a callback returns without waiting for the release.
pub trait Dispatcher: Send + Sync {
    fn submit(&self, action: Action);
}

/// Sending half of an owning context. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ContextHandle {
    tx: mpsc::UnboundedSender<Action>,
}

impl ContextHandle {
    /// Whether the owning context is still accepting actions.
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl Dispatcher for ContextHandle {
    fn submit(&self, action: Action) {
        if self.tx.send(action).is_err() {
            trace!("Owning context is gone; dropping action");
        }
    }
}

/// Receiving half: runs queued actions on the thread that pumps it.
#[derive(Debug)]
pub struct OwningContext {
    rx: mpsc::UnboundedReceiver<Action>,
}

impl OwningContext {
    /// Create a context and the handle used to submit to it.
    pub fn new() -> (Self, ContextHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, ContextHandle { tx })
    }

    /// Run every action queued so far without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(action) = self.rx.try_recv() {
            action();
            ran += 1;
        }
        ran
    }

    /// Wait for the next action and run it.
    ///
    /// Returns `false` once every handle has been dropped and the queue is empty.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    /// Run actions until every handle has been dropped.
    pub async fn run(mut self) {
        while self.run_next().await {}
    }

    /// Blocking variant of [`run`](Self::run) for plain threads.
    ///
    /// Must not be called from inside an async runtime.
    pub fn run_blocking(mut self) {
        while let Some(action) = self.rx.blocking_recv() {
            action();
        }
    }
}

/// An owning context on its own thread.
#[derive(Debug)]
pub struct ContextThread {
    handle: ContextHandle,
    thread: JoinHandle<()>,
}

impl ContextThread {
    /// Spawn a named thread that runs submitted actions.
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let (context, handle) = OwningContext::new();
        let thread = thread::Builder::new()
            .name(name.into())
            .spawn(move || context.run_blocking())?;
        Ok(Self { handle, thread })
    }

    /// A dispatcher feeding this thread.
    pub fn handle(&self) -> ContextHandle {
        self.handle.clone()
    }

    /// Id of the thread actions run on.
    pub fn thread_id(&self) -> ThreadId {
        self.thread.thread().id()
    }

    /// Stop accepting work from this value and wait for the thread to drain.
    ///
    /// Blocks until every other [`ContextHandle`] clone is dropped too.
    pub fn join(self) {
        let Self { handle, thread } = self;
        drop(handle);
        let _ = thread.join();
    }
}
