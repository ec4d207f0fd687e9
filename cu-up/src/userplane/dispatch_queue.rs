//! dispatch_queue - bounded per-tunnel queue drained in batches on the tunnel's executor

use crate::executor::TaskExecutor;
use async_channel::{Receiver, Sender, TrySendError};
use atomic_counter::{AtomicCounter, RelaxedCounter};
use gtpu::GtpTeid;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// A received datagram on its way to a tunnel.
#[derive(Debug)]
pub struct PduContext {
    pub pdu: Vec<u8>,
    pub src: SocketAddr,
}

pub(crate) type PduHandler = Box<dyn Fn(PduContext) + Send + Sync>;

#[derive(Default)]
struct QueueStats {
    pushed: RelaxedCounter,
    dropped: RelaxedCounter,
}

pub(crate) struct DispatchQueue {
    sender: Sender<PduContext>,
    receiver: Receiver<PduContext>,
    executor: Arc<dyn TaskExecutor>,
    batch_size: usize,
    // Set while a batch task is scheduled or running.
    dispatch_pending: AtomicBool,
    handler: PduHandler,
    stats: Arc<QueueStats>,
}

impl DispatchQueue {
    /// `queue_size` and `batch_size` must be non-zero.
    pub fn new(
        queue_size: usize,
        batch_size: usize,
        executor: Arc<dyn TaskExecutor>,
        handler: PduHandler,
    ) -> Arc<Self> {
        let (sender, receiver) = async_channel::bounded(queue_size);
        Arc::new(DispatchQueue {
            sender,
            receiver,
            executor,
            batch_size,
            dispatch_pending: AtomicBool::new(false),
            handler,
            stats: Arc::new(QueueStats::default()),
        })
    }

    pub fn handle(self: &Arc<Self>, teid: GtpTeid) -> DispatchQueueHandle {
        DispatchQueueHandle {
            teid,
            capacity: self.sender.capacity().unwrap_or(0),
            queue: Arc::downgrade(self),
            stats: self.stats.clone(),
        }
    }

    /// Enqueue without blocking.  Returns false, dropping the PDU, if the queue is full.
    pub fn try_push(self: &Arc<Self>, pdu_ctx: PduContext) -> bool {
        match self.sender.try_send(pdu_ctx) {
            Ok(()) => {
                self.stats.pushed.inc();
                self.schedule();
                true
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                self.stats.dropped.inc();
                false
            }
        }
    }

    fn schedule(self: &Arc<Self>) {
        if self.dispatch_pending.swap(true, Ordering::SeqCst) {
            return;
        }
        let queue = self.clone();
        if !self.executor.defer(Box::new(move || queue.run_batch())) {
            // Leave the PDUs queued; the next push tries again.
            self.dispatch_pending.store(false, Ordering::SeqCst);
        }
    }

    fn run_batch(self: &Arc<Self>) {
        for _ in 0..self.batch_size {
            let Ok(pdu_ctx) = self.receiver.try_recv() else {
                break;
            };
            (self.handler)(pdu_ctx);
        }
        self.dispatch_pending.store(false, Ordering::SeqCst);

        // A push that saw dispatch_pending set before it was cleared left work behind.
        if !self.receiver.is_empty() {
            self.schedule();
        }
    }
}

/// Observer of a tunnel's dispatch queue, returned when the tunnel is added.
#[derive(Clone)]
pub struct DispatchQueueHandle {
    teid: GtpTeid,
    capacity: usize,
    queue: Weak<DispatchQueue>,
    stats: Arc<QueueStats>,
}

impl DispatchQueueHandle {
    pub fn teid(&self) -> GtpTeid {
        self.teid
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// PDUs waiting for dispatch.  0 once the tunnel has gone and its queue has drained.
    pub fn depth(&self) -> usize {
        self.queue.upgrade().map_or(0, |q| q.receiver.len())
    }

    pub fn pushed(&self) -> usize {
        self.stats.pushed.get()
    }

    pub fn dropped(&self) -> usize {
        self.stats.dropped.get()
    }
}

impl std::fmt::Debug for DispatchQueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchQueueHandle")
            .field("teid", &self.teid)
            .field("capacity", &self.capacity)
            .field("depth", &self.depth())
            .field("dropped", &self.dropped())
            .finish()
    }
}
