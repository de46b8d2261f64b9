use std::sync::Arc;

use arena_sight::FrameReport;
use tokio::sync::Notify;
use tokio::sync::broadcast::{self, error::RecvError};

/// Fan-out channel carrying one report per closed frame to every consumer.
#[derive(Clone)]
pub struct ReportBus {
    pub reports_tx: broadcast::Sender<Arc<FrameReport>>,
    /// Signalled by consumers every time they take a report off the channel.
    drained: Arc<Notify>,
    capacity: usize,
}

/// One consumer's end of a `ReportBus`.
pub struct ReportReceiver {
    rx: broadcast::Receiver<Arc<FrameReport>>,
    drained: Arc<Notify>,
}

impl ReportBus {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (reports_tx, _) = broadcast::channel::<Arc<FrameReport>>(capacity);
        Self {
            reports_tx,
            drained: Arc::new(Notify::new()),
            capacity,
        }
    }

    pub fn subscribe(&self) -> ReportReceiver {
        ReportReceiver {
            rx: self.reports_tx.subscribe(),
            drained: Arc::clone(&self.drained),
        }
    }

    /// Publishes a report. While the buffer is full this waits for the slowest
    /// consumer to take a report, so none is overwritten.
    pub async fn publish(&self, report: FrameReport) {
        loop {
            // Registered before the check so a drain in between is not missed.
            let drained = self.drained.notified();
            if self.reports_tx.len() < self.capacity {
                break;
            }
            drained.await;
        }
        if self.reports_tx.send(Arc::new(report)).is_err() {
            log::debug!("report published with no consumer attached");
        }
    }
}

impl ReportReceiver {
    pub async fn recv(&mut self) -> Result<Arc<FrameReport>, RecvError> {
        let received = self.rx.recv().await;
        self.drained.notify_waiters();
        received
    }
}
