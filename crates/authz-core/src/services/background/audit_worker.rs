//! Producer/consumer decoupling for the audit sink (C9)
//!
//! The synchronous request path must never block on a slow durable write:
//! `AsyncAuditLogger::submit` only pushes onto a bounded channel. The
//! background [`AuditWorker`] drains it, retrying the durable sink with
//! backoff and counting drops into a dead-letter queue when attempts are
//! exhausted.

use crate::audit::{AuditSink, PendingAuditRecord};
use crate::resilience::retry::{retry, RetryConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Offloads writes to the background worker via a bounded channel. A full
/// channel means the consumer is falling behind; we drop and count rather
/// than block the request path.
pub struct AsyncAuditLogger {
    sender: mpsc::Sender<PendingAuditRecord>,
    dropped: Arc<AtomicU64>,
}

impl AsyncAuditLogger {
    pub fn new(buffer_size: usize) -> (Self, mpsc::Receiver<PendingAuditRecord>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (
            Self {
                sender: tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn submit(&self, record: PendingAuditRecord) {
        if let Err(e) = self.sender.try_send(record) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(error = %e, "audit channel full, dropping record at the producer");
        }
    }
}

/// Consumes queued records and writes them through a durable [`AuditSink`],
/// retrying with backoff before counting a dead-letter drop. Never panics on
/// a single record's failure — one bad write must not stall the queue.
pub struct AuditWorker {
    receiver: mpsc::Receiver<PendingAuditRecord>,
    sink: Arc<dyn AuditSink>,
    retry_config: RetryConfig,
    dead_letters: Arc<AtomicU64>,
}

impl AuditWorker {
    pub fn new(receiver: mpsc::Receiver<PendingAuditRecord>, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            receiver,
            sink,
            retry_config: RetryConfig::default(),
            dead_letters: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn dead_letter_count(&self) -> Arc<AtomicU64> {
        self.dead_letters.clone()
    }

    pub async fn run(mut self) {
        info!("audit background worker started");
        while let Some(record) = self.receiver.recv().await {
            let sink = self.sink.clone();
            let result = retry(self.retry_config, || {
                let sink = sink.clone();
                let record = record.clone();
                async move { sink.append(record).await }
            })
            .await;

            if let Err(e) = result {
                self.dead_letters.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "audit record exhausted retries, moved to dead-letter counter");
            }
        }
        info!("audit background worker stopped");
    }
}
