use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, warn};

use bodega_core::audit::{AuditEntry, AuditSink, AuditStore};

/// Decoupled audit side channel: a bounded queue drained by one writer
/// task. `append` never blocks and never fails the caller; when the queue
/// is full or the writer is gone the entry is dropped with a warning, so a
/// logging fault can never abort a business transaction.
#[derive(Clone)]
pub struct AuditWriter {
    tx: mpsc::Sender<AuditEntry>,
}

impl AuditWriter {
    pub fn spawn(store: Arc<dyn AuditStore>, queue_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<AuditEntry>(queue_capacity);
        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(err) = store.persist_entry(&entry).await {
                    error!("audit entry {} lost: {}", entry.id, err);
                }
            }
        });
        Self { tx }
    }
}

impl AuditSink for AuditWriter {
    fn append(&self, entry: AuditEntry) {
        if let Err(err) = self.tx.try_send(entry) {
            warn!("audit queue rejected an entry: {}", err);
        }
    }
}
