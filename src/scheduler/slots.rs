use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

/// Bounded pool of numbered worker slots `1..=size`.
///
/// Acquiring a slot is the only backpressure in a run: once all tokens are
/// out, the dispatch loop waits here until a supervising task hands one back.
#[derive(Debug)]
pub struct SlotPool {
    size: usize,
    rx: mpsc::Receiver<usize>,
    tx: mpsc::Sender<usize>,
    available: Arc<AtomicUsize>,
}

impl SlotPool {
    pub fn new(size: usize) -> Self {
        let (tx, rx) = mpsc::channel(size.max(1));
        for slot in 1..=size {
            // Capacity equals size, so preloading never overflows.
            let _ = tx.try_send(slot);
        }
        Self {
            size,
            rx,
            tx,
            available: Arc::new(AtomicUsize::new(size)),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Tokens currently in the pool.
    pub fn available(&self) -> usize {
        self.available.load(Ordering::SeqCst)
    }

    /// Whether every token has come back.
    pub fn is_full(&self) -> bool {
        self.available() == self.size
    }

    /// Wait for a free slot. Returns `None` only if the pool was built empty.
    pub async fn acquire(&mut self) -> Option<SlotToken> {
        if self.size == 0 {
            return None;
        }
        let slot = self.rx.recv().await?;
        self.available.fetch_sub(1, Ordering::SeqCst);
        Some(SlotToken {
            slot,
            tx: self.tx.clone(),
            available: self.available.clone(),
        })
    }
}

/// A slot held by one job. Dropping the token returns the slot to its pool.
#[derive(Debug)]
pub struct SlotToken {
    slot: usize,
    tx: mpsc::Sender<usize>,
    available: Arc<AtomicUsize>,
}

impl SlotToken {
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl Drop for SlotToken {
    fn drop(&mut self) {
        self.available.fetch_add(1, Ordering::SeqCst);
        if self.tx.try_send(self.slot).is_err() {
            tracing::error!(slot = self.slot, "Slot pool rejected returned token");
        }
    }
}
