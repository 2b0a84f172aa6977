//! Repaint requests from the producer to the presentation layer

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Flag raised after every `write`, polled by the presentation loop
///
/// Cloning shares the same flag, so the producer and the presentation layer
/// each keep a handle.
#[derive(Debug, Clone, Default)]
pub struct RepaintSignal {
    pending: Arc<AtomicBool>,
    requests: Arc<AtomicU64>,
}

impl RepaintSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
    }

    /// Consume a pending request, returning whether one was pending
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Total number of requests ever made
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}
