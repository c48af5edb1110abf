//! Anti-replay signature ledger
//!
//! One ledger guards all purchases: a signature admitted once is never
//! admitted again, no matter which purchase it is attached to. The
//! check-and-insert is a single atomic entry operation on the sharded map,
//! so two confirmations racing on the same signature cannot both pass.
//! Entries are retained for a configurable window that must comfortably
//! exceed the purchase TTL, then swept to bound memory.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A signature was presented a second time
#[derive(Debug, Clone, Error)]
#[error("Signature already used")]
pub struct ReplayedSignature;

#[derive(Debug)]
pub struct SignatureLedger {
    seen: DashMap<String, Instant>,
    retention: Duration,
}

impl SignatureLedger {
    pub fn new(retention: Duration) -> Self {
        Self {
            seen: DashMap::new(),
            retention,
        }
    }

    /// Admit a signature exactly once.
    ///
    /// Must be called, and the insertion committed, before any purchase
    /// state is mutated: a later failure must leave the signature consumed
    /// so it can never be replayed for a second credit.
    pub fn consume(&self, signature: &str) -> Result<(), ReplayedSignature> {
        match self.seen.entry(signature.to_string()) {
            Entry::Occupied(_) => {
                warn!(signature = %signature, "Replay attempt rejected");
                Err(ReplayedSignature)
            }
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                Ok(())
            }
        }
    }

    /// Whether a signature has been consumed
    pub fn contains(&self, signature: &str) -> bool {
        self.seen.contains_key(signature)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Drop signatures older than the retention window.
    ///
    /// A signature is only exploitable while its purchase could still be
    /// confirmed, so retention only needs to dominate the purchase TTL.
    pub fn sweep(&self) -> usize {
        let before = self.seen.len();
        let retention = self.retention;
        self.seen.retain(|_, inserted| inserted.elapsed() < retention);
        before - self.seen.len()
    }

    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let ledger = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let dropped = ledger.sweep();
                if dropped > 0 {
                    debug!(dropped, remaining = ledger.len(), "Signature ledger sweep");
                }
            }
        })
    }
}
