//! Store for purchases awaiting on-chain confirmation
//!
//! Owned exclusively by the orchestrator. A record is consumed at most once
//! via the atomic `take`; everything else is a value copy. Expired records
//! are swept every few minutes.

use crate::types::PendingPurchase;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
pub struct PendingPurchaseStore {
    records: DashMap<String, PendingPurchase>,
}

impl PendingPurchaseStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn insert(&self, record: PendingPurchase) {
        self.records.insert(record.purchase_id.clone(), record);
    }

    pub fn get(&self, purchase_id: &str) -> Option<PendingPurchase> {
        self.records.get(purchase_id).map(|r| r.clone())
    }

    /// Atomically remove and return the record. Exactly one caller wins
    /// when confirmations race on the same purchase.
    pub fn take(&self, purchase_id: &str) -> Option<PendingPurchase> {
        self.records.remove(purchase_id).map(|(_, record)| record)
    }

    pub fn remove(&self, purchase_id: &str) {
        self.records.remove(purchase_id);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop expired records; returns how many were dropped
    pub fn sweep(&self) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired());
        before - self.records.len()
    }

    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let dropped = store.sweep();
                if dropped > 0 {
                    debug!(dropped, remaining = store.len(), "Pending purchase sweep");
                }
            }
        })
    }
}
