//! Store for transactions handed out but not yet confirmed
//!
//! Owned exclusively by the builder. Records live for a fixed max age and
//! are swept on expiry or shortly after completion.

use crate::types::{PendingTransaction, TxStatus};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
pub struct PendingTransactionStore {
    records: DashMap<String, PendingTransaction>,
}

impl PendingTransactionStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn insert(&self, record: PendingTransaction) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<PendingTransaction> {
        self.records.get(id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Advance a record's status. Returns false when the record is gone
    /// (already swept).
    pub fn mark(&self, id: &str, status: TxStatus) -> bool {
        match self.records.get_mut(id) {
            Some(mut record) => {
                record.status = status;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &str) -> Option<PendingTransaction> {
        self.records.remove(id).map(|(_, record)| record)
    }

    /// Drop expired and completed records; returns how many were dropped
    pub fn sweep(&self) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, record| !record.is_expired() && record.status != TxStatus::Completed);
        before - self.records.len()
    }

    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let dropped = store.sweep();
                if dropped > 0 {
                    debug!(dropped, remaining = store.len(), "Pending transaction sweep");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{now_unix, TxType};
    use solana_sdk::pubkey::Pubkey;
    use std::time::Instant;

    fn record(id: &str, ttl: Duration) -> PendingTransaction {
        PendingTransaction {
            id: id.to_string(),
            tx_type: TxType::Burn,
            wallet: Pubkey::new_unique(),
            amount: 10,
            priority_fee: 10_000,
            blockhash: "hash".to_string(),
            created_at: now_unix(),
            expires_at: Instant::now() + ttl,
            status: TxStatus::Pending,
        }
    }

    #[test]
    fn test_insert_get_remove() {
        let store = PendingTransactionStore::new();
        store.insert(record("tx-1", Duration::from_secs(300)));

        let found = store.get("tx-1").unwrap();
        assert_eq!(found.status, TxStatus::Pending);

        assert!(store.remove("tx-1").is_some());
        assert!(store.get("tx-1").is_none());
    }

    #[test]
    fn test_mark_transitions() {
        let store = PendingTransactionStore::new();
        store.insert(record("tx-1", Duration::from_secs(300)));

        assert!(store.mark("tx-1", TxStatus::Verified));
        assert_eq!(store.get("tx-1").unwrap().status, TxStatus::Verified);

        assert!(store.mark("tx-1", TxStatus::Completed));
        assert!(!store.mark("missing", TxStatus::Verified));
    }

    #[test]
    fn test_sweep_drops_expired_and_completed() {
        let store = PendingTransactionStore::new();
        store.insert(record("expired", Duration::from_millis(0)));
        store.insert(record("completed", Duration::from_secs(300)));
        store.insert(record("live", Duration::from_secs(300)));
        store.mark("completed", TxStatus::Completed);

        std::thread::sleep(Duration::from_millis(5));
        let dropped = store.sweep();
        assert_eq!(dropped, 2);
        assert!(store.get("live").is_some());
        assert_eq!(store.len(), 1);
    }
}
