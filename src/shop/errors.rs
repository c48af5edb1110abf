//! Purchase pipeline error taxonomy
//!
//! Business/validation errors carry human-readable messages and are never
//! retried. Transient RPC trouble is absorbed by the retry executor and
//! only surfaces here once retries are exhausted.

use crate::replay::ReplayedSignature;
use crate::rpc::RpcError;
use crate::tx_builder::TransactionBuilderError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Item {0} is a default item and cannot be purchased")]
    DefaultItem(String),

    #[error("Item {0} is already owned")]
    AlreadyOwned(String),

    #[error("Item requires engage tier {required}, current tier is {current}")]
    TierLocked { required: u8, current: u8 },

    #[error("Invalid wallet address: {0}")]
    InvalidWallet(String),

    #[error("Insufficient balance: need {required} tokens, have {available}")]
    InsufficientBalance { required: u64, available: f64 },

    #[error("Price calculation error for item {0}")]
    PriceCalculation(String),

    #[error("Signature already used")]
    DoubleSpend,

    #[error("Purchase not found: {0}")]
    NotFound(String),

    #[error("Purchase {0} expired")]
    Expired(String),

    #[error("Burn verification failed: {0}")]
    Verification(String),

    #[error("Transaction build failed: {0}")]
    Build(#[from] TransactionBuilderError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl From<ReplayedSignature> for PurchaseError {
    fn from(_: ReplayedSignature) -> Self {
        PurchaseError::DoubleSpend
    }
}

impl PurchaseError {
    /// Hint for callers that may retry after transient trouble.
    /// Business errors never carry one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PurchaseError::Rpc(e) if e.is_retryable() => Some(Duration::from_secs(5)),
            PurchaseError::Build(e) if e.is_retryable() => Some(Duration::from_secs(5)),
            _ => None,
        }
    }

    /// Error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            PurchaseError::UnknownItem(_)
            | PurchaseError::DefaultItem(_)
            | PurchaseError::AlreadyOwned(_)
            | PurchaseError::TierLocked { .. }
            | PurchaseError::InvalidWallet(_) => "validation",
            PurchaseError::InsufficientBalance { .. } => "balance",
            PurchaseError::PriceCalculation(_) => "pricing",
            PurchaseError::DoubleSpend => "double_spend",
            PurchaseError::NotFound(_) => "not_found",
            PurchaseError::Expired(_) => "expired",
            PurchaseError::Verification(_) => "verification",
            PurchaseError::Build(_) => "build",
            PurchaseError::Rpc(_) => "rpc",
        }
    }
}
