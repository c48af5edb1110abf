//! Common types shared across the burn pipeline

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Kind of token movement a built transaction performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxType {
    /// Irreversible burn (payment path)
    Burn,
    /// Plain transfer to a treasury destination
    Transfer,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Burn => "burn",
            TxType::Transfer => "transfer",
        }
    }
}

/// Inclusion-priority level requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Urgent,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::Low => "low",
            PriorityLevel::Medium => "medium",
            PriorityLevel::High => "high",
            PriorityLevel::Urgent => "urgent",
        }
    }
}

/// Lifecycle of a pending transaction record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Pending,
    Verified,
    Completed,
}

/// Record of an unsigned transaction handed to a client for signing.
///
/// Owned exclusively by the builder's pending store; swept on expiry or
/// shortly after completion.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub id: String,
    pub tx_type: TxType,
    pub wallet: Pubkey,
    /// Whole-token amount the transaction moves
    pub amount: u64,
    pub priority_fee: u64,
    pub blockhash: String,
    pub created_at: u64,
    pub expires_at: Instant,
    pub status: TxStatus,
}

impl PendingTransaction {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Record of a purchase awaiting on-chain confirmation.
///
/// Created by `initiate_purchase`, consumed exactly once by a successful
/// `confirm_purchase`, or swept at expiry.
#[derive(Debug, Clone)]
pub struct PendingPurchase {
    pub purchase_id: String,
    pub wallet: Pubkey,
    pub item: crate::shop::ShopItem,
    /// Price in whole tokens at initiation time
    pub price: u64,
    /// Links back to the builder's pending transaction record
    pub transaction_id: String,
    pub blockhash: String,
    pub last_valid_block_height: u64,
    pub created_at: u64,
    pub expires_at: Instant,
}

impl PendingPurchase {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Builder output returned to the web layer
#[derive(Debug, Clone, Serialize)]
pub struct BuiltTransaction {
    pub transaction_id: String,
    /// Unsigned transaction, bincode-serialized then base64-encoded.
    /// The wallet signs client-side; no key material ever enters this service.
    pub transaction: String,
    /// Priority fee in micro-lamports per compute unit
    pub priority_fee: u64,
    /// Estimated total fee in lamports (signature fee + compute budget)
    pub estimated_fee: u64,
    pub blockhash: String,
    pub last_valid_block_height: u64,
    /// Unix seconds after which the record is swept
    pub expires_at_unix: u64,
}

/// Item summary included in API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: String,
    pub name: String,
    pub tier: u8,
}

/// Response of a successful `initiate_purchase`
#[derive(Debug, Clone, Serialize)]
pub struct InitiatedPurchase {
    pub purchase_id: String,
    pub transaction: BuiltTransaction,
    pub price: u64,
    pub item: ItemSummary,
}

/// Response of a successful `confirm_purchase`
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub success: bool,
    pub item: ItemSummary,
    pub price: u64,
    pub xp_gained: u64,
    pub tx_signature: String,
}

/// Outcome of verifying a submitted burn. Transient, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct BurnVerification {
    pub valid: bool,
    pub actual_amount: Option<f64>,
    pub error: Option<String>,
    pub slot: Option<u64>,
    pub block_time: Option<i64>,
}

impl BurnVerification {
    pub fn ok(actual_amount: f64, slot: u64, block_time: Option<i64>) -> Self {
        Self {
            valid: true,
            actual_amount: Some(actual_amount),
            error: None,
            slot: Some(slot),
            block_time,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            actual_amount: None,
            error: Some(reason.into()),
            slot: None,
            block_time: None,
        }
    }

    /// Rejection that still reports what was actually burned
    pub fn amount_mismatch(actual: f64, expected: f64) -> Self {
        Self {
            valid: false,
            actual_amount: Some(actual),
            error: Some(format!(
                "Amount mismatch: burned {actual}, expected {expected}"
            )),
            slot: None,
            block_time: None,
        }
    }
}

/// Cache key for a wallet's token balance entry
pub fn balance_cache_key(wallet: &Pubkey) -> String {
    format!("balance:{wallet}")
}

/// Current unix time in seconds
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
