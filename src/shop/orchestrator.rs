//! Purchase orchestration
//!
//! The top-level state machine tying the pipeline together. Initiation
//! validates access, prices the item against live supply, checks balance
//! and hands back an unsigned burn transaction. Confirmation consumes the
//! signature in the anti-replay ledger before any other side effect, then
//! verifies the burn on-chain and credits the item.
//!
//! Per purchase: INITIATED -> (client signs and submits off-system)
//! -> CONFIRMING -> COMPLETED | REJECTED | EXPIRED.

use crate::audit::AuditSink;
use crate::metrics::Metrics;
use crate::replay::SignatureLedger;
use crate::rpc::{ChainGateway, ResponseCache};
use crate::shop::catalog::{apply_discount, calculate_price, can_access_tier, Catalog};
use crate::shop::errors::PurchaseError;
use crate::shop::pending::PendingPurchaseStore;
use crate::tx_builder::{BuildOptions, TransactionBuilder};
use crate::types::{
    balance_cache_key, now_unix, InitiatedPurchase, PendingPurchase, PriorityLevel,
    PurchaseReceipt, TxStatus, TxType,
};
use crate::verify::TransactionVerifier;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

const SUPPLY_CACHE_KEY: &str = "token_supply";

/// Scalar settings for the purchase pipeline
#[derive(Debug, Clone)]
pub struct PurchaseSettings {
    pub mint: Pubkey,
    /// Pricing denominator in whole tokens
    pub initial_supply: f64,
    pub purchase_ttl: Duration,
    pub balance_ttl: Duration,
    pub supply_ttl: Duration,
}

pub struct PurchaseService {
    catalog: Catalog,
    gateway: Arc<dyn ChainGateway>,
    builder: Arc<TransactionBuilder>,
    verifier: Arc<TransactionVerifier>,
    ledger: Arc<SignatureLedger>,
    pending: Arc<PendingPurchaseStore>,
    balances: Arc<ResponseCache<f64>>,
    supply: Arc<ResponseCache<f64>>,
    audit: Arc<dyn AuditSink>,
    metrics: Arc<Metrics>,
    settings: PurchaseSettings,
}

impl PurchaseService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Catalog,
        gateway: Arc<dyn ChainGateway>,
        builder: Arc<TransactionBuilder>,
        verifier: Arc<TransactionVerifier>,
        ledger: Arc<SignatureLedger>,
        pending: Arc<PendingPurchaseStore>,
        balances: Arc<ResponseCache<f64>>,
        supply: Arc<ResponseCache<f64>>,
        audit: Arc<dyn AuditSink>,
        metrics: Arc<Metrics>,
        settings: PurchaseSettings,
    ) -> Self {
        Self {
            catalog,
            gateway,
            builder,
            verifier,
            ledger,
            pending,
            balances,
            supply,
            audit,
            metrics,
            settings,
        }
    }

    pub fn pending_store(&self) -> Arc<PendingPurchaseStore> {
        Arc::clone(&self.pending)
    }

    pub fn signature_ledger(&self) -> Arc<SignatureLedger> {
        Arc::clone(&self.ledger)
    }

    /// Validate access, price the item and hand back an unsigned burn
    /// transaction for client-side signing.
    pub async fn initiate_purchase(
        &self,
        wallet: &str,
        item_id: &str,
        engage_tier: u8,
        owned_items: &[String],
    ) -> Result<InitiatedPurchase, PurchaseError> {
        let wallet = Pubkey::from_str(wallet)
            .map_err(|_| PurchaseError::InvalidWallet(wallet.to_string()))?;

        let item = self
            .catalog
            .get(item_id)
            .ok_or_else(|| PurchaseError::UnknownItem(item_id.to_string()))?
            .clone();

        // Tier-0 items are gate-only: priced to zero, never purchasable
        if item.default_item || item.tier == 0 {
            return Err(PurchaseError::DefaultItem(item.id));
        }
        if owned_items.iter().any(|owned| owned == &item.id) {
            return Err(PurchaseError::AlreadyOwned(item.id));
        }
        if !can_access_tier(item.tier, engage_tier) {
            return Err(PurchaseError::TierLocked {
                required: item.tier.saturating_sub(2).min(4),
                current: engage_tier,
            });
        }

        let supply = self.current_supply().await?;
        let base_price = calculate_price(item.tier, supply, self.settings.initial_supply);
        let price = apply_discount(base_price, engage_tier);
        // A free paid-item would break the economic model
        if price == 0 {
            return Err(PurchaseError::PriceCalculation(item.id));
        }

        let balance = self.wallet_balance(&wallet).await?;
        if balance < price as f64 {
            return Err(PurchaseError::InsufficientBalance {
                required: price,
                available: balance,
            });
        }

        let timer = self.metrics.build_latency.start_timer();
        let transaction = self
            .builder
            .build(
                TxType::Burn,
                wallet,
                price,
                BuildOptions {
                    priority: PriorityLevel::High,
                    recipient: None,
                },
            )
            .await?;
        timer.observe_duration();

        let purchase_id = Uuid::new_v4().to_string();
        self.pending.insert(PendingPurchase {
            purchase_id: purchase_id.clone(),
            wallet,
            item: item.clone(),
            price,
            transaction_id: transaction.transaction_id.clone(),
            blockhash: transaction.blockhash.clone(),
            last_valid_block_height: transaction.last_valid_block_height,
            created_at: now_unix(),
            expires_at: Instant::now() + self.settings.purchase_ttl,
        });

        self.metrics.purchases_initiated.inc();
        self.metrics
            .pending_purchases
            .set(self.pending.len() as i64);

        info!(
            purchase_id = %purchase_id,
            wallet = %wallet,
            item = %item.id,
            price,
            engage_tier,
            "Purchase initiated"
        );
        self.audit.record(
            "purchase_initiated",
            json!({
                "purchase_id": purchase_id,
                "wallet": wallet.to_string(),
                "item": item.id,
                "price": price,
                "engage_tier": engage_tier,
            }),
        );

        Ok(InitiatedPurchase {
            purchase_id,
            price,
            item: item.summary(),
            transaction,
        })
    }

    /// Verify the submitted burn and credit the item.
    ///
    /// The signature is consumed in the anti-replay ledger before anything
    /// else, so a failed verification still burns the signature and it can
    /// never be retried against a different purchase.
    pub async fn confirm_purchase(
        &self,
        purchase_id: &str,
        signature: &str,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        if let Err(replayed) = self.ledger.consume(signature) {
            self.metrics.replay_attempts.inc();
            return Err(replayed.into());
        }
        self.metrics.used_signatures.set(self.ledger.len() as i64);

        let purchase = self
            .pending
            .get(purchase_id)
            .ok_or_else(|| PurchaseError::NotFound(purchase_id.to_string()))?;

        if purchase.is_expired() {
            self.pending.remove(purchase_id);
            self.metrics
                .pending_purchases
                .set(self.pending.len() as i64);
            return Err(PurchaseError::Expired(purchase_id.to_string()));
        }

        let timer = self.metrics.verify_latency.start_timer();
        let verification = self
            .verifier
            .verify_burn(signature, &purchase.wallet, purchase.price as f64)
            .await?;
        timer.observe_duration();

        if !verification.valid {
            let reason = verification
                .error
                .unwrap_or_else(|| "Verification failed".to_string());
            self.metrics.purchases_rejected.inc();
            warn!(
                purchase_id = %purchase_id,
                wallet = %purchase.wallet,
                reason = %reason,
                "Purchase rejected"
            );
            self.audit.record(
                "purchase_rejected",
                json!({
                    "purchase_id": purchase_id,
                    "wallet": purchase.wallet.to_string(),
                    "signature": signature,
                    "reason": reason,
                }),
            );
            return Err(PurchaseError::Verification(reason));
        }

        // Atomic consumption: if a racing confirmation won, this purchase
        // is already credited and gone
        let purchase = self
            .pending
            .take(purchase_id)
            .ok_or_else(|| PurchaseError::NotFound(purchase_id.to_string()))?;
        self.builder
            .pending_store()
            .mark(&purchase.transaction_id, TxStatus::Completed);
        self.metrics
            .pending_purchases
            .set(self.pending.len() as i64);

        // XP is 1:1 with the burned amount
        let xp_gained = purchase.price;
        self.metrics.purchases_completed.inc();

        info!(
            purchase_id = %purchase_id,
            wallet = %purchase.wallet,
            item = %purchase.item.id,
            price = purchase.price,
            xp_gained,
            signature = %signature,
            "Purchase completed"
        );
        self.audit.record(
            "purchase_completed",
            json!({
                "purchase_id": purchase_id,
                "wallet": purchase.wallet.to_string(),
                "item": purchase.item.id,
                "price": purchase.price,
                "xp_gained": xp_gained,
                "signature": signature,
            }),
        );

        Ok(PurchaseReceipt {
            success: true,
            item: purchase.item.summary(),
            price: purchase.price,
            xp_gained,
            tx_signature: signature.to_string(),
        })
    }

    async fn current_supply(&self) -> Result<f64, PurchaseError> {
        if let Some(cached) = self.supply.get(SUPPLY_CACHE_KEY) {
            return Ok(cached);
        }
        let supply = self.gateway.token_supply(&self.settings.mint).await?;
        self.supply
            .set(SUPPLY_CACHE_KEY, supply, self.settings.supply_ttl);
        Ok(supply)
    }

    async fn wallet_balance(&self, wallet: &Pubkey) -> Result<f64, PurchaseError> {
        let key = balance_cache_key(wallet);
        if let Some(cached) = self.balances.get(&key) {
            return Ok(cached);
        }
        let balance = self
            .gateway
            .token_balance(wallet, &self.settings.mint)
            .await?;
        self.balances.set(key, balance, self.settings.balance_ttl);
        Ok(balance)
    }
}
