//! Core transaction building
//!
//! Assembles the instruction plan, fetches a recent blockhash through the
//! retrying gateway, serializes an unsigned transaction for client-side
//! signing and records a short-lived pending transaction. No private key
//! ever enters this path; the fee payer is the purchasing wallet.

use crate::audit::AuditSink;
use crate::fees::PriorityFeeEstimator;
use crate::rpc::ChainGateway;
use crate::tx_builder::errors::TransactionBuilderError;
use crate::tx_builder::instructions::{
    burn_instruction, plan_instructions, sanity_check_ix_order, transfer_instruction,
};
use crate::tx_builder::pending::PendingTransactionStore;
use crate::types::{now_unix, BuiltTransaction, PendingTransaction, PriorityLevel, TxStatus, TxType};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::json;
use solana_sdk::{message::Message, pubkey::Pubkey, transaction::Transaction};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

/// Lamports charged per signature by the runtime
const SIGNATURE_FEE_LAMPORTS: u64 = 5_000;

/// Per-build options
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub priority: PriorityLevel,
    /// Required for transfers, ignored for burns
    pub recipient: Option<Pubkey>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            priority: PriorityLevel::Medium,
            recipient: None,
        }
    }
}

pub struct TransactionBuilder {
    gateway: Arc<dyn ChainGateway>,
    fees: Arc<PriorityFeeEstimator>,
    pending: Arc<PendingTransactionStore>,
    audit: Arc<dyn AuditSink>,
    mint: Pubkey,
    decimals: u8,
    cu_limit: u32,
    pending_ttl: Duration,
}

impl TransactionBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        fees: Arc<PriorityFeeEstimator>,
        pending: Arc<PendingTransactionStore>,
        audit: Arc<dyn AuditSink>,
        mint: Pubkey,
        decimals: u8,
        cu_limit: u32,
        pending_ttl: Duration,
    ) -> Self {
        Self {
            gateway,
            fees,
            pending,
            audit,
            mint,
            decimals,
            cu_limit,
            pending_ttl,
        }
    }

    /// The pending store, shared with the orchestrator for completion marks
    pub fn pending_store(&self) -> Arc<PendingTransactionStore> {
        Arc::clone(&self.pending)
    }

    /// Build an unsigned transaction moving `amount` whole tokens.
    ///
    /// Instruction order is fixed: compute-unit limit, compute-unit price,
    /// core instruction. Returns the serialized transaction and records a
    /// pending transaction with a fixed max age.
    pub async fn build(
        &self,
        tx_type: TxType,
        wallet: Pubkey,
        amount: u64,
        options: BuildOptions,
    ) -> Result<BuiltTransaction, TransactionBuilderError> {
        if amount == 0 {
            return Err(TransactionBuilderError::Configuration(
                "Amount must be positive".to_string(),
            ));
        }
        let amount_raw = amount
            .checked_mul(10u64.pow(self.decimals as u32))
            .ok_or_else(|| {
                TransactionBuilderError::Configuration(format!(
                    "Amount {amount} overflows at {} decimals",
                    self.decimals
                ))
            })?;

        let transaction_id = Uuid::new_v4().to_string();
        let priority_fee = self.fees.estimate(tx_type, options.priority).await;

        let core_ix = match tx_type {
            TxType::Burn => burn_instruction(&wallet, &self.mint, amount_raw, self.decimals)?,
            TxType::Transfer => {
                let recipient = options.recipient.ok_or_else(|| {
                    TransactionBuilderError::Configuration(
                        "Transfer requires a recipient".to_string(),
                    )
                })?;
                transfer_instruction(&wallet, &recipient, &self.mint, amount_raw, self.decimals)?
            }
        };

        let plan = plan_instructions(self.cu_limit, priority_fee, core_ix)?;
        sanity_check_ix_order(&plan.instructions)?;

        let (blockhash, last_valid_block_height) = self.gateway.latest_blockhash().await?;

        let message = Message::new_with_blockhash(&plan.instructions, Some(&wallet), &blockhash);
        let transaction = Transaction::new_unsigned(message);
        let serialized = bincode::serialize(&transaction)
            .map_err(|e| TransactionBuilderError::Serialization(e.to_string()))?;
        let encoded = BASE64.encode(serialized);

        let estimated_fee =
            SIGNATURE_FEE_LAMPORTS + priority_fee * self.cu_limit as u64 / 1_000_000;
        let expires_at = Instant::now() + self.pending_ttl;
        let expires_at_unix = now_unix() + self.pending_ttl.as_secs();

        self.pending.insert(PendingTransaction {
            id: transaction_id.clone(),
            tx_type,
            wallet,
            amount,
            priority_fee,
            blockhash: blockhash.to_string(),
            created_at: now_unix(),
            expires_at,
            status: TxStatus::Pending,
        });

        info!(
            transaction_id = %transaction_id,
            tx_type = tx_type.as_str(),
            wallet = %wallet,
            amount,
            priority_fee,
            "Built unsigned transaction"
        );
        self.audit.record(
            "transaction_built",
            json!({
                "transaction_id": transaction_id,
                "type": tx_type.as_str(),
                "wallet": wallet.to_string(),
                "amount": amount,
                "priority_fee": priority_fee,
                "blockhash": blockhash.to_string(),
            }),
        );

        Ok(BuiltTransaction {
            transaction_id,
            transaction: encoded,
            priority_fee,
            estimated_fee,
            blockhash: blockhash.to_string(),
            last_valid_block_height,
            expires_at_unix,
        })
    }
}
