//! On-chain burn verification
//!
//! Given a submitted signature, fetches the confirmed transaction and
//! validates that it is the expected burn: correct mint, correct authority,
//! amount within tolerance. Results are never cached; verification always
//! reads on-chain truth. A transaction the provider has not indexed yet is
//! a retryable condition handled inside the gateway.

use crate::audit::AuditSink;
use crate::rpc::{ChainGateway, ResponseCache, RpcError};
use crate::types::{balance_cache_key, BurnVerification};
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::{
    EncodedTransaction, UiInstruction, UiMessage, UiParsedInstruction,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

struct BurnDetails {
    mint: String,
    authority: String,
    ui_amount: Option<f64>,
}

pub struct TransactionVerifier {
    gateway: Arc<dyn ChainGateway>,
    balances: Arc<ResponseCache<f64>>,
    audit: Arc<dyn AuditSink>,
    mint: Pubkey,
    decimals: u8,
    /// Amount tolerance in whole tokens (floating-point decimals)
    tolerance: f64,
}

impl TransactionVerifier {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        balances: Arc<ResponseCache<f64>>,
        audit: Arc<dyn AuditSink>,
        mint: Pubkey,
        decimals: u8,
        tolerance: f64,
    ) -> Self {
        Self {
            gateway,
            balances,
            audit,
            mint,
            decimals,
            tolerance,
        }
    }

    /// Verify that `signature` is a confirmed burn of `expected_amount`
    /// tokens by `expected_wallet`.
    ///
    /// Transport-level problems surface as `Err`; a transaction that is
    /// confirmed but not the expected burn comes back as
    /// `Ok(BurnVerification { valid: false, .. })` with the reason.
    pub async fn verify_burn(
        &self,
        signature: &str,
        expected_wallet: &Pubkey,
        expected_amount: f64,
    ) -> Result<BurnVerification, RpcError> {
        let sig = Signature::from_str(signature)
            .map_err(|e| RpcError::InvalidInput(format!("Invalid signature: {e}")))?;

        // Cheap status probe before the full parsed fetch
        if let Some(Err(err)) = self.gateway.signature_status(&sig).await? {
            debug!(signature = %sig, error = ?err, "Signature status reports on-chain failure");
            return Ok(BurnVerification::rejected("Transaction failed on-chain"));
        }

        let confirmed = self.gateway.parsed_transaction(&sig).await?;

        if let Some(meta) = &confirmed.transaction.meta {
            if meta.err.is_some() {
                return Ok(BurnVerification::rejected("Transaction failed on-chain"));
            }
        }

        let instructions = match &confirmed.transaction.transaction {
            EncodedTransaction::Json(ui_tx) => match &ui_tx.message {
                UiMessage::Parsed(message) => &message.instructions,
                UiMessage::Raw(_) => {
                    return Ok(BurnVerification::rejected(
                        "Transaction message is not parsed",
                    ))
                }
            },
            _ => {
                return Ok(BurnVerification::rejected(
                    "Unsupported transaction encoding",
                ))
            }
        };

        let burn = match self.extract_burn(instructions) {
            Some(burn) => burn,
            None => return Ok(BurnVerification::rejected("No burn instruction found")),
        };

        if burn.mint != self.mint.to_string() {
            return Ok(BurnVerification::rejected("Wrong token mint"));
        }
        if burn.authority != expected_wallet.to_string() {
            return Ok(BurnVerification::rejected("Wrong wallet"));
        }

        let actual_amount = match burn.ui_amount {
            Some(amount) => amount,
            None => return Ok(BurnVerification::rejected("Burn amount missing")),
        };
        if (actual_amount - expected_amount).abs() > self.tolerance {
            return Ok(BurnVerification::amount_mismatch(
                actual_amount,
                expected_amount,
            ));
        }

        // The burn changed the wallet's balance; drop the stale cache entry
        self.balances.invalidate(&balance_cache_key(expected_wallet));

        info!(
            signature = %sig,
            wallet = %expected_wallet,
            amount = actual_amount,
            slot = confirmed.slot,
            "Burn verified"
        );
        self.audit.record(
            "burn_verified",
            json!({
                "signature": sig.to_string(),
                "wallet": expected_wallet.to_string(),
                "amount": actual_amount,
                "slot": confirmed.slot,
            }),
        );

        Ok(BurnVerification::ok(
            actual_amount,
            confirmed.slot,
            confirmed.block_time,
        ))
    }

    /// Locate the spl-token burn among the parsed instructions
    fn extract_burn(&self, instructions: &[UiInstruction]) -> Option<BurnDetails> {
        for instruction in instructions {
            let parsed = match instruction {
                UiInstruction::Parsed(UiParsedInstruction::Parsed(parsed)) => parsed,
                _ => continue,
            };
            if parsed.program != "spl-token" {
                continue;
            }
            let kind = parsed
                .parsed
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            if kind != "burn" && kind != "burnChecked" {
                continue;
            }
            let info = match parsed.parsed.get("info") {
                Some(info) => info,
                None => continue,
            };

            let ui_amount = if kind == "burnChecked" {
                info.get("tokenAmount")
                    .and_then(|amount| amount.get("uiAmount"))
                    .and_then(|v| v.as_f64())
            } else {
                // Plain burn carries raw base units as a string
                info.get("amount")
                    .and_then(|v| v.as_str())
                    .and_then(|raw| raw.parse::<u64>().ok())
                    .map(|raw| raw as f64 / 10f64.powi(self.decimals as i32))
            };

            return Some(BurnDetails {
                mint: info
                    .get("mint")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                authority: info
                    .get("authority")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                ui_amount,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::TracingAuditSink;
    use crate::tests::helpers::{burn_fixture, BurnFixture, MockGateway};
    use std::time::Duration;

    fn verifier(
        gateway: Arc<MockGateway>,
        balances: Arc<ResponseCache<f64>>,
        mint: Pubkey,
    ) -> TransactionVerifier {
        TransactionVerifier::new(
            gateway,
            balances,
            Arc::new(TracingAuditSink),
            mint,
            9,
            0.001,
        )
    }

    fn sig() -> String {
        Signature::from([7u8; 64]).to_string()
    }

    #[tokio::test]
    async fn test_valid_burn_verifies() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let signature = sig();

        let gateway = Arc::new(MockGateway::new());
        gateway.insert_transaction(
            &signature,
            burn_fixture(BurnFixture::new(&wallet, &mint, 2.0)),
        );

        let v = verifier(gateway, Arc::new(ResponseCache::new()), mint);
        let result = v.verify_burn(&signature, &wallet, 2.0).await.unwrap();

        assert!(result.valid);
        assert_eq!(result.actual_amount, Some(2.0));
        assert!(result.slot.is_some());
    }

    #[tokio::test]
    async fn test_success_invalidates_balance_cache() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let signature = sig();

        let balances: Arc<ResponseCache<f64>> = Arc::new(ResponseCache::new());
        balances.set(balance_cache_key(&wallet), 100.0, Duration::from_secs(30));

        let gateway = Arc::new(MockGateway::new());
        gateway.insert_transaction(
            &signature,
            burn_fixture(BurnFixture::new(&wallet, &mint, 2.0)),
        );

        let v = verifier(gateway, balances.clone(), mint);
        v.verify_burn(&signature, &wallet, 2.0).await.unwrap();

        assert_eq!(balances.get(&balance_cache_key(&wallet)), None);
    }

    #[tokio::test]
    async fn test_wrong_mint_rejected() {
        let wallet = Pubkey::new_unique();
        let expected_mint = Pubkey::new_unique();
        let other_mint = Pubkey::new_unique();
        let signature = sig();

        let gateway = Arc::new(MockGateway::new());
        gateway.insert_transaction(
            &signature,
            burn_fixture(BurnFixture::new(&wallet, &other_mint, 2.0)),
        );

        let v = verifier(gateway, Arc::new(ResponseCache::new()), expected_mint);
        let result = v.verify_burn(&signature, &wallet, 2.0).await.unwrap();

        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Wrong token mint"));
    }

    #[tokio::test]
    async fn test_wrong_wallet_rejected() {
        let burner = Pubkey::new_unique();
        let expected_wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let signature = sig();

        let gateway = Arc::new(MockGateway::new());
        gateway.insert_transaction(
            &signature,
            burn_fixture(BurnFixture::new(&burner, &mint, 2.0)),
        );

        let v = verifier(gateway, Arc::new(ResponseCache::new()), mint);
        let result = v
            .verify_burn(&signature, &expected_wallet, 2.0)
            .await
            .unwrap();

        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Wrong wallet"));
    }

    #[tokio::test]
    async fn test_amount_mismatch_reports_both_amounts() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let signature = sig();

        let gateway = Arc::new(MockGateway::new());
        gateway.insert_transaction(
            &signature,
            burn_fixture(BurnFixture::new(&wallet, &mint, 1.5)),
        );

        let v = verifier(gateway, Arc::new(ResponseCache::new()), mint);
        let result = v.verify_burn(&signature, &wallet, 2.0).await.unwrap();

        assert!(!result.valid);
        assert_eq!(result.actual_amount, Some(1.5));
        let error = result.error.unwrap();
        assert!(error.contains("1.5") && error.contains("2"));
    }

    #[tokio::test]
    async fn test_amount_within_tolerance_passes() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let signature = sig();

        let gateway = Arc::new(MockGateway::new());
        gateway.insert_transaction(
            &signature,
            burn_fixture(BurnFixture::new(&wallet, &mint, 2.0005)),
        );

        let v = verifier(gateway, Arc::new(ResponseCache::new()), mint);
        let result = v.verify_burn(&signature, &wallet, 2.0).await.unwrap();
        assert!(result.valid);
    }

    #[tokio::test]
    async fn test_failed_on_chain_rejected() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let signature = sig();

        let gateway = Arc::new(MockGateway::new());
        gateway.insert_transaction(
            &signature,
            burn_fixture(BurnFixture::new(&wallet, &mint, 2.0).failed()),
        );

        let v = verifier(gateway, Arc::new(ResponseCache::new()), mint);
        let result = v.verify_burn(&signature, &wallet, 2.0).await.unwrap();

        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Transaction failed on-chain"));
    }

    #[tokio::test]
    async fn test_missing_burn_instruction_rejected() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let signature = sig();

        let gateway = Arc::new(MockGateway::new());
        gateway.insert_transaction(
            &signature,
            burn_fixture(BurnFixture::new(&wallet, &mint, 2.0).without_burn()),
        );

        let v = verifier(gateway, Arc::new(ResponseCache::new()), mint);
        let result = v.verify_burn(&signature, &wallet, 2.0).await.unwrap();

        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("No burn instruction found"));
    }

    #[tokio::test]
    async fn test_unknown_signature_is_retryable_error() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let gateway = Arc::new(MockGateway::new());
        let v = verifier(gateway, Arc::new(ResponseCache::new()), mint);

        let result = v.verify_burn(&sig(), &wallet, 2.0).await;
        match result {
            Err(err) => {
                assert!(matches!(err, RpcError::NotYetIndexed { .. }));
                assert!(err.is_retryable());
            }
            Ok(_) => panic!("expected NotYetIndexed error"),
        }
    }

    #[tokio::test]
    async fn test_malformed_signature_is_fatal() {
        let gateway = Arc::new(MockGateway::new());
        let v = verifier(
            gateway,
            Arc::new(ResponseCache::new()),
            Pubkey::new_unique(),
        );

        let result = v
            .verify_burn("not-base58!", &Pubkey::new_unique(), 2.0)
            .await;
        match result {
            Err(err) => assert!(!err.is_retryable()),
            Ok(_) => panic!("expected invalid input error"),
        }
    }
}
