//! Chain access seam for the burn pipeline
//!
//! [`ChainGateway`] is the narrow trait the builder, fee estimator and
//! verifier consume; [`SolanaGateway`] is the production implementation
//! composing the connection manager and the retry executor, so every RPC
//! call gets failover and backoff without the callers knowing. Tests inject
//! a mock implementation instead of a network.

use crate::rpc::errors::RpcError;
use crate::rpc::failover::ConnectionManager;
use crate::rpc::retry::RetryExecutor;
use async_trait::async_trait;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::TransactionError;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, UiTransactionEncoding,
};
use spl_associated_token_account::get_associated_token_address;
use std::sync::Arc;
use tracing::debug;

/// RPC provider surface consumed by the pipeline
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Latest blockhash and its last valid block height
    async fn latest_blockhash(&self) -> Result<(Hash, u64), RpcError>;

    /// Confirmed transaction by signature, JSON-parsed.
    /// Not yet indexed is an [`RpcError::NotYetIndexed`] after retries.
    async fn parsed_transaction(
        &self,
        signature: &Signature,
    ) -> Result<EncodedConfirmedTransactionWithStatusMeta, RpcError>;

    /// Circulating supply of the mint in whole tokens
    async fn token_supply(&self, mint: &Pubkey) -> Result<f64, RpcError>;

    /// Wallet's balance of the mint in whole tokens. A missing token
    /// account reads as zero.
    async fn token_balance(&self, owner: &Pubkey, mint: &Pubkey) -> Result<f64, RpcError>;

    /// Processed status of a signature, if the cluster has seen it
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, RpcError>;

    /// Recent network prioritization fee in micro-lamports per CU
    async fn prioritization_fee(&self) -> Result<u64, RpcError>;
}

/// Production gateway: connection manager + retry executor over the
/// nonblocking Solana RPC client
pub struct SolanaGateway {
    connection: Arc<ConnectionManager>,
    retry: RetryExecutor,
    commitment: CommitmentConfig,
}

impl SolanaGateway {
    pub fn new(connection: Arc<ConnectionManager>, retry: RetryExecutor) -> Self {
        Self {
            connection,
            retry,
            commitment: CommitmentConfig::confirmed(),
        }
    }
}

#[async_trait]
impl ChainGateway for SolanaGateway {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), RpcError> {
        self.retry
            .run("get_latest_blockhash", || async move {
                let client = self.connection.active_client();
                let endpoint = self.connection.active_url();
                client
                    .get_latest_blockhash_with_commitment(self.commitment)
                    .await
                    .map_err(|e| RpcError::from_client_error(e, &endpoint))
            })
            .await
    }

    async fn parsed_transaction(
        &self,
        signature: &Signature,
    ) -> Result<EncodedConfirmedTransactionWithStatusMeta, RpcError> {
        self.retry
            .run("get_parsed_transaction", || async move {
                let client = self.connection.active_client();
                let endpoint = self.connection.active_url();
                let config = RpcTransactionConfig {
                    encoding: Some(UiTransactionEncoding::JsonParsed),
                    commitment: Some(self.commitment),
                    max_supported_transaction_version: Some(0),
                };
                client
                    .get_transaction_with_config(signature, config)
                    .await
                    .map_err(|e| {
                        let msg = e.to_string().to_lowercase();
                        // A confirmed-but-unindexed transaction surfaces as a
                        // null/not-found response; the executor re-attempts it
                        if msg.contains("not found") || msg.contains("invalid type: null") {
                            RpcError::NotYetIndexed {
                                signature: signature.to_string(),
                            }
                        } else {
                            RpcError::from_client_error(e, &endpoint)
                        }
                    })
            })
            .await
    }

    async fn token_supply(&self, mint: &Pubkey) -> Result<f64, RpcError> {
        self.retry
            .run("get_token_supply", || async move {
                let client = self.connection.active_client();
                let endpoint = self.connection.active_url();
                let supply = client
                    .get_token_supply(mint)
                    .await
                    .map_err(|e| RpcError::from_client_error(e, &endpoint))?;
                supply.ui_amount.ok_or_else(|| RpcError::Response {
                    endpoint: endpoint.clone(),
                    message: "token supply missing uiAmount".to_string(),
                })
            })
            .await
    }

    async fn token_balance(&self, owner: &Pubkey, mint: &Pubkey) -> Result<f64, RpcError> {
        let ata = get_associated_token_address(owner, mint);
        self.retry
            .run("get_token_account_balance", || async move {
                let client = self.connection.active_client();
                let endpoint = self.connection.active_url();
                match client.get_token_account_balance(&ata).await {
                    Ok(balance) => Ok(balance.ui_amount.unwrap_or(0.0)),
                    Err(e) => {
                        // No associated token account means a zero balance,
                        // not an error
                        if e.to_string().to_lowercase().contains("could not find account") {
                            debug!(owner = %owner, "No token account, reading balance as 0");
                            Ok(0.0)
                        } else {
                            Err(RpcError::from_client_error(e, &endpoint))
                        }
                    }
                }
            })
            .await
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, RpcError> {
        self.retry
            .run("get_signature_status", || async move {
                let client = self.connection.active_client();
                let endpoint = self.connection.active_url();
                client
                    .get_signature_status(signature)
                    .await
                    .map_err(|e| RpcError::from_client_error(e, &endpoint))
            })
            .await
    }

    async fn prioritization_fee(&self) -> Result<u64, RpcError> {
        self.retry
            .run("get_recent_prioritization_fees", || async move {
                let client = self.connection.active_client();
                let endpoint = self.connection.active_url();
                let fees = client
                    .get_recent_prioritization_fees(&[])
                    .await
                    .map_err(|e| RpcError::from_client_error(e, &endpoint))?;

                let mut samples: Vec<u64> =
                    fees.iter().map(|f| f.prioritization_fee).collect();
                if samples.is_empty() {
                    return Err(RpcError::Response {
                        endpoint: endpoint.clone(),
                        message: "empty prioritization fee response".to_string(),
                    });
                }
                samples.sort_unstable();
                // Median of the recent slots
                Ok(samples[samples.len() / 2])
            })
            .await
    }
}
