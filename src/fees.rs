//! Priority fee estimation
//!
//! Resolves a micro-lamports-per-CU estimate from the enhanced provider API
//! when configured (API-keyed, redacted in logs), falling back to the RPC
//! prioritization-fee endpoint. The network estimate is cached under one
//! global key with a short TTL since it is network-wide, not per-wallet.
//! Estimation is infallible: any failure yields the configured default, so
//! a flaky fee source can never block a purchase.

use crate::config::FeeSettings;
use crate::rpc::{ChainGateway, ResponseCache, RpcError};
use crate::types::{PriorityLevel, TxType};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const FEE_CACHE_KEY: &str = "priority_fee_estimate";

/// Show only a short prefix of an API key in logs and error context
pub fn redact_key(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    if key.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{prefix}****")
    }
}

fn priority_multiplier(level: PriorityLevel) -> f64 {
    match level {
        PriorityLevel::Low => 0.8,
        PriorityLevel::Medium => 1.0,
        PriorityLevel::High => 1.5,
        PriorityLevel::Urgent => 2.0,
    }
}

pub struct PriorityFeeEstimator {
    gateway: Arc<dyn ChainGateway>,
    cache: Arc<ResponseCache<u64>>,
    settings: FeeSettings,
    http: reqwest::Client,
}

impl PriorityFeeEstimator {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        cache: Arc<ResponseCache<u64>>,
        settings: FeeSettings,
    ) -> Self {
        Self {
            gateway,
            cache,
            settings,
            http: reqwest::Client::new(),
        }
    }

    /// Estimate the priority fee for a transaction.
    ///
    /// Cached network estimate -> transaction-type multiplier -> priority
    /// multiplier -> clamp. Any source failure returns the configured
    /// default instead of an error.
    pub async fn estimate(&self, tx_type: TxType, priority: PriorityLevel) -> u64 {
        let base = match self.cache.get(FEE_CACHE_KEY) {
            Some(cached) => cached,
            None => match self.fetch_base_estimate().await {
                Ok(estimate) => {
                    self.cache.set(
                        FEE_CACHE_KEY,
                        estimate,
                        Duration::from_millis(self.settings.cache_ttl_ms),
                    );
                    estimate
                }
                Err(err) => {
                    warn!(
                        category = err.category(),
                        error = %err,
                        default = self.settings.default_micro_lamports,
                        "Fee estimation failed, using default"
                    );
                    return self.clamp(self.settings.default_micro_lamports);
                }
            },
        };

        let fee = self.adjust(base, tx_type, priority);
        debug!(
            base,
            fee,
            tx_type = tx_type.as_str(),
            priority = priority.as_str(),
            "Priority fee resolved"
        );
        fee
    }

    fn adjust(&self, base: u64, tx_type: TxType, priority: PriorityLevel) -> u64 {
        let type_mult = match tx_type {
            TxType::Burn => self.settings.burn_multiplier,
            TxType::Transfer => self.settings.transfer_multiplier,
        };
        let adjusted = (base as f64 * type_mult * priority_multiplier(priority)).round() as u64;
        self.clamp(adjusted)
    }

    fn clamp(&self, fee: u64) -> u64 {
        fee.clamp(
            self.settings.min_micro_lamports,
            self.settings.max_micro_lamports,
        )
    }

    async fn fetch_base_estimate(&self) -> Result<u64, RpcError> {
        if let (Some(url), Some(key)) =
            (&self.settings.estimate_api_url, &self.settings.api_key)
        {
            match self.fetch_enhanced_estimate(url, key).await {
                Ok(estimate) => return Ok(estimate),
                Err(err) => {
                    warn!(
                        endpoint = %url,
                        api_key = %redact_key(key),
                        error = %err,
                        "Enhanced fee estimate failed, falling back to RPC"
                    );
                }
            }
        }
        self.gateway.prioritization_fee().await
    }

    async fn fetch_enhanced_estimate(&self, url: &str, key: &str) -> Result<u64, RpcError> {
        // The key goes in the request only; error context carries the
        // redacted form
        let endpoint = format!("{url}?api-key={key}");
        let redacted = format!("{url}?api-key={}", redact_key(key));

        let body = json!({
            "jsonrpc": "2.0",
            "id": "fee-estimate",
            "method": "getPriorityFeeEstimate",
            "params": [{ "options": { "priorityLevel": "High", "recommended": true } }],
        });

        let response = self
            .http
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport {
                endpoint: redacted.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::ServerError {
                endpoint: redacted,
                code: status.as_u16() as i64,
            });
        }

        let value: serde_json::Value =
            response.json().await.map_err(|e| RpcError::Response {
                endpoint: redacted.clone(),
                message: e.to_string(),
            })?;

        value["result"]["priorityFeeEstimate"]
            .as_f64()
            .map(|fee| fee.round() as u64)
            .ok_or(RpcError::Response {
                endpoint: redacted,
                message: "malformed fee estimate response".to_string(),
            })
    }
}
