//! Configuration module for the burn pipeline
//!
//! This module handles all configuration loading from TOML files,
//! environment variables, and provides structured configuration types.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoints configuration
    pub rpc: RpcSettings,

    /// Token configuration (mint, supply)
    pub token: TokenSettings,

    /// Priority fee estimation
    #[serde(default)]
    pub fees: FeeSettings,

    /// Shop / purchase pipeline
    #[serde(default)]
    pub shop: ShopSettings,

    /// Monitoring and metrics
    #[serde(default)]
    pub monitoring: MonitoringSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSettings {
    /// Primary RPC endpoint
    pub primary_url: String,

    /// Backup RPC endpoint used after repeated failures
    #[serde(default)]
    pub backup_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Max attempts per request (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Consecutive failures before switching to the backup endpoint
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds without failures before retrying the primary endpoint
    #[serde(default = "default_failover_cooldown")]
    pub failover_cooldown_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Token mint address
    pub mint: String,

    /// Token decimals
    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Initial supply in whole tokens (pricing denominator)
    pub initial_supply: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSettings {
    /// Enhanced fee-estimate API endpoint (optional)
    #[serde(default)]
    pub estimate_api_url: Option<String>,

    /// API key for the enhanced endpoint. Never logged in full.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Fallback when every estimate source fails (micro-lamports per CU)
    #[serde(default = "default_priority_fee")]
    pub default_micro_lamports: u64,

    #[serde(default = "default_min_fee")]
    pub min_micro_lamports: u64,

    #[serde(default = "default_max_fee")]
    pub max_micro_lamports: u64,

    /// Burns pay a higher multiplier than plain transfers
    #[serde(default = "default_burn_multiplier")]
    pub burn_multiplier: f64,

    #[serde(default = "default_transfer_multiplier")]
    pub transfer_multiplier: f64,

    /// Fee-estimate cache TTL in milliseconds
    #[serde(default = "default_fee_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Compute-unit limit for built transactions
    #[serde(default = "default_cu_limit")]
    pub cu_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSettings {
    /// Pending purchase max age in seconds
    #[serde(default = "default_purchase_ttl")]
    pub purchase_ttl_secs: u64,

    /// Pending transaction max age in seconds
    #[serde(default = "default_purchase_ttl")]
    pub pending_tx_ttl_secs: u64,

    /// Wallet balance cache TTL in seconds
    #[serde(default = "default_balance_ttl")]
    pub balance_ttl_secs: u64,

    /// Token supply cache TTL in seconds
    #[serde(default = "default_supply_ttl")]
    pub supply_ttl_secs: u64,

    /// Used-signature retention window in seconds
    #[serde(default = "default_signature_retention")]
    pub signature_retention_secs: u64,

    /// Burn amount tolerance in whole tokens
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: f64,

    /// Catalog entries; the built-in catalog is used when empty
    #[serde(default)]
    pub items: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub tier: u8,
    #[serde(default)]
    pub default_item: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

// Default value functions
fn default_rpc_timeout() -> u64 { 30 }
fn default_max_attempts() -> u32 { 3 }
fn default_failure_threshold() -> u32 { 3 }
fn default_failover_cooldown() -> u64 { 120 }
fn default_decimals() -> u8 { 9 }
fn default_priority_fee() -> u64 { 50_000 }
fn default_min_fee() -> u64 { 1_000 }
fn default_max_fee() -> u64 { 2_000_000 }
fn default_burn_multiplier() -> f64 { 1.5 }
fn default_transfer_multiplier() -> f64 { 1.0 }
fn default_fee_cache_ttl_ms() -> u64 { 10_000 }
fn default_cu_limit() -> u32 { 120_000 }
fn default_purchase_ttl() -> u64 { 300 }
fn default_balance_ttl() -> u64 { 30 }
fn default_supply_ttl() -> u64 { 60 }
fn default_signature_retention() -> u64 { 86_400 }
fn default_amount_tolerance() -> f64 { 0.001 }
fn default_metrics_port() -> u16 { 9090 }
fn default_true() -> bool { true }

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            estimate_api_url: None,
            api_key: None,
            default_micro_lamports: default_priority_fee(),
            min_micro_lamports: default_min_fee(),
            max_micro_lamports: default_max_fee(),
            burn_multiplier: default_burn_multiplier(),
            transfer_multiplier: default_transfer_multiplier(),
            cache_ttl_ms: default_fee_cache_ttl_ms(),
            cu_limit: default_cu_limit(),
        }
    }
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            purchase_ttl_secs: default_purchase_ttl(),
            pending_tx_ttl_secs: default_purchase_ttl(),
            balance_ttl_secs: default_balance_ttl(),
            supply_ttl_secs: default_supply_ttl(),
            signature_retention_secs: default_signature_retention(),
            amount_tolerance: default_amount_tolerance(),
            items: Vec::new(),
        }
    }
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            enable_metrics: default_true(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// The fee API key is a secret and comes from `FEE_API_KEY` when the
    /// file leaves it unset.
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        if config.fees.api_key.is_none() {
            config.fees.api_key = std::env::var("FEE_API_KEY").ok();
        }
        Ok(config)
    }

    /// Validate cross-field constraints before anything is wired up
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc.primary_url.trim().is_empty() {
            anyhow::bail!("rpc.primary_url must not be empty");
        }
        if let Some(backup) = &self.rpc.backup_url {
            if backup.trim() == self.rpc.primary_url.trim() {
                anyhow::bail!("rpc.backup_url must differ from the primary endpoint");
            }
        }
        Pubkey::from_str(&self.token.mint)
            .map_err(|e| anyhow::anyhow!("token.mint is not a valid address: {e}"))?;
        if self.token.initial_supply <= 0.0 {
            anyhow::bail!("token.initial_supply must be positive");
        }
        if self.fees.min_micro_lamports > self.fees.max_micro_lamports {
            anyhow::bail!("fees.min_micro_lamports exceeds fees.max_micro_lamports");
        }
        if self.shop.signature_retention_secs < self.shop.purchase_ttl_secs {
            anyhow::bail!("shop.signature_retention_secs must cover the purchase window");
        }
        Ok(())
    }

    /// Parsed mint address
    pub fn mint(&self) -> Pubkey {
        // validate() is called at startup; a bad mint never reaches here
        Pubkey::from_str(&self.token.mint).unwrap_or_default()
    }
}
