//! burngate service entry point
//!
//! Loads and validates configuration, wires the purchase pipeline together
//! with constructor-injected stores, starts the background sweepers and the
//! metrics endpoint, then waits for shutdown. The web layer mounts
//! [`PurchaseService`] for the two API operations (initiate/confirm).

#![deny(unused_imports)]
#![deny(unused_mut)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use burngate::audit::TracingAuditSink;
use burngate::config::Config;
use burngate::fees::PriorityFeeEstimator;
use burngate::metrics::Metrics;
use burngate::replay::SignatureLedger;
use burngate::rpc::{ConnectionManager, ResponseCache, RetryExecutor, RetryPolicy, SolanaGateway};
use burngate::shop::{Catalog, PendingPurchaseStore, PurchaseService, PurchaseSettings};
use burngate::tx_builder::{PendingTransactionStore, TransactionBuilder};
use burngate::verify::TransactionVerifier;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_file_with_env(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    config.validate().context("Invalid configuration")?;

    let mint = config.mint();
    info!(mint = %mint, primary = %config.rpc.primary_url, "Starting burngate");

    // RPC layer
    let connection = Arc::new(ConnectionManager::new(
        config.rpc.primary_url.clone(),
        config.rpc.backup_url.clone(),
        config.rpc.failure_threshold,
        Duration::from_secs(config.rpc.failover_cooldown_secs),
        Duration::from_secs(config.rpc.timeout_secs),
    ));
    let retry = RetryExecutor::new(
        RetryPolicy::with_max_attempts(config.rpc.max_attempts),
        Arc::clone(&connection),
    );
    let gateway = Arc::new(SolanaGateway::new(Arc::clone(&connection), retry));

    // Shared caches and stores
    let balances: Arc<ResponseCache<f64>> = Arc::new(ResponseCache::new());
    let supply: Arc<ResponseCache<f64>> = Arc::new(ResponseCache::new());
    let fee_cache: Arc<ResponseCache<u64>> = Arc::new(ResponseCache::new());
    let tx_store = Arc::new(PendingTransactionStore::new());
    let purchase_store = Arc::new(PendingPurchaseStore::new());
    let ledger = Arc::new(SignatureLedger::new(Duration::from_secs(
        config.shop.signature_retention_secs,
    )));

    let audit = Arc::new(TracingAuditSink);
    let metrics = Arc::new(Metrics::new()?);

    // Pipeline components
    let fees = Arc::new(PriorityFeeEstimator::new(
        gateway.clone(),
        Arc::clone(&fee_cache),
        config.fees.clone(),
    ));
    let builder = Arc::new(TransactionBuilder::new(
        gateway.clone(),
        fees,
        Arc::clone(&tx_store),
        audit.clone(),
        mint,
        config.token.decimals,
        config.fees.cu_limit,
        Duration::from_secs(config.shop.pending_tx_ttl_secs),
    ));
    let verifier = Arc::new(TransactionVerifier::new(
        gateway.clone(),
        Arc::clone(&balances),
        audit.clone(),
        mint,
        config.token.decimals,
        config.shop.amount_tolerance,
    ));

    let service = Arc::new(PurchaseService::new(
        Catalog::from_config(&config.shop.items),
        gateway,
        builder,
        verifier,
        Arc::clone(&ledger),
        Arc::clone(&purchase_store),
        Arc::clone(&balances),
        Arc::clone(&supply),
        audit,
        Arc::clone(&metrics),
        PurchaseSettings {
            mint,
            initial_supply: config.token.initial_supply,
            purchase_ttl: Duration::from_secs(config.shop.purchase_ttl_secs),
            balance_ttl: Duration::from_secs(config.shop.balance_ttl_secs),
            supply_ttl: Duration::from_secs(config.shop.supply_ttl_secs),
        },
    ));

    // Background sweepers
    let _sweepers = [
        balances.spawn_sweeper(Duration::from_secs(300)),
        supply.spawn_sweeper(Duration::from_secs(300)),
        fee_cache.spawn_sweeper(Duration::from_secs(300)),
        tx_store.spawn_sweeper(Duration::from_secs(60)),
        purchase_store.spawn_sweeper(Duration::from_secs(60)),
        ledger.spawn_sweeper(Duration::from_secs(300)),
    ];

    // Failover stats into gauges
    {
        let metrics = Arc::clone(&metrics);
        let connection = Arc::clone(&connection);
        let ledger = Arc::clone(&ledger);
        let tx_store = Arc::clone(&tx_store);
        let purchase_store = Arc::clone(&purchase_store);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(30)).await;
                let stats = connection.stats();
                metrics.rpc_failovers.set(stats.total_failovers as i64);
                metrics.used_signatures.set(ledger.len() as i64);
                metrics.pending_transactions.set(tx_store.len() as i64);
                metrics.pending_purchases.set(purchase_store.len() as i64);
            }
        });
    }

    if config.monitoring.enable_metrics {
        let metrics = Arc::clone(&metrics);
        let port = config.monitoring.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = burngate::endpoints::endpoint_server(port, metrics).await {
                tracing::error!("Metrics endpoint failed: {}", e);
            }
        });
    }

    info!("Purchase pipeline ready; web layer can mount the service");
    let _service = service;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
