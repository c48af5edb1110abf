//! Metrics collection and export module

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder};

/// Pipeline metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub purchases_initiated: IntCounter,
    pub purchases_completed: IntCounter,
    pub purchases_rejected: IntCounter,
    pub replay_attempts: IntCounter,

    // Gauges
    pub pending_purchases: IntGauge,
    pub pending_transactions: IntGauge,
    pub used_signatures: IntGauge,
    pub rpc_failovers: IntGauge,

    // Histograms
    pub build_latency: Histogram,
    pub verify_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let purchases_initiated = IntCounter::with_opts(Opts::new(
            "purchases_initiated",
            "Number of purchases initiated",
        ))?;

        let purchases_completed = IntCounter::with_opts(Opts::new(
            "purchases_completed",
            "Number of purchases credited after verification",
        ))?;

        let purchases_rejected = IntCounter::with_opts(Opts::new(
            "purchases_rejected",
            "Number of confirmations rejected by verification",
        ))?;

        let replay_attempts = IntCounter::with_opts(Opts::new(
            "replay_attempts",
            "Number of signature replay attempts rejected",
        ))?;

        let pending_purchases = IntGauge::with_opts(Opts::new(
            "pending_purchases",
            "Purchases awaiting confirmation",
        ))?;

        let pending_transactions = IntGauge::with_opts(Opts::new(
            "pending_transactions",
            "Unsigned transactions handed out and not yet confirmed",
        ))?;

        let used_signatures = IntGauge::with_opts(Opts::new(
            "used_signatures",
            "Signatures held in the anti-replay ledger",
        ))?;

        let rpc_failovers = IntGauge::with_opts(Opts::new(
            "rpc_failovers",
            "Times the active RPC endpoint switched to backup",
        ))?;

        let build_latency = Histogram::with_opts(HistogramOpts::new(
            "build_latency_seconds",
            "Transaction build latency",
        ))?;

        let verify_latency = Histogram::with_opts(HistogramOpts::new(
            "verify_latency_seconds",
            "Burn verification latency",
        ))?;

        registry.register(Box::new(purchases_initiated.clone()))?;
        registry.register(Box::new(purchases_completed.clone()))?;
        registry.register(Box::new(purchases_rejected.clone()))?;
        registry.register(Box::new(replay_attempts.clone()))?;
        registry.register(Box::new(pending_purchases.clone()))?;
        registry.register(Box::new(pending_transactions.clone()))?;
        registry.register(Box::new(used_signatures.clone()))?;
        registry.register(Box::new(rpc_failovers.clone()))?;
        registry.register(Box::new(build_latency.clone()))?;
        registry.register(Box::new(verify_latency.clone()))?;

        Ok(Self {
            registry,
            purchases_initiated,
            purchases_completed,
            purchases_rejected,
            replay_attempts,
            pending_purchases,
            pending_transactions,
            used_signatures,
            rpc_failovers,
            build_latency,
            verify_latency,
        })
    }

    /// Render the registry in the Prometheus text format
    pub fn export(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_export() {
        let metrics = Metrics::new().unwrap();
        metrics.purchases_initiated.inc();
        metrics.purchases_completed.inc();
        metrics.pending_purchases.set(3);

        let output = metrics.export().unwrap();
        assert!(output.contains("purchases_initiated 1"));
        assert!(output.contains("pending_purchases 3"));
    }
}
