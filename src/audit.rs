//! Audit log sink for purchase lifecycle events
//!
//! Build, verify and completion events carry structured payloads; the
//! default sink emits them on the `audit` tracing target. Deployments can
//! inject their own sink to forward events elsewhere.

use serde_json::Value;

pub trait AuditSink: Send + Sync {
    fn record(&self, event: &str, payload: Value);
}

/// Default sink backed by structured tracing
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &str, payload: Value) {
        tracing::info!(
            target: "audit",
            event = %event,
            payload = %payload,
            "Audit event"
        );
    }
}
