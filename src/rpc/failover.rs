//! Primary/backup endpoint management with failure-driven failover
//!
//! The manager holds one primary and an optional backup RPC endpoint and
//! tracks consecutive failures reported by the retry executor. Reaching the
//! failure threshold switches the active endpoint to the backup; after a
//! cooldown with no further failures, the next access reverts to primary.
//! Success never moves state; only explicit failure reports do.

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use solana_client::nonblocking::rpc_client::RpcClient;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which configured endpoint currently serves requests.
/// Exactly one endpoint is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveEndpoint {
    Primary,
    Backup,
}

struct EndpointSlot {
    url: String,
    client: OnceCell<Arc<RpcClient>>,
}

impl EndpointSlot {
    fn new(url: String) -> Self {
        Self {
            url,
            client: OnceCell::new(),
        }
    }

    /// Connections are constructed lazily on first use
    fn client(&self, timeout: Duration) -> Arc<RpcClient> {
        self.client
            .get_or_init(|| Arc::new(RpcClient::new_with_timeout(self.url.clone(), timeout)))
            .clone()
    }
}

#[derive(Debug)]
struct FailoverState {
    active: ActiveEndpoint,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

/// Failover stats snapshot for metrics/logging
#[derive(Debug, Clone)]
pub struct FailoverStats {
    pub active: ActiveEndpoint,
    pub consecutive_failures: u32,
    pub total_failovers: u64,
    pub has_backup: bool,
}

pub struct ConnectionManager {
    primary: EndpointSlot,
    backup: Option<EndpointSlot>,
    state: Mutex<FailoverState>,
    failure_threshold: u32,
    cooldown: Duration,
    timeout: Duration,
    total_failovers: Mutex<u64>,
}

impl ConnectionManager {
    pub fn new(
        primary_url: String,
        backup_url: Option<String>,
        failure_threshold: u32,
        cooldown: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            primary: EndpointSlot::new(primary_url),
            backup: backup_url.map(EndpointSlot::new),
            state: Mutex::new(FailoverState {
                active: ActiveEndpoint::Primary,
                consecutive_failures: 0,
                last_failure: None,
            }),
            failure_threshold: failure_threshold.max(1),
            cooldown,
            timeout,
            total_failovers: Mutex::new(0),
        }
    }

    /// Returns the currently active client, lazily constructing the
    /// connection on first use. When the backup is active and the cooldown
    /// has elapsed since the last failure, reverts to primary first.
    pub fn active_client(&self) -> Arc<RpcClient> {
        let slot = match self.resolve_active() {
            ActiveEndpoint::Primary => &self.primary,
            // resolve_active only returns Backup when one is configured
            ActiveEndpoint::Backup => self.backup.as_ref().unwrap_or(&self.primary),
        };
        slot.client(self.timeout)
    }

    /// URL of the currently active endpoint (for error context)
    pub fn active_url(&self) -> String {
        match self.resolve_active() {
            ActiveEndpoint::Primary => self.primary.url.clone(),
            ActiveEndpoint::Backup => self
                .backup
                .as_ref()
                .map(|s| s.url.clone())
                .unwrap_or_else(|| self.primary.url.clone()),
        }
    }

    fn resolve_active(&self) -> ActiveEndpoint {
        let mut state = self.state.lock();
        if state.active == ActiveEndpoint::Backup {
            let cooled_down = state
                .last_failure
                .map(|t| t.elapsed() >= self.cooldown)
                .unwrap_or(true);
            if cooled_down {
                info!(
                    primary = %self.primary.url,
                    "Failover cooldown elapsed, reverting to primary endpoint"
                );
                state.active = ActiveEndpoint::Primary;
                state.consecutive_failures = 0;
            }
        }
        state.active
    }

    /// Record a connection fault. Reaching the threshold with a backup
    /// configured switches the active endpoint and resets the counter.
    pub fn report_failure(&self) {
        let mut state = self.state.lock();
        state.consecutive_failures += 1;
        state.last_failure = Some(Instant::now());

        debug!(
            failures = state.consecutive_failures,
            threshold = self.failure_threshold,
            active = ?state.active,
            "RPC failure reported"
        );

        if state.consecutive_failures >= self.failure_threshold {
            if let Some(backup) = &self.backup {
                if state.active == ActiveEndpoint::Primary {
                    warn!(
                        backup = %backup.url,
                        failures = state.consecutive_failures,
                        "Failure threshold reached, switching to backup endpoint"
                    );
                    state.active = ActiveEndpoint::Backup;
                    *self.total_failovers.lock() += 1;
                }
                state.consecutive_failures = 0;
            }
        }
    }

    /// Clear all failover state (tests / manual recovery)
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.active = ActiveEndpoint::Primary;
        state.consecutive_failures = 0;
        state.last_failure = None;
    }

    pub fn stats(&self) -> FailoverStats {
        let state = self.state.lock();
        FailoverStats {
            active: state.active,
            consecutive_failures: state.consecutive_failures,
            total_failovers: *self.total_failovers.lock(),
            has_backup: self.backup.is_some(),
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("primary", &self.primary.url)
            .field("backup", &self.backup.as_ref().map(|s| &s.url))
            .field("failure_threshold", &self.failure_threshold)
            .field("state", &self.state.lock())
            .finish_non_exhaustive()
    }
}
