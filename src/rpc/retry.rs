//! Retry executor with exponential backoff and jitter
//!
//! Wraps every RPC call made by the builder, fee estimator and verifier.
//! Classification is by the typed error's `is_retryable()` flag; connection
//! faults are additionally reported to the [`ConnectionManager`] so repeated
//! faults trigger failover.

use crate::rpc::errors::RpcError;
use crate::rpc::failover::ConnectionManager;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff policy for retried operations
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,

    /// Base delay in milliseconds
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,

    /// Jitter factor (0.0 - 1.0)
    pub jitter_factor: f64,

    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 5000,
            jitter_factor: 0.1,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay before the attempt after `attempt` (0-based), or None when
    /// attempts are exhausted
    pub fn calculate_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }

        let delay_ms = self.base_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        let delay_ms = delay_ms.min(self.max_delay_ms as f64);

        // Jitter prevents thundering herd across concurrent purchases
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * self.jitter_factor;
        let jittered = (delay_ms * (1.0 + jitter)).max(0.0) as u64;

        Some(Duration::from_millis(jittered))
    }
}

/// Runs operations under the retry policy, reporting connection faults to
/// the connection manager.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    connection: Arc<ConnectionManager>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, connection: Arc<ConnectionManager>) -> Self {
        Self { policy, connection }
    }

    /// Attempt `op` up to `max_attempts` times.
    ///
    /// Non-retryable errors are returned immediately without further
    /// attempts. Connection faults increment the failover counter before
    /// the backoff wait. The last error is returned once attempts are
    /// exhausted.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RpcError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(label, attempt, "RPC operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if !err.is_retryable() {
                        debug!(label, error = %err, "Non-retryable RPC error");
                        return Err(err);
                    }

                    if err.is_connection_fault() {
                        self.connection.report_failure();
                    }

                    match self.policy.calculate_delay(attempt) {
                        Some(delay) => {
                            warn!(
                                label,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                category = err.category(),
                                error = %err,
                                "Retryable RPC error, backing off"
                            );
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                        }
                        None => {
                            warn!(label, attempt, error = %err, "RPC retries exhausted");
                            return Err(err);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::failover::ActiveEndpoint;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn executor(max_attempts: u32) -> (RetryExecutor, Arc<ConnectionManager>) {
        let connection = Arc::new(ConnectionManager::new(
            "http://primary.invalid".to_string(),
            Some("http://backup.invalid".to_string()),
            3,
            Duration::from_secs(60),
            Duration::from_secs(5),
        ));
        let policy = RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
            jitter_factor: 0.0,
            multiplier: 2.0,
        };
        (RetryExecutor::new(policy, connection.clone()), connection)
    }

    fn transport_err() -> RpcError {
        RpcError::Transport {
            endpoint: "http://primary.invalid".to_string(),
            message: "connection refused".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let (exec, _) = executor(3);
        let result: Result<u32, RpcError> = exec.run("op", || async move { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_non_retryable_invoked_exactly_once() {
        let (exec, _) = executor(3);
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), RpcError> = exec
            .run("op", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RpcError::InsufficientFunds {
                    endpoint: "e".to_string(),
                })
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retryable_exhausts_all_attempts() {
        let (exec, _) = executor(3);
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), RpcError> = exec
            .run("op", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(transport_err())
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let (exec, _) = executor(3);
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result = exec
            .run("op", || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(transport_err())
                } else {
                    Ok("done")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_connection_faults_trigger_failover() {
        let (exec, connection) = executor(4);
        let _: Result<(), RpcError> = exec.run("op", || async move { Err(transport_err()) }).await;
        // 4 reported faults, threshold 3: manager switched to backup
        assert_eq!(connection.stats().active, ActiveEndpoint::Backup);
    }

    #[tokio::test]
    async fn test_not_indexed_does_not_count_against_endpoint() {
        let (exec, connection) = executor(3);
        let _: Result<(), RpcError> = exec
            .run("op", || async move {
                Err(RpcError::NotYetIndexed {
                    signature: "sig".to_string(),
                })
            })
            .await;
        assert_eq!(connection.stats().active, ActiveEndpoint::Primary);
        assert_eq!(connection.stats().consecutive_failures, 0);
    }

    #[test]
    fn test_delay_progression_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 300,
            jitter_factor: 0.0,
            multiplier: 2.0,
        };
        assert_eq!(policy.calculate_delay(0).unwrap().as_millis(), 100);
        assert_eq!(policy.calculate_delay(1).unwrap().as_millis(), 200);
        // Capped at max_delay_ms
        assert_eq!(policy.calculate_delay(2).unwrap().as_millis(), 300);
        // Exhausted
        assert!(policy.calculate_delay(4).is_none());
    }
}
