use solana_client::client_error::ClientError;
use thiserror::Error;

/// Typed error taxonomy for all RPC access.
///
/// Retryability is decided here, at the point the error is raised, and
/// carried by the variant. Call sites consult `is_retryable()` instead of
/// sniffing message text.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// Transport-level errors (connection refused, reset, DNS)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    /// Timeout errors
    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// Provider rate limiting (429 and friends)
    #[error("Rate limit exceeded (endpoint: {endpoint})")]
    RateLimited { endpoint: String },

    /// Server-side errors (5xx)
    #[error("Server error {code} (endpoint: {endpoint})")]
    ServerError { endpoint: String, code: i64 },

    /// A confirmed transaction the provider has not indexed yet.
    /// Retryable: the retry executor re-attempts the fetch.
    #[error("Transaction not yet indexed: {signature}")]
    NotYetIndexed { signature: String },

    /// Malformed input (bad address, bad signature). Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The wallet lacks funds for the operation. Never retried.
    #[error("Insufficient funds (endpoint: {endpoint})")]
    InsufficientFunds { endpoint: String },

    /// Required configuration is absent. Aborts the whole operation.
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    /// RPC response errors that fit no specific bucket
    #[error("RPC response error: {message} (endpoint: {endpoint})")]
    Response { endpoint: String, message: String },
}

impl RpcError {
    /// Whether the retry executor should attempt the operation again
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Transport { .. } => true,
            RpcError::Timeout { .. } => true,
            RpcError::RateLimited { .. } => true,
            RpcError::ServerError { .. } => true,
            RpcError::NotYetIndexed { .. } => true,

            RpcError::InvalidInput(_) => false,
            RpcError::InsufficientFunds { .. } => false,
            RpcError::MissingConfiguration(_) => false,
            RpcError::Response { .. } => false,
        }
    }

    /// Whether this error indicates the endpoint itself is misbehaving.
    ///
    /// Connection faults feed the Connection Manager's failure counter;
    /// `NotYetIndexed` does not, since the endpoint answered correctly.
    pub fn is_connection_fault(&self) -> bool {
        matches!(
            self,
            RpcError::Transport { .. }
                | RpcError::Timeout { .. }
                | RpcError::RateLimited { .. }
                | RpcError::ServerError { .. }
        )
    }

    /// Error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            RpcError::Transport { .. } => "transport",
            RpcError::Timeout { .. } => "timeout",
            RpcError::RateLimited { .. } => "rate_limit",
            RpcError::ServerError { .. } => "server",
            RpcError::NotYetIndexed { .. } => "not_indexed",
            RpcError::InvalidInput(_) => "invalid_input",
            RpcError::InsufficientFunds { .. } => "insufficient_funds",
            RpcError::MissingConfiguration(_) => "config",
            RpcError::Response { .. } => "response",
        }
    }

    /// Classify a solana client error with endpoint context
    pub fn from_client_error(err: ClientError, endpoint: &str) -> Self {
        let err_str = err.to_string().to_lowercase();

        if err_str.contains("insufficient funds") || err_str.contains("insufficient lamports") {
            RpcError::InsufficientFunds {
                endpoint: endpoint.to_string(),
            }
        } else if err_str.contains("invalid param")
            || err_str.contains("invalid base58")
            || err_str.contains("wrongsize")
        {
            RpcError::InvalidInput(err.to_string())
        } else if err_str.contains("rate limit")
            || err_str.contains("too many requests")
            || err_str.contains("429")
        {
            RpcError::RateLimited {
                endpoint: endpoint.to_string(),
            }
        } else if err_str.contains("timeout") || err_str.contains("timed out") {
            RpcError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms: 30_000,
            }
        } else if err_str.contains("502") || err_str.contains("503") || err_str.contains("504") {
            let code = if err_str.contains("502") {
                502
            } else if err_str.contains("503") {
                503
            } else {
                504
            };
            RpcError::ServerError {
                endpoint: endpoint.to_string(),
                code,
            }
        } else if err_str.contains("connection refused")
            || err_str.contains("connection reset")
            || err_str.contains("dns error")
            || err_str.contains("error sending request")
        {
            RpcError::Transport {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else {
            RpcError::Response {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_variants() {
        assert!(RpcError::Transport {
            endpoint: "test".to_string(),
            message: "connection refused".to_string(),
        }
        .is_retryable());

        assert!(RpcError::Timeout {
            endpoint: "test".to_string(),
            timeout_ms: 5000,
        }
        .is_retryable());

        assert!(RpcError::NotYetIndexed {
            signature: "sig".to_string(),
        }
        .is_retryable());

        assert!(!RpcError::InvalidInput("bad address".to_string()).is_retryable());
        assert!(!RpcError::MissingConfiguration("api key".to_string()).is_retryable());
        assert!(!RpcError::InsufficientFunds {
            endpoint: "test".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_connection_fault_excludes_not_indexed() {
        assert!(RpcError::RateLimited {
            endpoint: "test".to_string(),
        }
        .is_connection_fault());

        assert!(!RpcError::NotYetIndexed {
            signature: "sig".to_string(),
        }
        .is_connection_fault());

        assert!(!RpcError::InvalidInput("x".to_string()).is_connection_fault());
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            RpcError::ServerError {
                endpoint: "e".to_string(),
                code: 503,
            }
            .category(),
            "server"
        );
        assert_eq!(
            RpcError::NotYetIndexed {
                signature: "s".to_string(),
            }
            .category(),
            "not_indexed"
        );
    }
}
