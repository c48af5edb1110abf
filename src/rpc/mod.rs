//! Resilient RPC access: failover, retry, caching
//!
//! - **errors**: typed error taxonomy with retryability decided at raise time
//! - **failover**: primary/backup connection manager with cooldown revert
//! - **retry**: exponential backoff + jitter executor
//! - **cache**: TTL response cache for balance/supply/fee reads
//! - **gateway**: the trait seam over the RPC provider

pub mod cache;
pub mod errors;
pub mod failover;
pub mod gateway;
pub mod retry;

pub use cache::ResponseCache;
pub use errors::RpcError;
pub use failover::{ActiveEndpoint, ConnectionManager, FailoverStats};
pub use gateway::{ChainGateway, SolanaGateway};
pub use retry::{RetryExecutor, RetryPolicy};
