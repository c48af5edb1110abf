//! Error types for transaction building

use crate::rpc::RpcError;
use thiserror::Error;

/// Errors raised while assembling an unsigned transaction
#[derive(Error, Debug)]
pub enum TransactionBuilderError {
    /// Failed to build an instruction for a specific program
    #[error("Instruction build error (program={program}): {reason}")]
    InstructionBuild { program: String, reason: String },

    /// Blockhash could not be fetched or is stale
    #[error("Blockhash error: {0}")]
    Blockhash(String),

    /// Compute budget instructions must precede the instruction they
    /// budget for
    #[error("Invalid instruction order: {0}")]
    InvalidInstructionOrder(String),

    /// Invalid builder input or configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unsigned transaction serialization failure
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Underlying RPC failure (already retried by the executor)
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
}

impl TransactionBuilderError {
    /// Whether retrying the build might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Blockhash(_) => true,
            Self::Rpc(e) => e.is_retryable(),

            Self::InstructionBuild { .. } => false,
            Self::InvalidInstructionOrder(_) => false,
            Self::Configuration(_) => false,
            Self::Serialization(_) => false,
        }
    }

    /// Error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::InstructionBuild { .. } => "instruction",
            Self::Blockhash(_) => "blockhash",
            Self::InvalidInstructionOrder(_) => "validation",
            Self::Configuration(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Rpc(_) => "rpc",
        }
    }

    pub fn instruction_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InstructionBuild {
            program: program.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidInstructionOrder(reason.into())
    }
}
