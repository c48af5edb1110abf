//! Unsigned transaction construction
//!
//! - **errors**: builder error taxonomy
//! - **instructions**: instruction planning and ordering validation
//! - **builder**: fee resolution, blockhash fetch, serialization
//! - **pending**: short-lived record of handed-out transactions

pub mod builder;
pub mod errors;
pub mod instructions;
pub mod pending;

pub use builder::{BuildOptions, TransactionBuilder};
pub use errors::TransactionBuilderError;
pub use instructions::{plan_instructions, sanity_check_ix_order, InstructionPlan};
pub use pending::PendingTransactionStore;
