//! Cosmetics shop purchase pipeline
//!
//! - **catalog**: items, Fibonacci pricing, tier gating
//! - **errors**: purchase error taxonomy
//! - **pending**: store of purchases awaiting confirmation
//! - **orchestrator**: the initiate/confirm state machine

pub mod catalog;
pub mod errors;
pub mod orchestrator;
pub mod pending;

pub use catalog::{apply_discount, calculate_price, can_access_tier, Catalog, ShopItem, FIB};
pub use errors::PurchaseError;
pub use orchestrator::{PurchaseService, PurchaseSettings};
pub use pending::PendingPurchaseStore;
