//! Data models
//!
//! Shared between the store, the sync layer and the snapshot host.
//! All IDs are `i64`, allocated as `max(existing) + 1` per collection.
//! Timestamps are Unix milliseconds.

pub mod audit;
pub mod backup;
pub mod customer;
pub mod installment;
pub mod laptop;
pub mod record;
pub mod registration;
pub mod repair;
pub mod sale;
pub mod user;

// Re-exports
pub use audit::*;
pub use backup::*;
pub use customer::*;
pub use installment::*;
pub use laptop::*;
pub use record::*;
pub use registration::*;
pub use repair::*;
pub use sale::*;
pub use user::*;
