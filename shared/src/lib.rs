//! Shared types for the laptop store
//!
//! Domain models, the snapshot document exchanged with every persistence
//! backend, result objects and money/time helpers.

pub mod document;
pub mod models;
pub mod money;
pub mod result;
pub mod util;

// Re-exports
pub use document::StoreDocument;
pub use result::OperationResult;
pub use serde::{Deserialize, Serialize};
