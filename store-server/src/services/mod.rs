//! 服务层

pub mod snapshot_host;

pub use snapshot_host::{Slot, SnapshotHost};
