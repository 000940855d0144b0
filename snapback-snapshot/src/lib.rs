//! Snapshot naming and ordered snapshot sets for snapback.
//!
//! A snapshot is a read-only btrfs subvolume whose directory name encodes
//! the instant it was committed. This crate owns that naming scheme and the
//! in-memory, read-only view over the snapshots of one backup target.

pub mod name;
pub mod set;

pub use name::{NameError, SnapshotName};
pub use set::SnapshotSet;
