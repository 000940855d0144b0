//! Backup volume handling and external collaborators for snapback.
//!
//! The core never touches snapshot bytes itself: byte transfer is delegated
//! to an incremental sync tool (rsync) and the snapshot primitive to the
//! copy-on-write filesystem (btrfs). Both are consumed through traits so
//! the lifecycle engine can be driven against mocks in tests, alongside the
//! target-scoped advisory lock that serializes mutating operations.

pub mod btrfs;
pub mod lock;
pub mod sync;
pub mod volume;

pub use btrfs::{Btrfs, BtrfsError, MockBtrfs, RealBtrfs};
pub use lock::{LockError, LockFile, LockGuard, Locker, MockLocker};
pub use sync::{MockSyncer, RealRsync, SyncError, SyncOptions, Syncer};
pub use volume::{Volume, VolumeError};
