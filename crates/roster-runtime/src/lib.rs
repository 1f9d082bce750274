#![forbid(unsafe_code)]

//! Runtime: the cache and mutation coordinator.
//!
//! # Role in Roster
//! `roster-runtime` keeps the one in-memory copy of the customer collection
//! and decides when to talk to the server. Readers get cached snapshots
//! while they are fresh; writers go straight to the server and the
//! collection is refetched afterwards.
//!
//! # Primary responsibilities
//! - **Coordinator**: load/refresh with in-flight deduplication, writes with
//!   refetch-after-success, and pending-operation tracking.
//! - **Clock**: injectable time source for the staleness and GC windows.
//! - **Notify**: success/failure notices for the operator.
//! - **Reactive**: listener sets and RAII subscriptions.
//!
//! # How it fits in the system
//! The coordinator is generic over [`roster_client::RemoteCollection`], so
//! the web shell passes in the HTTP client and tests pass in fakes.

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod notify;
pub mod reactive;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{
    CacheOptions, Coordinator, CoordinatorBuilder, PendingOperation, QueryStatus, Snapshot,
};
pub use error::{ErrorKind, SyncError, SyncResult};
pub use notify::{Notice, NoticeLevel, NoticeLog, Notifier, NullNotifier};
pub use reactive::{ListenerSet, Subscription};
