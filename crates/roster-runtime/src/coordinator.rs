#![forbid(unsafe_code)]

//! Cache and mutation coordinator for the customer collection.
//!
//! # Design
//!
//! The [`Coordinator`] is the single owner of the cached [`Collection`]. It
//! lives on one thread and keeps its mutable state in an `Rc<RefCell<..>>`;
//! every future it hands out holds only a `Weak` reference to that state.
//! Dropping the coordinator therefore releases the cache immediately, and
//! any network completion that arrives afterwards finds nothing to update
//! and is discarded.
//!
//! Writes never patch the cache. A successful create/update/delete forces a
//! fresh `GET /customers` and the whole snapshot is replaced when it lands.
//!
//! # Fetch sequencing
//!
//! | Situation | Behavior |
//! |---|---|
//! | `load()` with fresh data | cached snapshot, no request |
//! | `load()` while a fetch is in flight | joins that fetch |
//! | `load()` with stale or no data | starts a fetch |
//! | `refresh()` / successful mutation | always starts a new fetch |
//!
//! Every fetch takes a sequence number when issued. A response older than
//! the snapshot already applied is dropped, so the most recently *issued*
//! fetch wins even when responses arrive out of order.
//!
//! # Failure Modes
//!
//! - A failed fetch leaves the previous snapshot in place, records
//!   `last_error`, and raises an error notice. A failure from a fetch issued
//!   before the applied snapshot is silent and resolves to that snapshot.
//! - A response that is not a valid collection (missing or duplicate ids)
//!   is treated as [`ClientError::Unknown`].
//! - A mutation whose follow-up refresh fails still reports success; the
//!   refresh failure shows up in [`Snapshot::last_error`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use tracing::{debug, info, warn};
use web_time::Instant;

use roster_client::RemoteCollection;
use roster_core::{ClientError, ClientResult, Collection, Config, Record, RecordId};

use crate::clock::{Clock, SystemClock};
use crate::error::{SyncError, SyncResult};
use crate::notify::{Notice, Notifier, NullNotifier};
use crate::reactive::{ListenerSet, Subscription};

const LOAD_FAILED: &str = "Error loading customers. Please try again later.";

/// Freshness and retention windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// A snapshot younger than this is served without a request.
    pub stale_time: Duration,
    /// Unobserved snapshots are discarded after this long.
    pub gc_time: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for CacheOptions {
    fn from(config: &Config) -> Self {
        Self {
            stale_time: config.stale_time,
            gc_time: config.gc_time,
        }
    }
}

/// A write submitted to the remote service and not yet settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
    Create(Record),
    Update(RecordId, Record),
    Delete(RecordId),
}

impl PendingOperation {
    fn success_message(&self) -> &'static str {
        match self {
            Self::Create(_) => "Customer created successfully!",
            Self::Update(..) => "Customer updated successfully!",
            Self::Delete(_) => "Customer deleted successfully",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Self::Create(_) => "Failed to create customer. Please try again.",
            Self::Update(..) => "Failed to update customer. Please try again.",
            Self::Delete(_) => "Failed to delete customer. Please try again.",
        }
    }
}

/// Lifecycle of the cached collection, from the presentation layer's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing loaded and nothing requested.
    Idle,
    /// First fetch in flight, no data yet.
    Loading,
    /// No data and the latest fetch failed.
    Error,
    /// A snapshot is available (possibly stale).
    Success,
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub collection: Option<Rc<Collection>>,
    pub status: QueryStatus,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub last_error: Option<ClientError>,
    pub updated_at: Option<Instant>,
}

type FetchOutcome = ClientResult<Rc<Collection>>;
type SharedFetch = Shared<LocalBoxFuture<'static, FetchOutcome>>;

struct InFlight {
    seq: u64,
    fetch: SharedFetch,
}

/// Everything mutable. Only ever borrowed for short, non-suspending sections.
struct CacheState {
    collection: Option<Rc<Collection>>,
    updated_at: Option<Instant>,
    invalidated: bool,
    in_flight: Option<InFlight>,
    issued_seq: u64,
    applied_seq: u64,
    last_error: Option<ClientError>,
    error_seq: u64,
    pending: Vec<(u64, PendingOperation)>,
    next_op: u64,
    listeners: ListenerSet<Rc<Collection>>,
    unobserved_since: Option<Instant>,
}

impl CacheState {
    fn new() -> Self {
        Self {
            collection: None,
            updated_at: None,
            invalidated: false,
            in_flight: None,
            issued_seq: 0,
            applied_seq: 0,
            last_error: None,
            error_seq: 0,
            pending: Vec::new(),
            next_op: 0,
            listeners: ListenerSet::new(),
            unobserved_since: None,
        }
    }

    fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
        match (&self.collection, self.updated_at) {
            (Some(_), Some(at)) if !self.invalidated => now.duration_since(at) < stale_time,
            _ => false,
        }
    }

    fn status(&self) -> QueryStatus {
        if self.collection.is_some() {
            QueryStatus::Success
        } else if self.in_flight.is_some() {
            QueryStatus::Loading
        } else if self.last_error.is_some() {
            QueryStatus::Error
        } else {
            QueryStatus::Idle
        }
    }

    /// Drop the snapshot once it has gone unobserved for `gc_time`.
    fn collect_garbage(&mut self, now: Instant, gc_time: Duration) {
        if self.listeners.has_live() {
            self.unobserved_since = None;
            return;
        }
        let Some(since) = self.unobserved_since else {
            return;
        };
        if self.collection.is_some() && now.duration_since(since) >= gc_time {
            debug!(idle_ms = now.duration_since(since).as_millis() as u64, "discarding unobserved collection");
            self.collection = None;
            self.updated_at = None;
            self.unobserved_since = None;
        }
    }

    fn begin_op(&mut self, op: PendingOperation) -> u64 {
        self.next_op += 1;
        self.pending.push((self.next_op, op));
        self.next_op
    }

    fn end_op(&mut self, op_id: u64) -> Option<PendingOperation> {
        let pos = self.pending.iter().position(|(id, _)| *id == op_id)?;
        Some(self.pending.remove(pos).1)
    }
}

/// Pending entry for one write.
///
/// Cleared by [`PendingGuard::finish`] when the write settles, or on drop if
/// the write future is abandoned first.
struct PendingGuard {
    state: Weak<RefCell<CacheState>>,
    op_id: u64,
    armed: bool,
}

impl PendingGuard {
    fn begin(state: &Rc<RefCell<CacheState>>, op: PendingOperation) -> Self {
        let op_id = state.borrow_mut().begin_op(op);
        Self {
            state: Rc::downgrade(state),
            op_id,
            armed: true,
        }
    }

    fn finish(mut self) -> Option<PendingOperation> {
        self.armed = false;
        let state = self.state.upgrade()?;
        let mut st = state.borrow_mut();
        st.end_op(self.op_id)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let Ok(mut st) = state.try_borrow_mut() else {
            warn!(op_id = self.op_id, "cache busy; abandoned write left pending");
            return;
        };
        if st.end_op(self.op_id).is_some() {
            debug!(op_id = self.op_id, "write abandoned before settling");
        }
    }
}

/// Injected collaborators. Shared by the coordinator and its futures.
struct Ports<C> {
    client: C,
    clock: Rc<dyn Clock>,
    notifier: Rc<dyn Notifier>,
    options: CacheOptions,
}

/// Builder for [`Coordinator`].
pub struct CoordinatorBuilder<C> {
    client: C,
    clock: Rc<dyn Clock>,
    notifier: Rc<dyn Notifier>,
    options: CacheOptions,
}

impl<C: RemoteCollection + 'static> CoordinatorBuilder<C> {
    #[must_use]
    pub fn options(mut self, options: CacheOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Rc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn build(self) -> Coordinator<C> {
        Coordinator {
            state: Rc::new(RefCell::new(CacheState::new())),
            ports: Rc::new(Ports {
                client: self.client,
                clock: self.clock,
                notifier: self.notifier,
                options: self.options,
            }),
        }
    }
}

/// Single source of truth for the customer collection.
///
/// Not `Clone`: whoever owns the coordinator owns the cache. Drop it to
/// release interest; in-flight work then completes without effect.
pub struct Coordinator<C> {
    state: Rc<RefCell<CacheState>>,
    ports: Rc<Ports<C>>,
}

impl<C> std::fmt::Debug for Coordinator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Coordinator")
            .field("records", &state.collection.as_ref().map(|c| c.len()))
            .field("fetching", &state.in_flight.is_some())
            .field("pending", &state.pending.len())
            .field("applied_seq", &state.applied_seq)
            .finish()
    }
}

impl<C: RemoteCollection + 'static> Coordinator<C> {
    /// Coordinator with default windows, the system clock, and no notifier.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self::builder(client).build()
    }

    #[must_use]
    pub fn builder(client: C) -> CoordinatorBuilder<C> {
        CoordinatorBuilder {
            client,
            clock: Rc::new(SystemClock),
            notifier: Rc::new(NullNotifier),
            options: CacheOptions::default(),
        }
    }

    #[must_use]
    pub fn options(&self) -> CacheOptions {
        self.ports.options
    }

    /// Collection, served from cache while fresh.
    ///
    /// Concurrent callers share one in-flight request. On failure the
    /// previous snapshot stays in place and the error is returned.
    pub fn load(&self) -> LocalBoxFuture<'static, SyncResult<Rc<Collection>>> {
        let now = self.ports.clock.now();
        {
            let mut state = self.state.borrow_mut();
            state.collect_garbage(now, self.ports.options.gc_time);
            if state.is_fresh(now, self.ports.options.stale_time) {
                if let Some(collection) = state.collection.clone() {
                    debug!(records = collection.len(), "cache hit");
                    return future::ready(Ok(collection)).boxed_local();
                }
            }
        }
        let fetch = begin_fetch(&self.state, &self.ports, false);
        async move { fetch.await.map_err(SyncError::from) }.boxed_local()
    }

    /// Refetch regardless of freshness or in-flight requests.
    pub fn refresh(&self) -> LocalBoxFuture<'static, SyncResult<Rc<Collection>>> {
        let fetch = begin_fetch(&self.state, &self.ports, true);
        async move { fetch.await.map_err(SyncError::from) }.boxed_local()
    }

    /// Create a record, then refresh the collection from the server.
    ///
    /// Resolves with the server's copy (carrying its new id) once the
    /// refresh has settled.
    pub fn create(&self, draft: Record) -> LocalBoxFuture<'static, SyncResult<Record>> {
        let guard = PendingGuard::begin(&self.state, PendingOperation::Create(draft.clone()));
        let ports = Rc::clone(&self.ports);
        async move {
            let result = ports.client.create(&draft).await;
            settle_mutation(guard, &ports, result).await
        }
        .boxed_local()
    }

    /// Update a cached record, then refresh.
    ///
    /// Fails with [`SyncError::InvalidLocalState`], without a request, if
    /// `id` is not in the cached collection.
    pub fn update(&self, id: RecordId, draft: Record) -> LocalBoxFuture<'static, SyncResult<Record>> {
        if let Err(err) = self.require_cached(id) {
            return future::ready(Err(err)).boxed_local();
        }
        let guard = PendingGuard::begin(&self.state, PendingOperation::Update(id, draft.clone()));
        let ports = Rc::clone(&self.ports);
        async move {
            let result = ports.client.update(id, &draft).await;
            settle_mutation(guard, &ports, result).await
        }
        .boxed_local()
    }

    /// Delete a cached record, then refresh.
    ///
    /// Same precondition as [`update`](Self::update).
    pub fn delete(&self, id: RecordId) -> LocalBoxFuture<'static, SyncResult<()>> {
        if let Err(err) = self.require_cached(id) {
            return future::ready(Err(err)).boxed_local();
        }
        let guard = PendingGuard::begin(&self.state, PendingOperation::Delete(id));
        let ports = Rc::clone(&self.ports);
        async move {
            let result = ports.client.delete(id).await;
            settle_mutation(guard, &ports, result).await
        }
        .boxed_local()
    }

    /// Read one record straight from the service. The cache is untouched.
    pub fn fetch_one(&self, id: RecordId) -> LocalBoxFuture<'static, SyncResult<Record>> {
        let ports = Rc::clone(&self.ports);
        async move { ports.client.fetch_one(id).await.map_err(SyncError::from) }.boxed_local()
    }

    /// Current snapshot state. Never issues a request.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let now = self.ports.clock.now();
        let mut state = self.state.borrow_mut();
        state.collect_garbage(now, self.ports.options.gc_time);
        Snapshot {
            collection: state.collection.clone(),
            status: state.status(),
            is_fetching: state.in_flight.is_some(),
            is_stale: !state.is_fresh(now, self.ports.options.stale_time),
            last_error: state.last_error.clone(),
            updated_at: state.updated_at,
        }
    }

    /// Cached collection, fresh or not.
    #[must_use]
    pub fn collection(&self) -> Option<Rc<Collection>> {
        self.snapshot().collection
    }

    /// Cached copy of one record.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<Record> {
        self.collection()?.by_id(id).cloned()
    }

    /// Whether cached data is past its freshness window (or absent).
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.snapshot().is_stale
    }

    /// Writes submitted and not yet settled, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<PendingOperation> {
        self.state
            .borrow()
            .pending
            .iter()
            .map(|(_, op)| op.clone())
            .collect()
    }

    #[must_use]
    pub fn is_mutating(&self) -> bool {
        !self.state.borrow().pending.is_empty()
    }

    /// Call `callback` with each newly applied collection.
    ///
    /// Live subscriptions keep the cached snapshot from being garbage
    /// collected.
    pub fn subscribe(&self, callback: impl Fn(&Rc<Collection>) + 'static) -> Subscription {
        let mut state = self.state.borrow_mut();
        state.unobserved_since = None;
        let subscription = state.listeners.register(callback);
        drop(state);

        let weak = Rc::downgrade(&self.state);
        let clock = Rc::clone(&self.ports.clock);
        subscription.on_release(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let mut state = state.borrow_mut();
            if !state.listeners.has_live() {
                state.unobserved_since = Some(clock.now());
            }
        })
    }

    fn require_cached(&self, id: RecordId) -> SyncResult<()> {
        let known = self
            .collection()
            .is_some_and(|collection| collection.contains(id));
        if known {
            Ok(())
        } else {
            debug!(%id, "rejecting write for uncached record");
            Err(SyncError::InvalidLocalState { id })
        }
    }
}

/// Join the in-flight fetch or start a new one.
fn begin_fetch<C: RemoteCollection + 'static>(
    state: &Rc<RefCell<CacheState>>,
    ports: &Rc<Ports<C>>,
    force: bool,
) -> SharedFetch {
    let mut st = state.borrow_mut();
    if force {
        st.invalidated = true;
    } else if let Some(in_flight) = &st.in_flight {
        debug!(seq = in_flight.seq, "joining in-flight fetch");
        return in_flight.fetch.clone();
    }

    st.issued_seq += 1;
    let seq = st.issued_seq;
    debug!(seq, force, "issuing fetch");

    let weak = Rc::downgrade(state);
    let task_ports = Rc::clone(ports);
    let fetch = async move {
        let result = task_ports.client.fetch_all().await;
        settle_fetch(&weak, &task_ports, seq, result)
    }
    .boxed_local()
    .shared();

    st.in_flight = Some(InFlight {
        seq,
        fetch: fetch.clone(),
    });
    fetch
}

/// Apply one fetch result. Runs exactly once per fetch.
fn settle_fetch<C>(
    weak: &Weak<RefCell<CacheState>>,
    ports: &Ports<C>,
    seq: u64,
    result: ClientResult<Vec<Record>>,
) -> FetchOutcome {
    let outcome = result.and_then(|records| {
        Collection::from_records(records)
            .map(Rc::new)
            .map_err(|err| {
                warn!(seq, error = %err, "rejecting malformed collection");
                ClientError::Unknown
            })
    });

    let Some(state) = weak.upgrade() else {
        debug!(seq, "coordinator released; fetch result ignored");
        return outcome;
    };
    let now = ports.clock.now();

    let mut st = state.borrow_mut();
    if st.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
        st.in_flight = None;
    }

    match outcome {
        Ok(collection) if seq > st.applied_seq => {
            info!(seq, records = collection.len(), "collection replaced");
            st.collection = Some(Rc::clone(&collection));
            st.updated_at = Some(now);
            st.applied_seq = seq;
            if st.error_seq < seq {
                st.last_error = None;
            }
            if st.in_flight.is_none() {
                st.invalidated = false;
            }
            if !st.listeners.has_live() && st.unobserved_since.is_none() {
                st.unobserved_since = Some(now);
            }
            let listeners = st.listeners.live();
            drop(st);
            for listener in listeners {
                listener(&collection);
            }
            Ok(collection)
        }
        Ok(collection) => {
            debug!(seq, applied = st.applied_seq, "discarding superseded fetch");
            Ok(st.collection.clone().unwrap_or(collection))
        }
        Err(err) => {
            if seq < st.applied_seq {
                if let Some(current) = st.collection.clone() {
                    debug!(seq, applied = st.applied_seq, error = %err, "discarding superseded fetch failure");
                    return Ok(current);
                }
            }
            if seq > st.applied_seq && seq > st.error_seq {
                st.last_error = Some(err.clone());
                st.error_seq = seq;
            }
            drop(st);
            ports
                .notifier
                .notify(&Notice::error(LOAD_FAILED).with_detail(err.user_message()));
            Err(err)
        }
    }
}

/// Finish a write: clear its pending entry, notify, and refresh on success.
async fn settle_mutation<C: RemoteCollection + 'static, T>(
    guard: PendingGuard,
    ports: &Rc<Ports<C>>,
    result: ClientResult<T>,
) -> SyncResult<T> {
    let op_id = guard.op_id;
    let Some(state) = guard.state.upgrade() else {
        debug!(op_id, "coordinator released; write result ignored");
        return result.map_err(SyncError::from);
    };
    let op = guard.finish();

    match result {
        Ok(value) => {
            if let Some(op) = &op {
                ports.notifier.notify(&Notice::success(op.success_message()));
            }
            let refresh = begin_fetch(&state, ports, true);
            drop(state);
            if let Err(err) = refresh.await {
                debug!(op_id, error = %err, "refresh after write failed");
            }
            Ok(value)
        }
        Err(err) => {
            if let Some(op) = &op {
                warn!(op_id, error = %err, "write failed");
                ports
                    .notifier
                    .notify(&Notice::error(op.failure_message()).with_detail(err.user_message()));
            }
            Err(SyncError::from(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use futures::executor::block_on;
    use std::cell::Cell;

    /// In-memory service that hands out ids from 1.
    #[derive(Default)]
    struct MemoryService {
        rows: RefCell<Vec<Record>>,
        next_id: Cell<i64>,
        fetches: Cell<u32>,
    }

    impl RemoteCollection for MemoryService {
        async fn fetch_all(&self) -> ClientResult<Vec<Record>> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(self.rows.borrow().clone())
        }

        async fn fetch_one(&self, id: RecordId) -> ClientResult<Record> {
            let rows = self.rows.borrow();
            rows.iter()
                .find(|r| r.id == Some(id))
                .cloned()
                .ok_or(ClientError::NotFound)
        }

        async fn create(&self, draft: &Record) -> ClientResult<Record> {
            self.next_id.set(self.next_id.get() + 1);
            let saved = draft.to_draft().with_id(RecordId(self.next_id.get()));
            self.rows.borrow_mut().push(saved.clone());
            Ok(saved)
        }

        async fn update(&self, id: RecordId, draft: &Record) -> ClientResult<Record> {
            let mut rows = self.rows.borrow_mut();
            let row = rows
                .iter_mut()
                .find(|r| r.id == Some(id))
                .ok_or(ClientError::NotFound)?;
            *row = draft.to_draft().with_id(id);
            Ok(row.clone())
        }

        async fn delete(&self, id: RecordId) -> ClientResult<()> {
            let mut rows = self.rows.borrow_mut();
            let before = rows.len();
            rows.retain(|r| r.id != Some(id));
            if rows.len() == before {
                Err(ClientError::NotFound)
            } else {
                Ok(())
            }
        }
    }

    fn coordinator() -> (Rc<MemoryService>, Rc<ManualClock>, Coordinator<Rc<MemoryService>>) {
        let service = Rc::new(MemoryService::default());
        let clock = Rc::new(ManualClock::new());
        let coord = Coordinator::builder(Rc::clone(&service))
            .clock(clock.clone())
            .build();
        (service, clock, coord)
    }

    #[test]
    fn starts_idle() {
        let (_, _, coord) = coordinator();
        let snap = coord.snapshot();
        assert_eq!(snap.status, QueryStatus::Idle);
        assert!(snap.collection.is_none());
        assert!(snap.is_stale);
        assert!(!snap.is_fetching);
    }

    #[test]
    fn pending_load_reports_loading() {
        let (_, _, coord) = coordinator();
        let fut = coord.load();
        assert_eq!(coord.snapshot().status, QueryStatus::Loading);
        block_on(fut).unwrap();
        assert_eq!(coord.snapshot().status, QueryStatus::Success);
    }

    #[test]
    fn update_roundtrip_refreshes() {
        let (service, _, coord) = coordinator();
        let created = block_on(coord.create(Record::draft("Ada", "a@x.com", "1234567890", "1 Main St"))).unwrap();
        let id = created.id.unwrap();

        let mut edit = created.clone();
        edit.name = "Ada Lovelace".into();
        let updated = block_on(coord.update(id, edit)).unwrap();
        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(coord.get(id).unwrap().name, "Ada Lovelace");
        assert_eq!(service.fetches.get(), 2);
    }

    #[test]
    fn fetch_one_does_not_touch_cache() {
        let (service, _, coord) = coordinator();
        service
            .rows
            .borrow_mut()
            .push(Record::draft("B", "b@x.com", "1234567890", "2 Main St").with_id(RecordId(2)));
        let one = block_on(coord.fetch_one(RecordId(2))).unwrap();
        assert_eq!(one.name, "B");
        assert!(coord.collection().is_none());
        assert_eq!(
            block_on(coord.fetch_one(RecordId(3))),
            Err(SyncError::Client(ClientError::NotFound))
        );
    }

    #[test]
    fn debug_reports_counts() {
        let (_, _, coord) = coordinator();
        block_on(coord.load()).unwrap();
        let dbg = format!("{coord:?}");
        assert!(dbg.contains("records: Some(0)"));
        assert!(dbg.contains("applied_seq: 1"));
    }
}
