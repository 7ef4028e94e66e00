// ── Cache entries ──
//
// Per-key query state and per-request mutation state. Entries are only
// touched by the slice reducer while the store lock is held; every change
// is pushed to subscribers through the entry's `watch` channel.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use strum::Display;
use tokio::sync::watch;

use super::key::CacheKey;
use super::tag::Tag;
use crate::error::QueryError;

/// Type-erased value stored in the cache: a decoded response or a query
/// argument. Endpoint handles downcast it back to their concrete type.
#[derive(Clone)]
pub struct Payload(Arc<dyn Any + Send + Sync>);

impl Payload {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wrap an already shared value without copying it.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self(value)
    }

    /// Shared handle to the value if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.0).downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload(..)")
    }
}

/// Lifecycle of a cache entry or mutation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum QueryStatus {
    #[default]
    Uninitialized,
    Loading,
    Success,
    Error,
}

/// Point-in-time view of one entry, published on every change.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    pub status: QueryStatus,
    pub data: Option<Payload>,
    pub error: Option<QueryError>,
    pub started_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

/// How eagerly `begin_fetch` should start a request for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchMode {
    /// A consumer subscribed: fetch unless fresh data exists or a request
    /// is already running.
    IfNeeded,
    /// Explicit refetch: fetch unless a request is already running.
    Refetch,
    /// A mutation invalidated the entry: fetch even if a request is running,
    /// since that request may predate the mutation.
    Invalidated,
}

/// Cached state for one `(endpoint, argument)` pair.
pub(crate) struct CacheEntry {
    pub(crate) key: CacheKey,
    pub(crate) args: Payload,
    pub(crate) status: QueryStatus,
    pub(crate) data: Option<Payload>,
    pub(crate) error: Option<QueryError>,
    pub(crate) subscribers: usize,
    /// Sequence number of the most recently started request.
    pub(crate) request_seq: u64,
    /// Sequence number of the request whose result is currently applied.
    pub(crate) applied_seq: u64,
    pub(crate) provided_tags: Vec<Tag>,
    pub(crate) invalidated: bool,
    /// Tags invalidated while the latest request was running that did not
    /// match `provided_tags`. Checked against the tags its result provides.
    pub(crate) missed_invalidations: Vec<Tag>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) fulfilled_at: Option<DateTime<Utc>>,
    /// Bumped whenever the subscriber count drops to zero; an eviction
    /// timer only fires for the generation it was scheduled for.
    pub(crate) unsubscribed_generation: u64,
    watch: watch::Sender<QuerySnapshot>,
}

impl CacheEntry {
    pub(crate) fn new(key: CacheKey, args: Payload) -> Self {
        let (watch, _) = watch::channel(QuerySnapshot::default());
        Self {
            key,
            args,
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            subscribers: 0,
            request_seq: 0,
            applied_seq: 0,
            provided_tags: Vec::new(),
            invalidated: false,
            missed_invalidations: Vec::new(),
            started_at: None,
            fulfilled_at: None,
            unsubscribed_generation: 0,
            watch,
        }
    }

    pub(crate) fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            started_at: self.started_at,
            fulfilled_at: self.fulfilled_at,
        }
    }

    pub(crate) fn watch(&self) -> watch::Receiver<QuerySnapshot> {
        self.watch.subscribe()
    }

    /// Push the current state to every subscriber.
    pub(crate) fn publish(&self) {
        self.watch.send_replace(self.snapshot());
    }

    /// Push an empty snapshot before the entry is dropped.
    pub(crate) fn publish_removed(&self) {
        self.watch.send_replace(QuerySnapshot::default());
    }

    /// Whether any of `tags` invalidates data this entry provided.
    pub(crate) fn is_hit_by(&self, tags: &[Tag]) -> bool {
        tags.iter()
            .any(|t| self.provided_tags.iter().any(|p| t.invalidates(p)))
    }

    /// Whether the result about to be applied, providing `provided`, was
    /// already made stale by an invalidation recorded while it ran. Marks
    /// the entry invalidated if so.
    pub(crate) fn take_missed_invalidation(&mut self, provided: &[Tag]) -> bool {
        let missed = std::mem::take(&mut self.missed_invalidations);
        let hit = missed
            .iter()
            .any(|t| provided.iter().any(|p| t.invalidates(p)));
        if hit {
            self.invalidated = true;
        }
        hit
    }

    /// Decide whether a new request should start.
    pub(crate) fn needs_fetch(
        &self,
        mode: FetchMode,
        refetch_after: Option<Duration>,
        now: DateTime<Utc>,
    ) -> bool {
        match mode {
            FetchMode::Invalidated => self.invalidated,
            FetchMode::Refetch => self.status != QueryStatus::Loading,
            FetchMode::IfNeeded => match self.status {
                QueryStatus::Uninitialized | QueryStatus::Error => true,
                QueryStatus::Loading => false,
                QueryStatus::Success => self.invalidated || self.is_older_than(refetch_after, now),
            },
        }
    }

    fn is_older_than(&self, threshold: Option<Duration>, now: DateTime<Utc>) -> bool {
        let (Some(threshold), Some(fulfilled)) = (threshold, self.fulfilled_at) else {
            return false;
        };
        let age = now.signed_duration_since(fulfilled);
        chrono::Duration::from_std(threshold).is_ok_and(|t| age >= t)
    }
}

/// State of one triggered mutation request.
#[derive(Debug, Clone)]
pub struct MutationSnapshot {
    pub endpoint: String,
    pub status: QueryStatus,
    pub data: Option<Payload>,
    pub error: Option<QueryError>,
    pub started_at: DateTime<Utc>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}
