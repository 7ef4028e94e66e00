// ── Consumer handles ──
//
// `QuerySubscription` keeps a cache entry alive and exposes its state;
// dropping it releases the subscription. `MutationTrigger` sends a
// mutation and tracks the state of its latest request.

use std::fmt;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures_core::Stream;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::Store;
use crate::cache::{CacheKey, FetchMode, MutationSnapshot, QuerySnapshot, QueryStatus};
use crate::endpoint::MutationEndpoint;
use crate::error::QueryError;

// ── Query views ──────────────────────────────────────────────────────

/// Typed projection of one cache entry.
pub struct QueryView<R> {
    pub status: QueryStatus,
    pub data: Option<Arc<R>>,
    pub error: Option<QueryError>,
    pub started_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl<R> Clone for QueryView<R> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            started_at: self.started_at,
            fulfilled_at: self.fulfilled_at,
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for QueryView<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryView")
            .field("status", &self.status)
            .field("data", &self.data)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<R: Send + Sync + 'static> QueryView<R> {
    pub(crate) fn from_snapshot(snapshot: &QuerySnapshot) -> Self {
        Self {
            status: snapshot.status,
            data: snapshot.data.as_ref().and_then(|d| d.downcast::<R>()),
            error: snapshot.error.clone(),
            started_at: snapshot.started_at,
            fulfilled_at: snapshot.fulfilled_at,
        }
    }
}

impl<R> QueryView<R> {
    pub fn is_uninitialized(&self) -> bool {
        self.status == QueryStatus::Uninitialized
    }

    /// First load: a request is running and there is nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading && self.data.is_none()
    }

    /// A request is running, possibly while stale data is shown.
    pub fn is_fetching(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

// ── Query subscriptions ──────────────────────────────────────────────

/// A live subscription to one cache entry.
pub struct QuerySubscription<R> {
    store: Store,
    path: Arc<str>,
    key: CacheKey,
    receiver: watch::Receiver<QuerySnapshot>,
    _marker: PhantomData<fn() -> R>,
}

impl<R> fmt::Debug for QuerySubscription<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySubscription")
            .field("path", &self.path)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<R: Send + Sync + 'static> QuerySubscription<R> {
    pub(crate) fn new(
        store: Store,
        path: Arc<str>,
        key: CacheKey,
        receiver: watch::Receiver<QuerySnapshot>,
    ) -> Self {
        Self {
            store,
            path,
            key,
            receiver,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Latest state of the entry.
    pub fn state(&self) -> QueryView<R> {
        QueryView::from_snapshot(&self.receiver.borrow())
    }

    /// Wait for the next change. Returns `None` once the entry is removed
    /// (slice reset).
    pub async fn changed(&mut self) -> Option<QueryView<R>> {
        self.receiver.changed().await.ok()?;
        Some(QueryView::from_snapshot(&self.receiver.borrow_and_update()))
    }

    /// Wait until the latest request settles and return its outcome.
    ///
    /// Resolves immediately if the entry already holds a settled result.
    pub async fn resolved(&mut self) -> Result<Arc<R>, QueryError> {
        let snapshot = self
            .receiver
            .wait_for(|s| matches!(s.status, QueryStatus::Success | QueryStatus::Error))
            .await
            .map_err(|_| QueryError::Aborted {
                message: format!("cache entry {} was removed", self.key),
            })?
            .clone();

        match snapshot.status {
            QueryStatus::Success => snapshot
                .data
                .and_then(|d| d.downcast::<R>())
                .ok_or_else(|| QueryError::Config {
                    message: format!("cached data for {} has an unexpected type", self.key),
                }),
            _ => Err(snapshot.error.unwrap_or_else(|| QueryError::Aborted {
                message: format!("{} failed without an error", self.key),
            })),
        }
    }

    /// Refetch unless a request is already running.
    pub fn refetch(&self) -> bool {
        self.store.begin_fetch(&self.path, &self.key, FetchMode::Refetch)
    }

    /// Convert into a `Stream` of views. The subscription stays active
    /// while the stream lives.
    pub fn into_stream(self) -> QueryStream<R> {
        QueryStream {
            inner: WatchStream::new(self.receiver.clone()),
            _subscription: self,
        }
    }
}

impl<R> Drop for QuerySubscription<R> {
    fn drop(&mut self) {
        // A closed channel means the entry is already gone (slice reset);
        // releasing would decrement a newer entry under the same key.
        if self.receiver.has_changed().is_ok() {
            self.store.release(&self.path, &self.key);
        }
    }
}

/// `Stream` adapter over a subscription's `watch` channel.
pub struct QueryStream<R> {
    inner: WatchStream<QuerySnapshot>,
    _subscription: QuerySubscription<R>,
}

impl<R: Send + Sync + 'static> Stream for QueryStream<R> {
    type Item = QueryView<R>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner)
            .poll_next(cx)
            .map(|next| next.map(|s| QueryView::from_snapshot(&s)))
    }
}

// ── Mutations ────────────────────────────────────────────────────────

/// Typed projection of one mutation request.
pub struct MutationView<R> {
    pub status: QueryStatus,
    pub data: Option<Arc<R>>,
    pub error: Option<QueryError>,
}

impl<R> Default for MutationView<R> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for MutationView<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationView")
            .field("status", &self.status)
            .field("data", &self.data)
            .field("error", &self.error)
            .finish()
    }
}

impl<R: Send + Sync + 'static> MutationView<R> {
    pub(crate) fn from_snapshot(snapshot: &MutationSnapshot) -> Self {
        Self {
            status: snapshot.status,
            data: snapshot.data.as_ref().and_then(|d| d.downcast::<R>()),
            error: snapshot.error.clone(),
        }
    }
}

impl<R> MutationView<R> {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

enum LastRequest {
    None,
    Sent(u64),
    Invalid(QueryError),
}

/// Sends one mutation endpoint and remembers its latest request.
pub struct MutationTrigger<A, R> {
    store: Store,
    endpoint: MutationEndpoint<A, R>,
    last: Mutex<LastRequest>,
}

impl<A, R> fmt::Debug for MutationTrigger<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationTrigger")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl<A, R> MutationTrigger<A, R>
where
    A: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    pub(crate) fn new(store: Store, endpoint: MutationEndpoint<A, R>) -> Self {
        Self {
            store,
            endpoint,
            last: Mutex::new(LastRequest::None),
        }
    }

    /// Send the mutation and wait for its result.
    ///
    /// The request runs to completion even if this future is dropped;
    /// its invalidations still apply.
    pub async fn trigger(&self, arg: A) -> Result<Arc<R>, QueryError> {
        let (request_id, task) = match self.store.start_mutation(&self.endpoint, arg) {
            Ok(started) => started,
            Err(error) => {
                self.replace(LastRequest::Invalid(error.clone()));
                return Err(error);
            }
        };
        self.replace(LastRequest::Sent(request_id));

        match task.await {
            Ok(result) => result,
            Err(e) => Err(QueryError::Aborted {
                message: e.to_string(),
            }),
        }
    }

    /// State of the most recent request.
    pub fn state(&self) -> MutationView<R> {
        match &*self.last.lock() {
            LastRequest::None => MutationView::default(),
            LastRequest::Sent(id) => self.store.mutation_view(self.endpoint.reducer_path(), *id),
            LastRequest::Invalid(error) => MutationView {
                status: QueryStatus::Error,
                data: None,
                error: Some(error.clone()),
            },
        }
    }

    /// Forget the most recent request.
    pub fn reset(&self) {
        self.replace(LastRequest::None);
    }

    fn replace(&self, next: LastRequest) {
        let previous = std::mem::replace(&mut *self.last.lock(), next);
        if let LastRequest::Sent(id) = previous {
            self.store.remove_mutation(self.endpoint.path(), id);
        }
    }
}

impl<A, R> Drop for MutationTrigger<A, R> {
    fn drop(&mut self) {
        if let LastRequest::Sent(id) = std::mem::replace(self.last.get_mut(), LastRequest::None) {
            self.store.remove_mutation(self.endpoint.path(), id);
        }
    }
}
