// ── Store aggregator ──
//
// One `Store` owns the state of every registered API slice and feature
// reducer behind a single lock. `dispatch` reduces an action under the
// lock, releases it, then runs the middleware chain in declaration order.
// Network work happens on spawned tasks whose results re-enter through
// `dispatch`, so every state change is serialized.

mod action;
mod middleware;
mod subscription;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

pub use action::{Action, ApiAction, ApiEvent, FeatureAction, Lifecycle};
pub use middleware::{Middleware, TracingMiddleware};
pub use subscription::{MutationTrigger, MutationView, QueryStream, QuerySubscription, QueryView};

use crate::cache::{CacheEntry, CacheKey, FetchMode, Payload, Tag};
use crate::endpoint::{EndpointKind, MutationEndpoint, QueryEndpoint};
use crate::error::{QueryError, StoreError};
use crate::feature::FeatureReducer;
use crate::slice::{ApiSlice, SliceState, SliceStats};
use middleware::CacheLifecycle;

// ── State tree ───────────────────────────────────────────────────────

struct StateTree {
    slices: HashMap<Arc<str>, SliceState>,
    features: Vec<(String, Box<dyn FeatureReducer>)>,
}

impl StateTree {
    fn reduce(&mut self, action: &Action) {
        if let Action::Api(api) = action {
            match self.slices.get_mut(&*api.path) {
                Some(slice) => slice.reduce(&api.path, &api.event),
                None => debug!(path = %api.path, "action for unknown slice ignored"),
            }
        }
        for (_, feature) in &mut self.features {
            feature.reduce(action);
        }
    }

    fn slice(&self, path: &str) -> Option<&SliceState> {
        self.slices.get(path)
    }

    fn entry(&self, path: &str, key: &CacheKey) -> Option<&CacheEntry> {
        self.slice(path)?.entry(key)
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Declares the slices, feature reducers, and middleware of a store.
#[derive(Default)]
pub struct StoreBuilder {
    slices: Vec<ApiSlice>,
    features: Vec<(String, Box<dyn FeatureReducer>)>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl StoreBuilder {
    /// Register an API slice under its reducer path.
    #[must_use]
    pub fn api(mut self, slice: &ApiSlice) -> Self {
        self.slices.push(slice.clone());
        self
    }

    /// Register a feature reducer under `key`.
    #[must_use]
    pub fn feature(mut self, key: impl Into<String>, reducer: impl FeatureReducer) -> Self {
        self.features.push((key.into(), Box::new(reducer)));
        self
    }

    /// Append middleware. Runs after the cache lifecycle middleware of
    /// every slice, in the order added.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Validate registrations and create the store.
    ///
    /// Must be called inside a tokio runtime; fetches and eviction timers
    /// are spawned onto it.
    pub fn build(self) -> Result<Store, StoreError> {
        let runtime = Handle::try_current().map_err(|_| StoreError::NoRuntime)?;

        let mut seen = HashSet::new();
        let feature_keys = self.features.iter().map(|(k, _)| k.as_str());
        let slice_paths = self.slices.iter().map(ApiSlice::reducer_path);
        for path in feature_keys.chain(slice_paths) {
            if path.trim().is_empty() {
                return Err(StoreError::EmptyName { what: "feature" });
            }
            if !seen.insert(path) {
                return Err(StoreError::DuplicateReducerPath {
                    path: path.to_owned(),
                });
            }
        }

        let mut chain: Vec<Arc<dyn Middleware>> = self
            .slices
            .iter()
            .map(|s| Arc::new(CacheLifecycle::new(s.clone())) as Arc<dyn Middleware>)
            .collect();
        chain.extend(self.middleware);

        let state = StateTree {
            slices: self
                .slices
                .iter()
                .map(|s| (Arc::clone(s.path()), SliceState::default()))
                .collect(),
            features: self.features,
        };

        info!(
            slices = self.slices.len(),
            features = state.features.len(),
            middleware = chain.len(),
            "store initialized"
        );

        Ok(Store {
            inner: Arc::new(StoreInner {
                state: Mutex::new(state),
                slices: self
                    .slices
                    .into_iter()
                    .map(|s| (Arc::clone(s.path()), s))
                    .collect(),
                middleware: chain,
                next_seq: AtomicU64::new(0),
                runtime,
            }),
        })
    }
}

// ── Store ────────────────────────────────────────────────────────────

struct StoreInner {
    state: Mutex<StateTree>,
    slices: HashMap<Arc<str>, ApiSlice>,
    middleware: Vec<Arc<dyn Middleware>>,
    /// Shared by query requests and mutation request ids; strictly
    /// increasing across the whole store.
    next_seq: AtomicU64,
    runtime: Handle,
}

/// The application store. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("slices", &self.reducer_paths())
            .finish_non_exhaustive()
    }
}

impl Store {
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Reduce `action`, then hand it to the middleware chain.
    pub fn dispatch(&self, action: Action) {
        self.inner.state.lock().reduce(&action);
        self.run_middleware(&action);
    }

    fn run_middleware(&self, action: &Action) {
        for middleware in &self.inner.middleware {
            middleware.handle(self, action);
        }
    }

    fn next_seq(&self) -> u64 {
        self.inner.next_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// Registered reducer paths of API slices, sorted.
    pub fn reducer_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.inner.slices.keys().map(|p| &**p).collect();
        paths.sort_unstable();
        paths
    }

    pub fn slice(&self, reducer_path: &str) -> Result<&ApiSlice, StoreError> {
        self.inner
            .slices
            .get(reducer_path)
            .ok_or_else(|| StoreError::UnknownSlice {
                path: reducer_path.to_owned(),
            })
    }

    fn slice_for(&self, path: &str, name: &str, kind: EndpointKind) -> Result<&ApiSlice, StoreError> {
        let slice = self.slice(path)?;
        if !slice.has_endpoint(name, kind) {
            return Err(StoreError::UnknownEndpoint {
                path: path.to_owned(),
                endpoint: name.to_owned(),
            });
        }
        Ok(slice)
    }

    /// Entry and mutation counts of one slice.
    pub fn stats(&self, reducer_path: &str) -> Result<SliceStats, StoreError> {
        self.inner
            .state
            .lock()
            .slice(reducer_path)
            .map(SliceState::stats)
            .ok_or_else(|| StoreError::UnknownSlice {
                path: reducer_path.to_owned(),
            })
    }

    /// Read a feature reducer's state.
    pub fn with_feature<T: 'static, O>(
        &self,
        key: &str,
        read: impl FnOnce(&T) -> O,
    ) -> Result<O, StoreError> {
        let state = self.inner.state.lock();
        state
            .features
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, f)| f.as_any().downcast_ref::<T>())
            .map(read)
            .ok_or_else(|| StoreError::UnknownFeature {
                key: key.to_owned(),
            })
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Subscribe to `endpoint(arg)`, starting a fetch if the cache holds
    /// nothing usable and none is in flight.
    ///
    /// The entry stays cached while the returned handle lives, and for the
    /// slice's retention period afterwards.
    pub fn subscribe<A, R>(
        &self,
        endpoint: &QueryEndpoint<A, R>,
        arg: A,
    ) -> Result<QuerySubscription<R>, StoreError>
    where
        A: Serialize + Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        let slice = self.slice_for(endpoint.reducer_path(), endpoint.name(), EndpointKind::Query)?;
        let path = Arc::clone(slice.path());
        let key = CacheKey::new(endpoint.name(), &arg)?;

        let action = Action::api(
            &path,
            ApiEvent::Subscribed {
                key: key.clone(),
                args: Payload::new(arg),
            },
        );
        let receiver = {
            let mut state = self.inner.state.lock();
            state.reduce(&action);
            state.entry(&path, &key).map(CacheEntry::watch)
        };
        self.run_middleware(&action);

        let receiver = receiver.ok_or_else(|| StoreError::UnknownSlice {
            path: path.to_string(),
        })?;
        self.begin_fetch(&path, &key, FetchMode::IfNeeded);
        Ok(QuerySubscription::new(self.clone(), path, key, receiver))
    }

    /// Subscribe, wait for the entry to settle, then release the
    /// subscription. The result stays cached for the retention period.
    pub async fn query<A, R>(&self, endpoint: &QueryEndpoint<A, R>, arg: A) -> Result<Arc<R>, QueryError>
    where
        A: Serialize + Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        let mut subscription = self.subscribe(endpoint, arg)?;
        subscription.resolved().await
    }

    /// Current cached state of `endpoint(arg)` without subscribing.
    pub fn select<A, R>(
        &self,
        endpoint: &QueryEndpoint<A, R>,
        arg: &A,
    ) -> Result<Option<QueryView<R>>, StoreError>
    where
        A: Serialize,
        R: Send + Sync + 'static,
    {
        let key = CacheKey::new(endpoint.name(), arg)?;
        let state = self.inner.state.lock();
        Ok(state
            .entry(endpoint.reducer_path(), &key)
            .map(|e| QueryView::from_snapshot(&e.snapshot())))
    }

    /// Refetch a cached entry unless a request for it is already running.
    /// Returns whether a request was started.
    pub fn refetch<A, R>(&self, endpoint: &QueryEndpoint<A, R>, arg: &A) -> Result<bool, StoreError>
    where
        A: Serialize,
    {
        let key = CacheKey::new(endpoint.name(), arg)?;
        Ok(self.begin_fetch(endpoint.path(), &key, FetchMode::Refetch))
    }

    /// Start a request for an existing entry if `mode` calls for one.
    pub(crate) fn begin_fetch(&self, path: &Arc<str>, key: &CacheKey, mode: FetchMode) -> bool {
        let Some(slice) = self.inner.slices.get(path) else {
            return false;
        };
        let Some(endpoint) = slice.query(key.endpoint()) else {
            debug!(%path, %key, "no query endpoint for key");
            return false;
        };

        let now = Utc::now();
        let (action, seq, args) = {
            let mut state = self.inner.state.lock();
            let Some(entry) = state.entry(path, key) else {
                return false;
            };
            let refetch_after = slice.policy().refetch_on_mount_or_arg_change;
            if !entry.needs_fetch(mode, refetch_after, now) {
                trace!(%path, %key, status = %entry.status, "reusing cache entry");
                return false;
            }
            let args = entry.args.clone();
            let seq = self.next_seq();
            let action = Action::api(
                path,
                ApiEvent::QueryStarted {
                    key: key.clone(),
                    seq,
                    started_at: now,
                },
            );
            state.reduce(&action);
            (action, seq, args)
        };
        debug!(%path, %key, seq, ?mode, "fetch started");
        self.run_middleware(&action);

        let store = self.clone();
        let client = slice.client().clone();
        let path = Arc::clone(path);
        let key = key.clone();
        self.inner.runtime.spawn(async move {
            let fetched = endpoint.fetch(client, args).await;
            let event = match fetched.result {
                Ok(data) => ApiEvent::QueryFulfilled {
                    key,
                    seq,
                    data,
                    tags: fetched.tags,
                    fulfilled_at: Utc::now(),
                },
                Err(error) => {
                    debug!(%path, %key, seq, %error, "fetch failed");
                    ApiEvent::QueryRejected {
                        key,
                        seq,
                        error,
                        tags: fetched.tags,
                    }
                }
            };
            store.dispatch(Action::api(&path, event));
        });
        true
    }

    pub(crate) fn release(&self, path: &Arc<str>, key: &CacheKey) {
        self.dispatch(Action::api(path, ApiEvent::Unsubscribed { key: key.clone() }));
    }

    /// Arm the retention timer for an entry that just lost its last
    /// subscriber. The timer holds only a weak reference to the store.
    pub(crate) fn schedule_eviction(&self, slice: &ApiSlice, key: &CacheKey) {
        let generation = {
            let state = self.inner.state.lock();
            match state.entry(slice.path(), key) {
                Some(entry) if entry.subscribers == 0 => entry.unsubscribed_generation,
                _ => return,
            }
        };
        let retention = slice.policy().keep_unused_data_for;
        let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);
        let path = Arc::clone(slice.path());
        let key = key.clone();
        trace!(%path, %key, ?retention, "eviction scheduled");
        self.inner.runtime.spawn(async move {
            tokio::time::sleep(retention).await;
            if let Some(inner) = weak.upgrade() {
                Store { inner }.dispatch(Action::api(&path, ApiEvent::RemoveQuery { key, generation }));
            }
        });
    }

    /// Start requests for subscribed entries of `slice` matching `filter`.
    pub(crate) fn refetch_subscribed(
        &self,
        slice: &ApiSlice,
        mode: FetchMode,
        filter: impl Fn(&CacheEntry) -> bool,
    ) {
        let keys: Vec<CacheKey> = {
            let state = self.inner.state.lock();
            state
                .slice(slice.path())
                .map(|s| {
                    s.entries()
                        .filter(|e| e.subscribers > 0 && filter(e))
                        .map(|e| e.key.clone())
                        .collect()
                })
                .unwrap_or_default()
        };
        for key in keys {
            self.begin_fetch(slice.path(), &key, mode);
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// A trigger for `endpoint` that tracks its most recent request.
    pub fn mutation<A, R>(&self, endpoint: &MutationEndpoint<A, R>) -> MutationTrigger<A, R>
    where
        A: Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        MutationTrigger::new(self.clone(), endpoint.clone())
    }

    /// Validate `arg`, record the request, and spawn it. A validation
    /// failure returns before anything is recorded or sent.
    pub(crate) fn start_mutation<A, R>(
        &self,
        endpoint: &MutationEndpoint<A, R>,
        arg: A,
    ) -> Result<(u64, JoinHandle<Result<Arc<R>, QueryError>>), QueryError>
    where
        A: Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        endpoint.check(&arg).inspect_err(|e| {
            debug!(endpoint = endpoint.name(), error = %e, "mutation rejected before sending");
        })?;
        let slice =
            self.slice_for(endpoint.reducer_path(), endpoint.name(), EndpointKind::Mutation)?;
        let path = Arc::clone(slice.path());
        let client = slice.client().clone();

        let request_id = self.next_seq();
        self.dispatch(Action::api(
            &path,
            ApiEvent::MutationStarted {
                request_id,
                endpoint: endpoint.name().to_owned(),
                started_at: Utc::now(),
            },
        ));

        let store = self.clone();
        let endpoint = endpoint.clone();
        let task = self.inner.runtime.spawn(async move {
            let (result, invalidates) = endpoint.execute(&client, &arg).await;
            let result = result.map(Arc::new);
            let event = match &result {
                Ok(data) => ApiEvent::MutationFulfilled {
                    request_id,
                    data: Payload::from_arc(Arc::clone(data)),
                    invalidates,
                    fulfilled_at: Utc::now(),
                },
                Err(error) => ApiEvent::MutationRejected {
                    request_id,
                    error: error.clone(),
                    invalidates,
                },
            };
            store.dispatch(Action::api(&path, event));
            result
        });
        Ok((request_id, task))
    }

    pub(crate) fn mutation_view<R>(&self, path: &str, request_id: u64) -> MutationView<R>
    where
        R: Send + Sync + 'static,
    {
        let state = self.inner.state.lock();
        state
            .slice(path)
            .and_then(|s| s.mutation(request_id))
            .map(MutationView::from_snapshot)
            .unwrap_or_default()
    }

    pub(crate) fn remove_mutation(&self, path: &Arc<str>, request_id: u64) {
        self.dispatch(Action::api(path, ApiEvent::MutationRemoved { request_id }));
    }

    // ── Cache control ────────────────────────────────────────────────

    /// Mark entries of one slice providing a matching tag as stale.
    /// Subscribed entries refetch immediately.
    pub fn invalidate_tags(&self, reducer_path: &str, tags: Vec<Tag>) -> Result<(), StoreError> {
        let path = Arc::clone(self.slice(reducer_path)?.path());
        self.dispatch(Action::api(&path, ApiEvent::InvalidateTags { tags }));
        Ok(())
    }

    /// Drop every cached entry and mutation record of one slice.
    pub fn reset_api_state(&self, reducer_path: &str) -> Result<(), StoreError> {
        let path = Arc::clone(self.slice(reducer_path)?.path());
        self.dispatch(Action::api(&path, ApiEvent::ResetApiState));
        Ok(())
    }

    /// The host application regained focus.
    pub fn notify_focus(&self) {
        self.dispatch(Action::Lifecycle(Lifecycle::Focused));
    }

    /// Network connectivity came back.
    pub fn notify_reconnect(&self) {
        self.dispatch(Action::Lifecycle(Lifecycle::Reconnected));
    }
}
