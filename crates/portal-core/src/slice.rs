// ── API slices ──
//
// An API slice groups the endpoints of one backend under a reducer path,
// together with the HTTP client they share and the cache policy that
// governs their entries. `SliceState` is the slice's reducer: the only
// code that mutates cache entries and mutation records.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use portal_api::HttpClient;
use tracing::{debug, trace};

use crate::cache::{CacheEntry, CacheKey, MutationSnapshot, QueryStatus, Tag};
use crate::config::CachePolicy;
use crate::endpoint::{
    EndpointDescriptor, EndpointKind, ErasedQuery, MutationDef, MutationEndpoint, QueryDef,
    QueryEndpoint,
};
use crate::error::StoreError;
use crate::store::ApiEvent;

struct SliceInner {
    reducer_path: Arc<str>,
    client: HttpClient,
    policy: CachePolicy,
    endpoints: BTreeMap<&'static str, EndpointDescriptor>,
}

/// A named group of endpoints sharing one client and cache policy.
///
/// Cheap to clone. Register it on a `StoreBuilder` to give it state.
#[derive(Clone)]
pub struct ApiSlice {
    inner: Arc<SliceInner>,
}

impl fmt::Debug for ApiSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSlice")
            .field("reducer_path", &self.inner.reducer_path)
            .field("endpoints", &self.inner.endpoints.keys().collect::<Vec<_>>())
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

impl ApiSlice {
    /// Start defining a slice rooted at `reducer_path`.
    pub fn builder(reducer_path: &str, client: HttpClient) -> Result<ApiSliceBuilder, StoreError> {
        if reducer_path.trim().is_empty() {
            return Err(StoreError::EmptyName {
                what: "reducer path",
            });
        }
        Ok(ApiSliceBuilder {
            reducer_path: Arc::from(reducer_path),
            client,
            policy: CachePolicy::default(),
            endpoints: BTreeMap::new(),
        })
    }

    pub fn reducer_path(&self) -> &str {
        &self.inner.reducer_path
    }

    pub(crate) fn path(&self) -> &Arc<str> {
        &self.inner.reducer_path
    }

    pub fn client(&self) -> &HttpClient {
        &self.inner.client
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.inner.policy
    }

    /// Registered endpoint names and kinds, sorted by name.
    pub fn endpoints(&self) -> impl Iterator<Item = (&'static str, EndpointKind)> + '_ {
        self.inner.endpoints.iter().map(|(name, d)| (*name, d.kind()))
    }

    pub(crate) fn has_endpoint(&self, name: &str, kind: EndpointKind) -> bool {
        self.inner
            .endpoints
            .get(name)
            .is_some_and(|d| d.kind() == kind)
    }

    pub(crate) fn query(&self, name: &str) -> Option<Arc<dyn ErasedQuery>> {
        match self.inner.endpoints.get(name)? {
            EndpointDescriptor::Query(q) => Some(Arc::clone(q)),
            EndpointDescriptor::Mutation => None,
        }
    }
}

/// Collects endpoint definitions for one slice.
pub struct ApiSliceBuilder {
    reducer_path: Arc<str>,
    client: HttpClient,
    policy: CachePolicy,
    endpoints: BTreeMap<&'static str, EndpointDescriptor>,
}

impl ApiSliceBuilder {
    /// Override the default cache policy.
    pub fn policy(&mut self, policy: CachePolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Register a query endpoint and return its typed handle.
    pub fn query<A, R>(
        &mut self,
        name: &'static str,
        def: QueryDef<A, R>,
    ) -> Result<QueryEndpoint<A, R>, StoreError>
    where
        A: Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        self.reserve(name)?;
        let endpoint = QueryEndpoint::new(Arc::clone(&self.reducer_path), name, def);
        self.endpoints.insert(
            name,
            EndpointDescriptor::Query(Arc::new(endpoint.clone())),
        );
        Ok(endpoint)
    }

    /// Register a mutation endpoint and return its typed handle.
    pub fn mutation<A, R>(
        &mut self,
        name: &'static str,
        def: MutationDef<A, R>,
    ) -> Result<MutationEndpoint<A, R>, StoreError>
    where
        A: Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        self.reserve(name)?;
        self.endpoints.insert(name, EndpointDescriptor::Mutation);
        Ok(MutationEndpoint::new(
            Arc::clone(&self.reducer_path),
            name,
            def,
        ))
    }

    fn reserve(&self, name: &str) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName {
                what: "endpoint",
            });
        }
        if self.endpoints.contains_key(name) {
            return Err(StoreError::DuplicateEndpoint {
                path: self.reducer_path.to_string(),
                endpoint: name.to_owned(),
            });
        }
        Ok(())
    }

    pub fn build(self) -> ApiSlice {
        ApiSlice {
            inner: Arc::new(SliceInner {
                reducer_path: self.reducer_path,
                client: self.client,
                policy: self.policy,
                endpoints: self.endpoints,
            }),
        }
    }
}

// ── Slice state ──────────────────────────────────────────────────────

/// Counts over one slice's cache, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceStats {
    pub queries: usize,
    pub subscribed: usize,
    pub loading: usize,
    pub mutations: usize,
}

/// Cache entries and mutation records of one slice.
#[derive(Default)]
pub(crate) struct SliceState {
    queries: HashMap<CacheKey, CacheEntry>,
    mutations: HashMap<u64, MutationSnapshot>,
}

impl SliceState {
    pub(crate) fn entry(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.queries.get(key)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.queries.values()
    }

    pub(crate) fn mutation(&self, request_id: u64) -> Option<&MutationSnapshot> {
        self.mutations.get(&request_id)
    }

    pub(crate) fn stats(&self) -> SliceStats {
        SliceStats {
            queries: self.queries.len(),
            subscribed: self.queries.values().filter(|e| e.subscribers > 0).count(),
            loading: self
                .queries
                .values()
                .filter(|e| e.status == QueryStatus::Loading)
                .count(),
            mutations: self.mutations.len(),
        }
    }

    /// Apply one event. Events for entries that no longer exist are inert.
    pub(crate) fn reduce(&mut self, path: &str, event: &ApiEvent) {
        match event {
            ApiEvent::Subscribed { key, args } => {
                let entry = self
                    .queries
                    .entry(key.clone())
                    .or_insert_with(|| CacheEntry::new(key.clone(), args.clone()));
                entry.subscribers += 1;
                trace!(path, %key, subscribers = entry.subscribers, "subscribed");
            }

            ApiEvent::Unsubscribed { key } => {
                if let Some(entry) = self.queries.get_mut(key) {
                    entry.subscribers = entry.subscribers.saturating_sub(1);
                    if entry.subscribers == 0 {
                        entry.unsubscribed_generation += 1;
                    }
                    trace!(path, %key, subscribers = entry.subscribers, "unsubscribed");
                }
            }

            ApiEvent::QueryStarted {
                key,
                seq,
                started_at,
            } => {
                if let Some(entry) = self.queries.get_mut(key) {
                    entry.status = QueryStatus::Loading;
                    entry.request_seq = entry.request_seq.max(*seq);
                    entry.started_at = Some(*started_at);
                    entry.invalidated = false;
                    entry.missed_invalidations.clear();
                    entry.publish();
                }
            }

            ApiEvent::QueryFulfilled {
                key,
                seq,
                data,
                tags,
                fulfilled_at,
            } => {
                let Some(entry) = self.queries.get_mut(key) else {
                    debug!(path, %key, seq, "result for evicted entry ignored");
                    return;
                };
                if *seq <= entry.applied_seq {
                    debug!(path, %key, seq, applied = entry.applied_seq, "stale result discarded");
                    return;
                }
                entry.applied_seq = *seq;
                entry.data = Some(data.clone());
                entry.provided_tags.clone_from(tags);
                entry.fulfilled_at = Some(*fulfilled_at);
                // A newer request is still running: keep showing it as loading.
                if *seq >= entry.request_seq {
                    if entry.take_missed_invalidation(tags) && entry.subscribers > 0 {
                        debug!(path, %key, seq, "result predates an invalidation");
                    } else {
                        entry.status = QueryStatus::Success;
                        entry.error = None;
                    }
                }
                entry.publish();
            }

            ApiEvent::QueryRejected {
                key,
                seq,
                error,
                tags,
            } => {
                let Some(entry) = self.queries.get_mut(key) else {
                    debug!(path, %key, seq, "error for evicted entry ignored");
                    return;
                };
                if *seq < entry.request_seq || *seq <= entry.applied_seq {
                    debug!(path, %key, seq, "superseded error discarded");
                    return;
                }
                entry.applied_seq = *seq;
                if !(entry.take_missed_invalidation(tags) && entry.subscribers > 0) {
                    entry.status = QueryStatus::Error;
                }
                entry.error = Some(error.clone());
                entry.provided_tags.clone_from(tags);
                entry.publish();
            }

            ApiEvent::MutationStarted {
                request_id,
                endpoint,
                started_at,
            } => {
                self.mutations.insert(
                    *request_id,
                    MutationSnapshot {
                        endpoint: endpoint.clone(),
                        status: QueryStatus::Loading,
                        data: None,
                        error: None,
                        started_at: *started_at,
                        fulfilled_at: None,
                    },
                );
            }

            ApiEvent::MutationFulfilled {
                request_id,
                data,
                invalidates,
                fulfilled_at,
            } => {
                if let Some(m) = self.mutations.get_mut(request_id) {
                    m.status = QueryStatus::Success;
                    m.data = Some(data.clone());
                    m.fulfilled_at = Some(*fulfilled_at);
                }
                self.invalidate(path, invalidates);
            }

            ApiEvent::MutationRejected {
                request_id,
                error,
                invalidates,
            } => {
                if let Some(m) = self.mutations.get_mut(request_id) {
                    m.status = QueryStatus::Error;
                    m.error = Some(error.clone());
                }
                self.invalidate(path, invalidates);
            }

            ApiEvent::MutationRemoved { request_id } => {
                self.mutations.remove(request_id);
            }

            ApiEvent::InvalidateTags { tags } => self.invalidate(path, tags),

            ApiEvent::RemoveQuery { key, generation } => {
                let evict = self.queries.get(key).is_some_and(|e| {
                    e.subscribers == 0 && e.unsubscribed_generation == *generation
                });
                if evict {
                    if let Some(entry) = self.queries.remove(key) {
                        entry.publish_removed();
                        debug!(path, %key, "evicted unused entry");
                    }
                }
            }

            ApiEvent::ResetApiState => {
                for entry in self.queries.values() {
                    entry.publish_removed();
                }
                debug!(path, queries = self.queries.len(), "api state reset");
                self.queries.clear();
                self.mutations.clear();
            }
        }
    }

    fn invalidate(&mut self, path: &str, tags: &[Tag]) {
        if tags.is_empty() {
            return;
        }
        for entry in self.queries.values_mut() {
            if entry.is_hit_by(tags) {
                entry.invalidated = true;
                trace!(path, key = %entry.key, "invalidated");
            } else if entry.status == QueryStatus::Loading {
                // Tags of a first fetch are unknown until it settles.
                entry.missed_invalidations.extend_from_slice(tags);
                trace!(path, key = %entry.key, "invalidation held for running request");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use portal_api::{Anonymous, Request, TransportConfig};

    use super::*;
    use crate::cache::Payload;
    use crate::error::QueryError;

    const PATH: &str = "rtk/test";

    fn client() -> HttpClient {
        HttpClient::new(
            "http://localhost",
            &TransportConfig::default(),
            Arc::new(Anonymous),
        )
        .unwrap()
    }

    fn key() -> CacheKey {
        CacheKey::new("fetchActiveApps", &()).unwrap()
    }

    fn subscribed() -> SliceState {
        let mut state = SliceState::default();
        state.reduce(
            PATH,
            &ApiEvent::Subscribed {
                key: key(),
                args: Payload::new(()),
            },
        );
        state
    }

    fn started(state: &mut SliceState, seq: u64) {
        state.reduce(
            PATH,
            &ApiEvent::QueryStarted {
                key: key(),
                seq,
                started_at: Utc::now(),
            },
        );
    }

    fn fulfilled(state: &mut SliceState, seq: u64, value: &str) {
        state.reduce(
            PATH,
            &ApiEvent::QueryFulfilled {
                key: key(),
                seq,
                data: Payload::new(value.to_string()),
                tags: vec![Tag::kind("Apps")],
                fulfilled_at: Utc::now(),
            },
        );
    }

    fn data(state: &SliceState) -> Option<String> {
        state
            .entry(&key())
            .and_then(|e| e.data.as_ref())
            .and_then(|d| d.downcast_ref::<String>().cloned())
    }

    // ── Builder ──────────────────────────────────────────────────────

    #[test]
    fn duplicate_endpoint_is_rejected() {
        let mut builder = ApiSlice::builder(PATH, client()).unwrap();
        builder
            .query("fetchActiveApps", QueryDef::<(), Vec<String>>::json(|()| Ok(Request::get("a"))))
            .unwrap();
        let err = builder
            .mutation("fetchActiveApps", MutationDef::<(), ()>::raw(|()| Ok(Request::post("a")), |_| Ok(())))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEndpoint { .. }));
    }

    #[test]
    fn empty_names_are_rejected() {
        assert!(matches!(
            ApiSlice::builder(" ", client()),
            Err(StoreError::EmptyName { .. })
        ));
        let mut builder = ApiSlice::builder(PATH, client()).unwrap();
        let err = builder
            .query("", QueryDef::<(), String>::json(|()| Ok(Request::get("a"))))
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyName { what: "endpoint" }));
    }

    #[test]
    fn built_slice_lists_endpoints() {
        let mut builder = ApiSlice::builder(PATH, client()).unwrap();
        let q = builder
            .query("fetchModels", QueryDef::<(), String>::json(|()| Ok(Request::get("m"))))
            .unwrap();
        builder
            .mutation("postModel", MutationDef::<(), String>::json(|()| Ok(Request::post("m"))))
            .unwrap();
        let slice = builder.build();

        assert_eq!(q.reducer_path(), PATH);
        assert_eq!(
            slice.endpoints().collect::<Vec<_>>(),
            vec![
                ("fetchModels", EndpointKind::Query),
                ("postModel", EndpointKind::Mutation)
            ]
        );
        assert!(slice.query("fetchModels").is_some());
        assert!(slice.query("postModel").is_none());
    }

    // ── Reducer ──────────────────────────────────────────────────────

    #[test]
    fn fulfilled_result_becomes_success() {
        let mut state = subscribed();
        started(&mut state, 1);
        fulfilled(&mut state, 1, "first");

        let entry = state.entry(&key()).unwrap();
        assert_eq!(entry.status, QueryStatus::Success);
        assert_eq!(data(&state).as_deref(), Some("first"));
    }

    #[test]
    fn older_result_never_overwrites_newer() {
        let mut state = subscribed();
        started(&mut state, 1);
        started(&mut state, 2);
        fulfilled(&mut state, 2, "newer");
        fulfilled(&mut state, 1, "older");

        assert_eq!(data(&state).as_deref(), Some("newer"));
        assert_eq!(state.entry(&key()).unwrap().status, QueryStatus::Success);
    }

    #[test]
    fn early_older_result_keeps_loading() {
        let mut state = subscribed();
        started(&mut state, 1);
        started(&mut state, 2);
        fulfilled(&mut state, 1, "older");

        let entry = state.entry(&key()).unwrap();
        assert_eq!(entry.status, QueryStatus::Loading);
        assert_eq!(data(&state).as_deref(), Some("older"));

        fulfilled(&mut state, 2, "newer");
        assert_eq!(state.entry(&key()).unwrap().status, QueryStatus::Success);
        assert_eq!(data(&state).as_deref(), Some("newer"));
    }

    #[test]
    fn superseded_error_is_ignored() {
        let mut state = subscribed();
        started(&mut state, 1);
        started(&mut state, 2);
        state.reduce(
            PATH,
            &ApiEvent::QueryRejected {
                key: key(),
                seq: 1,
                error: QueryError::Network {
                    message: "down".into(),
                },
                tags: Vec::new(),
            },
        );
        let entry = state.entry(&key()).unwrap();
        assert_eq!(entry.status, QueryStatus::Loading);
        assert!(entry.error.is_none());
    }

    #[test]
    fn rejection_keeps_previous_data() {
        let mut state = subscribed();
        started(&mut state, 1);
        fulfilled(&mut state, 1, "cached");
        started(&mut state, 2);
        state.reduce(
            PATH,
            &ApiEvent::QueryRejected {
                key: key(),
                seq: 2,
                error: QueryError::HttpStatus {
                    status: 500,
                    message: "boom".into(),
                },
                tags: Vec::new(),
            },
        );
        let entry = state.entry(&key()).unwrap();
        assert_eq!(entry.status, QueryStatus::Error);
        assert_eq!(entry.error.as_ref().and_then(QueryError::status), Some(500));
        assert_eq!(data(&state).as_deref(), Some("cached"));
    }

    #[test]
    fn mutation_marks_matching_entries() {
        let mut state = subscribed();
        started(&mut state, 1);
        fulfilled(&mut state, 1, "apps");
        state.reduce(
            PATH,
            &ApiEvent::MutationStarted {
                request_id: 7,
                endpoint: "updateApps".into(),
                started_at: Utc::now(),
            },
        );
        state.reduce(
            PATH,
            &ApiEvent::MutationFulfilled {
                request_id: 7,
                data: Payload::new(()),
                invalidates: vec![Tag::kind("Apps")],
                fulfilled_at: Utc::now(),
            },
        );

        assert!(state.entry(&key()).unwrap().invalidated);
        assert_eq!(state.mutation(7).unwrap().status, QueryStatus::Success);
    }

    #[test]
    fn invalidation_during_first_fetch_flags_its_result() {
        let mut state = subscribed();
        started(&mut state, 1);
        state.reduce(
            PATH,
            &ApiEvent::InvalidateTags {
                tags: vec![Tag::kind("Apps")],
            },
        );
        assert!(!state.entry(&key()).unwrap().invalidated);

        fulfilled(&mut state, 1, "before mutation");
        let entry = state.entry(&key()).unwrap();
        assert!(entry.invalidated);
        assert_eq!(entry.status, QueryStatus::Loading);
        assert_eq!(data(&state).as_deref(), Some("before mutation"));
    }

    #[test]
    fn held_invalidation_is_dropped_by_newer_request() {
        let mut state = subscribed();
        started(&mut state, 1);
        state.reduce(
            PATH,
            &ApiEvent::InvalidateTags {
                tags: vec![Tag::kind("Apps")],
            },
        );
        started(&mut state, 2);
        fulfilled(&mut state, 2, "fresh");

        let entry = state.entry(&key()).unwrap();
        assert!(!entry.invalidated);
        assert_eq!(entry.status, QueryStatus::Success);
    }

    #[test]
    fn unrelated_invalidation_during_fetch_is_ignored() {
        let mut state = subscribed();
        started(&mut state, 1);
        state.reduce(
            PATH,
            &ApiEvent::InvalidateTags {
                tags: vec![Tag::kind("SemanticModels")],
            },
        );
        fulfilled(&mut state, 1, "apps");

        let entry = state.entry(&key()).unwrap();
        assert!(!entry.invalidated);
        assert_eq!(entry.status, QueryStatus::Success);
    }

    #[test]
    fn removal_requires_matching_generation() {
        let mut state = subscribed();
        state.reduce(PATH, &ApiEvent::Unsubscribed { key: key() });
        let generation = state.entry(&key()).unwrap().unsubscribed_generation;

        // Resubscribed and released again before the first timer fired.
        state.reduce(
            PATH,
            &ApiEvent::Subscribed {
                key: key(),
                args: Payload::new(()),
            },
        );
        state.reduce(PATH, &ApiEvent::Unsubscribed { key: key() });
        state.reduce(PATH, &ApiEvent::RemoveQuery { key: key(), generation });
        assert!(state.entry(&key()).is_some());

        state.reduce(
            PATH,
            &ApiEvent::RemoveQuery {
                key: key(),
                generation: generation + 1,
            },
        );
        assert!(state.entry(&key()).is_none());
    }

    #[test]
    fn result_after_eviction_is_inert() {
        let mut state = subscribed();
        started(&mut state, 1);
        state.reduce(PATH, &ApiEvent::ResetApiState);
        fulfilled(&mut state, 1, "late");
        assert!(state.entry(&key()).is_none());
        assert_eq!(state.stats(), SliceStats::default());
    }
}
