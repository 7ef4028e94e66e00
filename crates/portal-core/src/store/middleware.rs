// ── Middleware ──
//
// Middleware sees every action after it has been reduced and may start
// follow-up work: refetches, eviction timers, logging. It runs outside
// the store lock and may dispatch.

use tracing::{debug, trace};

use super::{Action, ApiEvent, Lifecycle, Store};
use crate::cache::FetchMode;
use crate::slice::ApiSlice;

/// Post-reduce hook in the store's dispatch chain.
pub trait Middleware: Send + Sync {
    fn handle(&self, store: &Store, action: &Action);
}

/// Cache lifecycle of one slice. Installed automatically for every
/// registered slice, ahead of user middleware.
pub(crate) struct CacheLifecycle {
    slice: ApiSlice,
}

impl CacheLifecycle {
    pub(crate) fn new(slice: ApiSlice) -> Self {
        Self { slice }
    }
}

impl Middleware for CacheLifecycle {
    fn handle(&self, store: &Store, action: &Action) {
        let policy = self.slice.policy();
        match action {
            Action::Api(api) if api.path == *self.slice.path() => {
                if api.event.invalidated_tags().is_some_and(|t| !t.is_empty()) {
                    store.refetch_subscribed(&self.slice, FetchMode::Invalidated, |e| e.invalidated);
                }
                match &api.event {
                    ApiEvent::Unsubscribed { key } => store.schedule_eviction(&self.slice, key),
                    // A result that predates an invalidation leaves the entry flagged.
                    ApiEvent::QueryFulfilled { key, .. } | ApiEvent::QueryRejected { key, .. } => {
                        store.refetch_subscribed(&self.slice, FetchMode::Invalidated, |e| {
                            e.invalidated && e.key == *key
                        });
                    }
                    _ => {}
                }
            }
            Action::Lifecycle(Lifecycle::Focused) if policy.refetch_on_focus => {
                debug!(path = self.slice.reducer_path(), "refetching on focus");
                store.refetch_subscribed(&self.slice, FetchMode::Refetch, |_| true);
            }
            Action::Lifecycle(Lifecycle::Reconnected) if policy.refetch_on_reconnect => {
                debug!(path = self.slice.reducer_path(), "refetching on reconnect");
                store.refetch_subscribed(&self.slice, FetchMode::Refetch, |_| true);
            }
            _ => {}
        }
    }
}

/// Logs every dispatched action at trace level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn handle(&self, _store: &Store, action: &Action) {
        trace!(action = %action.type_name(), "dispatched");
    }
}
