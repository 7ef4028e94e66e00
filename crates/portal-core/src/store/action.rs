// ── Store actions ──
//
// Every state change goes through `Store::dispatch` as one of these. API
// actions are addressed to a single slice by reducer path; feature actions
// and lifecycle signals are seen by every reducer and middleware.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::cache::{CacheKey, Payload, Tag};
use crate::error::QueryError;

/// Closed set of actions the store understands.
#[derive(Debug, Clone)]
pub enum Action {
    /// Cache bookkeeping for one API slice.
    Api(ApiAction),
    /// Application state owned by a feature reducer.
    Feature(FeatureAction),
    /// Environment signals that can trigger refetches.
    Lifecycle(Lifecycle),
}

impl Action {
    pub(crate) fn api(path: &Arc<str>, event: ApiEvent) -> Self {
        Self::Api(ApiAction {
            path: Arc::clone(path),
            event,
        })
    }

    /// Short action type for logs, in `"<slice>/<event>"` form.
    pub fn type_name(&self) -> String {
        match self {
            Self::Api(a) => format!("{}/{}", a.path, a.event.name()),
            Self::Feature(f) => f.kind.clone(),
            Self::Lifecycle(Lifecycle::Focused) => "lifecycle/focused".into(),
            Self::Lifecycle(Lifecycle::Reconnected) => "lifecycle/reconnected".into(),
        }
    }
}

/// An event addressed to the slice at `path`.
#[derive(Debug, Clone)]
pub struct ApiAction {
    pub path: Arc<str>,
    pub event: ApiEvent,
}

/// Cache events produced by the store on behalf of a slice.
#[derive(Debug, Clone)]
pub enum ApiEvent {
    /// A consumer subscribed to a query; creates the entry if absent.
    Subscribed { key: CacheKey, args: Payload },
    /// A consumer released its subscription.
    Unsubscribed { key: CacheKey },
    /// A request with sequence number `seq` started for `key`.
    QueryStarted {
        key: CacheKey,
        seq: u64,
        started_at: DateTime<Utc>,
    },
    QueryFulfilled {
        key: CacheKey,
        seq: u64,
        data: Payload,
        tags: Vec<Tag>,
        fulfilled_at: DateTime<Utc>,
    },
    QueryRejected {
        key: CacheKey,
        seq: u64,
        error: QueryError,
        tags: Vec<Tag>,
    },
    MutationStarted {
        request_id: u64,
        endpoint: String,
        started_at: DateTime<Utc>,
    },
    MutationFulfilled {
        request_id: u64,
        data: Payload,
        invalidates: Vec<Tag>,
        fulfilled_at: DateTime<Utc>,
    },
    MutationRejected {
        request_id: u64,
        error: QueryError,
        invalidates: Vec<Tag>,
    },
    /// The owner of a mutation request no longer needs its result.
    MutationRemoved { request_id: u64 },
    /// Mark every entry providing a matching tag as stale.
    InvalidateTags { tags: Vec<Tag> },
    /// Retention timer fired. Only applies if the entry is still unused
    /// and no subscriber came and went since the timer was scheduled.
    RemoveQuery { key: CacheKey, generation: u64 },
    /// Drop every entry and mutation record of the slice.
    ResetApiState,
}

impl ApiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Subscribed { .. } => "subscribed",
            Self::Unsubscribed { .. } => "unsubscribed",
            Self::QueryStarted { .. } => "queryStarted",
            Self::QueryFulfilled { .. } => "queryFulfilled",
            Self::QueryRejected { .. } => "queryRejected",
            Self::MutationStarted { .. } => "mutationStarted",
            Self::MutationFulfilled { .. } => "mutationFulfilled",
            Self::MutationRejected { .. } => "mutationRejected",
            Self::MutationRemoved { .. } => "mutationRemoved",
            Self::InvalidateTags { .. } => "invalidateTags",
            Self::RemoveQuery { .. } => "removeQuery",
            Self::ResetApiState => "resetApiState",
        }
    }

    /// Tags this event invalidates, if it is an invalidating event.
    pub fn invalidated_tags(&self) -> Option<&[Tag]> {
        match self {
            Self::MutationFulfilled { invalidates, .. }
            | Self::MutationRejected { invalidates, .. } => Some(invalidates),
            Self::InvalidateTags { tags } => Some(tags),
            _ => None,
        }
    }
}

/// An action for a feature reducer: a type string plus a JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAction {
    pub kind: String,
    pub payload: Value,
}

impl FeatureAction {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// Environment signals forwarded by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Focused,
    Reconnected,
}
