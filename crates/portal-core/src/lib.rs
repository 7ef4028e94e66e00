//! Client-side data layer between `portal-api` and view consumers.
//!
//! - **[`ApiSlice`]**: a named group of query and mutation endpoints sharing
//!   one [`HttpClient`](portal_api::HttpClient) and a [`CachePolicy`].
//!   Endpoints are declared with [`QueryDef`] / [`MutationDef`] and come
//!   back as typed handles ([`QueryEndpoint`], [`MutationEndpoint`]).
//!
//! - **[`Store`]**: process-wide container aggregating every slice's cache
//!   and ordinary [`FeatureReducer`]s under unique keys. All changes flow
//!   through [`Store::dispatch`]; middleware runs after each action in
//!   declaration order.
//!
//! - **Query cache**: entries keyed by endpoint + canonical argument
//!   ([`CacheKey`]). Concurrent subscribers share one in-flight request;
//!   results older than the applied one are discarded; entries with no
//!   subscribers are evicted after the retention period; mutations
//!   invalidate entries through [`Tag`]s and subscribed entries refetch.
//!
//! - **Consumer handles**: [`QuerySubscription`] exposes
//!   `{data, is_loading, is_fetching, is_error, error}` plus `changed()` and
//!   `refetch()`; [`MutationTrigger`] sends a mutation and tracks its state.
//!
//! - **Portal slices** ([`apis`]): marketplace, app subscription, and
//!   semantic model hub endpoints, assembled by [`PortalApis`].

pub mod apis;
pub mod cache;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod feature;
pub mod slice;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use apis::PortalApis;
pub use cache::{CacheKey, Payload, QueryStatus, Tag};
pub use config::{CachePolicy, PortalConfig, TlsVerification};
pub use endpoint::{EndpointKind, MutationDef, MutationEndpoint, QueryDef, QueryEndpoint};
pub use error::{QueryError, StoreError};
pub use feature::{ErrorState, FeatureReducer, LanguageState};
pub use slice::{ApiSlice, ApiSliceBuilder, SliceStats};
pub use store::{
    Action, ApiAction, ApiEvent, FeatureAction, Lifecycle, Middleware, MutationTrigger,
    MutationView, QueryStream, QuerySubscription, QueryView, Store, StoreBuilder,
    TracingMiddleware,
};
