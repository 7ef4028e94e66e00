// ── Endpoint definitions ──
//
// A query or mutation endpoint is a request builder, a response transform,
// and a tag function. Definitions are plain values; registering one on an
// `ApiSliceBuilder` yields a typed handle bound to that slice's reducer
// path. The store only ever sees endpoints through the closed
// `EndpointDescriptor` set.

use std::fmt;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use portal_api::{HttpClient, Request, Response};
use serde::de::DeserializeOwned;

use crate::cache::{Payload, Tag};
use crate::error::QueryError;

type BuildFn<A> = dyn Fn(&A) -> Result<Request, portal_api::Error> + Send + Sync;
type TransformFn<R> = dyn Fn(Response) -> Result<R, portal_api::Error> + Send + Sync;
type TagFn<A, R> = dyn Fn(&A, Result<&R, &QueryError>) -> Vec<Tag> + Send + Sync;
type ValidateFn<A> = dyn Fn(&A) -> Result<(), portal_api::Error> + Send + Sync;

/// Query endpoints and mutation endpoints are the only two kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Query,
    Mutation,
}

// ── Definitions ──────────────────────────────────────────────────────

/// Definition of a read endpoint.
pub struct QueryDef<A, R> {
    build: Box<BuildFn<A>>,
    transform: Box<TransformFn<R>>,
    provides_tags: Option<Box<TagFn<A, R>>>,
}

impl<A: 'static, R: DeserializeOwned + 'static> QueryDef<A, R> {
    /// A query whose response body decodes as JSON into `R`.
    pub fn json(
        build: impl Fn(&A) -> Result<Request, portal_api::Error> + Send + Sync + 'static,
    ) -> Self {
        Self::raw(build, Response::into_json::<R>)
    }
}

impl<A: 'static, R: 'static> QueryDef<A, R> {
    /// A query with a custom response transform (binary or text bodies).
    pub fn raw(
        build: impl Fn(&A) -> Result<Request, portal_api::Error> + Send + Sync + 'static,
        transform: impl Fn(Response) -> Result<R, portal_api::Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            build: Box::new(build),
            transform: Box::new(transform),
            provides_tags: None,
        }
    }

    /// Tags the cached result depends on. Called for both outcomes.
    #[must_use]
    pub fn provides_tags(
        mut self,
        tags: impl Fn(&A, Result<&R, &QueryError>) -> Vec<Tag> + Send + Sync + 'static,
    ) -> Self {
        self.provides_tags = Some(Box::new(tags));
        self
    }
}

/// Definition of a write endpoint.
pub struct MutationDef<A, R> {
    build: Box<BuildFn<A>>,
    transform: Box<TransformFn<R>>,
    invalidates_tags: Option<Box<TagFn<A, R>>>,
    validate: Option<Box<ValidateFn<A>>>,
}

impl<A: 'static, R: DeserializeOwned + 'static> MutationDef<A, R> {
    /// A mutation whose response body decodes as JSON into `R`.
    pub fn json(
        build: impl Fn(&A) -> Result<Request, portal_api::Error> + Send + Sync + 'static,
    ) -> Self {
        Self::raw(build, Response::into_json::<R>)
    }
}

impl<A: 'static, R: 'static> MutationDef<A, R> {
    pub fn raw(
        build: impl Fn(&A) -> Result<Request, portal_api::Error> + Send + Sync + 'static,
        transform: impl Fn(Response) -> Result<R, portal_api::Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            build: Box::new(build),
            transform: Box::new(transform),
            invalidates_tags: None,
            validate: None,
        }
    }

    /// Tags made stale by this mutation. Called for both outcomes.
    #[must_use]
    pub fn invalidates_tags(
        mut self,
        tags: impl Fn(&A, Result<&R, &QueryError>) -> Vec<Tag> + Send + Sync + 'static,
    ) -> Self {
        self.invalidates_tags = Some(Box::new(tags));
        self
    }

    /// Client-side check run before any request is built. A failure is
    /// returned to the caller and nothing is sent.
    #[must_use]
    pub fn validate(
        mut self,
        check: impl Fn(&A) -> Result<(), portal_api::Error> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Box::new(check));
        self
    }
}

async fn send<A, R>(
    build: &BuildFn<A>,
    transform: &TransformFn<R>,
    client: &HttpClient,
    arg: &A,
) -> Result<R, QueryError> {
    let request = build(arg)?;
    let response = client.request(request).await?;
    Ok(transform(response)?)
}

// ── Typed handles ────────────────────────────────────────────────────

struct QueryInner<A, R> {
    reducer_path: Arc<str>,
    name: &'static str,
    def: QueryDef<A, R>,
}

/// Handle to a registered query endpoint.
///
/// Carries the reducer path of the slice it was registered on, so the store
/// can route subscriptions without string lookups by the caller.
pub struct QueryEndpoint<A, R> {
    inner: Arc<QueryInner<A, R>>,
}

impl<A, R> Clone for QueryEndpoint<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> fmt::Debug for QueryEndpoint<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEndpoint")
            .field("reducer_path", &self.inner.reducer_path)
            .field("name", &self.inner.name)
            .finish()
    }
}

impl<A, R> QueryEndpoint<A, R> {
    pub(crate) fn new(reducer_path: Arc<str>, name: &'static str, def: QueryDef<A, R>) -> Self {
        Self {
            inner: Arc::new(QueryInner {
                reducer_path,
                name,
                def,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn reducer_path(&self) -> &str {
        &self.inner.reducer_path
    }

    pub(crate) fn path(&self) -> &Arc<str> {
        &self.inner.reducer_path
    }

    /// Run one request outside the cache and compute the provided tags.
    pub async fn execute(&self, client: &HttpClient, arg: &A) -> (Result<R, QueryError>, Vec<Tag>) {
        let def = &self.inner.def;
        let result = send(&*def.build, &*def.transform, client, arg).await;
        let tags = def
            .provides_tags
            .as_ref()
            .map(|f| f(arg, result.as_ref()))
            .unwrap_or_default();
        (result, tags)
    }
}

struct MutationInner<A, R> {
    reducer_path: Arc<str>,
    name: &'static str,
    def: MutationDef<A, R>,
}

/// Handle to a registered mutation endpoint.
pub struct MutationEndpoint<A, R> {
    inner: Arc<MutationInner<A, R>>,
}

impl<A, R> Clone for MutationEndpoint<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> fmt::Debug for MutationEndpoint<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationEndpoint")
            .field("reducer_path", &self.inner.reducer_path)
            .field("name", &self.inner.name)
            .finish()
    }
}

impl<A, R> MutationEndpoint<A, R> {
    pub(crate) fn new(reducer_path: Arc<str>, name: &'static str, def: MutationDef<A, R>) -> Self {
        Self {
            inner: Arc::new(MutationInner {
                reducer_path,
                name,
                def,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn reducer_path(&self) -> &str {
        &self.inner.reducer_path
    }

    pub(crate) fn path(&self) -> &Arc<str> {
        &self.inner.reducer_path
    }

    /// Run the client-side validation hook, if any.
    pub fn check(&self, arg: &A) -> Result<(), QueryError> {
        match &self.inner.def.validate {
            Some(validate) => validate(arg).map_err(QueryError::from),
            None => Ok(()),
        }
    }

    /// Send the mutation and compute the tags it invalidates.
    pub async fn execute(&self, client: &HttpClient, arg: &A) -> (Result<R, QueryError>, Vec<Tag>) {
        let def = &self.inner.def;
        let result = send(&*def.build, &*def.transform, client, arg).await;
        let tags = def
            .invalidates_tags
            .as_ref()
            .map(|f| f(arg, result.as_ref()))
            .unwrap_or_default();
        (result, tags)
    }
}

// ── Type-erased registry entries ─────────────────────────────────────

/// Result of a type-erased query run, ready to become an action.
pub(crate) struct Fetched {
    pub(crate) result: Result<Payload, QueryError>,
    pub(crate) tags: Vec<Tag>,
}

/// What the store needs to refetch a query without knowing its types.
pub(crate) trait ErasedQuery: Send + Sync {
    fn fetch(&self, client: HttpClient, args: Payload) -> BoxFuture<'static, Fetched>;
}

impl<A, R> ErasedQuery for QueryEndpoint<A, R>
where
    A: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    fn fetch(&self, client: HttpClient, args: Payload) -> BoxFuture<'static, Fetched> {
        let endpoint = self.clone();
        async move {
            let Some(arg) = args.downcast::<A>() else {
                return Fetched {
                    result: Err(QueryError::Config {
                        message: format!("argument type mismatch for {}", endpoint.name()),
                    }),
                    tags: Vec::new(),
                };
            };
            let (result, tags) = endpoint.execute(&client, &arg).await;
            Fetched {
                result: result.map(Payload::new),
                tags,
            }
        }
        .boxed()
    }
}

/// Registry entry for one endpoint of a slice.
#[derive(Clone)]
pub(crate) enum EndpointDescriptor {
    Query(Arc<dyn ErasedQuery>),
    Mutation,
}

impl EndpointDescriptor {
    pub(crate) fn kind(&self) -> EndpointKind {
        match self {
            Self::Query(_) => EndpointKind::Query,
            Self::Mutation => EndpointKind::Mutation,
        }
    }
}
