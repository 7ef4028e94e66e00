// portal-api: Async HTTP client and wire models for the portal backends
// (marketplace, app subscription, semantic model hub).

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod request;
pub mod semantic;
pub mod transport;

pub use auth::{Anonymous, BearerToken, SharedTokenProvider, TokenProvider};
pub use client::HttpClient;
pub use error::Error;
pub use request::{Request, RequestBody, Response, ResponseBody, ResponseType};
pub use semantic::SemanticHubClient;
pub use transport::{TlsMode, TransportConfig};

// Re-exported so endpoint definitions don't need a direct reqwest dependency.
pub use reqwest::header::HeaderMap;
pub use reqwest::{Method, StatusCode};
