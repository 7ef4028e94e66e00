// ── Core error types ──
//
// `QueryError` is what a cache entry or mutation record carries when a
// request fails. It is cloneable so every subscriber of the same entry
// can observe it. `StoreError` covers misuse of the store itself:
// registration conflicts, unknown slices, unencodable arguments.

use thiserror::Error;

/// Failure of one query or mutation, as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    // ── Transport ────────────────────────────────────────────────────
    /// No response was received.
    #[error("Network error: {message}")]
    Network { message: String },

    // ── HTTP ─────────────────────────────────────────────────────────
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    // ── Data ─────────────────────────────────────────────────────────
    /// The body did not match the expected shape.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Input rejected before any request was sent.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Setup ────────────────────────────────────────────────────────
    /// No usable credentials were available for the request.
    #[error("Credentials unavailable: {message}")]
    Credentials { message: String },

    /// Misconfigured client, endpoint, or store.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The request task ended before producing a result.
    #[error("Request aborted: {message}")]
    Aborted { message: String },
}

impl QueryError {
    /// HTTP status of the failed exchange, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for 401 responses.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Short category name, used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "NetworkError",
            Self::HttpStatus { .. } => "HttpStatusError",
            Self::Decode { .. } => "DecodeError",
            Self::Validation { .. } => "ValidationError",
            Self::Credentials { .. } => "CredentialsError",
            Self::Config { .. } => "ConfigError",
            Self::Aborted { .. } => "AbortedError",
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<portal_api::Error> for QueryError {
    fn from(err: portal_api::Error) -> Self {
        match err {
            portal_api::Error::Network(e) => match e.status() {
                Some(status) => QueryError::HttpStatus {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => QueryError::Network {
                    message: e.to_string(),
                },
            },
            portal_api::Error::InvalidUrl(e) => QueryError::Config {
                message: format!("Invalid URL: {e}"),
            },
            portal_api::Error::Tls(message) => QueryError::Config {
                message: format!("TLS error: {message}"),
            },
            portal_api::Error::Credentials { message } => QueryError::Credentials { message },
            portal_api::Error::HttpStatus { status, message } => {
                QueryError::HttpStatus { status, message }
            }
            portal_api::Error::Decode { message, body: _ } => QueryError::Decode { message },
            portal_api::Error::Validation { field, reason } => {
                QueryError::Validation { field, reason }
            }
        }
    }
}

/// Misuse of the store or a slice definition.
#[derive(Debug, Error)]
pub enum StoreError {
    // ── Registration ─────────────────────────────────────────────────
    #[error("Reducer path {path:?} is registered twice")]
    DuplicateReducerPath { path: String },

    #[error("Endpoint {endpoint:?} is defined twice in slice {path:?}")]
    DuplicateEndpoint { path: String, endpoint: String },

    #[error("Empty {what} name")]
    EmptyName { what: &'static str },

    #[error("No tokio runtime available to drive background fetches")]
    NoRuntime,

    // ── Lookup ───────────────────────────────────────────────────────
    #[error("No API slice registered at {path:?}")]
    UnknownSlice { path: String },

    #[error("Endpoint {endpoint:?} does not belong to slice {path:?}")]
    UnknownEndpoint { path: String, endpoint: String },

    #[error("No feature state registered at {key:?}")]
    UnknownFeature { key: String },

    // ── Arguments ────────────────────────────────────────────────────
    #[error("Arguments for {endpoint:?} cannot be serialized: {message}")]
    ArgumentEncoding { endpoint: String, message: String },

    // ── Client setup ─────────────────────────────────────────────────
    #[error("Cannot build backend client: {0}")]
    Client(#[from] portal_api::Error),
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        QueryError::Config {
            message: err.to_string(),
        }
    }
}
