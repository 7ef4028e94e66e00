use thiserror::Error;

/// Top-level error type for the `portal-api` crate.
///
/// Every failure of a single HTTP exchange lands in one of these variants.
/// `portal-core` folds them into the cloneable `QueryError` that is stored
/// in cache entries; nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// No response was received (connection refused, DNS failure, timeout).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing or joining failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Authentication ──────────────────────────────────────────────
    /// The identity provider could not supply a token.
    #[error("No usable credentials: {message}")]
    Credentials { message: String },

    // ── HTTP ────────────────────────────────────────────────────────
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The body could not be decoded into the expected shape.
    #[error("Decode error: {message}")]
    Decode { message: String, body: String },

    // ── Client-side input ───────────────────────────────────────────
    /// Input rejected before any request was sent.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },
}

impl Error {
    /// HTTP status of the failed exchange, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` for 401 responses; the view layer reacts (re-login).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_for_http_errors() {
        let err = Error::HttpStatus {
            status: 401,
            message: "Unauthorized".into(),
        };
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
        assert!(!err.is_transient());

        let err = Error::Decode {
            message: "expected array".into(),
            body: "{}".into(),
        };
        assert_eq!(err.status(), None);
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::HttpStatus {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert!(err.is_transient());
        assert!(!err.is_not_found());
    }
}
