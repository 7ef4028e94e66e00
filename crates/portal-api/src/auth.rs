use std::fmt;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Source of the authorization header attached to every outgoing request.
///
/// The session/identity provider lives outside this crate; this layer only
/// asks it for the current token and never refreshes credentials itself.
pub trait TokenProvider: Send + Sync {
    /// Return the header value to send, or `None` for anonymous requests.
    fn authorization(&self) -> Result<Option<HeaderValue>, Error>;
}

/// Sends no authorization header.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl TokenProvider for Anonymous {
    fn authorization(&self) -> Result<Option<HeaderValue>, Error> {
        Ok(None)
    }
}

/// A fixed bearer token, typically resolved from config or the keyring.
#[derive(Clone)]
pub struct BearerToken {
    token: SecretString,
}

impl BearerToken {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken").finish_non_exhaustive()
    }
}

impl TokenProvider for BearerToken {
    fn authorization(&self) -> Result<Option<HeaderValue>, Error> {
        let raw = self.token.expose_secret();
        if raw.trim().is_empty() {
            return Err(Error::Credentials {
                message: "bearer token is empty".into(),
            });
        }
        let mut value =
            HeaderValue::from_str(&format!("Bearer {raw}")).map_err(|e| Error::Credentials {
                message: format!("token is not a valid header value: {e}"),
            })?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

/// Shared handle used by clients.
pub type SharedTokenProvider = Arc<dyn TokenProvider>;

/// Attach the provider's header to a request builder.
pub(crate) fn decorate(
    builder: reqwest::RequestBuilder,
    provider: &dyn TokenProvider,
) -> Result<reqwest::RequestBuilder, Error> {
    Ok(match provider.authorization()? {
        Some(value) => builder.header(AUTHORIZATION, value),
        None => builder,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_formats_header() {
        let provider = BearerToken::new(SecretString::from("abc123".to_string()));
        let value = provider.authorization().unwrap().unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc123");
        assert!(value.is_sensitive());
    }

    #[test]
    fn empty_token_is_rejected() {
        let provider = BearerToken::new(SecretString::from("  ".to_string()));
        assert!(matches!(
            provider.authorization(),
            Err(Error::Credentials { .. })
        ));
    }

    #[test]
    fn debug_does_not_leak_token() {
        let provider = BearerToken::new(SecretString::from("hunter2".to_string()));
        assert!(!format!("{provider:?}").contains("hunter2"));
    }
}
