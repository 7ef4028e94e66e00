// Portal HTTP client
//
// Wraps `reqwest::Client` with base-URL resolution, authorization header
// injection, and response-type aware body reading. One `request` call is
// one network call; nothing is retried here.

use std::fmt;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::{self, Anonymous, SharedTokenProvider};
use crate::error::Error;
use crate::request::{Request, RequestBody, Response, ResponseBody, ResponseType};
use crate::transport::TransportConfig;

/// Longest body excerpt carried into an `HttpStatus` error message.
const ERROR_BODY_LIMIT: usize = 512;

/// Low-level request executor bound to one backend base URL.
///
/// Cheap to clone: the underlying `reqwest::Client` and token provider are
/// shared.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    auth: SharedTokenProvider,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a client from a `TransportConfig` and token provider.
    ///
    /// `base_url` is resolved once here; request paths are joined onto it.
    pub fn new(
        base_url: &str,
        transport: &TransportConfig,
        auth: SharedTokenProvider,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            auth,
        })
    }

    /// Create an anonymous client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            auth: Arc::new(Anonymous),
        })
    }

    /// Replace the token provider.
    pub fn with_token_provider(mut self, auth: SharedTokenProvider) -> Self {
        self.auth = auth;
        self
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// A client sharing this one's connection pool and credentials, rooted
    /// at `prefix` below the current base URL.
    pub fn scoped(&self, prefix: &str) -> Result<Self, Error> {
        let mut base_url = self.resolve(prefix)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: self.http.clone(),
            base_url,
            auth: Arc::clone(&self.auth),
        })
    }

    /// Join a request path onto the base URL.
    ///
    /// Absolute `http(s)://` paths are used as-is. Otherwise slashes at the
    /// seam are collapsed, so `"/api/apps"` and `"api/apps"` resolve alike.
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let tail = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{tail}"))?)
    }

    // ── Request execution ────────────────────────────────────────────

    /// Execute one request.
    pub async fn request(&self, request: Request) -> Result<Response, Error> {
        let mut url = self.resolve(&request.path)?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }

        debug!(method = %request.method, %url, "sending request");

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(request.headers);
        builder = auth::decorate(builder, self.auth.as_ref())?;
        builder = match request.body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Text(text)) => builder.header(CONTENT_TYPE, "text/plain").body(text),
            Some(RequestBody::Bytes(bytes)) => builder
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(bytes),
            None => builder,
        };

        let resp = builder.send().await.map_err(Error::Network)?;
        read_response(resp, request.response_type).await
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(Request::get(path)).await?.into_json()
    }
}

async fn read_response(
    resp: reqwest::Response,
    response_type: ResponseType,
) -> Result<Response, Error> {
    let status = resp.status();
    let headers = resp.headers().clone();

    if !status.is_success() {
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = status.as_u16(), error = %e, "error body unreadable");
                String::new()
            }
        };
        debug!(status = status.as_u16(), "request failed");
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            message: error_message(status, &body),
        });
    }

    let body = match response_type {
        ResponseType::Binary => ResponseBody::Binary(resp.bytes().await.map_err(Error::Network)?),
        ResponseType::Text => ResponseBody::Text(resp.text().await.map_err(Error::Network)?),
        ResponseType::Json => {
            let text = resp.text().await.map_err(Error::Network)?;
            if text.trim().is_empty() {
                ResponseBody::Empty
            } else {
                let value = serde_json::from_str(&text).map_err(|e| Error::Decode {
                    message: e.to_string(),
                    body: text.clone(),
                })?;
                ResponseBody::Json(value)
            }
        }
    };

    Ok(Response::new(status, headers, body))
}

/// Message for a failed response: the body if there is one, else the
/// status reason.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_owned()
    } else {
        truncate(body.trim(), ERROR_BODY_LIMIT)
    }
}

fn truncate(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpClient {
        HttpClient::from_reqwest(base, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn resolve_collapses_slashes() {
        let c = client("https://portal.example.com/");
        assert_eq!(
            c.resolve("/api/apps/active").unwrap().as_str(),
            "https://portal.example.com/api/apps/active"
        );
    }

    #[test]
    fn resolve_keeps_base_path() {
        let c = client("https://hub.example.com/hub/api/v1/");
        assert_eq!(
            c.resolve("models/urn:x/diagram").unwrap().as_str(),
            "https://hub.example.com/hub/api/v1/models/urn:x/diagram"
        );
    }

    #[test]
    fn resolve_passes_absolute_urls_through() {
        let c = client("https://portal.example.com");
        assert_eq!(
            c.resolve("https://cdn.example.com/x.json").unwrap().as_str(),
            "https://cdn.example.com/x.json"
        );
    }

    #[test]
    fn scoped_client_nests_base_path() {
        let c = client("https://semantics.example.com").scoped("hub/api/v1").unwrap();
        assert_eq!(c.base_url().as_str(), "https://semantics.example.com/hub/api/v1/");
        assert_eq!(
            c.resolve("models").unwrap().as_str(),
            "https://semantics.example.com/hub/api/v1/models"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("äöü", 2), "äö…");
        assert_eq!(truncate("ok", 10), "ok");
    }

    #[test]
    fn missing_error_body_falls_back_to_reason() {
        use reqwest::StatusCode;

        assert_eq!(
            error_message(StatusCode::SERVICE_UNAVAILABLE, "  "),
            "Service Unavailable"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, " tenantUrl invalid\n"),
            "tenantUrl invalid"
        );
        let long = "x".repeat(ERROR_BODY_LIMIT * 2);
        assert!(error_message(StatusCode::INTERNAL_SERVER_ERROR, &long).len() <= ERROR_BODY_LIMIT + 3);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = HttpClient::from_reqwest("not a url", reqwest::Client::new());
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
