// Request and response value types for `HttpClient`.
//
// A `Request` is a plain description (method, relative path, query pairs,
// headers, body, expected response type). Endpoint definitions build one
// per invocation; the client turns it into exactly one network call.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// How the response body should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    /// JSON document (the default wire format).
    #[default]
    Json,
    /// UTF-8 text.
    Text,
    /// Opaque byte stream (diagrams, files, example payloads, documentation).
    Binary,
}

/// Outgoing request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Text(String),
    Bytes(Bytes),
}

/// One HTTP request, relative to the client's base URL.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<RequestBody>,
    pub(crate) response_type: ResponseType,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            response_type: ResponseType::Json,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a single query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Flatten a serializable record into query parameters.
    ///
    /// List values become repeated keys (`a=1&a=2`), nested records become
    /// `parent[child]=v`, and `null` fields are skipped.
    pub fn query_from<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self, Error> {
        let value = serde_json::to_value(params).map_err(|e| Error::Validation {
            field: "query".into(),
            reason: e.to_string(),
        })?;
        let Value::Object(map) = value else {
            return Err(Error::Validation {
                field: "query".into(),
                reason: "query parameters must serialize to a record".into(),
            });
        };
        for (key, value) in map {
            flatten_into(&mut self.query, key, value);
        }
        Ok(self)
    }

    /// Add a request header. Invalid names or values are rejected.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, Error> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::Validation {
            field: "header".into(),
            reason: e.to_string(),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| Error::Validation {
            field: name.to_string(),
            reason: e.to_string(),
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    pub fn bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(RequestBody::Bytes(body.into()));
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub fn expected_response(&self) -> ResponseType {
        self.response_type
    }
}

fn flatten_into(out: &mut Vec<(String, String)>, key: String, value: Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                if let Some(s) = scalar_to_string(item) {
                    out.push((key.clone(), s));
                }
            }
        }
        Value::Object(map) => {
            for (child, value) in map {
                flatten_into(out, format!("{key}[{child}]"), value);
            }
        }
        scalar => {
            if let Some(s) = scalar_to_string(scalar) {
                out.push((key, s));
            }
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

// ── Response ─────────────────────────────────────────────────────────

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
    Binary(Bytes),
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Decode the body into `T`. An empty body decodes as JSON `null`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, Error> {
        let value = match self.body {
            ResponseBody::Empty => Value::Null,
            ResponseBody::Json(v) => v,
            ResponseBody::Text(text) => {
                serde_json::from_str(&text).map_err(|e| Error::Decode {
                    message: e.to_string(),
                    body: text.clone(),
                })?
            }
            ResponseBody::Binary(_) => {
                return Err(Error::Decode {
                    message: "expected JSON, got a binary body".into(),
                    body: String::new(),
                });
            }
        };
        let raw = value.to_string();
        serde_json::from_value(value).map_err(|e| Error::Decode {
            message: e.to_string(),
            body: raw,
        })
    }

    /// The body as raw bytes, whatever its declared type.
    pub fn into_bytes(self) -> Bytes {
        match self.body {
            ResponseBody::Empty => Bytes::new(),
            ResponseBody::Json(v) => Bytes::from(v.to_string()),
            ResponseBody::Text(t) => Bytes::from(t),
            ResponseBody::Binary(b) => b,
        }
    }

    pub fn into_text(self) -> Result<String, Error> {
        match self.body {
            ResponseBody::Empty => Ok(String::new()),
            ResponseBody::Json(v) => Ok(v.to_string()),
            ResponseBody::Text(t) => Ok(t),
            ResponseBody::Binary(b) => String::from_utf8(b.to_vec()).map_err(|e| Error::Decode {
                message: e.to_string(),
                body: String::new(),
            }),
        }
    }
}
