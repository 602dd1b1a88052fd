//! The outbound half of an exchange.

use bytes::Bytes;
use std::fmt;

/// HTTP verbs used by the search engine API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// POST
    Post,
}

impl Method {
    /// Whether a request with this verb may carry a body.
    pub fn accepts_body(self) -> bool {
        matches!(self, Method::Put | Method::Post)
    }

    /// Upper-case verb name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Post => "POST",
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
            Method::Post => http::Method::POST,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a transport needs to perform one exchange.
///
/// `path` is relative to the transport's base URL and carries no query
/// string; parameters travel in `query` in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportCall {
    /// HTTP verb.
    pub method: Method,
    /// Resolved resource path, e.g. `_ingest/pipeline/my-pipeline`.
    pub path: String,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Serialized JSON body.
    pub body: Option<Bytes>,
}

impl TransportCall {
    /// Create a call without parameters or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the serialized body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Look up a query parameter by name.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Body as UTF-8 text, if any.
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| std::str::from_utf8(b).ok())
    }
}
