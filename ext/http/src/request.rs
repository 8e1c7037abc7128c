//! Raw outgoing HTTP request.

use crate::context::{get_query_param, parse_path_only, parse_query_string};
use cps::{AcceptedParams, Method};
use std::collections::BTreeMap;

/// An outgoing HTTP request as the dispatch layer holds it just before sending.
///
/// Headers are stored lower-cased; lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: Method,
    path: String,
    headers: BTreeMap<String, String>,
    body: Option<Vec<u8>>,
    accepted_params: Option<AcceptedParams>,
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self {
            method: Method::Get,
            path: "/".to_string(),
            headers: BTreeMap::new(),
            body: None,
            accepted_params: None,
        }
    }
}

impl HttpRequest {
    /// Create a builder for `HttpRequest`.
    #[must_use]
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Raw path, including any query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path without the query string.
    #[must_use]
    pub fn path_only(&self) -> &str {
        parse_path_only(&self.path)
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        parse_query_string(&self.path).and_then(|q| get_query_param(q, name))
    }

    /// Header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// All headers, lower-cased names in sorted order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Capability set declared by the caller, if any.
    ///
    /// When `None`, the scoped client looks the operation up in its catalog.
    #[must_use]
    pub fn accepted_params(&self) -> Option<&AcceptedParams> {
        self.accepted_params.as_ref()
    }

    pub(crate) fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub(crate) fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub(crate) fn remove_header(&mut self, name: &str) {
        self.headers.remove(&name.to_ascii_lowercase());
    }

    pub(crate) fn replace_body(&mut self, body: Vec<u8>) {
        self.body = Some(body);
    }

    pub(crate) fn clear_body(&mut self) {
        self.body = None;
    }
}

/// Builder for `HttpRequest`.
#[derive(Debug, Default)]
pub struct HttpRequestBuilder {
    request: HttpRequest,
}

impl HttpRequestBuilder {
    /// Set the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.request.method = method;
        self
    }

    /// Set the path, optionally with a query string.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.request.path = path.into();
        self
    }

    /// Add a header. Later values for the same name replace earlier ones.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.request.set_header(name.as_ref(), value);
        self
    }

    /// Set the raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    /// Declare the parameters the target operation accepts.
    #[must_use]
    pub fn accepted_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.accepted_params = Some(params.into_iter().collect());
        self
    }

    /// Build the `HttpRequest`.
    #[must_use]
    pub fn build(self) -> HttpRequest {
        self.request
    }
}
