//! Request descriptor handed to interceptors before dispatch.

use crate::{RoutingError, PROJECT_ROUTING};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// HTTP method of an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
}

impl Method {
    /// The canonical upper-case method name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
        }
    }
}

impl FromStr for Method {
    type Err = RoutingError;

    /// Parses a method name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "PATCH" => Ok(Self::Patch),
            _ => Err(RoutingError::UnknownMethod {
                method: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of parameter names an operation declares it accepts.
///
/// This is the capability check for routing: an operation accepts a routing
/// directive only when `project_routing` is a member.
///
/// # Example
///
/// ```
/// use cps::AcceptedParams;
///
/// let params: AcceptedParams = ["index", "project_routing"].into_iter().collect();
/// assert!(params.accepts_project_routing());
/// assert!(!AcceptedParams::new().accepts_project_routing());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcceptedParams(BTreeSet<String>);

impl AcceptedParams {
    /// Create an empty capability set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter name.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    /// Returns `true` if the operation accepts `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Returns `true` if the operation accepts `project_routing`.
    #[must_use]
    pub fn accepts_project_routing(&self) -> bool {
        self.contains(PROJECT_ROUTING)
    }

    /// Iterate parameter names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no parameters are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AcceptedParams {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Per-request metadata declared by the target operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Parameters the target operation accepts.
    #[serde(default)]
    pub accepted_params: AcceptedParams,
}

/// An outgoing request as seen by interceptors.
///
/// Produced by the dispatch layer, mutated in place by interceptors, then sent.
/// The descriptor is owned by a single in-flight request and is never shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    /// HTTP method.
    pub method: Method,
    /// Request path, possibly with a query string.
    pub path: String,
    /// Capability metadata. `None` means the operation declared nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RequestMeta>,
    /// JSON body. `None` means the request has no body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestParams {
    /// Create a request without metadata or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            meta: None,
            body: None,
        }
    }

    /// Declare the accepted parameters (builder pattern).
    #[must_use]
    pub fn with_accepted_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta = Some(RequestMeta {
            accepted_params: params.into_iter().collect(),
        });
        self
    }

    /// Set the body (builder pattern).
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns the declared capability set, if any.
    #[must_use]
    pub fn accepted_params(&self) -> Option<&AcceptedParams> {
        self.meta.as_ref().map(|m| &m.accepted_params)
    }

    /// Returns `true` if the target operation declares `name`.
    ///
    /// Missing metadata declares nothing.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        self.accepted_params().is_some_and(|p| p.contains(name))
    }

    /// The path without its query string.
    #[must_use]
    pub fn path_only(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(p, _)| p)
    }
}
