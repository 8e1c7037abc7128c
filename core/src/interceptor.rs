//! `RequestInterceptor`: pre-send hook seam
//!
//! The dispatch layer owns network I/O. Right before sending, it hands the
//! request descriptor to its interceptors, which may mutate it in place.
//! Interceptors are synchronous and infallible.

use crate::{ApiCatalog, RequestParams, RoutingInjector};
use std::fmt::Debug;

/// A hook invoked on every outgoing request before it is sent.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: one interceptor instance serves every
/// in-flight request concurrently, each with its own `RequestParams`.
///
/// # Example
///
/// ```
/// use cps::prelude::*;
///
/// #[derive(Debug)]
/// struct ForceGet;
///
/// impl RequestInterceptor for ForceGet {
///     fn on_request(&self, params: &mut RequestParams) {
///         params.method = Method::Get;
///     }
/// }
///
/// let mut params = RequestParams::new(Method::Post, "/_search");
/// ForceGet.on_request(&mut params);
/// assert_eq!(params.method, Method::Get);
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `RequestInterceptor`",
    label = "this type cannot be used as a pre-send hook",
    note = "implement `on_request(&self, &mut RequestParams)` for your type"
)]
pub trait RequestInterceptor: Send + Sync + Debug {
    /// Stable name, used in logs.
    fn name(&self) -> &str {
        "interceptor"
    }

    /// Inspect and mutate the request before it is sent.
    fn on_request(&self, params: &mut RequestParams);
}

#[diagnostic::do_not_recommend]
impl RequestInterceptor for Box<dyn RequestInterceptor> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_request(&self, params: &mut RequestParams) {
        (**self).on_request(params);
    }
}

impl RequestInterceptor for RoutingInjector {
    fn name(&self) -> &str {
        "project_routing"
    }

    fn on_request(&self, params: &mut RequestParams) {
        self.route(params);
    }
}

impl RequestInterceptor for ApiCatalog {
    fn name(&self) -> &str {
        "api_catalog"
    }

    fn on_request(&self, params: &mut RequestParams) {
        self.annotate(params);
    }
}

/// Runs interceptors in registration order.
///
/// Order matters: a catalog that fills in capability metadata must run before
/// the routing injector that reads it.
#[derive(Debug, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Box<dyn RequestInterceptor>>,
}

impl InterceptorChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor (builder pattern).
    #[must_use]
    pub fn with(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.push(interceptor);
        self
    }

    /// Append an interceptor.
    pub fn push(&mut self, interceptor: impl RequestInterceptor + 'static) {
        self.interceptors.push(Box::new(interceptor));
    }

    /// Names of the registered interceptors, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.interceptors.iter().map(|i| i.name())
    }

    /// Number of registered interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if no interceptors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl RequestInterceptor for InterceptorChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn on_request(&self, params: &mut RequestParams) {
        for interceptor in &self.interceptors {
            interceptor.on_request(params);
        }
    }
}
