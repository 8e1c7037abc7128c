//! cps - Cross-project search request routing
//!
//! Decides, per outgoing search request, whether the JSON body should carry a
//! `project_routing` directive, and mutates the caller-owned request to match.
//!
//! # Architecture
//!
//! - [`RequestParams`]: The request descriptor produced by the dispatch layer
//!   (method, path, capability metadata, optional body)
//! - [`BodyShape`]: Narrowed view of the body: absent, a JSON record, or opaque
//! - [`RoutingInjector`]: Captured configuration + the decision function
//! - [`RequestInterceptor`]: Pre-send hook seam; [`InterceptorChain`] runs several
//! - [`ApiCatalog`]: Endpoint rules that declare which operations accept `project_routing`
//! - [`CpsConfig`]: Bootstrap configuration (YAML/JSON)
//!
//! # Key Invariants
//!
//! 1. **Never fails**: routing a request is a synchronous, infallible transform.
//!    Errors only exist at configuration time.
//!
//! 2. **Caller wins**: a non-empty `project_routing` already present in the body
//!    is never overwritten.
//!
//! 3. **PIT is pinned**: a point-in-time search has its project scope fixed when
//!    the PIT was opened, so any `project_routing` on it is stripped.
//!
//! 4. **Capability gates everything while enabled**: operations that do not declare
//!    `project_routing` are left byte-for-byte unchanged.
//!
//! # Example
//!
//! ```
//! use cps::prelude::*;
//! use serde_json::json;
//!
//! let injector = RoutingInjector::new(true, "origin");
//!
//! let mut params = RequestParams::new(Method::Post, "/logs-*/_search")
//!     .with_accepted_params(["project_routing"])
//!     .with_body(json!({ "query": { "match_all": {} } }));
//!
//! injector.route(&mut params);
//!
//! assert_eq!(
//!     params.body,
//!     Some(json!({ "query": { "match_all": {} }, "project_routing": "origin" }))
//! );
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod body;
mod catalog;
mod config;
mod injector;
mod interceptor;
mod params;
mod routing;
mod trace;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use body::{is_truthy, BodyShape};
pub use catalog::{ApiCatalog, EndpointRule, EndpointRuleConfig, PathTemplate};
pub use config::CpsConfig;
pub use injector::{RoutingDecision, RoutingInjector};
pub use interceptor::{InterceptorChain, RequestInterceptor};
pub use params::{AcceptedParams, Method, RequestMeta, RequestParams};
pub use routing::{ProjectRouting, RoutingScope, SpaceRoutingTable};
pub use trace::{Check, DecisionStep, DecisionTrace};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use cps::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AcceptedParams, ApiCatalog, BodyShape, Check, CpsConfig, DecisionStep, DecisionTrace,
        EndpointRule, InterceptorChain, Method, ProjectRouting, RequestInterceptor, RequestMeta,
        RequestParams, RoutingDecision, RoutingError, RoutingInjector, RoutingScope,
        SpaceRoutingTable,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Name of the routing parameter, both in capability sets and in request bodies.
pub const PROJECT_ROUTING: &str = "project_routing";

/// Body key that marks a point-in-time search.
pub const PIT: &str = "pit";

/// Wire token for origin-only routing.
pub const ORIGIN_ALIAS: &str = "_alias:_origin";

/// Wire token for routing to every linked project.
pub const ALL_ALIAS: &str = "_alias:*";

/// Maximum length of a free-form routing expression.
pub const MAX_EXPRESSION_LENGTH: usize = 4096;

/// Maximum number of endpoint rules in a single [`ApiCatalog`].
///
/// Lookup is a linear first-match-wins scan, so the rule count bounds the
/// per-request cost.
pub const MAX_CATALOG_RULES: usize = 256;

/// Maximum length of an endpoint path template.
pub const MAX_TEMPLATE_LENGTH: usize = 1024;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from configuration and bootstrap.
///
/// Routing a request never fails; these are all raised while building the
/// injector, the catalog or the config. Fix the configuration and rebuild.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    /// A routing value could not be parsed.
    #[error("invalid project routing \"{value}\": {reason}")]
    InvalidRouting {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A routing expression exceeds [`MAX_EXPRESSION_LENGTH`].
    #[error("routing expression length is {len}, but maximum allowed is {max}")]
    ExpressionTooLong {
        /// Actual length.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// A routing scope string could not be parsed.
    #[error("invalid routing scope \"{value}\", expected origin, all or space:<id>")]
    InvalidScope {
        /// The rejected value.
        value: String,
    },

    /// An HTTP method name is not recognized.
    #[error("unknown HTTP method \"{method}\"")]
    UnknownMethod {
        /// The rejected method name.
        method: String,
    },

    /// An endpoint path template is malformed.
    #[error("invalid path template \"{template}\": {message}")]
    InvalidTemplate {
        /// The template that failed to compile.
        template: String,
        /// The underlying error message.
        message: String,
    },

    /// An endpoint path template exceeds [`MAX_TEMPLATE_LENGTH`].
    #[error("path template length is {len}, but maximum allowed is {max}")]
    TemplateTooLong {
        /// Actual length.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Too many rules in a single catalog.
    #[error("catalog has {count} endpoint rules, but maximum allowed is {max}")]
    TooManyRules {
        /// Actual count of rules.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Configuration deserialization failed.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// The underlying error message.
        message: String,
    },
}
