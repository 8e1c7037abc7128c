//! `RoutingInjector`: the per-request routing decision
//!
//! The injector is constructed once with the deployment mode and the routing
//! value, then invoked once per outgoing request. It holds no per-request
//! state: every mutation lands on the caller-owned [`RequestParams`].
//!
//! # Decision order (short-circuiting)
//!
//! | routing enabled | accepts `project_routing` | body | outcome |
//! |---|---|---|---|
//! | no | any | any | strip |
//! | yes | no | any | untouched |
//! | yes | yes | opaque | untouched (opaque) |
//! | yes | yes | has `pit` | strip |
//! | yes | yes | has non-empty `project_routing` | keep caller value |
//! | yes | yes | otherwise | inject |

use crate::body::record_mut;
use crate::{
    BodyShape, Check, DecisionStep, DecisionTrace, ProjectRouting, RequestParams, PROJECT_ROUTING,
};
use serde_json::{Map, Value};
use std::fmt;

/// Which branch of the decision applies to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingDecision {
    /// Routing is disabled: any `project_routing` is removed.
    StripDisabled,
    /// The operation does not declare `project_routing`: nothing is touched.
    Untouched,
    /// The body is not a JSON record: nothing is touched.
    OpaqueBody,
    /// Point-in-time search: the scope was pinned at PIT open, so any
    /// `project_routing` is removed.
    StripPointInTime,
    /// The caller supplied a non-empty value, which is kept.
    KeepCallerValue,
    /// The configured value is written.
    Inject,
}

impl RoutingDecision {
    /// Stable `snake_case` name, used in logs and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StripDisabled => "strip_disabled",
            Self::Untouched => "untouched",
            Self::OpaqueBody => "opaque_body",
            Self::StripPointInTime => "strip_point_in_time",
            Self::KeepCallerValue => "keep_caller_value",
            Self::Inject => "inject",
        }
    }

    /// Returns `true` for the two stripping branches.
    #[must_use]
    pub fn strips(&self) -> bool {
        matches!(self, Self::StripDisabled | Self::StripPointInTime)
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adds, keeps or strips `project_routing` on outgoing requests.
///
/// # Thread Safety
///
/// The injector is immutable after construction; share it freely across
/// concurrent requests.
///
/// # Example
///
/// ```
/// use cps::prelude::*;
/// use serde_json::json;
///
/// let injector = RoutingInjector::new(true, "origin");
///
/// // PIT searches never carry a routing directive.
/// let mut params = RequestParams::new(Method::Post, "/_search")
///     .with_accepted_params(["project_routing"])
///     .with_body(json!({ "pit": { "id": "abc123" }, "project_routing": "stale" }));
///
/// injector.route(&mut params);
/// assert_eq!(params.body, Some(json!({ "pit": { "id": "abc123" } })));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingInjector {
    enabled: bool,
    routing_value: String,
}

impl RoutingInjector {
    /// Create an injector that writes `routing_value` verbatim.
    pub fn new(enabled: bool, routing_value: impl Into<String>) -> Self {
        Self {
            enabled,
            routing_value: routing_value.into(),
        }
    }

    /// Create an injector that writes the wire token of `routing`.
    #[must_use]
    pub fn from_routing(enabled: bool, routing: &ProjectRouting) -> Self {
        Self::new(enabled, routing.wire_value())
    }

    /// An injector for deployments without cross-project routing.
    ///
    /// It only ever strips.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false, String::new())
    }

    /// Whether cross-project routing is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The value written on injection.
    #[must_use]
    pub fn routing_value(&self) -> &str {
        &self.routing_value
    }

    /// Decide which branch applies, without mutating anything.
    #[must_use]
    pub fn decide(&self, params: &RequestParams) -> RoutingDecision {
        self.evaluate(params, |_, _| {})
    }

    /// Apply the routing decision to `params.body` in place.
    ///
    /// Never fails. A missing body is created only when a value is injected.
    pub fn route(&self, params: &mut RequestParams) {
        let decision = self.decide(params);
        let changed = self.apply(decision, &mut params.body);
        log_decision(params, decision, changed);
    }

    /// Apply the routing decision and return the evaluation trace.
    ///
    /// The mutation is identical to [`route()`](Self::route).
    pub fn route_with_trace(&self, params: &mut RequestParams) -> DecisionTrace {
        let mut steps = Vec::with_capacity(5);
        let decision = self.evaluate(params, |check, passed| {
            steps.push(DecisionStep { check, passed });
        });
        let body_changed = self.apply(decision, &mut params.body);
        log_decision(params, decision, body_changed);

        DecisionTrace {
            decision,
            steps,
            body_changed,
        }
    }

    /// Single evaluation path shared by `decide` and `route_with_trace`.
    fn evaluate(
        &self,
        params: &RequestParams,
        mut record: impl FnMut(Check, bool),
    ) -> RoutingDecision {
        record(Check::RoutingEnabled, self.enabled);
        if !self.enabled {
            return RoutingDecision::StripDisabled;
        }

        let accepts = params.accepts(PROJECT_ROUTING);
        record(Check::AcceptsProjectRouting, accepts);
        if !accepts {
            return RoutingDecision::Untouched;
        }

        let shape = BodyShape::of(params.body.as_ref());
        let is_record = !shape.is_opaque();
        record(Check::RecordBody, is_record);
        if !is_record {
            return RoutingDecision::OpaqueBody;
        }

        let pit = shape.is_point_in_time();
        record(Check::PointInTime, pit);
        if pit {
            return RoutingDecision::StripPointInTime;
        }

        let caller = shape.has_caller_routing();
        record(Check::CallerRouting, caller);
        if caller {
            RoutingDecision::KeepCallerValue
        } else {
            RoutingDecision::Inject
        }
    }

    /// Returns whether the body changed.
    fn apply(&self, decision: RoutingDecision, body: &mut Option<Value>) -> bool {
        match decision {
            RoutingDecision::StripDisabled | RoutingDecision::StripPointInTime => {
                record_mut(body).is_some_and(|map| map.remove(PROJECT_ROUTING).is_some())
            }
            RoutingDecision::Inject => {
                if body.is_none() {
                    *body = Some(Value::Object(Map::new()));
                }
                match record_mut(body) {
                    Some(map) => {
                        map.insert(
                            PROJECT_ROUTING.to_string(),
                            Value::String(self.routing_value.clone()),
                        );
                        true
                    }
                    None => false,
                }
            }
            RoutingDecision::Untouched
            | RoutingDecision::OpaqueBody
            | RoutingDecision::KeepCallerValue => false,
        }
    }
}

fn log_decision(params: &RequestParams, decision: RoutingDecision, changed: bool) {
    tracing::debug!(
        target: "cps",
        method = %params.method,
        path = %params.path_only(),
        decision = decision.as_str(),
        changed,
        "project routing decision"
    );
}
