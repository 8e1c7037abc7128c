//! Decision trace types for debugging routing behavior.
//!
//! A [`DecisionTrace`] records the checks the injector evaluated, in order,
//! up to the one that settled the decision. Use
//! [`RoutingInjector::route_with_trace()`](crate::RoutingInjector::route_with_trace)
//! to answer "why did this request (not) get a `project_routing`?".
//!
//! # Example
//!
//! ```ignore
//! let trace = injector.route_with_trace(&mut params);
//! println!("decision: {}", trace.decision);
//! for step in &trace.steps {
//!     println!("  {}: {}", step.check, step.passed);
//! }
//! ```

use crate::RoutingDecision;
use std::fmt;

/// One of the questions the decision function asks, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Is cross-project routing enabled for the deployment?
    RoutingEnabled,
    /// Does the target operation declare `project_routing`?
    AcceptsProjectRouting,
    /// Is the body absent or a JSON record (as opposed to opaque)?
    RecordBody,
    /// Does the body carry a `pit` key?
    PointInTime,
    /// Does the body already carry a non-empty `project_routing`?
    CallerRouting,
}

impl Check {
    /// Stable `snake_case` name, used in logs and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoutingEnabled => "routing_enabled",
            Self::AcceptsProjectRouting => "accepts_project_routing",
            Self::RecordBody => "record_body",
            Self::PointInTime => "point_in_time",
            Self::CallerRouting => "caller_routing",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One evaluated check and its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionStep {
    /// Which check.
    pub check: Check,
    /// The answer.
    pub passed: bool,
}

/// Trace of a full routing decision.
///
/// # INV: `decision` == `decide()` result
///
/// The trace and the plain decision come from the same evaluation, and the
/// body mutation that accompanies a trace is identical to what
/// [`route()`](crate::RoutingInjector::route) performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTrace {
    /// The branch taken.
    pub decision: RoutingDecision,
    /// Checks evaluated before the decision settled (short-circuited).
    pub steps: Vec<DecisionStep>,
    /// Whether the body was modified.
    pub body_changed: bool,
}

impl DecisionTrace {
    /// The answer recorded for `check`, if it was evaluated.
    #[must_use]
    pub fn answer(&self, check: Check) -> Option<bool> {
        self.steps
            .iter()
            .find(|step| step.check == check)
            .map(|step| step.passed)
    }
}

impl fmt::Display for DecisionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "decision: {}", self.decision)?;
        for step in &self.steps {
            writeln!(f, "  {:<24} {}", step.check, step.passed)?;
        }
        write!(f, "body changed: {}", self.body_changed)
    }
}
