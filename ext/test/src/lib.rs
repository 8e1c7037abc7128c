//! cps-test: Test domain for conformance testing
//!
//! Canned requests for the two kinds of operation routing cares about (one that
//! accepts `project_routing`, one that does not) and a recording interceptor
//! for asserting what a chain saw.
//!
//! # Example
//!
//! ```
//! use cps_test::prelude::*;
//! use serde_json::json;
//!
//! let mut params = search_request(Some(json!({ "size": 0 })));
//! RoutingInjector::new(true, "origin").route(&mut params);
//! assert_eq!(params.body.unwrap()["project_routing"], "origin");
//! ```

use cps::prelude::*;
use cps::PROJECT_ROUTING;
use serde_json::Value;
use std::sync::Mutex;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// `POST /logs-*/_search`, declaring `project_routing`.
#[must_use]
pub fn search_request(body: Option<Value>) -> RequestParams {
    let mut params = RequestParams::new(Method::Post, "/logs-*/_search")
        .with_accepted_params([PROJECT_ROUTING, "q", "size"]);
    params.body = body;
    params
}

/// `GET /_cat/indices`, an admin call that does not declare `project_routing`.
#[must_use]
pub fn cat_indices_request(body: Option<Value>) -> RequestParams {
    let mut params =
        RequestParams::new(Method::Get, "/_cat/indices").with_accepted_params(["format", "h"]);
    params.body = body;
    params
}

/// Records the body of every request it sees, then leaves it alone.
#[derive(Debug, Default)]
pub struct RecordingInterceptor {
    seen: Mutex<Vec<Option<Value>>>,
}

impl RecordingInterceptor {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bodies seen so far, in order.
    #[must_use]
    pub fn seen(&self) -> Vec<Option<Value>> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

impl RequestInterceptor for RecordingInterceptor {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_request(&self, params: &mut RequestParams) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(params.body.clone());
        }
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{cat_indices_request, search_request, RecordingInterceptor};
    pub use cps::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn canned_requests_declare_capability() {
        assert!(search_request(None).accepts(PROJECT_ROUTING));
        assert!(!cat_indices_request(None).accepts(PROJECT_ROUTING));
    }

    #[test]
    fn recorder_sees_routed_body() {
        let recorder = Arc::new(RecordingInterceptor::new());

        #[derive(Debug)]
        struct Shared(Arc<RecordingInterceptor>);
        impl RequestInterceptor for Shared {
            fn on_request(&self, params: &mut RequestParams) {
                self.0.on_request(params);
            }
        }

        let chain = InterceptorChain::new()
            .with(RoutingInjector::new(true, "origin"))
            .with(Shared(Arc::clone(&recorder)));

        let mut searched = search_request(None);
        chain.on_request(&mut searched);
        let mut listed = cat_indices_request(None);
        chain.on_request(&mut listed);

        assert_eq!(
            recorder.seen(),
            vec![Some(json!({ "project_routing": "origin" })), None]
        );
    }

    #[test]
    fn recorder_does_not_mutate() {
        let recorder = RecordingInterceptor::new();
        let mut params = search_request(Some(json!({ "size": 1 })));
        recorder.on_request(&mut params);
        assert_eq!(params.body, Some(json!({ "size": 1 })));
        assert_eq!(recorder.name(), "recorder");
    }
}
