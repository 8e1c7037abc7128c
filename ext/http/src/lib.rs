//! cps-http: scoped clients for outgoing search requests
//!
//! The core crate routes a decoded [`RequestParams`](cps::RequestParams). This
//! crate sits one layer out, on raw HTTP requests with byte bodies:
//!
//! ```text
//! CpsConfig (bootstrap)
//!         ↓ ScopedClientFactory::new()
//! ScopedClientFactory ──as_scoped(scope)──→ ScopedClient
//!                                               ↓ prepare()
//! HttpRequest ─decode→ RequestParams ─catalog→ injector→ encode→ HttpRequest
//! ```
//!
//! The body is only re-encoded when routing changed it, so untouched requests
//! go out byte-for-byte as they came in.
//!
//! # Example
//!
//! ```
//! use cps::prelude::*;
//! use cps_http::prelude::*;
//!
//! let factory = ScopedClientFactory::new(CpsConfig::enabled()).unwrap();
//! let client = factory.as_scoped(RoutingScope::All);
//!
//! let request = HttpRequest::builder()
//!     .method(Method::Post)
//!     .path("/logs-*/_search")
//!     .header("Content-Type", "application/json")
//!     .body(br#"{"size":0}"#.to_vec())
//!     .build();
//!
//! let prepared = client.prepare(request).unwrap();
//! let body: serde_json::Value = serde_json::from_slice(prepared.body().unwrap()).unwrap();
//! assert_eq!(body["project_routing"], "_alias:*");
//! ```

mod codec;
mod context;
mod error;
mod request;
mod scoped;

pub use codec::{decode_body, encode_body, DecodedBody};
pub use context::{get_query_param, parse_path_only, parse_query_string, query_pairs};
pub use error::HttpError;
pub use request::{HttpRequest, HttpRequestBuilder};
pub use scoped::{Prepared, ScopedClient, ScopedClientFactory};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        HttpError, HttpRequest, HttpRequestBuilder, Prepared, ScopedClient, ScopedClientFactory,
    };
}
