//! JSON body codec.
//!
//! Only bodies that decode as a single JSON document take part in routing.
//! Newline-delimited bodies (`_msearch`, `_bulk`) and anything that fails to
//! parse are passed through as bytes.

use crate::HttpError;
use serde_json::Value;

/// A request body after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    /// No body, or a zero-length one.
    Absent,
    /// A single JSON document.
    Json(Value),
    /// Bytes that routing must not touch.
    Undecodable,
}

impl DecodedBody {
    /// The decoded value for routing, if the body is routable.
    ///
    /// Returns `None` for [`DecodedBody::Undecodable`].
    #[must_use]
    pub fn into_routable(self) -> Option<Option<Value>> {
        match self {
            Self::Absent => Some(None),
            Self::Json(value) => Some(Some(value)),
            Self::Undecodable => None,
        }
    }
}

/// Decode raw body bytes.
///
/// A `content-type` naming NDJSON forces [`DecodedBody::Undecodable`] even
/// when the bytes happen to be a single valid JSON line.
#[must_use]
pub fn decode_body(body: Option<&[u8]>, content_type: Option<&str>) -> DecodedBody {
    let Some(bytes) = body.filter(|b| !b.iter().all(u8::is_ascii_whitespace)) else {
        return DecodedBody::Absent;
    };
    if content_type.is_some_and(is_ndjson) {
        return DecodedBody::Undecodable;
    }
    serde_json::from_slice(bytes).map_or(DecodedBody::Undecodable, DecodedBody::Json)
}

/// Encode a routed body.
///
/// # Errors
///
/// Returns [`HttpError::Encode`] if serialization fails.
pub fn encode_body(body: &Value) -> Result<Vec<u8>, HttpError> {
    Ok(serde_json::to_vec(body)?)
}

fn is_ndjson(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("application/x-ndjson")
        || mime.eq_ignore_ascii_case("application/ndjson")
        || mime.to_ascii_lowercase().ends_with("+x-ndjson")
}
