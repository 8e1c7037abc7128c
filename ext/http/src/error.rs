use cps::RoutingError;

/// Errors from building scoped clients or preparing requests.
///
/// Routing decisions never fail. What can fail is loading the configuration
/// the clients are built from, and re-encoding a body routing changed.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The configuration could not be turned into a catalog or injector.
    #[error(transparent)]
    Config(#[from] RoutingError),

    /// A routed body could not be serialized back to JSON.
    #[error("failed to encode routed body: {0}")]
    Encode(#[from] serde_json::Error),
}
