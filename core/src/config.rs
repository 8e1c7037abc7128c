//! Bootstrap configuration.
//!
//! Read once at startup and used to build the injector and catalog. Nothing
//! here is consulted per request.
//!
//! ```yaml
//! cps_enabled: true
//! project_routing: origin
//! spaces:
//!   security: "_alias:sec-*"
//!   observability: all
//! catalog:                     # optional, defaults to the built-in search family
//!   - name: search
//!     methods: [GET, POST]
//!     path: /{index}/_search
//!     accepted_params: [project_routing]
//! ```
//!
//! | Config field | Runtime type | Built by |
//! |---|---|---|
//! | `cps_enabled` + `project_routing` | [`RoutingInjector`] | [`CpsConfig::injector()`] |
//! | `spaces` | [`SpaceRoutingTable`] | [`CpsConfig::space_table()`] |
//! | `catalog` | [`ApiCatalog`] | [`CpsConfig::catalog()`] |

use crate::{
    ApiCatalog, EndpointRuleConfig, ProjectRouting, RoutingError, RoutingInjector, RoutingScope,
    SpaceRoutingTable,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cross-project search configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CpsConfig {
    /// Whether the deployment supports cross-project routing.
    #[serde(default)]
    pub cps_enabled: bool,

    /// Default routing for unscoped clients.
    #[serde(default)]
    pub project_routing: ProjectRouting,

    /// Default routing per space.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub spaces: BTreeMap<String, ProjectRouting>,

    /// Endpoint rules. `None` uses [`ApiCatalog::search_family()`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Vec<EndpointRuleConfig>>,
}

impl CpsConfig {
    /// Routing enabled with origin-only default.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            cps_enabled: true,
            ..Self::default()
        }
    }

    /// Routing disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Parse and validate a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidConfig`] on malformed YAML, and any
    /// validation error from [`validate()`](Self::validate).
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RoutingError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| RoutingError::InvalidConfig {
            message: format!("YAML parse error: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidConfig`] on malformed JSON, and any
    /// validation error from [`validate()`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self, RoutingError> {
        let config: Self = serde_json::from_str(json).map_err(|e| RoutingError::InvalidConfig {
            message: format!("JSON parse error: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that can fail at build time.
    ///
    /// Routing values are already validated during deserialization; this
    /// compiles the catalog and rejects blank space ids.
    ///
    /// # Errors
    ///
    /// Returns the first invalid catalog rule or space id.
    pub fn validate(&self) -> Result<(), RoutingError> {
        if let Some(space) = self.spaces.keys().find(|id| id.trim().is_empty()) {
            return Err(RoutingError::InvalidConfig {
                message: format!("space id {space:?} is blank"),
            });
        }
        self.catalog().map(|_| ())
    }

    /// Build the endpoint catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured rule is invalid.
    pub fn catalog(&self) -> Result<ApiCatalog, RoutingError> {
        match &self.catalog {
            Some(rules) => ApiCatalog::from_configs(rules.clone()),
            None => ApiCatalog::search_family(),
        }
    }

    /// Build the per-space routing table.
    #[must_use]
    pub fn space_table(&self) -> SpaceRoutingTable {
        self.spaces
            .iter()
            .map(|(id, routing)| (id.clone(), routing.clone()))
            .collect()
    }

    /// Resolve a scope against this configuration.
    #[must_use]
    pub fn resolve(&self, scope: &RoutingScope) -> ProjectRouting {
        self.space_table().resolve(scope, &self.project_routing)
    }

    /// Injector for unscoped clients.
    #[must_use]
    pub fn injector(&self) -> RoutingInjector {
        RoutingInjector::from_routing(self.cps_enabled, &self.project_routing)
    }

    /// Injector for a client scoped to `scope`.
    ///
    /// When routing is disabled the scope is irrelevant and the injector only
    /// strips.
    #[must_use]
    pub fn injector_for(&self, scope: &RoutingScope) -> RoutingInjector {
        if !self.cps_enabled {
            return RoutingInjector::disabled();
        }
        RoutingInjector::from_routing(true, &self.resolve(scope))
    }
}
