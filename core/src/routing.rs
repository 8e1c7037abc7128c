//! Routing values and scopes.
//!
//! [`ProjectRouting`] is what gets written on the wire. [`RoutingScope`] is what
//! a caller asks for when it scopes a client; a space scope is resolved to a
//! routing value through the [`SpaceRoutingTable`].

use crate::{RoutingError, ALL_ALIAS, MAX_EXPRESSION_LENGTH, ORIGIN_ALIAS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A project routing target.
///
/// | Variant | Parsed from | Wire token |
/// |---|---|---|
/// | `Origin` | `origin`, `_alias:_origin` | `_alias:_origin` |
/// | `All` | `all`, `_alias:*` | `_alias:*` |
/// | `Expression` | anything else | verbatim |
///
/// # Example
///
/// ```
/// use cps::ProjectRouting;
///
/// let routing: ProjectRouting = "origin".parse().unwrap();
/// assert_eq!(routing.wire_value(), "_alias:_origin");
///
/// let routing: ProjectRouting = "_alias:team-a*".parse().unwrap();
/// assert_eq!(routing.wire_value(), "_alias:team-a*");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProjectRouting {
    /// Only the instance the client is connected to.
    #[default]
    Origin,
    /// Every linked project.
    All,
    /// A space-scoped expression, opaque to routing.
    ///
    /// Never one of the sentinel spellings, which parse back as `Origin` or
    /// `All`.
    Expression(String),
}

impl ProjectRouting {
    /// Parse a routing value.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidRouting`] for blank values and
    /// [`RoutingError::ExpressionTooLong`] past [`MAX_EXPRESSION_LENGTH`].
    pub fn parse(value: &str) -> Result<Self, RoutingError> {
        match value {
            "origin" | ORIGIN_ALIAS => Ok(Self::Origin),
            "all" | ALL_ALIAS => Ok(Self::All),
            _ => Self::expression(value),
        }
    }

    /// Build an expression routing.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse), plus [`RoutingError::InvalidRouting`]
    /// for a sentinel spelling (`origin`, `all` or their alias tokens).
    pub fn expression(value: impl Into<String>) -> Result<Self, RoutingError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(RoutingError::InvalidRouting {
                value,
                reason: "expression must not be blank",
            });
        }
        if matches!(value.as_str(), "origin" | "all" | ORIGIN_ALIAS | ALL_ALIAS) {
            return Err(RoutingError::InvalidRouting {
                value,
                reason: "sentinel values are not expressions",
            });
        }
        if value.len() > MAX_EXPRESSION_LENGTH {
            return Err(RoutingError::ExpressionTooLong {
                len: value.len(),
                max: MAX_EXPRESSION_LENGTH,
            });
        }
        Ok(Self::Expression(value))
    }

    /// The value sent in the request body.
    #[must_use]
    pub fn wire_value(&self) -> &str {
        match self {
            Self::Origin => ORIGIN_ALIAS,
            Self::All => ALL_ALIAS,
            Self::Expression(expr) => expr,
        }
    }

    /// Returns `true` for [`ProjectRouting::Origin`].
    #[must_use]
    pub fn is_origin(&self) -> bool {
        matches!(self, Self::Origin)
    }

    /// Returns `true` for [`ProjectRouting::All`].
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl FromStr for ProjectRouting {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProjectRouting {
    type Error = RoutingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProjectRouting> for String {
    fn from(routing: ProjectRouting) -> Self {
        routing.to_string()
    }
}

impl fmt::Display for ProjectRouting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => f.write_str("origin"),
            Self::All => f.write_str("all"),
            Self::Expression(expr) => f.write_str(expr),
        }
    }
}

/// What a caller asks for when scoping a client.
///
/// Parsed from `origin`, `all` or `space:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutingScope {
    /// Route to the origin instance only.
    Origin,
    /// Route to every linked project.
    All,
    /// Route with the default expression of a space.
    Space(String),
}

impl FromStr for RoutingScope {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "origin" => Ok(Self::Origin),
            "all" => Ok(Self::All),
            _ => match s.strip_prefix("space:") {
                Some(id) if !id.is_empty() => Ok(Self::Space(id.to_string())),
                _ => Err(RoutingError::InvalidScope {
                    value: s.to_string(),
                }),
            },
        }
    }
}

impl fmt::Display for RoutingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => f.write_str("origin"),
            Self::All => f.write_str("all"),
            Self::Space(id) => write!(f, "space:{id}"),
        }
    }
}

/// Default routing per space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpaceRoutingTable {
    spaces: BTreeMap<String, ProjectRouting>,
}

impl SpaceRoutingTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the routing for a space (builder pattern).
    #[must_use]
    pub fn with(mut self, space: impl Into<String>, routing: ProjectRouting) -> Self {
        self.spaces.insert(space.into(), routing);
        self
    }

    /// Look up the routing configured for a space.
    #[must_use]
    pub fn get(&self, space: &str) -> Option<&ProjectRouting> {
        self.spaces.get(space)
    }

    /// Number of configured spaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    /// Returns `true` if no spaces are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    /// Resolve a scope to a routing value.
    ///
    /// Spaces without an entry use `default`.
    #[must_use]
    pub fn resolve(&self, scope: &RoutingScope, default: &ProjectRouting) -> ProjectRouting {
        match scope {
            RoutingScope::Origin => ProjectRouting::Origin,
            RoutingScope::All => ProjectRouting::All,
            RoutingScope::Space(id) => match self.spaces.get(id) {
                Some(routing) => routing.clone(),
                None => {
                    tracing::warn!(
                        target: "cps",
                        space = %id,
                        fallback = %default,
                        "no project routing configured for space, using default"
                    );
                    default.clone()
                }
            },
        }
    }
}

impl FromIterator<(String, ProjectRouting)> for SpaceRoutingTable {
    fn from_iter<I: IntoIterator<Item = (String, ProjectRouting)>>(iter: I) -> Self {
        Self {
            spaces: iter.into_iter().collect(),
        }
    }
}
