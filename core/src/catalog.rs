//! `ApiCatalog`: which operations accept which parameters
//!
//! The dispatch layer normally declares `meta.accepted_params` for every
//! request it builds. The catalog is where that declaration comes from: an
//! ordered list of endpoint rules, looked up by method and path with
//! first-match-wins semantics.
//!
//! Path templates use `{placeholder}` segments and compile to anchored regexes:
//!
//! ```text
//! /{index}/_search   →   ^/[^/]+/_search$
//! ```

use crate::{
    AcceptedParams, Method, RequestMeta, RequestParams, RoutingError, MAX_CATALOG_RULES,
    MAX_TEMPLATE_LENGTH, PROJECT_ROUTING,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compiled endpoint path template.
///
/// # Example
///
/// ```
/// use cps::PathTemplate;
///
/// let template = PathTemplate::parse("/{index}/_search").unwrap();
/// assert!(template.matches("/logs-*/_search"));
/// assert!(!template.matches("/_search"));
/// ```
#[derive(Clone)]
pub struct PathTemplate {
    template: String,
    regex: Regex,
}

impl PathTemplate {
    /// Compile a template.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::TemplateTooLong`] past [`MAX_TEMPLATE_LENGTH`], and
    /// [`RoutingError::InvalidTemplate`] when the template does not start with `/`
    /// or a segment mixes literal text with braces.
    pub fn parse(template: &str) -> Result<Self, RoutingError> {
        if template.len() > MAX_TEMPLATE_LENGTH {
            return Err(RoutingError::TemplateTooLong {
                len: template.len(),
                max: MAX_TEMPLATE_LENGTH,
            });
        }
        let invalid = |message: &str| RoutingError::InvalidTemplate {
            template: template.to_string(),
            message: message.to_string(),
        };

        let rest = template
            .strip_prefix('/')
            .ok_or_else(|| invalid("template must start with '/'"))?;

        let mut pattern = String::with_capacity(template.len() * 2);
        pattern.push('^');
        if rest.is_empty() {
            pattern.push('/');
        }
        for segment in rest.split('/').filter(|_| !rest.is_empty()) {
            pattern.push('/');
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) if is_placeholder_name(name) => pattern.push_str("[^/]+"),
                Some(_) => return Err(invalid("placeholder names must be [A-Za-z0-9_]+")),
                None if segment.contains(['{', '}']) => {
                    return Err(invalid("braces are only allowed around a whole segment"));
                }
                None if segment.is_empty() => return Err(invalid("empty path segment")),
                None => pattern.push_str(&regex::escape(segment)),
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            template: template.to_string(),
            regex,
        })
    }

    /// Returns `true` if `path` (without query string) matches.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Debug for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathTemplate").field(&self.template).finish()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.template)
    }
}

/// Configuration for an [`EndpointRule`].
///
/// ```yaml
/// name: search
/// methods: [GET, POST]
/// path: /{index}/_search
/// accepted_params: [project_routing, q, size]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRuleConfig {
    /// Operation name, used in logs and listings.
    pub name: String,
    /// Methods this rule applies to. Empty means any method.
    #[serde(default)]
    pub methods: Vec<Method>,
    /// Path template.
    pub path: String,
    /// Parameters the operation accepts.
    #[serde(default)]
    pub accepted_params: AcceptedParams,
}

/// One operation in the catalog.
#[derive(Debug, Clone)]
pub struct EndpointRule {
    name: String,
    methods: Vec<Method>,
    path: PathTemplate,
    accepted_params: AcceptedParams,
}

impl EndpointRule {
    /// Create a rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the path template is invalid.
    pub fn new(
        name: impl Into<String>,
        methods: impl IntoIterator<Item = Method>,
        path: &str,
        accepted_params: AcceptedParams,
    ) -> Result<Self, RoutingError> {
        Ok(Self {
            name: name.into(),
            methods: methods.into_iter().collect(),
            path: PathTemplate::parse(path)?,
            accepted_params,
        })
    }

    /// Build a rule from its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the path template is invalid.
    pub fn from_config(config: EndpointRuleConfig) -> Result<Self, RoutingError> {
        Self::new(
            config.name,
            config.methods,
            &config.path,
            config.accepted_params,
        )
    }

    /// Returns `true` if this rule covers `method` and `path`.
    #[must_use]
    pub fn matches(&self, method: Method, path: &str) -> bool {
        (self.methods.is_empty() || self.methods.contains(&method)) && self.path.matches(path)
    }

    /// Operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Methods covered. Empty means any.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Path template.
    #[must_use]
    pub fn path(&self) -> &PathTemplate {
        &self.path
    }

    /// Parameters the operation accepts.
    #[must_use]
    pub fn accepted_params(&self) -> &AcceptedParams {
        &self.accepted_params
    }
}

/// Ordered endpoint rules with first-match-wins lookup.
///
/// # Example
///
/// ```
/// use cps::prelude::*;
///
/// let catalog = ApiCatalog::search_family().unwrap();
///
/// let rule = catalog.lookup(Method::Post, "/logs/_search?size=0").unwrap();
/// assert_eq!(rule.name(), "search");
/// assert!(rule.accepted_params().accepts_project_routing());
///
/// let rule = catalog.lookup(Method::Get, "/_cat/indices").unwrap();
/// assert!(!rule.accepted_params().accepts_project_routing());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ApiCatalog {
    rules: Vec<EndpointRule>,
}

impl ApiCatalog {
    /// Create a catalog from rules, in lookup order.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::TooManyRules`] past [`MAX_CATALOG_RULES`].
    pub fn new(rules: Vec<EndpointRule>) -> Result<Self, RoutingError> {
        if rules.len() > MAX_CATALOG_RULES {
            return Err(RoutingError::TooManyRules {
                count: rules.len(),
                max: MAX_CATALOG_RULES,
            });
        }
        Ok(Self { rules })
    }

    /// A catalog with no rules. Every lookup misses.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from rule configurations.
    ///
    /// # Errors
    ///
    /// Returns the first invalid template, or [`RoutingError::TooManyRules`].
    pub fn from_configs(configs: Vec<EndpointRuleConfig>) -> Result<Self, RoutingError> {
        if configs.len() > MAX_CATALOG_RULES {
            return Err(RoutingError::TooManyRules {
                count: configs.len(),
                max: MAX_CATALOG_RULES,
            });
        }
        let rules = configs
            .into_iter()
            .map(EndpointRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(rules)
    }

    /// Built-in rules for the search APIs.
    ///
    /// Search-family operations accept `project_routing`; the admin operations
    /// listed after them do not, so they are never touched while routing is
    /// enabled.
    ///
    /// # Errors
    ///
    /// Returns the first [`RoutingError`] raised while compiling a rule.
    pub fn search_family() -> Result<Self, RoutingError> {
        use Method::{Delete, Get, Post};

        const SEARCH: &[&str] = &[
            PROJECT_ROUTING,
            "q",
            "size",
            "from",
            "sort",
            "allow_no_indices",
        ];
        const ADMIN: &[&str] = &["format", "h", "v", "expand_wildcards", "timeout"];

        let table: &[(&str, &[Method], &str, &[&str])] = &[
            ("search", &[Get, Post], "/_search", SEARCH),
            ("search", &[Get, Post], "/{index}/_search", SEARCH),
            ("search_template", &[Get, Post], "/_search/template", SEARCH),
            ("search_template", &[Get, Post], "/{index}/_search/template", SEARCH),
            ("msearch", &[Get, Post], "/_msearch", SEARCH),
            ("msearch", &[Get, Post], "/{index}/_msearch", SEARCH),
            ("msearch_template", &[Get, Post], "/_msearch/template", SEARCH),
            ("msearch_template", &[Get, Post], "/{index}/_msearch/template", SEARCH),
            ("async_search.submit", &[Post], "/_async_search", SEARCH),
            ("async_search.submit", &[Post], "/{index}/_async_search", SEARCH),
            ("count", &[Get, Post], "/_count", SEARCH),
            ("count", &[Get, Post], "/{index}/_count", SEARCH),
            ("field_caps", &[Get, Post], "/_field_caps", SEARCH),
            ("field_caps", &[Get, Post], "/{index}/_field_caps", SEARCH),
            ("indices.resolve_index", &[Get], "/_resolve/index/{name}", SEARCH),
            ("esql.query", &[Post], "/_query", SEARCH),
            ("esql.async_query", &[Post], "/_query/async", SEARCH),
            ("eql.search", &[Get, Post], "/{index}/_eql/search", SEARCH),
            ("sql.query", &[Get, Post], "/_sql", SEARCH),
            ("open_point_in_time", &[Post], "/{index}/_pit", SEARCH),
            ("close_point_in_time", &[Delete], "/_pit", ADMIN),
            ("cat.indices", &[Get], "/_cat/indices", ADMIN),
            ("cat.indices", &[Get], "/_cat/indices/{index}", ADMIN),
            ("cluster.health", &[Get], "/_cluster/health", ADMIN),
            ("indices.get_mapping", &[Get], "/{index}/_mapping", ADMIN),
        ];

        let rules = table
            .iter()
            .map(|(name, methods, path, params)| {
                EndpointRule::new(
                    *name,
                    methods.iter().copied(),
                    path,
                    params.iter().copied().collect(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(rules)
    }

    /// Find the first rule covering `method` and `path`.
    ///
    /// Any query string on `path` is ignored.
    #[must_use]
    pub fn lookup(&self, method: Method, path: &str) -> Option<&EndpointRule> {
        let path = path.split_once('?').map_or(path, |(p, _)| p);
        self.rules.iter().find(|rule| rule.matches(method, path))
    }

    /// Fill in capability metadata for a request that declares none.
    ///
    /// Explicit metadata always wins. Returns `true` if metadata was added.
    pub fn annotate(&self, params: &mut RequestParams) -> bool {
        if params.meta.is_some() {
            return false;
        }
        match self.lookup(params.method, &params.path) {
            Some(rule) => {
                tracing::trace!(
                    target: "cps",
                    operation = rule.name(),
                    path = %params.path_only(),
                    "annotated request from catalog"
                );
                params.meta = Some(RequestMeta {
                    accepted_params: rule.accepted_params().clone(),
                });
                true
            }
            None => false,
        }
    }

    /// Rules in lookup order.
    #[must_use]
    pub fn rules(&self) -> &[EndpointRule] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the catalog has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
