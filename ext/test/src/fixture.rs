//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them through the routing pipeline.
//!
//! A fixture configures routing one of two ways:
//!
//! - `injector: { enabled, routing_value }` builds a bare [`RoutingInjector`]
//!   that writes `routing_value` verbatim.
//! - `config: <CpsConfig>` (plus an optional `scope`) goes through the
//!   bootstrap path: the config's catalog annotates requests that declare no
//!   capability, and the injector writes the resolved wire token.
//!
//! ```yaml
//! name: pit_strips
//! description: point-in-time searches never carry a routing directive
//! injector: { enabled: true, routing_value: origin }
//! cases:
//!   - name: stale value removed
//!     accepted_params: [project_routing]
//!     body: { pit: { id: abc123 }, project_routing: stale }
//!     expect:
//!       decision: strip_point_in_time
//!       body: { pit: { id: abc123 } }
//! ```

use cps::prelude::*;
use serde::Deserialize;
use serde_json::Value;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub injector: Option<InjectorConfig>,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expect_error: bool,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// Bare injector construction
#[derive(Debug, Deserialize)]
pub struct InjectorConfig {
    pub enabled: bool,
    #[serde(default)]
    pub routing_value: String,
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub accepted_params: Option<Vec<String>>,
    #[serde(default)]
    pub body: Option<Value>,
    pub expect: Expectation,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_path() -> String {
    "/_search".to_string()
}

/// What a case must produce
///
/// `body_absent: true` asserts no body at all; otherwise `body`, when given,
/// must equal the routed body.
#[derive(Debug, Default, Deserialize)]
pub struct Expectation {
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub body_absent: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder: fixture → pipeline
// ═══════════════════════════════════════════════════════════════════════════════

/// Catalog + injector under test
#[derive(Debug)]
pub struct Pipeline {
    catalog: Option<ApiCatalog>,
    injector: RoutingInjector,
}

impl Pipeline {
    /// Route one request, returning the decision trace.
    pub fn run(&self, params: &mut RequestParams) -> DecisionTrace {
        if let Some(catalog) = &self.catalog {
            catalog.annotate(params);
        }
        self.injector.route_with_trace(params)
    }
}

impl Fixture {
    /// Build the pipeline this fixture describes.
    ///
    /// # Errors
    ///
    /// Returns a message when the fixture is malformed or the config is
    /// rejected.
    pub fn build(&self) -> Result<Pipeline, String> {
        match (&self.injector, &self.config) {
            (Some(injector), None) => Ok(Pipeline {
                catalog: None,
                injector: RoutingInjector::new(injector.enabled, injector.routing_value.clone()),
            }),
            (None, Some(config)) => {
                let json = serde_json::to_string(config).map_err(|e| e.to_string())?;
                let config = CpsConfig::from_json_str(&json).map_err(|e| e.to_string())?;
                let catalog = config.catalog().map_err(|e| e.to_string())?;
                let injector = match &self.scope {
                    Some(scope) => {
                        let scope: RoutingScope =
                            scope.parse().map_err(|e: RoutingError| e.to_string())?;
                        config.injector_for(&scope)
                    }
                    None => config.injector(),
                };
                Ok(Pipeline {
                    catalog: Some(catalog),
                    injector,
                })
            }
            _ => Err(format!(
                "fixture '{}' must set exactly one of `injector` or `config`",
                self.name
            )),
        }
    }
}

impl TestCase {
    /// Build the request descriptor for this case.
    ///
    /// # Errors
    ///
    /// Returns a message for an unknown HTTP method.
    pub fn build_request(&self) -> Result<RequestParams, String> {
        let method: Method = self.method.parse().map_err(|e: RoutingError| e.to_string())?;
        let mut params = RequestParams::new(method, self.path.clone());
        if let Some(accepted) = &self.accepted_params {
            params = params.with_accepted_params(accepted.iter().cloned());
        }
        params.body = self.body.clone();
        Ok(params)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub failure: Option<String>,
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Run all test cases and return results
    ///
    /// A fixture with `expect_error: true` passes only if building fails.
    pub fn run(&self) -> Vec<CaseResult> {
        let pipeline = match (self.build(), self.expect_error) {
            (Ok(_), true) => {
                return vec![CaseResult {
                    case_name: "<build>".into(),
                    passed: false,
                    failure: Some("expected the fixture to be rejected".into()),
                }]
            }
            (Err(_), true) => return Vec::new(),
            (Err(e), false) => {
                return vec![CaseResult {
                    case_name: "<build>".into(),
                    passed: false,
                    failure: Some(e),
                }]
            }
            (Ok(pipeline), false) => pipeline,
        };

        self.cases
            .iter()
            .map(|case| {
                let failure = run_case(&pipeline, case).err();
                CaseResult {
                    case_name: case.name.clone(),
                    passed: failure.is_none(),
                    failure,
                }
            })
            .collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        for result in self.run() {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: {}",
                self.name,
                result.case_name,
                result.failure.unwrap_or_default()
            );
        }
    }
}

fn run_case(pipeline: &Pipeline, case: &TestCase) -> Result<(), String> {
    let mut params = case.build_request()?;
    let trace = pipeline.run(&mut params);

    if let Some(expected) = &case.expect.decision {
        if trace.decision.as_str() != expected {
            return Err(format!(
                "expected decision {expected}, got {}",
                trace.decision
            ));
        }
    }
    if case.expect.body_absent && params.body.is_some() {
        return Err(format!("expected no body, got {:?}", params.body));
    }
    if let Some(expected) = &case.expect.body {
        if params.body.as_ref() != Some(expected) {
            return Err(format!("expected body {expected}, got {:?}", params.body));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_runs_injector_fixture() {
        let fixture = Fixture::from_yaml(
            r#"
name: inline
injector: { enabled: true, routing_value: origin }
cases:
  - name: inject
    accepted_params: [project_routing]
    expect:
      decision: inject
      body: { project_routing: origin }
"#,
        )
        .unwrap();
        fixture.run_and_assert();
    }

    #[test]
    fn wrong_expectation_fails() {
        let fixture = Fixture::from_yaml(
            r#"
name: inline
injector: { enabled: false }
cases:
  - name: strip
    body: { project_routing: x }
    expect:
      body: { project_routing: x }
"#,
        )
        .unwrap();
        let results = fixture.run();
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
    }

    #[test]
    fn needs_exactly_one_source() {
        let fixture = Fixture::from_yaml("name: empty\ncases: []\n").unwrap();
        assert!(fixture.build().is_err());
    }

    #[test]
    fn expect_error_passes_on_rejected_config() {
        let fixture = Fixture::from_yaml(
            "name: bad\nconfig: { project_routing: \"\" }\nexpect_error: true\n",
        )
        .unwrap();
        assert!(fixture.run().is_empty());
    }
}
