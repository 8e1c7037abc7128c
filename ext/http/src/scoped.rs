//! Scoped clients.
//!
//! A [`ScopedClientFactory`] is built once from [`CpsConfig`] at startup. Each
//! [`ScopedClient`] it hands out carries an injector for one routing scope and
//! shares the factory's catalog.

use crate::codec::{decode_body, encode_body, DecodedBody};
use crate::{HttpError, HttpRequest};
use cps::{
    ApiCatalog, CpsConfig, DecisionTrace, InterceptorChain, RequestInterceptor, RequestMeta,
    RequestParams, RoutingInjector, RoutingScope,
};
use std::sync::Arc;

/// Builds scoped clients from one configuration.
#[derive(Debug, Clone)]
pub struct ScopedClientFactory {
    config: Arc<CpsConfig>,
    catalog: Arc<ApiCatalog>,
}

impl ScopedClientFactory {
    /// Validate `config` and build the shared catalog.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Config`] if the configuration is invalid.
    pub fn new(config: CpsConfig) -> Result<Self, HttpError> {
        config.validate()?;
        let catalog = config.catalog()?;
        tracing::debug!(
            target: "cps",
            cps_enabled = config.cps_enabled,
            routing = %config.project_routing,
            spaces = config.spaces.len(),
            rules = catalog.len(),
            "scoped client factory ready"
        );
        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
        })
    }

    /// A client using the configured default routing.
    #[must_use]
    pub fn unscoped(&self) -> ScopedClient {
        self.client(None, self.config.injector())
    }

    /// A client routing every request to `scope`.
    #[must_use]
    pub fn as_scoped(&self, scope: RoutingScope) -> ScopedClient {
        let injector = self.config.injector_for(&scope);
        self.client(Some(scope), injector)
    }

    fn client(&self, scope: Option<RoutingScope>, injector: RoutingInjector) -> ScopedClient {
        ScopedClient {
            scope,
            catalog: Arc::clone(&self.catalog),
            injector,
            extra: InterceptorChain::new(),
        }
    }

    /// The configuration clients are built from.
    #[must_use]
    pub fn config(&self) -> &CpsConfig {
        &self.config
    }

    /// The shared endpoint catalog.
    #[must_use]
    pub fn catalog(&self) -> &ApiCatalog {
        &self.catalog
    }
}

/// A request prepared for sending, with the routing trace that produced it.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// The request to send.
    pub request: HttpRequest,
    /// How routing decided. `None` when the body could not be decoded and
    /// routing was skipped.
    pub trace: Option<DecisionTrace>,
}

/// Prepares outgoing requests for one routing scope.
///
/// # Thread Safety
///
/// `prepare` takes `&self`; one client serves concurrent requests.
#[derive(Debug)]
pub struct ScopedClient {
    scope: Option<RoutingScope>,
    catalog: Arc<ApiCatalog>,
    injector: RoutingInjector,
    extra: InterceptorChain,
}

impl ScopedClient {
    /// Run `interceptor` after routing on every request (builder pattern).
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.extra.push(interceptor);
        self
    }

    /// The scope this client was built for. `None` for the unscoped client.
    #[must_use]
    pub fn scope(&self) -> Option<&RoutingScope> {
        self.scope.as_ref()
    }

    /// The injector applied to every request.
    #[must_use]
    pub fn injector(&self) -> &RoutingInjector {
        &self.injector
    }

    /// Route `request` and return it ready to send.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Encode`] if a changed body cannot be re-encoded.
    pub fn prepare(&self, request: HttpRequest) -> Result<HttpRequest, HttpError> {
        self.prepare_traced(request).map(|prepared| prepared.request)
    }

    /// Route `request` and keep the decision trace.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Encode`] if a changed body cannot be re-encoded.
    pub fn prepare_traced(&self, mut request: HttpRequest) -> Result<Prepared, HttpError> {
        let decoded = decode_body(request.body(), request.header("content-type"));
        let was_absent = decoded == DecodedBody::Absent;
        let Some(body) = decoded.into_routable() else {
            tracing::debug!(
                target: "cps",
                method = %request.method(),
                path = %request.path_only(),
                "body is not a single JSON document, routing skipped"
            );
            return Ok(Prepared {
                request,
                trace: None,
            });
        };

        let mut params = RequestParams {
            method: request.method(),
            path: request.path().to_string(),
            meta: request.accepted_params().map(|accepted| RequestMeta {
                accepted_params: accepted.clone(),
            }),
            body,
        };

        self.catalog.annotate(&mut params);
        let trace = self.injector.route_with_trace(&mut params);

        let mut changed = trace.body_changed;
        if !self.extra.is_empty() {
            let before = params.body.clone();
            self.extra.on_request(&mut params);
            changed |= params.body != before;
        }

        if changed {
            match &params.body {
                Some(body) => write_body(&mut request, encode_body(body)?, was_absent),
                None => clear_body(&mut request),
            }
        }

        Ok(Prepared {
            request,
            trace: Some(trace),
        })
    }
}

fn write_body(request: &mut HttpRequest, bytes: Vec<u8>, created: bool) {
    if created || request.has_header("content-length") {
        request.set_header("content-length", bytes.len().to_string());
    }
    if created && !request.has_header("content-type") {
        request.set_header("content-type", "application/json");
    }
    request.replace_body(bytes);
}

fn clear_body(request: &mut HttpRequest) {
    request.remove_header("content-length");
    request.remove_header("content-type");
    request.clear_body();
}

#[cfg(test)]
mod tests {
    use super::*;
    use cps::{Method, ProjectRouting, ALL_ALIAS, ORIGIN_ALIAS};
    use serde_json::{json, Value};

    fn factory(config: CpsConfig) -> ScopedClientFactory {
        ScopedClientFactory::new(config).unwrap()
    }

    fn body_json(request: &HttpRequest) -> Value {
        serde_json::from_slice(request.body().unwrap()).unwrap()
    }

    fn search(body: &str) -> HttpRequest {
        HttpRequest::builder()
            .method(Method::Post)
            .path("/logs-*/_search")
            .header("Content-Type", "application/json")
            .header("Content-Length", body.len().to_string())
            .body(body.as_bytes().to_vec())
            .build()
    }

    #[test]
    fn injects_scope_routing() {
        let client = factory(CpsConfig::enabled()).as_scoped(RoutingScope::All);
        let out = client.prepare(search(r#"{"size":0}"#)).unwrap();

        let body = body_json(&out);
        assert_eq!(body, json!({ "size": 0, "project_routing": ALL_ALIAS }));
        assert_eq!(
            out.header("content-length"),
            Some(out.body().unwrap().len().to_string().as_str())
        );
    }

    #[test]
    fn unscoped_uses_default() {
        let client = factory(CpsConfig::enabled()).unscoped();
        assert!(client.scope().is_none());
        let out = client.prepare(search("{}")).unwrap();
        assert_eq!(body_json(&out)["project_routing"], ORIGIN_ALIAS);
    }

    #[test]
    fn space_scope_resolves_through_config() {
        let config = CpsConfig {
            cps_enabled: true,
            spaces: [("sec".to_string(), ProjectRouting::parse("_alias:sec-*").unwrap())]
                .into_iter()
                .collect(),
            ..CpsConfig::default()
        };
        let client = factory(config).as_scoped("space:sec".parse().unwrap());
        let out = client.prepare(search("{}")).unwrap();
        assert_eq!(body_json(&out)["project_routing"], "_alias:sec-*");
    }

    #[test]
    fn untouched_request_keeps_exact_bytes() {
        let raw = "{ \"size\" : 0,  \"project_routing\": \"custom\" }";
        let client = factory(CpsConfig::enabled()).as_scoped(RoutingScope::All);
        let out = client.prepare(search(raw)).unwrap();
        assert_eq!(out.body(), Some(raw.as_bytes()));
    }

    #[test]
    fn admin_api_is_untouched() {
        let client = factory(CpsConfig::enabled()).unscoped();
        let req = HttpRequest::builder()
            .method(Method::Get)
            .path("/_cat/indices?format=json")
            .build();
        let prepared = client.prepare_traced(req.clone()).unwrap();

        assert_eq!(prepared.request, req);
        assert_eq!(
            prepared.trace.unwrap().decision,
            cps::RoutingDecision::Untouched
        );
    }

    #[test]
    fn missing_body_is_created_on_injection() {
        let client = factory(CpsConfig::enabled()).unscoped();
        let req = HttpRequest::builder()
            .method(Method::Get)
            .path("/_search")
            .build();
        let out = client.prepare(req).unwrap();

        assert_eq!(body_json(&out), json!({ "project_routing": ORIGIN_ALIAS }));
        assert_eq!(out.header("content-type"), Some("application/json"));
        assert!(out.header("content-length").is_some());
    }

    #[test]
    fn disabled_strips() {
        let client = factory(CpsConfig::disabled()).as_scoped(RoutingScope::All);
        let out = client
            .prepare(search(r#"{"query":{"match_all":{}},"project_routing":"stale"}"#))
            .unwrap();
        assert_eq!(body_json(&out), json!({ "query": { "match_all": {} } }));
    }

    #[test]
    fn ndjson_is_passed_through() {
        let raw = "{\"index\":\"logs\"}\n{\"query\":{}}\n";
        let req = HttpRequest::builder()
            .method(Method::Post)
            .path("/_msearch")
            .header("content-type", "application/x-ndjson")
            .body(raw)
            .build();
        let prepared = factory(CpsConfig::enabled())
            .unscoped()
            .prepare_traced(req)
            .unwrap();

        assert!(prepared.trace.is_none());
        assert_eq!(prepared.request.body(), Some(raw.as_bytes()));
    }

    #[test]
    fn explicit_capability_overrides_catalog() {
        let req = HttpRequest::builder()
            .method(Method::Post)
            .path("/logs/_search")
            .accepted_params(["q"])
            .body("{}")
            .build();
        let out = factory(CpsConfig::enabled()).unscoped().prepare(req).unwrap();
        assert_eq!(out.body(), Some(&b"{}"[..]));
    }

    #[derive(Debug)]
    struct TrackTotalHits;

    impl RequestInterceptor for TrackTotalHits {
        fn on_request(&self, params: &mut RequestParams) {
            if let Some(Value::Object(map)) = params.body.as_mut() {
                map.insert("track_total_hits".into(), json!(false));
            }
        }
    }

    #[test]
    fn extra_interceptors_run_after_routing() {
        let client = factory(CpsConfig::enabled())
            .unscoped()
            .with_interceptor(TrackTotalHits);
        let out = client.prepare(search(r#"{"project_routing":"custom"}"#)).unwrap();

        assert_eq!(
            body_json(&out),
            json!({ "project_routing": "custom", "track_total_hits": false })
        );
    }

    #[derive(Debug)]
    struct DropBody;

    impl RequestInterceptor for DropBody {
        fn on_request(&self, params: &mut RequestParams) {
            params.body = None;
        }
    }

    #[test]
    fn body_dropped_after_routing_is_not_sent() {
        let client = factory(CpsConfig::disabled())
            .unscoped()
            .with_interceptor(DropBody);
        let out = client.prepare(search(r#"{"project_routing":"stale"}"#)).unwrap();

        assert_eq!(out.body(), None);
        assert_eq!(out.header("content-length"), None);
        assert_eq!(out.header("content-type"), None);
    }

    #[test]
    fn blank_body_gets_json_content_type_on_injection() {
        let req = HttpRequest::builder()
            .method(Method::Post)
            .path("/_search")
            .body("  ")
            .build();
        let out = factory(CpsConfig::enabled()).unscoped().prepare(req).unwrap();

        assert_eq!(body_json(&out), json!({ "project_routing": ORIGIN_ALIAS }));
        assert_eq!(out.header("content-type"), Some("application/json"));
        assert_eq!(
            out.header("content-length"),
            Some(out.body().unwrap().len().to_string().as_str())
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = CpsConfig {
            catalog: Some(vec![cps::EndpointRuleConfig {
                name: "bad".into(),
                methods: vec![],
                path: "no-slash".into(),
                accepted_params: cps::AcceptedParams::new(),
            }]),
            ..CpsConfig::enabled()
        };
        assert!(matches!(
            ScopedClientFactory::new(config),
            Err(HttpError::Config(_))
        ));
    }

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ScopedClient>();
        assert_send_sync::<ScopedClientFactory>();
    }
}
