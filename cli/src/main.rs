//! cps CLI: driving adapter for project routing.
//!
//! Subcommands:
//! - `route <config> <request.json> [--scope <scope>]`: print the routed body
//! - `trace <config> <request.json> [--scope <scope>]`: print the decision trace
//! - `check <config>`: validate config
//! - `catalog [<config>]`: list endpoint rules
//!
//! Global flags `-v`/`--verbose` and `-q`/`--quiet` may appear anywhere.

mod logging;

use std::process;

use cps::{AcceptedParams, ApiCatalog, CpsConfig, Method, RoutingScope};
use cps_http::{HttpRequest, Prepared, ScopedClient, ScopedClientFactory};
use logging::Verbosity;
use serde::Deserialize;
use serde_json::Value;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (verbosity, args) = split_global_flags(args);
    logging::init(verbosity);

    let Some(command) = args.first() else {
        print_usage();
        process::exit(1);
    };

    let result = match command.as_str() {
        "route" => cmd_route(&args[1..]),
        "trace" => cmd_trace(&args[1..]),
        "check" => cmd_check(&args[1..]),
        "catalog" => cmd_catalog(&args[1..]),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_route(args: &[String]) -> Result<(), String> {
    let prepared = prepare(args, "route")?;
    match prepared.request.body() {
        Some(bytes) => match serde_json::from_slice::<Value>(bytes) {
            Ok(body) => println!(
                "{}",
                serde_json::to_string_pretty(&body).map_err(|e| e.to_string())?
            ),
            Err(_) => println!("{}", String::from_utf8_lossy(bytes)),
        },
        None => println!("(no body)"),
    }
    Ok(())
}

fn cmd_trace(args: &[String]) -> Result<(), String> {
    let prepared = prepare(args, "trace")?;
    match &prepared.trace {
        Some(trace) => println!("{trace}"),
        None => println!("(body is not a single JSON document, routing skipped)"),
    }
    Ok(())
}

fn cmd_check(args: &[String]) -> Result<(), String> {
    let [config_path] = args else {
        return Err("check requires exactly one config file path".into());
    };

    let config = load_config(config_path)?;
    let catalog = config.catalog().map_err(|e| format!("config invalid: {e}"))?;

    println!(
        "Config valid (cps {}, routing {}, {} spaces, {} endpoint rules)",
        if config.cps_enabled { "enabled" } else { "disabled" },
        config.project_routing,
        config.spaces.len(),
        catalog.len()
    );
    Ok(())
}

fn cmd_catalog(args: &[String]) -> Result<(), String> {
    let catalog = match args {
        [] => ApiCatalog::search_family().map_err(|e| format!("catalog invalid: {e}"))?,
        [config_path] => load_config(config_path)?
            .catalog()
            .map_err(|e| format!("config invalid: {e}"))?,
        _ => return Err("catalog takes at most one config file path".into()),
    };

    for rule in catalog.rules() {
        let methods = if rule.methods().is_empty() {
            "*".to_string()
        } else {
            rule.methods()
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(",")
        };
        let routed = if rule.accepted_params().accepts_project_routing() {
            "routed"
        } else {
            "-"
        };
        println!("{:<24} {:<12} {:<32} {routed}", rule.name(), methods, rule.path());
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request pipeline (composition root)
// ═══════════════════════════════════════════════════════════════════════════════

fn prepare(args: &[String], command: &str) -> Result<Prepared, String> {
    let invocation = parse_route_args(args)
        .map_err(|e| format!("{command}: {e}"))?;

    let config = load_config(&invocation.config_path)?;
    let request = load_request(&invocation.request_path)?;

    let client = build_client(config, invocation.scope)?;
    client
        .prepare_traced(request)
        .map_err(|e| format!("failed to prepare request: {e}"))
}

fn build_client(config: CpsConfig, scope: Option<RoutingScope>) -> Result<ScopedClient, String> {
    let factory = ScopedClientFactory::new(config).map_err(|e| format!("config invalid: {e}"))?;
    Ok(match scope {
        Some(scope) => factory.as_scoped(scope),
        None => factory.unscoped(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_config(path: &str) -> Result<CpsConfig, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;

    let is_json = std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        CpsConfig::from_json_str(&content)
    } else {
        CpsConfig::from_yaml_str(&content)
    };
    config.map_err(|e| e.to_string())
}

/// A request file: `{ "method", "path", "accepted_params"?, "headers"?, "body"? }`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestFile {
    method: Method,
    path: String,
    #[serde(default)]
    accepted_params: Option<AcceptedParams>,
    #[serde(default)]
    headers: Vec<(String, String)>,
    #[serde(default)]
    body: Option<Value>,
}

impl RequestFile {
    fn into_request(self) -> Result<HttpRequest, String> {
        let mut builder = HttpRequest::builder().method(self.method).path(self.path);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        if let Some(accepted) = self.accepted_params {
            builder = builder.accepted_params(accepted.iter().map(str::to_string));
        }
        if let Some(body) = self.body {
            let bytes = serde_json::to_vec(&body).map_err(|e| e.to_string())?;
            builder = builder.header("content-type", "application/json").body(bytes);
        }
        Ok(builder.build())
    }
}

fn load_request(path: &str) -> Result<HttpRequest, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;
    parse_request(&content)
}

fn parse_request(json: &str) -> Result<HttpRequest, String> {
    let file: RequestFile =
        serde_json::from_str(json).map_err(|e| format!("request parse error: {e}"))?;
    file.into_request()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, PartialEq)]
struct RouteInvocation {
    config_path: String,
    request_path: String,
    scope: Option<RoutingScope>,
}

fn split_global_flags(args: Vec<String>) -> (Verbosity, Vec<String>) {
    let mut verbose = false;
    let mut quiet = false;
    let rest = args
        .into_iter()
        .filter(|arg| match arg.as_str() {
            "-v" | "--verbose" => {
                verbose = true;
                false
            }
            "-q" | "--quiet" => {
                quiet = true;
                false
            }
            _ => true,
        })
        .collect();
    (Verbosity::from_flags(verbose, quiet), rest)
}

fn parse_route_args(args: &[String]) -> Result<RouteInvocation, String> {
    let mut positional = Vec::new();
    let mut scope = None;
    let mut i = 0;

    while i < args.len() {
        if args[i] == "--scope" {
            let value = args
                .get(i + 1)
                .ok_or("--scope requires a value (origin, all or space:<id>)")?;
            scope = Some(value.parse::<RoutingScope>().map_err(|e| e.to_string())?);
            i += 2;
        } else if args[i].starts_with("--") {
            return Err(format!("unexpected argument \"{}\"", args[i]));
        } else {
            positional.push(args[i].clone());
            i += 1;
        }
    }

    match <[String; 2]>::try_from(positional) {
        Ok([config_path, request_path]) => Ok(RouteInvocation {
            config_path,
            request_path,
            scope,
        }),
        Err(_) => Err("expected <config> <request.json>".into()),
    }
}

fn print_usage() {
    eprintln!(
        "Usage: cps [-v|-q] <command> [options]

Commands:
  route <config> <request.json> [--scope <scope>]   Print the routed request body
  trace <config> <request.json> [--scope <scope>]   Print the routing decision trace
  check <config>                                    Validate config
  catalog [<config>]                                List endpoint rules
  help                                              Show this help

Scopes: origin, all, space:<id>
Logging: CPS_LOG or RUST_LOG override -v/-q"
    );
}
