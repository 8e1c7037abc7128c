//! Conformance tests that run YAML fixtures through the routing pipeline
//!
//! Run with: cargo test -p cps-test --test conformance

#![cfg(feature = "fixtures")]

use cps_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};

/// The `conformance/` directory at the workspace root.
fn fixtures_dir() -> PathBuf {
    // ext/test -> ext -> workspace root
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("workspace root")
        .join("conformance")
}

fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(name);
    let yaml = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));

    let fixtures = Fixture::from_yaml_multi(&yaml)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {e}", path.display()));
    assert!(!fixtures.is_empty(), "{} has no fixtures", path.display());

    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_policy_table() {
    run_fixture_file("01_policy_table.yaml");
}

#[test]
fn test_scenarios() {
    run_fixture_file("02_scenarios.yaml");
}

#[test]
fn test_body_shapes() {
    run_fixture_file("03_body_shapes.yaml");
}

#[test]
fn test_catalog() {
    run_fixture_file("04_catalog.yaml");
}

#[test]
fn test_scopes() {
    run_fixture_file("05_scopes.yaml");
}

#[test]
fn every_fixture_file_is_covered() {
    let mut files: Vec<_> = fs::read_dir(fixtures_dir())
        .expect("read conformance dir")
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".yaml") || name.ends_with(".yml"))
        .collect();
    files.sort();
    assert_eq!(
        files,
        [
            "01_policy_table.yaml",
            "02_scenarios.yaml",
            "03_body_shapes.yaml",
            "04_catalog.yaml",
            "05_scopes.yaml",
        ]
    );
}
