//! Fixture-driven compile tests.
//!
//! Cases are loaded from TOML fixtures in tests/fixtures/script/. Each case
//! lists fragments the compiled module must contain, or the kind of error
//! compilation must fail with. Cases in snapshots.toml are compared in full
//! with insta snapshots stored in tests/snapshots/script/.

use crate::{compile_script, ScriptCompileOptions, ScriptErrorKind, SfcDescriptor};
use serde::Deserialize;
use std::path::PathBuf;

/// A test case from a TOML fixture
#[derive(Debug, Deserialize)]
struct TestCase {
    name: String,
    input: String,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    contains: Vec<String>,
    #[serde(default)]
    excludes: Vec<String>,
    #[serde(default)]
    error: Option<ScriptErrorKind>,
}

/// A fixture file containing multiple test cases
#[derive(Debug, Deserialize)]
struct Fixture {
    cases: Vec<TestCase>,
}

fn fixtures_path() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    PathBuf::from(manifest_dir)
        .join("tests")
        .join("fixtures")
        .join("script")
}

fn snapshots_path() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    PathBuf::from(manifest_dir)
        .join("tests")
        .join("snapshots")
        .join("script")
}

/// Normalize a test case name to a valid snapshot file name
fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .replace([' ', '-'], "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn load_fixture(name: &str) -> Fixture {
    let path = fixtures_path().join(name);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    toml::from_str(&content).unwrap_or_else(|e| panic!("invalid fixture {name}: {e}"))
}

fn run_fixture(name: &str) {
    let fixture = load_fixture(name);
    let options = ScriptCompileOptions::default();

    for case in &fixture.cases {
        let filename = case.filename.as_deref().unwrap_or("Comp.vue");
        let descriptor = SfcDescriptor::from_source(filename, &case.input);
        let result = compile_script(&descriptor, &options);

        match (&case.error, result) {
            (Some(kind), Err(err)) => {
                assert_eq!(err.kind, *kind, "{}: {}", case.name, err.message);
            }
            (Some(kind), Ok(result)) => {
                panic!("{}: expected {kind:?} error, got:\n{}", case.name, result.code);
            }
            (None, Err(err)) => panic!("{}: {err}", case.name),
            (None, Ok(result)) => {
                for fragment in &case.contains {
                    assert!(
                        result.code.contains(fragment.as_str()),
                        "{}: missing {fragment:?} in:\n{}",
                        case.name,
                        result.code
                    );
                }
                for fragment in &case.excludes {
                    assert!(
                        !result.code.contains(fragment.as_str()),
                        "{}: unexpected {fragment:?} in:\n{}",
                        case.name,
                        result.code
                    );
                }
            }
        }
    }
}

#[test]
fn test_macro_fixtures() {
    run_fixture("macros.toml");
}

#[test]
fn test_type_resolution_fixtures() {
    run_fixture("types.toml");
}

#[test]
fn test_error_fixtures() {
    run_fixture("errors.toml");
}

#[test]
fn test_output_snapshots() {
    let snapshot_path = snapshots_path();
    let fixture = load_fixture("snapshots.toml");
    let options = ScriptCompileOptions::default();

    for case in &fixture.cases {
        let filename = case.filename.as_deref().unwrap_or("Comp.vue");
        let descriptor = SfcDescriptor::from_source(filename, &case.input);
        let output = match compile_script(&descriptor, &options) {
            Ok(result) => result.code,
            Err(err) => format!("Compile error: {err}"),
        };

        insta::with_settings!({
            snapshot_path => &snapshot_path,
            prepend_module_to_snapshot => false,
            snapshot_suffix => "",
        }, {
            let snapshot_name = format!("setup__{}", normalize_name(&case.name));
            insta::assert_snapshot!(snapshot_name, output);
        });
    }
}
